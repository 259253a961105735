//! 订阅下载 (Subscription Fetching)
//!
//! 并发拉取多个 Clash 订阅，按参数顺序合并为一个配置。

use std::time::Duration;

use futures::{StreamExt, stream};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::FetchConfig;
use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProfile;

/// 校验订阅地址，仅接受 http / https
pub fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|source| ConvertError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConvertError::Format(format!("unsupported url scheme {:?}", scheme))),
    }
}

pub fn build_client(config: &FetchConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()?)
}

async fn fetch_one(client: &Client, url: Url) -> Result<ClashProfile> {
    debug!("Fetching subscription: {}", url);
    let body = client.get(url).send().await?.error_for_status()?.text().await?;
    ClashProfile::from_yaml(&body)
}

/// 批量下载订阅
///
/// 单个地址失败只记录警告；全部失败时返回第一个错误。
pub async fn fetch_profiles(urls: &[String], config: &FetchConfig) -> Result<ClashProfile> {
    let parsed = urls.iter().map(|u| parse_url(u)).collect::<Result<Vec<_>>>()?;
    let client = build_client(config)?;

    let results: Vec<(Url, Result<ClashProfile>)> = stream::iter(parsed)
        .map(|url| {
            let client = &client;
            async move {
                let result = fetch_one(client, url.clone()).await;
                (url, result)
            }
        })
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut merged = ClashProfile::default();
    let mut first_error = None;
    let mut fetched = 0usize;

    for (url, result) in results {
        match result {
            Ok(profile) => {
                debug!("{}: {} proxies", url, profile.proxies.len());
                merged.merge(profile);
                fetched += 1;
            }
            Err(e) => {
                warn!("Subscription failed {}: {}", url, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if fetched == 0 => Err(e),
        _ => {
            info!("已下载 {} 个订阅, 共 {} 个节点", fetched, merged.proxies.len());
            Ok(merged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com/sub?token=1").is_ok());
        assert!(parse_url(" http://example.com/clash.yaml ").is_ok());
        assert!(matches!(parse_url("not a url"), Err(ConvertError::InvalidUrl { .. })));
        assert!(matches!(parse_url("file:///etc/passwd"), Err(ConvertError::Format(_))));
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_request() {
        let urls = vec!["https://example.com/a".to_string(), "::".to_string()];
        let err = fetch_profiles(&urls, &FetchConfig::default()).await.unwrap_err();
        assert!(matches!(err, ConvertError::InvalidUrl { .. }));
    }
}
