//! Hysteria2 映射，支持端口跳跃

use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProxy;
use crate::model::singbox::{Obfs, Outbound};
use crate::protocols::common::{mbps, tls};

const NAME: &str = "hysteria2";

pub fn convert(proxy: &ClashProxy, mut out: Outbound) -> Result<Vec<Outbound>> {
    out.up_mbps = mbps(NAME, proxy, proxy.up.as_ref())?;
    out.down_mbps = mbps(NAME, proxy, proxy.down.as_ref())?;

    out.obfs = match proxy.obfs.as_deref() {
        None | Some("") => None,
        Some("salamander") => Some(Obfs::Typed {
            kind: "salamander".to_string(),
            password: proxy.obfs_password.clone().unwrap_or_default(),
        }),
        Some(other) => {
            return Err(ConvertError::field(
                NAME,
                &proxy.name,
                format!("unsupported obfs {:?}", other),
            ));
        }
    };

    if let Some(ports) = &proxy.ports {
        out.server_ports = server_ports(proxy, &ports.as_text())?;
        out.hop_interval = proxy.hop_interval.map(|s| format!("{}s", s));
    }

    out.tls = tls(proxy, true);
    Ok(vec![out])
}

/// "443,8000-9000" -> ["443:443", "8000:9000"]
fn server_ports(proxy: &ClashProxy, text: &str) -> Result<Vec<String>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|range| {
            let (start, end) = range.split_once('-').unwrap_or((range, range));
            let parse = |s: &str| {
                s.trim().parse::<u16>().map_err(|e| {
                    ConvertError::field(NAME, &proxy.name, format!("invalid ports {:?}: {}", text, e))
                })
            };
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(ConvertError::field(
                    NAME,
                    &proxy.name,
                    format!("invalid port range {:?}", range),
                ));
            }
            Ok(format!("{}:{}", start, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::singbox::OutboundType;

    #[test]
    fn test_hysteria2_obfs_and_ports() {
        let p: ClashProxy = serde_yml::from_str(
            "{name: h2, type: hysteria2, server: s, port: 443, password: pw, obfs: salamander, obfs-password: o, ports: '443,8000-9000', hop-interval: 30, sni: h.example.com}",
        )
        .unwrap();
        let outs = convert(&p, Outbound::new(OutboundType::Hysteria2, "h2")).unwrap();
        let out = &outs[0];

        assert_eq!(
            out.obfs,
            Some(Obfs::Typed {
                kind: "salamander".into(),
                password: "o".into()
            })
        );
        assert_eq!(out.server_ports, vec!["443:443", "8000:9000"]);
        assert_eq!(out.hop_interval.as_deref(), Some("30s"));
        assert_eq!(
            out.tls.as_ref().unwrap().server_name.as_deref(),
            Some("h.example.com")
        );
    }

    #[test]
    fn test_hysteria2_bad_ports() {
        let p: ClashProxy = serde_yml::from_str(
            "{name: h2, type: hysteria2, server: s, port: 443, password: pw, ports: '9000-8000'}",
        )
        .unwrap();
        assert!(convert(&p, Outbound::new(OutboundType::Hysteria2, "h2")).is_err());
    }
}
