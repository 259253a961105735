//! HTTP 代理映射

use crate::core::error::Result;
use crate::model::clash::ClashProxy;
use crate::model::singbox::Outbound;
use crate::protocols::common::tls;

pub fn convert(proxy: &ClashProxy, out: &mut Outbound) -> Result<()> {
    out.username = proxy.username.clone().filter(|u| !u.is_empty());
    out.tls = tls(proxy, false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::singbox::OutboundType;

    #[test]
    fn test_http_with_auth() {
        let p: ClashProxy = serde_yml::from_str(
            "{name: h, type: http, server: s, port: 8080, username: user, password: pass, tls: true}",
        )
        .unwrap();
        let mut out = Outbound::new(OutboundType::Http, "h");
        convert(&p, &mut out).unwrap();
        assert_eq!(out.username.as_deref(), Some("user"));
        assert!(out.tls.is_some());
    }
}
