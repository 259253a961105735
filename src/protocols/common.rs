//! 协议间共享的字段映射 (TLS / Transport)

use indexmap::IndexMap;

use crate::core::error::{ConvertError, Result};
use crate::model::clash::{ClashProxy, NumOrStr};
use crate::model::singbox::{Reality, Tls, Transport, Utls};

/// 读取必填的文本字段
pub fn require<'a>(
    protocol: &'static str,
    proxy: &ClashProxy,
    field: &'static str,
    value: Option<&'a String>,
) -> Result<&'a str> {
    match value.map(|s| s.as_str()) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ConvertError::field(
            protocol,
            &proxy.name,
            format!("missing {}", field),
        )),
    }
}

/// 构建 TLS 配置
///
/// `always` 为真时忽略 `tls` 开关 (trojan、hysteria 等协议强制 TLS)。
pub fn tls(proxy: &ClashProxy, always: bool) -> Option<Tls> {
    if !always && !proxy.tls && proxy.reality_opts.is_none() {
        return None;
    }

    let utls = proxy
        .client_fingerprint
        .as_ref()
        .filter(|f| !f.is_empty())
        .map(|f| Utls {
            enabled: true,
            fingerprint: f.clone(),
        });

    let reality = proxy.reality_opts.as_ref().map(|r| Reality {
        enabled: true,
        public_key: r.public_key.clone(),
        short_id: r.short_id.clone(),
    });

    Some(Tls {
        enabled: true,
        disable_sni: proxy.disable_sni,
        server_name: proxy.tls_server_name(),
        insecure: proxy.skip_cert_verify,
        alpn: proxy.alpn.clone(),
        // reality 需要 uTLS，未指定指纹时回落到 chrome
        utls: match (&utls, &reality) {
            (None, Some(_)) => Some(Utls {
                enabled: true,
                fingerprint: "chrome".to_string(),
            }),
            _ => utls,
        },
        reality,
    })
}

/// 构建 V2Ray 传输层
pub fn transport(protocol: &'static str, proxy: &ClashProxy) -> Result<Option<Transport>> {
    let network = match proxy.network.as_deref() {
        None | Some("") | Some("tcp") => return Ok(None),
        Some(n) => n,
    };

    let transport = match network {
        "ws" => {
            let opts = proxy.ws_opts.clone().unwrap_or_default();
            let mut headers: IndexMap<String, String> = opts.headers.into_iter().collect();
            headers.sort_keys();
            Transport::Ws {
                path: opts.path,
                headers,
                max_early_data: opts.max_early_data.filter(|n| *n > 0),
                early_data_header_name: opts.early_data_header_name,
            }
        }
        "grpc" => Transport::Grpc {
            service_name: proxy
                .grpc_opts
                .as_ref()
                .map(|o| o.grpc_service_name.clone())
                .unwrap_or_default(),
        },
        "h2" => {
            let opts = proxy.h2_opts.clone().unwrap_or_default();
            Transport::Http {
                host: opts.host,
                path: opts.path,
                method: None,
            }
        }
        "http" => {
            let opts = proxy.http_opts.clone().unwrap_or_default();
            Transport::Http {
                host: opts.headers.get("Host").cloned().unwrap_or_default(),
                path: opts.path.into_iter().next(),
                method: opts.method,
            }
        }
        other => {
            return Err(ConvertError::field(
                protocol,
                &proxy.name,
                format!("unsupported network {:?}", other),
            ));
        }
    };

    Ok(Some(transport))
}

/// 解析带宽: 数字按 Mbps 处理，文本取前导数字 (如 "100 Mbps")
pub fn mbps(protocol: &'static str, proxy: &ClashProxy, value: Option<&NumOrStr>) -> Result<Option<u32>> {
    let text = match value {
        None => return Ok(None),
        Some(NumOrStr::Num(n)) => {
            return u32::try_from(*n).map(Some).map_err(|_| {
                ConvertError::field(protocol, &proxy.name, format!("bandwidth {} out of range", n))
            });
        }
        Some(NumOrStr::Str(s)) => s.trim(),
    };

    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ConvertError::field(
            protocol,
            &proxy.name,
            format!("invalid bandwidth {:?}", text),
        ));
    }
    digits.parse().map(Some).map_err(|e| {
        ConvertError::field(protocol, &proxy.name, format!("invalid bandwidth {:?}: {}", text, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::clash::{RealityOpts, WsOpts};
    use std::collections::HashMap;

    fn proxy() -> ClashProxy {
        ClashProxy {
            name: "n".into(),
            kind: "vless".into(),
            server: "example.com".into(),
            port: "443".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tls_disabled_without_flag() {
        assert!(tls(&proxy(), false).is_none());
        assert!(tls(&proxy(), true).is_some());
    }

    #[test]
    fn test_tls_reality_defaults_fingerprint() {
        let mut p = proxy();
        p.sni = Some("sni.example.com".into());
        p.reality_opts = Some(RealityOpts {
            public_key: "pk".into(),
            short_id: "ab".into(),
        });

        let tls = tls(&p, false).unwrap();
        assert_eq!(tls.server_name.as_deref(), Some("sni.example.com"));
        assert_eq!(tls.utls.unwrap().fingerprint, "chrome");
        assert_eq!(tls.reality.unwrap().short_id, "ab");
    }

    #[test]
    fn test_transport_ws() {
        let mut p = proxy();
        p.network = Some("ws".into());
        p.ws_opts = Some(WsOpts {
            path: Some("/path".into()),
            headers: HashMap::from([("Host".to_string(), "cdn.example.com".to_string())]),
            max_early_data: Some(2048),
            early_data_header_name: Some("Sec-WebSocket-Protocol".into()),
        });

        match transport("vless", &p).unwrap() {
            Some(Transport::Ws {
                path,
                headers,
                max_early_data,
                ..
            }) => {
                assert_eq!(path.as_deref(), Some("/path"));
                assert_eq!(headers.get("Host").map(String::as_str), Some("cdn.example.com"));
                assert_eq!(max_early_data, Some(2048));
            }
            other => panic!("unexpected transport: {:?}", other),
        }
    }

    #[test]
    fn test_transport_unknown_network() {
        let mut p = proxy();
        p.network = Some("kcp".into());
        let err = transport("vless", &p).unwrap_err();
        assert!(err.to_string().contains("kcp"));
    }

    #[test]
    fn test_mbps() {
        let p = proxy();
        assert_eq!(mbps("hysteria", &p, None).unwrap(), None);
        assert_eq!(mbps("hysteria", &p, Some(&NumOrStr::Num(50))).unwrap(), Some(50));
        assert_eq!(
            mbps("hysteria", &p, Some(&NumOrStr::Str("100 Mbps".into()))).unwrap(),
            Some(100)
        );
        assert!(mbps("hysteria", &p, Some(&NumOrStr::Str("fast".into()))).is_err());
    }
}
