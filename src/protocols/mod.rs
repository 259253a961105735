//! 协议转换分发 (Protocol Converter Dispatch)
//!
//! 每个协议提供独立的映射函数，统一注册到 [`ConverterRegistry`]。
//! 转换函数之间互不感知，也不依赖模板修补逻辑。

use std::collections::HashMap;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProxy;
use crate::model::singbox::{Outbound, OutboundType};

pub mod common;
pub mod http;
pub mod hysteria;
pub mod hysteria2;
pub mod shadowsocks;
pub mod socks;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;
pub mod wireguard;

/// 源协议标识 (Clash `type` 字段)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    Ss,
    Vmess,
    Vless,
    Trojan,
    Socks5,
    Http,
    Hysteria,
    Hysteria2,
    Wireguard,
    Tuic,
}

impl Protocol {
    /// 解析协议标识，未知类型返回可区分的错误
    pub fn parse(kind: &str) -> Result<Self> {
        kind.parse().map_err(|_| ConvertError::UnsupportedType {
            kind: kind.to_string(),
        })
    }

    /// 对应的 sing-box 出站类型
    pub fn target(&self) -> OutboundType {
        match self {
            Protocol::Ss => OutboundType::Shadowsocks,
            Protocol::Vmess => OutboundType::Vmess,
            Protocol::Vless => OutboundType::Vless,
            Protocol::Trojan => OutboundType::Trojan,
            Protocol::Socks5 => OutboundType::Socks,
            Protocol::Http => OutboundType::Http,
            Protocol::Hysteria => OutboundType::Hysteria,
            Protocol::Hysteria2 => OutboundType::Hysteria2,
            Protocol::Wireguard => OutboundType::Wireguard,
            Protocol::Tuic => OutboundType::Tuic,
        }
    }
}

/// 转换函数: 源节点 + 已填充公共字段的出站 -> 一个或多个出站
pub type Converter = Box<dyn Fn(&ClashProxy, Outbound) -> Result<Vec<Outbound>> + Send + Sync>;

/// 将单结果映射函数适配为列表契约
pub fn single(
    f: fn(&ClashProxy, &mut Outbound) -> Result<()>,
) -> impl Fn(&ClashProxy, Outbound) -> Result<Vec<Outbound>> + Send + Sync + 'static {
    move |proxy: &ClashProxy, mut out: Outbound| {
        f(proxy, &mut out)?;
        Ok(vec![out])
    }
}

// ============================================================================
// 转换器注册表
// ============================================================================

pub struct ConverterRegistry {
    converters: HashMap<Protocol, Converter>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            converters: HashMap::new(),
        };
        registry.register(Protocol::Ss, shadowsocks::convert);
        registry.register(Protocol::Vmess, single(vmess::convert));
        registry.register(Protocol::Vless, single(vless::convert));
        registry.register(Protocol::Trojan, single(trojan::convert));
        registry.register(Protocol::Socks5, single(socks::convert));
        registry.register(Protocol::Http, single(http::convert));
        registry.register(Protocol::Hysteria, single(hysteria::convert));
        registry.register(Protocol::Hysteria2, hysteria2::convert);
        registry.register(Protocol::Wireguard, wireguard::convert);
        registry.register(Protocol::Tuic, tuic::convert);
        registry
    }

    pub fn register<F>(&mut self, protocol: Protocol, converter: F)
    where
        F: Fn(&ClashProxy, Outbound) -> Result<Vec<Outbound>> + Send + Sync + 'static,
    {
        self.converters.insert(protocol, Box::new(converter));
    }

    /// 执行转换，保证成功时结果非空
    pub fn convert(&self, protocol: Protocol, proxy: &ClashProxy, common: Outbound) -> Result<Vec<Outbound>> {
        let converter = self
            .converters
            .get(&protocol)
            .ok_or_else(|| ConvertError::UnsupportedType {
                kind: protocol.to_string(),
            })?;

        let outs = converter(proxy, common)?;
        if outs.is_empty() {
            return Err(ConvertError::field(
                "convert",
                &proxy.name,
                format!("{} produced no outbound", protocol),
            ));
        }
        Ok(outs)
    }

    pub fn list(&self) -> Vec<Protocol> {
        Protocol::iter()
            .filter(|p| self.converters.contains_key(p))
            .collect()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_vocabulary() {
        let pairs = [
            ("ss", OutboundType::Shadowsocks),
            ("vmess", OutboundType::Vmess),
            ("vless", OutboundType::Vless),
            ("trojan", OutboundType::Trojan),
            ("socks5", OutboundType::Socks),
            ("http", OutboundType::Http),
            ("hysteria", OutboundType::Hysteria),
            ("hysteria2", OutboundType::Hysteria2),
            ("wireguard", OutboundType::Wireguard),
            ("tuic", OutboundType::Tuic),
        ];
        for (kind, target) in pairs {
            assert_eq!(Protocol::parse(kind).unwrap().target(), target);
        }
    }

    #[test]
    fn test_unsupported_type_names_identifier() {
        let err = Protocol::parse("ssr").unwrap_err();
        assert!(matches!(&err, ConvertError::UnsupportedType { kind } if kind == "ssr"));
        assert!(err.to_string().contains("ssr"));
    }

    #[test]
    fn test_registry_covers_every_protocol() {
        let registry = ConverterRegistry::new();
        assert_eq!(registry.list().len(), Protocol::iter().count());
    }

    #[test]
    fn test_registry_rejects_empty_result() {
        let mut registry = ConverterRegistry::new();
        registry.register(Protocol::Socks5, |_, _| Ok(vec![]));

        let proxy = ClashProxy {
            name: "s".into(),
            kind: "socks5".into(),
            ..Default::default()
        };
        let common = Outbound::new(OutboundType::Socks, "s");
        assert!(registry.convert(Protocol::Socks5, &proxy, common).is_err());
    }

    #[test]
    fn test_single_adapter() {
        let adapter = single(socks::convert);
        let proxy = ClashProxy {
            name: "s".into(),
            kind: "socks5".into(),
            username: Some("u".into()),
            ..Default::default()
        };
        let outs = adapter(&proxy, Outbound::new(OutboundType::Socks, "s")).unwrap();
        assert_eq!(outs.len(), 1);
        assert_eq!(
            serde_json::to_value(&outs[0]).unwrap()["version"],
            serde_json::json!("5")
        );
        assert_eq!(outs[0].username.as_deref(), Some("u"));
    }
}
