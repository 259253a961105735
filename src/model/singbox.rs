//! sing-box 出站数据模型 (Target Outbound Schema)
//!
//! 单一扁平结构覆盖全部协议，未设置的可选字段在序列化时省略。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 出站类型 (Outbound Type)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutboundType {
    Shadowsocks,
    Vmess,
    Vless,
    Trojan,
    Socks,
    Http,
    Hysteria,
    Hysteria2,
    Wireguard,
    Tuic,
    Shadowtls,
    Selector,
    Urltest,
    #[default]
    Direct,
    Block,
    Dns,
}

impl OutboundType {
    /// 分组类型，其成员由其他出站派生
    pub fn is_group(&self) -> bool {
        matches!(self, OutboundType::Selector | OutboundType::Urltest)
    }
}

/// 出站节点 (NormalizedOutbound)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outbound {
    #[serde(rename = "type")]
    pub kind: OutboundType,
    pub tag: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub server_port: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server_ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hop_interval: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    // shadowsocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_opts: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub udp_over_tcp: bool,

    // vmess / vless / tuic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_encoding: Option<String>,

    // socks / http
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// socks 为文本 ("5")，shadowtls 为整数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    // hysteria / hysteria2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_mbps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obfs: Option<Obfs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv_window_conn: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recv_window: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_mtu_discovery: bool,

    // wireguard
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_address: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_shared_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<WireguardPeer>,

    // tuic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp_relay_mode: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub zero_rtt_handshake: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplex: Option<Multiplex>,

    /// 经由另一出站拨号 (relay / shadow-tls 链路)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detour: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tcp_fast_open: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tcp_multi_path: bool,

    // selector / urltest
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbounds: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// 不参与分组标签聚合，但仍保留在出站列表中
    #[serde(skip)]
    pub ignored: bool,
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}

impl Outbound {
    pub fn new(kind: OutboundType, tag: impl Into<String>) -> Self {
        Self {
            kind,
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn selector(tag: impl Into<String>, outbounds: Vec<String>, default: &str) -> Self {
        Self {
            outbounds,
            default: Some(default.to_string()),
            ..Self::new(OutboundType::Selector, tag)
        }
    }

    pub fn urltest(tag: impl Into<String>, outbounds: Vec<String>) -> Self {
        Self {
            outbounds,
            ..Self::new(OutboundType::Urltest, tag)
        }
    }
}

/// 多路复用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Multiplex {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub max_connections: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub min_streams: u32,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub max_streams: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub padding: bool,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

/// 安全传输配置 (TLS/uTLS/Reality)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tls {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_sni: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alpn: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utls: Option<Utls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality: Option<Reality>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utls {
    pub enabled: bool,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reality {
    pub enabled: bool,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_id: String,
}

/// 传输层封装协议 (Transport Layer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Transport {
    Http {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        host: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
    },
    Ws {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        headers: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_early_data: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        early_data_header_name: Option<String>,
    },
    Grpc {
        service_name: String,
    },
    Httpupgrade {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
}

/// 协议版本号，按出站类型决定 JSON 类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    Number(u8),
    Text(String),
}

/// 混淆配置: hysteria 为纯文本，hysteria2 为带类型的对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Obfs {
    Plain(String),
    Typed {
        #[serde(rename = "type")]
        kind: String,
        password: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireguardPeer {
    pub server: String,
    pub server_port: u16,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_shared_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved: Vec<u8>,
}
