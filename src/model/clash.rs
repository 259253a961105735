//! Clash 订阅数据模型 (Source Profile Schema)
//!
//! 字段命名遵循 Clash/mihomo 的 kebab-case 约定，未知字段一律忽略。

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// 订阅配置根节点
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClashProfile {
    #[serde(default)]
    pub proxies: Vec<ClashProxy>,
    #[serde(default, rename = "proxy-groups")]
    pub proxy_groups: Vec<ProxyGroup>,
}

impl ClashProfile {
    pub fn from_yaml(content: &str) -> crate::core::error::Result<Self> {
        Ok(serde_yml::from_str(content)?)
    }

    /// 合并另一份订阅 (按追加顺序)
    pub fn merge(&mut self, other: ClashProfile) {
        self.proxies.extend(other.proxies);
        self.proxy_groups.extend(other.proxy_groups);
    }
}

/// 代理组，仅 relay 类型参与转换
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProxyGroup {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub proxies: Vec<String>,
}

/// 数值或文本 (Clash 中端口、带宽常见两种写法)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NumOrStr {
    Num(u64),
    Str(String),
}

impl NumOrStr {
    pub fn as_text(&self) -> String {
        match self {
            NumOrStr::Num(n) => n.to_string(),
            NumOrStr::Str(s) => s.trim().to_string(),
        }
    }
}

/// WireGuard reserved 字段: 整数列表或 base64 文本
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Reserved {
    Bytes(Vec<u8>),
    Text(String),
}

fn port_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumOrStr>::deserialize(deserializer)?;
    Ok(value.map(|v| v.as_text()).unwrap_or_default())
}

/// 单个代理节点 (SourceProxy)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashProxy {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub server: String,
    /// 保留原始文本，由公共字段提取阶段校验
    #[serde(default, deserialize_with = "port_text")]
    pub port: String,
    #[serde(default)]
    pub password: String,

    // 通用开关
    #[serde(default)]
    pub tfo: bool,
    #[serde(default)]
    pub mptcp: bool,
    #[serde(default)]
    pub skip_cert_verify: bool,
    #[serde(default)]
    pub udp_over_tcp: bool,
    #[serde(default)]
    pub smux: Smux,

    // TLS
    #[serde(default)]
    pub tls: bool,
    pub sni: Option<String>,
    #[serde(alias = "servername")]
    pub server_name: Option<String>,
    #[serde(default)]
    pub alpn: Vec<String>,
    pub client_fingerprint: Option<String>,
    pub reality_opts: Option<RealityOpts>,

    // 传输层
    pub network: Option<String>,
    pub ws_opts: Option<WsOpts>,
    pub grpc_opts: Option<GrpcOpts>,
    pub h2_opts: Option<H2Opts>,
    pub http_opts: Option<HttpOpts>,

    // shadowsocks
    pub cipher: Option<String>,
    pub plugin: Option<String>,
    #[serde(default)]
    pub plugin_opts: HashMap<String, serde_yml::Value>,

    // vmess / vless
    pub uuid: Option<String>,
    #[serde(default, alias = "alterId")]
    pub alter_id: u32,
    pub flow: Option<String>,
    pub packet_encoding: Option<String>,

    // socks5 / http
    pub username: Option<String>,

    // hysteria / hysteria2
    pub up: Option<NumOrStr>,
    pub down: Option<NumOrStr>,
    pub obfs: Option<String>,
    pub obfs_password: Option<String>,
    #[serde(alias = "auth_str")]
    pub auth_str: Option<String>,
    pub protocol: Option<String>,
    pub recv_window_conn: Option<u64>,
    pub recv_window: Option<u64>,
    #[serde(default, alias = "disable_mtu_discovery")]
    pub disable_mtu_discovery: bool,
    pub ports: Option<NumOrStr>,
    pub hop_interval: Option<u64>,

    // wireguard
    pub private_key: Option<String>,
    pub public_key: Option<String>,
    pub pre_shared_key: Option<String>,
    pub ip: Option<String>,
    pub ipv6: Option<String>,
    pub mtu: Option<u32>,
    pub reserved: Option<Reserved>,
    #[serde(default)]
    pub peers: Vec<WireguardPeerOpts>,

    // tuic
    pub token: Option<String>,
    pub congestion_controller: Option<String>,
    pub udp_relay_mode: Option<String>,
    #[serde(default)]
    pub reduce_rtt: bool,
    pub heartbeat_interval: Option<u64>,
    #[serde(default)]
    pub disable_sni: bool,
}

impl ClashProxy {
    /// TLS SNI: 优先 sni，其次 servername
    pub fn tls_server_name(&self) -> Option<String> {
        self.sni
            .clone()
            .or_else(|| self.server_name.clone())
            .filter(|s| !s.is_empty())
    }

    /// 读取插件参数中的字符串值
    pub fn plugin_opt(&self, key: &str) -> Option<String> {
        match self.plugin_opts.get(key)? {
            serde_yml::Value::String(s) => Some(s.clone()),
            serde_yml::Value::Number(n) => Some(n.to_string()),
            serde_yml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn plugin_flag(&self, key: &str) -> bool {
        matches!(
            self.plugin_opts.get(key),
            Some(serde_yml::Value::Bool(true))
        )
    }
}

/// 多路复用参数
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Smux {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub max_connections: u32,
    #[serde(default)]
    pub min_streams: u32,
    #[serde(default)]
    pub max_streams: u32,
    #[serde(default)]
    pub padding: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RealityOpts {
    pub public_key: String,
    #[serde(default)]
    pub short_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WsOpts {
    pub path: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub max_early_data: Option<u32>,
    pub early_data_header_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrpcOpts {
    #[serde(default)]
    pub grpc_service_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct H2Opts {
    #[serde(default)]
    pub host: Vec<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpOpts {
    pub method: Option<String>,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,
}

/// WireGuard 多 peer 写法
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireguardPeerOpts {
    pub server: String,
    #[serde(deserialize_with = "port_text")]
    pub port: String,
    pub public_key: String,
    pub pre_shared_key: Option<String>,
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    pub reserved: Option<Reserved>,
}
