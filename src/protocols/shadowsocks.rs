//! Shadowsocks 映射，含 obfs / v2ray-plugin / shadow-tls 插件

use tracing::debug;

use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProxy;
use crate::model::singbox::{Outbound, OutboundType, Tls, Utls, Version};
use crate::protocols::common::require;

const NAME: &str = "shadowsocks";

/// shadow-tls 插件会额外生成一个承载出站，因此返回列表
pub fn convert(proxy: &ClashProxy, mut out: Outbound) -> Result<Vec<Outbound>> {
    out.method = Some(require(NAME, proxy, "cipher", proxy.cipher.as_ref())?.to_string());
    out.udp_over_tcp = proxy.udp_over_tcp;

    match proxy.plugin.as_deref() {
        None | Some("") => Ok(vec![out]),
        Some("obfs") => {
            let mode = proxy.plugin_opt("mode").unwrap_or_else(|| "http".to_string());
            let mut opts = format!("obfs={}", mode);
            if let Some(host) = proxy.plugin_opt("host") {
                opts.push_str(&format!(";obfs-host={}", host));
            }
            out.plugin = Some("obfs-local".to_string());
            out.plugin_opts = Some(opts);
            Ok(vec![out])
        }
        Some("v2ray-plugin") => {
            let mode = proxy
                .plugin_opt("mode")
                .unwrap_or_else(|| "websocket".to_string());
            let mut parts = vec![format!("mode={}", mode)];
            if let Some(host) = proxy.plugin_opt("host") {
                parts.push(format!("host={}", host));
            }
            if let Some(path) = proxy.plugin_opt("path") {
                parts.push(format!("path={}", path));
            }
            if proxy.plugin_flag("tls") {
                parts.push("tls".to_string());
            }
            out.plugin = Some("v2ray-plugin".to_string());
            out.plugin_opts = Some(parts.join(";"));
            Ok(vec![out])
        }
        Some("shadow-tls") => shadow_tls(proxy, out),
        Some(other) => Err(ConvertError::field(
            NAME,
            &proxy.name,
            format!("unsupported plugin {:?}", other),
        )),
    }
}

/// shadow-tls: 承载出站负责握手，shadowsocks 经 detour 走该出站
fn shadow_tls(proxy: &ClashProxy, mut out: Outbound) -> Result<Vec<Outbound>> {
    let password = proxy.plugin_opt("password").unwrap_or_default();
    let version: u8 = match proxy.plugin_opt("version") {
        None => 3,
        Some(v) => v.trim().parse().map_err(|_| {
            ConvertError::field(NAME, &proxy.name, format!("invalid shadow-tls version {:?}", v))
        })?,
    };
    if version != 1 && password.is_empty() {
        return Err(ConvertError::field(
            NAME,
            &proxy.name,
            "shadow-tls password is required",
        ));
    }

    let mut carrier = Outbound::new(OutboundType::Shadowtls, format!("{}_shadowtls", out.tag));
    carrier.server = out.server.clone();
    carrier.server_port = out.server_port;
    carrier.password = password;
    carrier.version = Some(Version::Number(version));
    carrier.tcp_fast_open = out.tcp_fast_open;
    carrier.tcp_multi_path = out.tcp_multi_path;
    carrier.tls = Some(Tls {
        enabled: true,
        server_name: proxy.plugin_opt("host"),
        insecure: proxy.skip_cert_verify,
        utls: proxy
            .client_fingerprint
            .clone()
            .filter(|f| !f.is_empty())
            .map(|fingerprint| Utls {
                enabled: true,
                fingerprint,
            }),
        ..Default::default()
    });
    carrier.ignored = true;

    debug!("{} 经由 {} 拨号", out.tag, carrier.tag);
    out.detour = Some(carrier.tag.clone());

    Ok(vec![out, carrier])
}
