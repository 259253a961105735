//! WireGuard 映射
//!
//! 单 peer 写法映射到顶层字段，`peers` 列表映射到 sing-box 的多 peer 配置。

use base64::{Engine as _, engine::general_purpose};

use crate::core::error::{ConvertError, Result};
use crate::model::clash::{ClashProxy, Reserved};
use crate::model::singbox::{Outbound, WireguardPeer};
use crate::protocols::common::require;

const NAME: &str = "wireguard";

pub fn convert(proxy: &ClashProxy, mut out: Outbound) -> Result<Vec<Outbound>> {
    let private_key = require(NAME, proxy, "private-key", proxy.private_key.as_ref())?;
    check_key(proxy, "private-key", private_key)?;
    out.private_key = Some(private_key.to_string());

    out.local_address = [
        proxy.ip.as_deref().map(|ip| with_prefix(ip, 32)),
        proxy.ipv6.as_deref().map(|ip| with_prefix(ip, 128)),
    ]
    .into_iter()
    .flatten()
    .collect();
    out.mtu = proxy.mtu;

    if proxy.peers.is_empty() {
        let public_key = require(NAME, proxy, "public-key", proxy.public_key.as_ref())?;
        check_key(proxy, "public-key", public_key)?;
        out.peer_public_key = Some(public_key.to_string());
        out.pre_shared_key = proxy.pre_shared_key.clone().filter(|k| !k.is_empty());
        out.reserved = reserved(proxy, proxy.reserved.as_ref())?;
        return Ok(vec![out]);
    }

    out.peers = proxy
        .peers
        .iter()
        .map(|peer| {
            check_key(proxy, "peer public-key", &peer.public_key)?;
            let server_port = peer.port.parse::<u16>().map_err(|e| {
                ConvertError::field(NAME, &proxy.name, format!("invalid peer port {:?}: {}", peer.port, e))
            })?;
            Ok(WireguardPeer {
                server: peer.server.clone(),
                server_port,
                public_key: peer.public_key.clone(),
                pre_shared_key: peer.pre_shared_key.clone().filter(|k| !k.is_empty()),
                allowed_ips: if peer.allowed_ips.is_empty() {
                    vec!["0.0.0.0/0".to_string(), "::/0".to_string()]
                } else {
                    peer.allowed_ips.clone()
                },
                reserved: reserved(proxy, peer.reserved.as_ref())?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(vec![out])
}

fn with_prefix(ip: &str, bits: u8) -> String {
    if ip.contains('/') {
        ip.to_string()
    } else {
        format!("{}/{}", ip, bits)
    }
}

/// 密钥必须是 32 字节的 base64
fn check_key(proxy: &ClashProxy, field: &str, key: &str) -> Result<()> {
    let bytes = general_purpose::STANDARD.decode(key.trim()).map_err(|e| {
        ConvertError::field(NAME, &proxy.name, format!("{} is not base64: {}", field, e))
    })?;
    if bytes.len() != 32 {
        return Err(ConvertError::field(
            NAME,
            &proxy.name,
            format!("{} must be 32 bytes, got {}", field, bytes.len()),
        ));
    }
    Ok(())
}

fn reserved(proxy: &ClashProxy, value: Option<&Reserved>) -> Result<Vec<u8>> {
    match value {
        None => Ok(Vec::new()),
        Some(Reserved::Bytes(bytes)) => Ok(bytes.clone()),
        Some(Reserved::Text(text)) if text.is_empty() => Ok(Vec::new()),
        Some(Reserved::Text(text)) => general_purpose::STANDARD
            .decode(text)
            .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(text))
            .map_err(|e| {
                ConvertError::field(NAME, &proxy.name, format!("invalid reserved {:?}: {}", text, e))
            }),
    }
}
