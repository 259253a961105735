//! VLESS 映射 (含 Reality / Vision)

use crate::core::error::Result;
use crate::model::clash::ClashProxy;
use crate::model::singbox::Outbound;
use crate::protocols::common::{require, tls, transport};

const NAME: &str = "vless";

pub fn convert(proxy: &ClashProxy, out: &mut Outbound) -> Result<()> {
    out.uuid = Some(require(NAME, proxy, "uuid", proxy.uuid.as_ref())?.to_string());
    out.flow = proxy.flow.clone().filter(|f| !f.is_empty());
    out.packet_encoding = Some(
        proxy
            .packet_encoding
            .clone()
            .unwrap_or_else(|| "xudp".to_string()),
    );
    out.tls = tls(proxy, false);
    out.transport = transport(NAME, proxy)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::singbox::OutboundType;

    #[test]
    fn test_vless_reality() {
        let p: ClashProxy = serde_yml::from_str(
            "{name: r, type: vless, server: s, port: 443, uuid: u, flow: xtls-rprx-vision, tls: true, servername: www.apple.com, client-fingerprint: safari, reality-opts: {public-key: PK, short-id: '01'}}",
        )
        .unwrap();
        let mut out = Outbound::new(OutboundType::Vless, "r");
        convert(&p, &mut out).unwrap();

        assert_eq!(out.flow.as_deref(), Some("xtls-rprx-vision"));
        assert_eq!(out.packet_encoding.as_deref(), Some("xudp"));
        let tls = out.tls.unwrap();
        assert_eq!(tls.server_name.as_deref(), Some("www.apple.com"));
        assert_eq!(tls.utls.unwrap().fingerprint, "safari");
        let reality = tls.reality.unwrap();
        assert_eq!(reality.public_key, "PK");
        assert_eq!(reality.short_id, "01");
    }
}
