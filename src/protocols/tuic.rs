//! TUIC (v5) 映射

use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProxy;
use crate::model::singbox::Outbound;
use crate::protocols::common::tls;

const NAME: &str = "tuic";

pub fn convert(proxy: &ClashProxy, mut out: Outbound) -> Result<Vec<Outbound>> {
    let uuid = proxy.uuid.clone().filter(|u| !u.is_empty());
    let Some(uuid) = uuid else {
        let reason = if proxy.token.is_some() {
            "tuic v4 (token) is not supported"
        } else {
            "missing uuid"
        };
        return Err(ConvertError::field(NAME, &proxy.name, reason));
    };

    out.uuid = Some(uuid);
    out.congestion_control = proxy.congestion_controller.clone();
    out.udp_relay_mode = proxy.udp_relay_mode.clone();
    out.zero_rtt_handshake = proxy.reduce_rtt;
    out.heartbeat = proxy.heartbeat_interval.map(|ms| format!("{}ms", ms));

    let mut tls = tls(proxy, true);
    // ip 字段覆盖连接地址，原 server 用作 SNI
    if let Some(ip) = proxy.ip.as_ref().filter(|ip| !ip.is_empty()) {
        if let Some(tls) = tls.as_mut() {
            if tls.server_name.is_none() {
                tls.server_name = Some(out.server.clone());
            }
        }
        out.server = ip.clone();
    }
    out.tls = tls;

    Ok(vec![out])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::singbox::OutboundType;

    #[test]
    fn test_tuic_v5() {
        let p: ClashProxy = serde_yml::from_str(
            "{name: t, type: tuic, server: t.example.com, ip: 1.1.1.1, port: 443, uuid: u, password: pw, congestion-controller: bbr, udp-relay-mode: native, reduce-rtt: true, heartbeat-interval: 10000, alpn: [h3]}",
        )
        .unwrap();
        let out = Outbound {
            server: p.server.clone(),
            ..Outbound::new(OutboundType::Tuic, "t")
        };
        let outs = convert(&p, out).unwrap();
        let out = &outs[0];

        assert_eq!(out.server, "1.1.1.1");
        assert_eq!(out.congestion_control.as_deref(), Some("bbr"));
        assert!(out.zero_rtt_handshake);
        assert_eq!(out.heartbeat.as_deref(), Some("10000ms"));
        assert_eq!(
            out.tls.as_ref().unwrap().server_name.as_deref(),
            Some("t.example.com")
        );
    }

    #[test]
    fn test_tuic_v4_rejected() {
        let p: ClashProxy =
            serde_yml::from_str("{name: t, type: tuic, server: s, port: 443, token: abc}").unwrap();
        let err = convert(&p, Outbound::new(OutboundType::Tuic, "t")).unwrap_err();
        assert!(err.to_string().contains("token"));
    }
}
