//! Hysteria (v1) 映射

use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProxy;
use crate::model::singbox::{Obfs, Outbound};
use crate::protocols::common::{mbps, tls};

const NAME: &str = "hysteria";

pub fn convert(proxy: &ClashProxy, out: &mut Outbound) -> Result<()> {
    match proxy.protocol.as_deref() {
        None | Some("") | Some("udp") => {}
        Some(other) => {
            return Err(ConvertError::field(
                NAME,
                &proxy.name,
                format!("unsupported protocol {:?}", other),
            ));
        }
    }

    out.up_mbps = mbps(NAME, proxy, proxy.up.as_ref())?;
    out.down_mbps = mbps(NAME, proxy, proxy.down.as_ref())?;
    if out.up_mbps.is_none() || out.down_mbps.is_none() {
        return Err(ConvertError::field(NAME, &proxy.name, "missing up/down bandwidth"));
    }

    out.obfs = proxy
        .obfs
        .clone()
        .filter(|o| !o.is_empty())
        .map(Obfs::Plain);
    out.auth_str = proxy.auth_str.clone().filter(|a| !a.is_empty());
    out.recv_window_conn = proxy.recv_window_conn;
    out.recv_window = proxy.recv_window;
    out.disable_mtu_discovery = proxy.disable_mtu_discovery;
    out.tls = tls(proxy, true);
    Ok(())
}
