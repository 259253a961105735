//! VMess 映射

use crate::core::error::Result;
use crate::model::clash::ClashProxy;
use crate::model::singbox::Outbound;
use crate::protocols::common::{require, tls, transport};

const NAME: &str = "vmess";

pub fn convert(proxy: &ClashProxy, out: &mut Outbound) -> Result<()> {
    out.uuid = Some(require(NAME, proxy, "uuid", proxy.uuid.as_ref())?.to_string());
    out.alter_id = Some(proxy.alter_id);
    out.security = Some(
        proxy
            .cipher
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "auto".to_string()),
    );
    out.packet_encoding = proxy.packet_encoding.clone();
    out.tls = tls(proxy, false);
    out.transport = transport(NAME, proxy)?;
    Ok(())
}
