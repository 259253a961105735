//! Trojan 映射，TLS 恒开启

use crate::core::error::{ConvertError, Result};
use crate::model::clash::ClashProxy;
use crate::model::singbox::Outbound;
use crate::protocols::common::{tls, transport};

const NAME: &str = "trojan";

pub fn convert(proxy: &ClashProxy, out: &mut Outbound) -> Result<()> {
    if out.password.is_empty() {
        return Err(ConvertError::field(NAME, &proxy.name, "missing password"));
    }
    out.tls = tls(proxy, true);
    out.transport = transport(NAME, proxy)?;
    Ok(())
}
