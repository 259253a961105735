//! SOCKS5 映射

use crate::core::error::Result;
use crate::model::clash::ClashProxy;
use crate::model::singbox::{Outbound, Version};

pub fn convert(proxy: &ClashProxy, out: &mut Outbound) -> Result<()> {
    out.username = proxy.username.clone().filter(|u| !u.is_empty());
    out.version = Some(Version::Text("5".to_string()));
    Ok(())
}
