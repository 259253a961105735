pub mod clash;
pub mod singbox;

pub use clash::{ClashProfile, ClashProxy, ProxyGroup};
pub use singbox::{Outbound, OutboundType};
