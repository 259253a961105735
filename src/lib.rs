//! Clash 订阅到 sing-box 配置的转换库 (Clash to sing-box Converter)
//!
//! 流水线: Clash 节点 -> 协议转换 (+ relay 解析) -> 出站列表 -> 模板修补 -> 分组指令解析 -> JSON。

pub mod convert;
pub mod core;
pub mod fetch;
pub mod model;
pub mod patch;
pub mod protocols;

pub use convert::{Conversion, clash_to_singbox, clash_to_singbox_with, to_insecure};
pub use crate::core::error::{ConvertError, ErrorList, Result};
pub use patch::{DEFAULT_TEMPLATE, patch};
