pub mod config;
pub mod error;

pub use config::{AppConfig, FetchConfig};
pub use error::{ConvertError, ErrorList, OpContext, Result};
