//! 配置管理系统 (Configuration Management)
//!
//! 负责 `clash2sing.toml` 的反序列化，环境变量 (`CLASH2SING_*`) 覆盖文件配置，
//! 命令行参数最终覆盖两者。

use std::path::Path;

use bon::Builder;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::error::Result;

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "clash2sing.toml";

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct AppConfig {
    /// 配置模板路径，缺省时使用内置模板
    pub template: Option<String>,

    /// 输出路径，`-` 表示标准输出
    #[serde(default = "default_output")]
    #[builder(default = default_output())]
    pub output: String,

    /// urltest 分组的包含 / 排除正则
    #[serde(default)]
    #[builder(default)]
    pub include: String,
    #[serde(default)]
    #[builder(default)]
    pub exclude: String,

    /// 跳过全部节点的证书校验
    #[serde(default)]
    #[builder(default)]
    pub insecure: bool,

    /// 追加到聚合标签末尾的额外标签
    #[serde(default)]
    #[builder(default)]
    pub ext_tags: Vec<String>,

    /// 订阅下载参数
    #[serde(default)]
    #[builder(default)]
    pub fetch: FetchConfig,
}

/// 订阅下载配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    #[builder(default = default_user_agent())]
    pub user_agent: String,

    /// 单个请求超时 (秒)
    #[serde(default = "default_timeout_secs")]
    #[builder(default = default_timeout_secs())]
    pub timeout_secs: u64,

    /// 并发下载上限
    #[serde(default = "default_concurrency")]
    #[builder(default = default_concurrency())]
    pub concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_output() -> String {
    "config.json".to_string()
}
fn default_user_agent() -> String {
    "clash.meta".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_concurrency() -> usize {
    4
}

impl AppConfig {
    /// 从默认位置加载配置
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// 从指定文件加载配置，文件不存在时仅使用环境变量与默认值
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder
            .add_source(
                Environment::with_prefix("CLASH2SING")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ext_tags")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
