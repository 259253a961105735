//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、日志初始化、配置分层合并，并串联 下载 -> 转换 -> 修补 -> 输出。

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{ArgGroup, Parser};
use tokio::fs;
use tracing::info;

use clash2sing::core::config::{AppConfig, DEFAULT_CONFIG_FILE};
use clash2sing::fetch::fetch_profiles;
use clash2sing::model::clash::ClashProfile;
use clash2sing::patch::{DEFAULT_TEMPLATE, patch};
use clash2sing::{clash_to_singbox, to_insecure};

/// 命令行界面脚手架 (CLI Scaffolding)
#[derive(Parser, Debug)]
#[command(author, version, about = "Convert Clash subscriptions to sing-box outbounds", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "url"])))]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// 本地 Clash 配置文件
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// 订阅地址，可重复指定
    #[arg(short, long, num_args = 1..)]
    url: Vec<String>,

    /// sing-box 配置模板
    #[arg(short, long)]
    template: Option<String>,

    /// 输出路径，`-` 表示标准输出
    #[arg(short, long)]
    output: Option<String>,

    /// urltest 分组包含的节点 (正则)
    #[arg(long)]
    include: Option<String>,

    /// urltest 分组排除的节点 (正则)
    #[arg(long)]
    exclude: Option<String>,

    /// 跳过证书校验
    #[arg(long)]
    insecure: bool,

    /// 追加到分组中的额外标签
    #[arg(long = "tag")]
    tags: Vec<String>,
}

impl Cli {
    /// 命令行参数覆盖文件与环境变量配置
    fn apply(&self, config: &mut AppConfig) {
        if let Some(template) = &self.template {
            config.template = Some(template.clone());
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(include) = &self.include {
            config.include = include.clone();
        }
        if let Some(exclude) = &self.exclude {
            config.exclude = exclude.clone();
        }
        config.insecure |= self.insecure;
        config.ext_tags.extend(self.tags.iter().cloned());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志写入 stderr，stdout 留给 JSON 输出
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    cli.apply(&mut config);

    let mut profile = load_profile(&cli, &config).await?;
    if config.insecure {
        to_insecure(&mut profile);
    }

    let conversion = clash_to_singbox(&profile);
    if conversion.outbounds.is_empty() && !conversion.errors.is_empty() {
        bail!("no proxy could be converted:\n{}", conversion.errors);
    }

    let template = match &config.template {
        Some(path) => fs::read(path)
            .await
            .with_context(|| format!("failed to read template {}", path))?,
        None => DEFAULT_TEMPLATE.as_bytes().to_vec(),
    };

    let output = patch(
        &template,
        &conversion.outbounds,
        &config.include,
        &config.exclude,
        Vec::new(),
        &config.ext_tags,
    )?;

    write_output(&config.output, &output).await?;
    if !conversion.errors.is_empty() {
        info!("{} 个节点未转换，详见上方警告", conversion.errors.len());
    }
    Ok(())
}

async fn load_profile(cli: &Cli, config: &AppConfig) -> anyhow::Result<ClashProfile> {
    if !cli.url.is_empty() {
        return Ok(fetch_profiles(&cli.url, &config.fetch).await?);
    }

    let Some(input) = &cli.input else {
        bail!("either --input or --url is required");
    };
    let content = fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    ClashProfile::from_yaml(&content).with_context(|| format!("failed to parse {}", input.display()))
}

async fn write_output(target: &str, data: &[u8]) -> anyhow::Result<()> {
    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()?;
        return Ok(());
    }

    let path = Path::new(target);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data)
        .await
        .with_context(|| format!("failed to write {}", target))?;
    info!("已写入 {}", target);
    Ok(())
}
