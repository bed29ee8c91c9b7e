//! # Fabsort CLI
//!
//! 分拣台的操作员命令行入口。
//!
//! ```bash
//! # 生成默认配置
//! fabsort config init --path fabsort.toml
//!
//! # 主循环：帧 → 检测 → 门控 → 分拣（无硬件试运行加 --synthetic）
//! fabsort run --config fabsort.toml --auto
//!
//! # 手动触发一次分拣（操作员覆盖）
//! fabsort trigger --defective
//!
//! # 机械臂归位 / 连接探测
//! fabsort home
//! fabsort probe
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制（默认 info）。

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod synthetic;

use commands::{ConfigCommand, RunArgs, TriggerArgs};
use config::RigConfig;

/// Fabsort - 视觉触发的织物分拣台
#[derive(Parser, Debug)]
#[command(name = "fabsort")]
#[command(about = "Vision-triggered fabric defect sorting rig", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（缺省使用内置默认值）
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// 串口端口覆盖（如 /dev/ttyACM0、COM3）
    #[arg(long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 主循环：帧采集、检测、自动触发
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// 手动触发一次分拣序列
    Trigger {
        #[command(flatten)]
        args: TriggerArgs,
    },

    /// 机械臂归位
    Home,

    /// 连接并做就绪探测，报告后断开
    Probe,

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut rig_config = match &cli.config {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };
    if let Some(port) = &cli.port {
        rig_config.port = port.clone();
    }

    match cli.command {
        Commands::Run { args } => commands::run::execute(rig_config, args),
        Commands::Trigger { args } => commands::trigger::execute(rig_config, args),
        Commands::Home => commands::trigger::execute_home(rig_config),
        Commands::Probe => commands::trigger::execute_probe(rig_config),
        Commands::Config(command) => commands::config::execute(rig_config, command),
    }
}
