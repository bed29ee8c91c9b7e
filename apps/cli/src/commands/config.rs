//! 配置管理命令

use crate::config::RigConfig;
use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印当前生效的配置（含默认值）
    Show,

    /// 写出一份默认配置文件
    Init {
        /// 目标路径
        #[arg(long, default_value = "fabsort.toml")]
        path: PathBuf,
    },
}

pub fn execute(config: RigConfig, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommand::Init { path } => {
            let content = RigConfig::default().to_toml()?;
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
