//! 一次性命令（连接 → 执行 → 断开）

use crate::config::RigConfig;
use anyhow::{Result, bail};
use clap::Args;
use fabsort_arm::{Arm, ArmSupervisor};
use fabsort_orchestrator::Orchestrator;

#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// 按次品处理（投入 defective 料仓）
    #[arg(long, conflicts_with = "good")]
    pub defective: bool,

    /// 按良品处理（投入 non_defective 料仓）
    #[arg(long)]
    pub good: bool,
}

/// 手动触发一次分拣序列
pub fn execute(config: RigConfig, args: TriggerArgs) -> Result<()> {
    let defective = args.defective || !args.good;
    with_session(config, |orchestrator| {
        if !orchestrator.manual_trigger(defective) {
            bail!("trigger rejected: {}", orchestrator.snapshot().message);
        }
        orchestrator.wait_idle();
        println!("{}", orchestrator.snapshot().message);
        Ok(())
    })
}

/// 机械臂归位
pub fn execute_home(config: RigConfig) -> Result<()> {
    with_session(config, |orchestrator| {
        if !orchestrator.reset_to_home() {
            bail!("home rejected: {}", orchestrator.snapshot().message);
        }
        orchestrator.wait_idle();
        println!("Robot arm back at home position");
        Ok(())
    })
}

/// 连接探测：建立会话、报告、断开
pub fn execute_probe(config: RigConfig) -> Result<()> {
    let arm = Arm::new(config.arm.clone())?;
    let mut supervisor = ArmSupervisor::new(arm.clone(), config.serial.clone());

    match supervisor.connect(&config.port) {
        Ok(()) => {
            println!("Robot arm: Ready (connected to {})", config.port);
            supervisor.disconnect();
            Ok(())
        }
        Err(e) => {
            println!("Robot arm: Not Connected ({e})");
            bail!("probe failed on {}", config.port);
        }
    }
}

fn with_session(
    config: RigConfig,
    action: impl FnOnce(&mut Orchestrator) -> Result<()>,
) -> Result<()> {
    let arm = Arm::new(config.arm.clone())?;
    let mut supervisor = ArmSupervisor::new(arm.clone(), config.serial.clone());
    supervisor.connect(&config.port)?;

    let mut orchestrator = Orchestrator::new(arm, &config.orchestrator);
    let result = action(&mut orchestrator);

    orchestrator.wait_idle();
    supervisor.disconnect();
    result
}
