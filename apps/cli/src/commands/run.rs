//! 主循环命令
//!
//! 一个循环以固定节拍驱动帧采集、检测和状态刷新；机械臂
//! 序列在编排器派发的独立线程上执行，多秒级的动作不会拖慢
//! 这里的节拍。相机取不到帧只告警重试，不退出。

use crate::config::RigConfig;
use crate::synthetic;
use anyhow::{Result, bail};
use clap::Args;
use fabsort_arm::{Arm, ArmSupervisor};
use fabsort_orchestrator::{DefectDetector, FrameSource, FrameSourceError, Orchestrator};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// 启动即开启自动触发（等价于界面上的 Automatic Robot Control）
    #[arg(long)]
    pub auto: bool,

    /// 使用合成帧源与检测器（无相机/模型试运行）
    #[arg(long)]
    pub synthetic: bool,

    /// 阈值覆盖（0-1）
    #[arg(long)]
    pub threshold: Option<f32>,
}

pub fn execute(config: RigConfig, args: RunArgs) -> Result<()> {
    // 检测器与帧源是外部协作者；本二进制只内置合成实现。
    // 真实部署经由 fabsort-orchestrator 的 FrameSource/DefectDetector
    // 接口接入推理后端。
    if !args.synthetic {
        bail!(
            "no camera/detector backend is built into this binary; \
             run with --synthetic, or integrate a backend via the \
             fabsort-orchestrator traits"
        );
    }
    let (mut source, mut detector) = synthetic::pair(&config);

    let arm = Arm::new(config.arm.clone())?;
    let mut supervisor = ArmSupervisor::new(arm.clone(), config.serial.clone());

    // 连接失败不退出：循环照常运行，状态行显示未连接，
    // 操作员修好端口后重启 run 即可
    if let Err(e) = supervisor.connect(&config.port) {
        warn!("Robot arm unavailable on {}: {e}", config.port);
    }

    let mut orchestrator = Orchestrator::new(arm, &config.orchestrator);
    if args.auto {
        orchestrator.set_auto_mode(true);
    }
    if let Some(threshold) = args.threshold {
        orchestrator.set_threshold(threshold);
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    let tick = Duration::from_secs_f64(1.0 / config.frame_rate.max(1) as f64);
    info!(
        "Run loop started at {} fps on {}",
        config.frame_rate, config.port
    );

    let mut last_message = String::new();
    while running.load(Ordering::SeqCst) {
        let tick_started = Instant::now();

        match source.next_frame() {
            Ok(frame) => {
                let observations = detector.detect(&frame);
                let threshold = orchestrator.snapshot().detection_threshold;

                let detected: Vec<String> = observations
                    .iter()
                    .filter(|o| o.confidence >= threshold)
                    .map(|o| format!("{} ({:.2})", o.class_name, o.confidence))
                    .collect();
                if !detected.is_empty() {
                    info!("Detected defects: {}", detected.join(", "));
                }

                orchestrator.on_observations(&observations);
            }
            Err(FrameSourceError::NoFrame) => {
                warn!("Camera error: No frame captured");
            }
        }

        // 状态行只在变化时打印
        let snapshot = orchestrator.snapshot();
        if snapshot.message != last_message {
            info!(
                ready = snapshot.ready,
                busy = snapshot.busy,
                auto = snapshot.auto_mode,
                threshold = snapshot.detection_threshold,
                "{}",
                snapshot.message
            );
            last_message = snapshot.message;
        }

        if let Some(remaining) = tick.checked_sub(tick_started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    info!("Shutting down; waiting for in-flight action");
    orchestrator.wait_idle();
    supervisor.disconnect();
    Ok(())
}
