//! 触发门控与单槽派发
//!
//! 自动触发的全部条件：过滤后观测集非空（最高置信度 ≥ 阈值）、
//! 自动模式开启、冷却期已过、臂就绪且不忙、派发槽空闲。
//! 冷却时间戳在派发的瞬间就盖上（而不是动作完成时），
//! 动作执行期间涌来的帧不会排队产生重复触发。
//!
//! "最多一个序列在飞" 不靠约定靠结构：编排器持有至多一个
//! 未完成动作的 [`JoinHandle`]，槽被占用时新触发直接作废。

use crate::observation::Observation;
use crate::status::StatusSnapshot;
use fabsort_arm::Arm;
use fabsort_protocol::PoseName;
use serde::{Deserialize, Serialize};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// 编排参数
///
/// 默认阈值 0.6、冷却 5 秒来自本部署的原始标定。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// 置信度阈值，`(0, 1)`
    pub detection_threshold: f32,

    /// 连续两次自动触发之间的最小间隔（秒）
    pub cooldown_secs: f64,

    /// 启动时是否开启自动模式
    pub auto_mode: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 0.6,
            cooldown_secs: 5.0,
            auto_mode: false,
        }
    }
}

impl OrchestratorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }
}

/// 检测到动作的编排器
///
/// 由帧处理循环独占持有；跨线程共享的只有 [`Arm`] 句柄
/// 内部的原子标志。
pub struct Orchestrator {
    arm: Arm,
    auto_mode: bool,
    detection_threshold: f32,
    cooldown: Duration,
    last_trigger_at: Option<Instant>,
    /// 单槽：至多一个未完成动作
    in_flight: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(arm: Arm, config: &OrchestratorConfig) -> Self {
        Self {
            arm,
            auto_mode: config.auto_mode,
            detection_threshold: config.detection_threshold,
            cooldown: config.cooldown(),
            last_trigger_at: None,
            in_flight: None,
        }
    }

    // ==================== 观测流入口 ====================

    /// 处理一帧的全部观测（每个循环节拍调用一次）
    ///
    /// 不阻塞：序列在独立线程上执行，本方法只做门控和派发。
    pub fn on_observations(&mut self, observations: &[Observation]) {
        self.reap();

        let Some(best) = max_confidence(observations) else {
            return;
        };
        if best < self.detection_threshold || !self.auto_mode {
            return;
        }

        if let Some(at) = self.last_trigger_at {
            if at.elapsed() < self.cooldown {
                debug!("Auto trigger suppressed by cooldown");
                return;
            }
        }

        if !self.slot_free() {
            debug!("Auto trigger dropped: sequence already executing");
            return;
        }
        if !self.arm.ready() {
            warn!("Defect confirmed but robot arm is not connected");
            return;
        }

        // 派发瞬间就盖冷却时间戳，动作执行期间的帧不会重复触发
        self.last_trigger_at = Some(Instant::now());
        self.dispatch(true);
    }

    // ==================== 操作员意图 ====================

    /// 手动触发一次序列（绕过阈值/冷却/自动模式，保留就绪与互斥检查）
    pub fn manual_trigger(&mut self, defective: bool) -> bool {
        self.reap();

        if !self.arm.ready() {
            self.arm.set_status("Robot arm not connected");
            return false;
        }
        if !self.slot_free() {
            self.arm.set_status("Robot arm is busy");
            return false;
        }

        self.dispatch(defective);
        self.arm.set_status("Manual robot action triggered");
        true
    }

    /// 手动归位（就绪与互斥检查同上）
    pub fn reset_to_home(&mut self) -> bool {
        self.reap();

        if !self.arm.ready() {
            self.arm.set_status("Robot arm not connected");
            return false;
        }
        if !self.slot_free() {
            self.arm.set_status("Robot arm is busy");
            return false;
        }

        let arm = self.arm.clone();
        self.in_flight = Some(std::thread::spawn(move || {
            if let Err(e) = arm.move_to(PoseName::Home) {
                error!("Failed to return to home position: {e}");
                arm.set_status(format!("Home move failed: {e}"));
            }
        }));
        self.arm.set_status("Robot returning to home position");
        true
    }

    pub fn set_threshold(&mut self, value: f32) {
        self.detection_threshold = value;
        self.arm
            .set_status(format!("Detection threshold set to {value:.2}"));
    }

    pub fn set_auto_mode(&mut self, enabled: bool) {
        self.auto_mode = enabled;
        let state = if enabled { "enabled" } else { "disabled" };
        self.arm
            .set_status(format!("Automatic robot control {state}"));
    }

    pub fn toggle_auto_mode(&mut self) -> bool {
        self.set_auto_mode(!self.auto_mode);
        self.auto_mode
    }

    // ==================== 呈现层 ====================

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ready: self.arm.ready(),
            busy: self.arm.busy() || self.in_flight.is_some(),
            auto_mode: self.auto_mode,
            detection_threshold: self.detection_threshold,
            message: self.arm.status(),
        }
    }

    /// 最近一次自动触发的时刻（测试与诊断用）
    pub fn last_trigger_at(&self) -> Option<Instant> {
        self.last_trigger_at
    }

    /// 等待在飞动作结束（退出前收尾；序列不支持中途取消）
    pub fn wait_idle(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if handle.join().is_err() {
                error!("Action thread panicked");
            }
        }
    }

    // ==================== 内部 ====================

    /// 回收已结束的动作句柄，空出派发槽
    fn reap(&mut self) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|handle| handle.is_finished())
        {
            self.wait_idle();
        }
    }

    fn slot_free(&self) -> bool {
        self.in_flight.is_none() && !self.arm.busy()
    }

    /// 把序列作为独立工作单元派发（错误在臂边界收口，这里只记日志）
    fn dispatch(&mut self, defective: bool) {
        let arm = self.arm.clone();
        self.in_flight = Some(std::thread::spawn(move || {
            let _ = arm.run_pick_and_place(defective);
        }));
    }
}

fn max_confidence(observations: &[Observation]) -> Option<f32> {
    observations
        .iter()
        .map(|o| o.confidence)
        .fold(None, |best, c| match best {
            Some(b) if b >= c => Some(b),
            _ => Some(c),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabsort_arm::{ArmConfig, ArmSupervisor};
    use fabsort_serial::SerialConfig;
    use fabsort_serial::mock::{MockLink, WrittenFrames};
    use proptest::prelude::*;

    /// 经由监督者建立就绪会话；Mock 记录里第 0 帧是归位探测
    fn ready_arm() -> (Arm, WrittenFrames) {
        let arm = Arm::new(ArmConfig::default().without_settle()).unwrap();
        let mut supervisor = ArmSupervisor::new(arm.clone(), SerialConfig::default());
        let link = MockLink::new();
        let written = link.written();
        supervisor.attach(Box::new(link), "mock").unwrap();
        (arm, written)
    }

    fn auto_orchestrator(arm: Arm, threshold: f32, cooldown_secs: f64) -> Orchestrator {
        Orchestrator::new(
            arm,
            &OrchestratorConfig {
                detection_threshold: threshold,
                cooldown_secs,
                auto_mode: true,
            },
        )
    }

    fn obs(confidence: f32) -> Vec<Observation> {
        vec![Observation::new("Hole", confidence)]
    }

    #[test]
    fn test_trigger_at_threshold_boundaries() {
        for (threshold, confidence, expect) in [
            (0.0, 0.0, true),
            (0.6, 0.6, true),
            (0.6, 0.59, false),
            (1.0, 1.0, true),
            (1.0, 0.99, false),
        ] {
            let (arm, _written) = ready_arm();
            let mut orchestrator = auto_orchestrator(arm, threshold, 0.0);
            orchestrator.on_observations(&obs(confidence));
            assert_eq!(
                orchestrator.last_trigger_at().is_some(),
                expect,
                "threshold {threshold}, confidence {confidence}"
            );
            orchestrator.wait_idle();
        }
    }

    #[test]
    fn test_no_trigger_without_auto_mode() {
        let (arm, written) = ready_arm();
        let mut orchestrator = auto_orchestrator(arm, 0.6, 0.0);
        orchestrator.set_auto_mode(false);
        orchestrator.on_observations(&obs(0.9));
        assert!(orchestrator.last_trigger_at().is_none());
        assert_eq!(written.len(), 1); // 仅归位探测
    }

    #[test]
    fn test_no_trigger_when_not_ready() {
        let arm = Arm::new(ArmConfig::default().without_settle()).unwrap();
        let mut orchestrator = auto_orchestrator(arm, 0.6, 0.0);
        orchestrator.on_observations(&obs(0.9));
        assert!(orchestrator.last_trigger_at().is_none());
    }

    #[test]
    fn test_empty_observations_do_nothing() {
        let (arm, written) = ready_arm();
        let mut orchestrator = auto_orchestrator(arm, 0.0, 0.0);
        orchestrator.on_observations(&[]);
        assert!(orchestrator.last_trigger_at().is_none());
        assert_eq!(written.len(), 1); // 仅归位探测
    }

    #[test]
    fn test_cooldown_suppresses_then_permits() {
        let (arm, written) = ready_arm();
        // 冷却 200ms（比例缩小的 5 秒）
        let mut orchestrator = auto_orchestrator(arm, 0.6, 0.2);

        orchestrator.on_observations(&obs(0.9));
        let first = orchestrator.last_trigger_at().unwrap();
        orchestrator.wait_idle();
        assert_eq!(written.len(), 9); // 探测 + 8 帧序列

        // 冷却期内：抑制
        std::thread::sleep(Duration::from_millis(50));
        orchestrator.on_observations(&obs(0.9));
        assert_eq!(orchestrator.last_trigger_at().unwrap(), first);

        // 冷却期过后：放行
        std::thread::sleep(Duration::from_millis(200));
        orchestrator.on_observations(&obs(0.9));
        assert_ne!(orchestrator.last_trigger_at().unwrap(), first);
        orchestrator.wait_idle();
        assert_eq!(written.len(), 17);
    }

    #[test]
    fn test_single_slot_mutual_exclusion() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let arm = Arm::new(ArmConfig::default().without_settle()).unwrap();
        let mut supervisor = ArmSupervisor::new(arm.clone(), SerialConfig::default());
        let link = MockLink::new().gate_writes(gate_rx);
        let written = link.written();
        gate_tx.send(()).unwrap(); // 放行归位探测
        supervisor.attach(Box::new(link), "mock").unwrap();

        let mut orchestrator = auto_orchestrator(arm.clone(), 0.6, 0.0);
        orchestrator.on_observations(&obs(0.9));
        let first = orchestrator.last_trigger_at().unwrap();

        // 等序列进入执行
        while !arm.busy() {
            std::thread::yield_now();
        }

        // 槽被占用：自动触发作废，时间戳不变
        orchestrator.on_observations(&obs(0.9));
        assert_eq!(orchestrator.last_trigger_at().unwrap(), first);

        // 手动触发同样被拒绝
        assert!(!orchestrator.manual_trigger(true));
        assert_eq!(arm.status(), "Robot arm is busy");

        for _ in 0..8 {
            gate_tx.send(()).unwrap();
        }
        orchestrator.wait_idle();
        assert_eq!(written.len(), 9); // 探测 + 8 帧序列
    }

    #[test]
    fn test_manual_trigger_bypasses_gating() {
        let (arm, written) = ready_arm();
        // 自动模式关、阈值 1.0、冷却很长 —— 手动触发全都绕过
        let mut orchestrator = Orchestrator::new(
            arm,
            &OrchestratorConfig {
                detection_threshold: 1.0,
                cooldown_secs: 3600.0,
                auto_mode: false,
            },
        );

        assert!(orchestrator.manual_trigger(false));
        orchestrator.wait_idle();
        assert_eq!(written.len(), 9);
        // 良品目标位姿（探测帧之后的第 5 帧）
        assert_eq!(
            written.frames()[5],
            b"{\"cmd\":\"move_all\",\"angles\":[90,0,180,180]}\n"
        );
        // 手动触发不盖自动冷却时间戳
        assert!(orchestrator.last_trigger_at().is_none());
    }

    #[test]
    fn test_manual_trigger_not_connected() {
        let arm = Arm::new(ArmConfig::default().without_settle()).unwrap();
        let mut orchestrator = auto_orchestrator(arm.clone(), 0.6, 0.0);
        assert!(!orchestrator.manual_trigger(true));
        assert_eq!(arm.status(), "Robot arm not connected");
    }

    #[test]
    fn test_reset_to_home() {
        let (arm, written) = ready_arm();
        let mut orchestrator = auto_orchestrator(arm, 0.6, 0.0);
        assert!(orchestrator.reset_to_home());
        orchestrator.wait_idle();
        assert_eq!(written.len(), 2); // 探测 + 归位
        assert_eq!(
            written.frames()[1],
            b"{\"cmd\":\"move_all\",\"angles\":[120,45,45,180]}\n"
        );
    }

    #[test]
    fn test_toggle_auto_mode() {
        let (arm, _written) = ready_arm();
        let mut orchestrator = auto_orchestrator(arm, 0.6, 0.0);
        assert!(!orchestrator.toggle_auto_mode());
        assert!(orchestrator.toggle_auto_mode());
        let snapshot = orchestrator.snapshot();
        assert!(snapshot.auto_mode);
        assert!(snapshot.message.contains("enabled"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// 触发当且仅当最高置信度 ≥ 阈值（其余门控条件全部满足时）
        #[test]
        fn prop_trigger_iff_max_confidence_reaches_threshold(
            confidences in proptest::collection::vec(0.0f32..=1.0, 1..8),
            threshold in prop_oneof![Just(0.0f32), Just(0.6f32), Just(1.0f32), 0.0f32..=1.0],
        ) {
            let (arm, _written) = ready_arm();
            let mut orchestrator = auto_orchestrator(arm, threshold, 0.0);

            let observations: Vec<Observation> =
                confidences.iter().map(|&c| Observation::new("Stitch", c)).collect();
            orchestrator.on_observations(&observations);

            let best = confidences.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            prop_assert_eq!(orchestrator.last_trigger_at().is_some(), best >= threshold);
            orchestrator.wait_idle();
        }
    }
}
