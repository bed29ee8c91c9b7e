//! 臂状态机
//!
//! 拥有臂的逻辑位姿、busy 互斥标志和固定的分拣序列。
//! 所有运动都是开环的：写出命令、读一条仅供日志的应答、
//! 等待固定的稳定延时。
//!
//! ## busy 语义
//!
//! `busy` 在整个 pick-and-place 序列期间为真，是防止序列
//! 重叠的唯一互斥量。释放走 RAII（[`BusyGuard`]），任何退出
//! 路径（包括中途硬件错误）都会清掉标志并盖上完成时间戳。
//!
//! ## 已知局限
//!
//! 序列中途失败时剩余步骤被放弃，物理位姿可能与
//! `current_pose` 不一致，且不做自动恢复 —— 任意失败点之后
//! 的安全恢复位姿取决于现场，由操作员通过归位命令处理。

use crate::config::ArmConfig;
use crate::error::ArmError;
use fabsort_protocol::pose::SERVO_COUNT;
use fabsort_protocol::{Angle, Command, PoseName, PoseTable, decode_response};
use fabsort_serial::SerialLink;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info};

/// 机械臂句柄（廉价克隆，内部 `Arc` 共享）
#[derive(Clone)]
pub struct Arm {
    shared: Arc<ArmShared>,
}

struct ArmShared {
    config: ArmConfig,
    poses: PoseTable,
    io: Mutex<ArmIo>,
    /// 串口会话就绪（由监督者维护）
    ready: AtomicBool,
    /// 序列互斥标志
    busy: AtomicBool,
    /// 最近一条状态文本（呈现层轮询）
    status: Mutex<String>,
    last_action_completed_at: Mutex<Option<Instant>>,
}

struct ArmIo {
    link: Option<Box<dyn SerialLink>>,
    current_pose: PoseName,
}

impl Arm {
    /// 从配置构建（校验位姿标定角度）
    pub fn new(config: ArmConfig) -> Result<Self, ArmError> {
        let poses = PoseTable::new(&config.poses)?;
        Ok(Self {
            shared: Arc::new(ArmShared {
                config,
                poses,
                io: Mutex::new(ArmIo {
                    link: None,
                    current_pose: PoseName::Home,
                }),
                ready: AtomicBool::new(false),
                busy: AtomicBool::new(false),
                status: Mutex::new(String::from("Robot arm not connected")),
                last_action_completed_at: Mutex::new(None),
            }),
        })
    }

    // ==================== 帧处理路径可见的只读状态 ====================

    pub fn ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    pub fn busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    /// 静止时的逻辑位姿（序列执行中为最近完成的一步）
    pub fn current_pose(&self) -> PoseName {
        self.shared.io.lock().current_pose
    }

    /// 最近一次序列结束的时刻（无论成败）
    pub fn last_action_completed_at(&self) -> Option<Instant> {
        *self.shared.last_action_completed_at.lock()
    }

    pub fn status(&self) -> String {
        self.shared.status.lock().clone()
    }

    pub fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        *self.shared.status.lock() = message;
    }

    // ==================== 监督者接口 ====================

    pub(crate) fn install_link(&self, link: Box<dyn SerialLink>) {
        self.shared.io.lock().link = Some(link);
    }

    /// 取走链路句柄（随返回值 Drop 而释放串口）
    pub(crate) fn take_link(&self) -> Option<Box<dyn SerialLink>> {
        self.shared.io.lock().link.take()
    }

    pub(crate) fn set_ready(&self, ready: bool) {
        self.shared.ready.store(ready, Ordering::SeqCst);
    }

    // ==================== 运动操作 ====================

    /// 移动到具名位姿（`MoveAll` + 稳定延时，开环）
    pub fn move_to(&self, pose: PoseName) -> Result<(), ArmError> {
        let mut io = self.shared.io.lock();
        self.move_to_locked(&mut io, pose)
    }

    /// 夹爪开合（`MoveJoint` 夹爪通道，0° = 开，180° = 合）
    pub fn set_gripper(&self, open: bool) -> Result<(), ArmError> {
        let mut io = self.shared.io.lock();
        self.set_gripper_locked(&mut io, open)
    }

    /// 完整的 pick-and-place 序列
    ///
    /// home → pickup → 开爪 → 合爪 → (defective | non_defective)
    /// → 开爪 → 合爪 → home，作为一个原子工作单元执行。
    /// 进入时置 `busy`，所有退出路径（含中途失败）释放 `busy`
    /// 并记录完成时间。第二次并发调用直接返回 [`ArmError::Busy`]。
    pub fn run_pick_and_place(&self, defective: bool) -> Result<(), ArmError> {
        let Some(_guard) = BusyGuard::acquire(&self.shared) else {
            return Err(ArmError::Busy);
        };

        let result = self.sequence(defective);
        match &result {
            Ok(()) => self.set_status("Sequence complete, arm back at home"),
            Err(e) => {
                // 串口错误在此边界收口：放弃剩余步骤，不向上扩散
                error!("Error in robot movement: {e}");
                self.set_status(format!("Sequence aborted: {e}"));
            }
        }
        result
    }

    fn sequence(&self, defective: bool) -> Result<(), ArmError> {
        // 序列全程独占 IO 锁；帧处理路径只碰原子标志，不会被卡住
        let mut io = self.shared.io.lock();

        info!("-> At Home Position");
        self.move_to_locked(&mut io, PoseName::Home)?;

        info!("-> Moving to Pickup Position");
        self.move_to_locked(&mut io, PoseName::Pickup)?;

        info!("-> Opening gripper to prepare for pickup");
        self.set_gripper_locked(&mut io, true)?;

        info!("-> Closing gripper to grab fabric");
        self.set_gripper_locked(&mut io, false)?;

        let target = if defective {
            info!("-> Defective item detected. Moving to Defective Section");
            PoseName::Defective
        } else {
            info!("-> Non-defective item detected. Moving to Correct Section");
            PoseName::NonDefective
        };
        self.move_to_locked(&mut io, target)?;

        info!("-> Opening gripper to release fabric");
        self.set_gripper_locked(&mut io, true)?;

        info!("-> Closing gripper after release");
        self.set_gripper_locked(&mut io, false)?;

        info!("-> Returning to Home Position");
        self.move_to_locked(&mut io, PoseName::Home)?;

        Ok(())
    }

    fn move_to_locked(&self, io: &mut ArmIo, pose: PoseName) -> Result<(), ArmError> {
        let angles: [Angle; SERVO_COUNT] = self.shared.poses.get(pose);
        self.send_command(io, &Command::MoveAll { angles })?;
        io.current_pose = pose;
        std::thread::sleep(self.shared.config.move_settle());
        Ok(())
    }

    fn set_gripper_locked(&self, io: &mut ArmIo, open: bool) -> Result<(), ArmError> {
        let angle = if open { Angle::MIN } else { Angle::MAX };
        self.send_command(
            io,
            &Command::MoveJoint {
                servo: self.shared.config.gripper_channel,
                angle,
            },
        )?;
        std::thread::sleep(self.shared.config.gripper_settle());
        Ok(())
    }

    /// 写一条命令帧并读取仅供日志的应答
    fn send_command(&self, io: &mut ArmIo, command: &Command) -> Result<(), ArmError> {
        let link = io.link.as_mut().ok_or(ArmError::NotConnected)?;
        let frame = command.encode()?;
        link.write_frame(&frame)?;
        let raw = link.read_frame()?;
        let response = decode_response(&raw);
        info!(port = link.port_name(), "Controller response: {}", response.text());
        Ok(())
    }
}

/// busy 标志的 RAII 守卫
///
/// 获取即 CAS 置位；Drop 时清零并盖上完成时间戳，
/// 保证任何退出路径都不会把臂留在 busy 状态。
struct BusyGuard<'a> {
    shared: &'a ArmShared,
}

impl<'a> BusyGuard<'a> {
    fn acquire(shared: &'a ArmShared) -> Option<Self> {
        shared
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(Self { shared })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.shared.last_action_completed_at.lock() = Some(Instant::now());
        self.shared.busy.store(false, Ordering::SeqCst);
    }
}
