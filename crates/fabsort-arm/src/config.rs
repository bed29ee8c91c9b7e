//! 臂参数配置
//!
//! 稳定延时是开环运动设计的一部分：运动命令没有完成确认，
//! 以固定等待近似机械行程。延时作为具名参数隔离在这里，
//! 将来换成带位置反馈的控制器时不需要动序列逻辑。

use fabsort_protocol::pose::PoseDegrees;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 臂参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// 夹爪舵机通道号
    pub gripper_channel: u8,

    /// 位姿运动后的稳定延时（秒）
    pub move_settle_secs: f64,

    /// 夹爪开合后的稳定延时（秒）
    pub gripper_settle_secs: f64,

    /// 位姿标定角度
    pub poses: PoseDegrees,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            gripper_channel: 3,
            move_settle_secs: 0.5,
            gripper_settle_secs: 1.0,
            poses: PoseDegrees::default(),
        }
    }
}

impl ArmConfig {
    pub fn move_settle(&self) -> Duration {
        Duration::from_secs_f64(self.move_settle_secs)
    }

    pub fn gripper_settle(&self) -> Duration {
        Duration::from_secs_f64(self.gripper_settle_secs)
    }

    /// 无延时配置（测试用）
    pub fn without_settle(mut self) -> Self {
        self.move_settle_secs = 0.0;
        self.gripper_settle_secs = 0.0;
        self
    }
}
