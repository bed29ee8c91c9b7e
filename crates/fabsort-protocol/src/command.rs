//! 控制命令构建与编码
//!
//! 由臂状态机产生，经 [`encode`](Command::encode) 变成单行 JSON 帧
//! 写入串口。角度字段使用 [`Angle`]，越界值在构造期就被拒绝，
//! 编码阶段不可能再出现非法角度。

use crate::angle::Angle;
use crate::pose::SERVO_COUNT;
use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// 控制命令
///
/// 线格式由 `cmd` 字段区分：
///
/// ```text
/// {"cmd":"move","servo":3,"angle":0}
/// {"cmd":"move_all","angles":[120,45,45,180]}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// 移动单个舵机（夹爪开合使用此命令）
    #[serde(rename = "move")]
    MoveJoint { servo: u8, angle: Angle },

    /// 同时移动全部四个舵机到一个位姿
    #[serde(rename = "move_all")]
    MoveAll { angles: [Angle; SERVO_COUNT] },
}

impl Command {
    /// 编码为一条以 `\n` 结尾的 UTF-8 JSON 帧
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut frame = serde_json::to_vec(self).map_err(ProtocolError::Encode)?;
        frame.push(b'\n');
        Ok(frame)
    }

    /// 从一条线上帧解码（忽略尾部换行）
    ///
    /// 控制器固件与测试端使用，臂状态机本身只编码。
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = frame.strip_suffix(b"\n").unwrap_or(frame);
        serde_json::from_slice(trimmed).map_err(ProtocolError::Decode)
    }
}
