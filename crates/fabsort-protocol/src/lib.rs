//! # Fabsort Protocol
//!
//! 机械臂串口控制协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `angle`: 舵机角度类型（构造期校验 0-180）
//! - `pose`: 位姿目录（home/pickup/defective/non_defective）
//! - `command`: 控制命令构建与编码
//! - `response`: 控制器应答解析（仅供日志参考）
//!
//! ## 线格式
//!
//! UTF-8 JSON 文本，每条命令一行，以 `\n` 结尾：
//!
//! ```text
//! {"cmd":"move","servo":3,"angle":90}
//! {"cmd":"move_all","angles":[120,45,45,180]}
//! ```
//!
//! 应答为任意单行文本。运动命令是开环的（fire-and-forget），
//! 应答解析永远不会失败，参见 [`response`]。

pub mod angle;
pub mod command;
pub mod pose;
pub mod response;

// 重新导出常用类型
pub use angle::Angle;
pub use command::Command;
pub use pose::{PoseName, PoseTable};
pub use response::{Response, decode_response};

use thiserror::Error;

/// 协议层错误类型
///
/// `InvalidAngle` 在构造期拦截越界角度，越界值永远不会上线。
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid servo angle: {angle} (valid range: 0-180)")]
    InvalidAngle { angle: u16 },

    #[error("Frame encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Frame decode error: {0}")]
    Decode(#[source] serde_json::Error),
}
