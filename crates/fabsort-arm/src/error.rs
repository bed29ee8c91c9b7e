//! 臂层错误类型定义

use fabsort_protocol::ProtocolError;
use fabsort_serial::SerialError;
use thiserror::Error;

/// 臂层错误类型
///
/// 串口与协议错误在臂状态机边界被捕获、记入日志和状态文本，
/// 不会向上炸掉帧处理循环。
#[derive(Error, Debug)]
pub enum ArmError {
    /// 串口链路错误
    #[error("Serial link error: {0}")]
    Serial(#[from] SerialError),

    /// 协议编码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 未连接（链路不存在或就绪探测未通过）
    #[error("Robot arm not connected")]
    NotConnected,

    /// 已有序列在执行（第二次触发被丢弃，不排队）
    #[error("Robot arm is busy")]
    Busy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serial_error() {
        let err: ArmError = SerialError::Timeout.into();
        assert!(matches!(err, ArmError::Serial(SerialError::Timeout)));
        assert_eq!(err.to_string(), "Serial link error: Read timeout");
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ArmError = ProtocolError::InvalidAngle { angle: 200 }.into();
        assert!(matches!(err, ArmError::Protocol(_)));
    }
}
