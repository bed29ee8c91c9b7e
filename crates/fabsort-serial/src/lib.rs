//! # Fabsort Serial Adapter Layer
//!
//! 串口硬件抽象层，提供统一的按行收发接口。
//!
//! 执行器控制器挂在一个串口字符设备上（Arduino，115200 波特），
//! 命令与应答都是以 `\n` 结尾的单行文本。本层只负责字节搬运：
//! 不重试、不解析，失败以类型化错误向上传播。

use std::time::Duration;
use thiserror::Error;

pub mod port;

#[cfg(feature = "mock")]
pub mod mock;

pub use port::open_port;

#[cfg(feature = "mock")]
pub use mock::MockLink;

/// 串口适配层统一错误类型
#[derive(Error, Debug)]
pub enum SerialError {
    /// 打开串口失败（仅发生在连接期）
    #[error("Serial port unavailable: {port}: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// 读写失败（连接已建立之后）
    #[error("IO failure: {0}")]
    Io(#[from] std::io::Error),

    /// 读取超过配置的超时时间
    #[error("Read timeout")]
    Timeout,
}

/// 串口配置
///
/// 默认值对应本部署的控制器固件：115200 波特，单次读取超时 2 秒。
/// `open_settle_secs` 是打开串口后的等待时间 —— 打开串口会使
/// Arduino 复位，固件就绪前写入的命令会丢失。
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud: u32,
    pub read_timeout_secs: f64,
    pub open_settle_secs: f64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: 115_200,
            read_timeout_secs: 2.0,
            open_settle_secs: 2.0,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.read_timeout_secs)
    }

    pub fn open_settle(&self) -> Duration {
        Duration::from_secs_f64(self.open_settle_secs)
    }
}

/// 双向串口链路
///
/// 实现者持有串口的独占 OS 句柄，句柄随值的生命周期释放（Drop 即关闭）。
pub trait SerialLink: Send + std::fmt::Debug {
    /// 写出一条完整帧（帧内容已含结尾换行）
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), SerialError>;

    /// 读取一条以 `\n` 结尾的帧，超时返回 [`SerialError::Timeout`]
    fn read_frame(&mut self) -> Result<Vec<u8>, SerialError>;

    /// 端口标识（日志用）
    fn port_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert_eq!(config.baud, 115_200);
        assert_eq!(config.read_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_open_unavailable_port() {
        let config = SerialConfig {
            open_settle_secs: 0.0,
            ..SerialConfig::default()
        };
        let err = open_port("/dev/fabsort-nonexistent", &config).unwrap_err();
        match err {
            SerialError::PortUnavailable { port, .. } => {
                assert_eq!(port, "/dev/fabsort-nonexistent");
            }
            other => panic!("Expected PortUnavailable, got {other:?}"),
        }
    }
}
