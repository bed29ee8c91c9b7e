//! serialport 后端
//!
//! 基于 `serialport` crate 的真实串口实现。读取按块进行，
//! 跨次调用的残留字节保留在内部缓冲中，直到凑出完整一行。

use crate::{SerialConfig, SerialError, SerialLink};
use serialport::SerialPort;
use std::io::Read;
use std::time::Instant;
use tracing::debug;

/// 打开串口并等待控制器固件就绪
///
/// 打开失败返回 [`SerialError::PortUnavailable`]；本层不做任何重试。
pub fn open_port(port: &str, config: &SerialConfig) -> Result<Box<dyn SerialLink>, SerialError> {
    let handle = serialport::new(port, config.baud)
        .timeout(config.read_timeout())
        .open()
        .map_err(|e| SerialError::PortUnavailable {
            port: port.to_string(),
            reason: e.to_string(),
        })?;

    debug!(port, baud = config.baud, "serial port opened");

    // 打开串口触发 Arduino 复位，等固件跑起来再交给上层
    std::thread::sleep(config.open_settle());

    Ok(Box::new(PortLink {
        name: port.to_string(),
        handle,
        pending: Vec::new(),
    }))
}

#[derive(Debug)]
struct PortLink {
    name: String,
    handle: Box<dyn serialport::SerialPort>,
    /// 上次读取中换行之后的残留字节
    pending: Vec<u8>,
}

impl PortLink {
    /// 从残留缓冲中切出完整一行（含换行）
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let newline = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
        line.pop(); // 去掉换行
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}

impl SerialLink for PortLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), SerialError> {
        use std::io::Write;
        self.handle.write_all(frame)?;
        self.handle.flush()?;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, SerialError> {
        if let Some(line) = self.take_line() {
            return Ok(line);
        }

        let deadline = Instant::now() + self.handle.timeout();
        let mut chunk = [0u8; 64];

        loop {
            match self.handle.read(&mut chunk) {
                Ok(0) => return Err(SerialError::Timeout),
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(line);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Err(SerialError::Timeout);
                }
                Err(e) => return Err(SerialError::Io(e)),
            }

            if Instant::now() >= deadline {
                return Err(SerialError::Timeout);
            }
        }
    }

    fn port_name(&self) -> &str {
        &self.name
    }
}
