//! Mock 串口链路（`mock` feature）
//!
//! 无硬件测试用：记录所有写出的帧，按脚本回放应答，
//! 并支持两种故障注入：
//!
//! - `fail_write_at(n)`: 第 n 次（0 起）写入返回 IO 错误，
//!   用于验证序列中途失败后的收尾路径；
//! - `gate_writes(rx)`: 每次写入先等一个令牌，用于在测试中
//!   确定性地把一次动作"卡"在执行中（互斥测试）。

use crate::{SerialError, SerialLink};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 写入记录的共享只读视图
#[derive(Clone, Default, Debug)]
pub struct WrittenFrames(Arc<Mutex<Vec<Vec<u8>>>>);

impl WrittenFrames {
    /// 当前已写出的所有帧（快照）
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// 脚本化的 Mock 串口链路
#[derive(Debug)]
pub struct MockLink {
    written: WrittenFrames,
    responses: Mutex<VecDeque<Vec<u8>>>,
    fail_write_at: Option<usize>,
    write_count: usize,
    write_gate: Option<Receiver<()>>,
    closed: Arc<AtomicBool>,
}

impl MockLink {
    pub fn new() -> Self {
        Self {
            written: WrittenFrames::default(),
            responses: Mutex::new(VecDeque::new()),
            fail_write_at: None,
            write_count: 0,
            write_gate: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 预置应答脚本；脚本耗尽后每次读取返回 `OK`
    pub fn with_responses<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let link = Self::new();
        {
            let mut responses = link.responses.lock();
            for line in lines {
                responses.push_back(line.into().into_bytes());
            }
        }
        link
    }

    /// 第 `index` 次写入（0 起）返回 IO 错误
    pub fn fail_write_at(mut self, index: usize) -> Self {
        self.fail_write_at = Some(index);
        self
    }

    /// 每次写入前阻塞等待一个令牌
    pub fn gate_writes(mut self, gate: Receiver<()>) -> Self {
        self.write_gate = Some(gate);
        self
    }

    /// 写入记录句柄（在 Box 化之前克隆出来）
    pub fn written(&self) -> WrittenFrames {
        self.written.clone()
    }

    /// 链路释放标志：`MockLink` 被 Drop 后置真（句柄泄漏检测用）
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for MockLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), SerialError> {
        if let Some(gate) = &self.write_gate {
            // 令牌发送端被丢弃时直接放行，避免测试悬死
            let _ = gate.recv();
        }

        let index = self.write_count;
        self.write_count += 1;

        if self.fail_write_at == Some(index) {
            return Err(SerialError::Io(std::io::Error::other(
                "injected write failure",
            )));
        }

        self.written.0.lock().push(frame.to_vec());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, SerialError> {
        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| b"OK".to_vec()))
    }

    fn port_name(&self) -> &str {
        "mock"
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
