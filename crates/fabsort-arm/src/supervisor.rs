//! 连接监督者
//!
//! 拥有串口会话的生命周期：打开、按需重连、关闭。
//! 就绪探测是一次 `move_to(home)` —— 打开成功但探测失败的
//! 链路被立即丢弃（句柄不泄漏），`ready` 保持为假。
//!
//! 没有任何自动重连：硬件会话不保证安全的自动恢复
//! （序列中途重连可能把臂留在半空），一切恢复动作都由
//! 操作员显式发起。

use crate::controller::Arm;
use crate::error::ArmError;
use fabsort_protocol::PoseName;
use fabsort_serial::{SerialConfig, SerialLink, open_port};
use tracing::{info, warn};

/// 串口会话监督者
pub struct ArmSupervisor {
    arm: Arm,
    serial: SerialConfig,
    port: Option<String>,
}

impl ArmSupervisor {
    pub fn new(arm: Arm, serial: SerialConfig) -> Self {
        Self {
            arm,
            serial,
            port: None,
        }
    }

    /// 当前会话的端口标识（连接后才有）
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// 打开端口并做就绪探测
    ///
    /// 两步都成功才置 `ready`；探测失败时链路句柄随错误路径
    /// 释放，不留半开的会话。
    pub fn connect(&mut self, port: &str) -> Result<(), ArmError> {
        if self.arm.busy() {
            return Err(ArmError::Busy);
        }
        if self.arm.ready() {
            self.disconnect();
        }

        let link = open_port(port, &self.serial).inspect_err(|e| {
            self.arm
                .set_status(format!("Failed to connect on {port}: {e}"));
        })?;

        self.attach(link, port)
    }

    /// 用现成的链路建立会话（mock 测试与探测共用的入口）
    pub fn attach(&mut self, link: Box<dyn SerialLink>, port: &str) -> Result<(), ArmError> {
        self.arm.install_link(link);

        // 就绪探测：归位命令走一遍完整的编码-写-读路径
        match self.arm.move_to(PoseName::Home) {
            Ok(()) => {
                self.arm.set_ready(true);
                self.port = Some(port.to_string());
                self.arm.set_status(format!("Robot arm ready on {port}"));
                info!("Robot arm initialized in home position with gripper closed");
                Ok(())
            }
            Err(e) => {
                // 探测失败：取回并丢弃句柄，会话保持未就绪
                drop(self.arm.take_link());
                self.arm.set_ready(false);
                self.arm
                    .set_status(format!("Readiness probe failed on {port}: {e}"));
                warn!("Failed to initialize robot arm: {e}");
                Err(e)
            }
        }
    }

    /// 关闭会话（busy 期间拒绝，避免把臂丢在半空）
    pub fn disconnect(&mut self) {
        if self.arm.busy() {
            warn!("Disconnect requested while a sequence is executing; ignored");
            return;
        }
        self.arm.set_ready(false);
        if self.arm.take_link().is_some() {
            let port = self.port.take();
            self.arm.set_status(match port {
                Some(port) => format!("Disconnected from {port}"),
                None => String::from("Disconnected"),
            });
        }
    }

    /// 显式重连（等价于 disconnect + connect，只由操作员发起）
    pub fn reconnect(&mut self, port: &str) -> Result<(), ArmError> {
        if self.arm.busy() {
            return Err(ArmError::Busy);
        }
        self.disconnect();
        self.connect(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArmConfig;
    use fabsort_serial::mock::MockLink;
    use std::sync::atomic::Ordering;

    fn arm() -> Arm {
        Arm::new(ArmConfig::default().without_settle()).unwrap()
    }

    #[test]
    fn test_attach_probes_home() {
        let arm = arm();
        let mut supervisor = ArmSupervisor::new(arm.clone(), SerialConfig::default());

        let link = MockLink::new();
        let written = link.written();
        supervisor.attach(Box::new(link), "COM3").unwrap();

        assert!(arm.ready());
        assert_eq!(supervisor.port(), Some("COM3"));
        // 探测 = 一条归位 move_all
        assert_eq!(written.len(), 1);
        assert_eq!(
            written.frames()[0],
            b"{\"cmd\":\"move_all\",\"angles\":[120,45,45,180]}\n"
        );
    }

    #[test]
    fn test_failed_probe_leaves_no_handle() {
        let arm = arm();
        let mut supervisor = ArmSupervisor::new(arm.clone(), SerialConfig::default());

        let link = MockLink::new().fail_write_at(0);
        let closed = link.closed_flag();
        let err = supervisor.attach(Box::new(link), "COM3").unwrap_err();

        assert!(matches!(err, ArmError::Serial(_)));
        assert!(!arm.ready());
        assert_eq!(supervisor.port(), None);
        // 链路句柄已随失败路径释放
        assert!(closed.load(Ordering::SeqCst));
        // 后续运动命令看到的是未连接
        assert!(matches!(
            arm.move_to(PoseName::Home),
            Err(ArmError::NotConnected)
        ));
    }

    #[test]
    fn test_connect_unavailable_port() {
        let arm = arm();
        let serial = SerialConfig {
            open_settle_secs: 0.0,
            ..SerialConfig::default()
        };
        let mut supervisor = ArmSupervisor::new(arm.clone(), serial);

        let err = supervisor.connect("/dev/fabsort-nonexistent").unwrap_err();
        assert!(matches!(
            err,
            ArmError::Serial(fabsort_serial::SerialError::PortUnavailable { .. })
        ));
        assert!(!arm.ready());
    }

    #[test]
    fn test_reconnect_failure_tears_down_old_session() {
        let arm = arm();
        let serial = SerialConfig {
            open_settle_secs: 0.0,
            ..SerialConfig::default()
        };
        let mut supervisor = ArmSupervisor::new(arm.clone(), serial);

        let link = MockLink::new();
        let closed = link.closed_flag();
        supervisor.attach(Box::new(link), "COM3").unwrap();
        assert!(arm.ready());

        // 换到一个打不开的端口：旧会话被拆掉，新会话未建立
        assert!(supervisor.reconnect("/dev/fabsort-nonexistent").is_err());
        assert!(!arm.ready());
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(supervisor.port(), None);
    }

    #[test]
    fn test_disconnect_then_reattach() {
        let arm = arm();
        let mut supervisor = ArmSupervisor::new(arm.clone(), SerialConfig::default());

        supervisor.attach(Box::new(MockLink::new()), "COM3").unwrap();
        supervisor.disconnect();
        assert!(!arm.ready());
        assert_eq!(supervisor.port(), None);

        supervisor.attach(Box::new(MockLink::new()), "COM4").unwrap();
        assert!(arm.ready());
        assert_eq!(supervisor.port(), Some("COM4"));
    }
}
