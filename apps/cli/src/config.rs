//! 分拣台配置
//!
//! 没有全局可变的 Settings 对象：配置在启动时反序列化为一个
//! 显式的值，再按组件拆开传给各自的构造函数（监督者只拿串口
//! 参数，状态机只拿臂参数，编排器只拿门控参数）。

use anyhow::{Context, Result};
use fabsort_arm::ArmConfig;
use fabsort_orchestrator::OrchestratorConfig;
use fabsort_serial::SerialConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 分拣台顶层配置（TOML）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// 执行器控制器所在的串口端口
    pub port: String,

    /// 主循环节拍（帧/秒）
    pub frame_rate: u32,

    /// 检测器的类别标签集
    pub class_names: Vec<String>,

    pub serial: SerialConfig,
    pub arm: ArmConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            frame_rate: 10,
            class_names: vec!["Hole".into(), "Stitch".into(), "Seam".into()],
            serial: SerialConfig::default(),
            arm: ArmConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

fn default_port() -> String {
    if cfg!(windows) {
        String::from("COM3")
    } else {
        String::from("/dev/ttyACM0")
    }
}

impl RigConfig {
    /// 从 TOML 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// 序列化为 TOML 文本（`config show` / `config init`）
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let config = RigConfig::default();
        let toml_text = config.to_toml().unwrap();
        let back: RigConfig = toml::from_str(&toml_text).unwrap();
        assert_eq!(back.frame_rate, 10);
        assert_eq!(back.serial.baud, 115_200);
        assert_eq!(back.arm.gripper_channel, 3);
        assert_eq!(back.orchestrator.detection_threshold, 0.6);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.toml");
        std::fs::write(&path, "port = \"/dev/ttyUSB7\"\n").unwrap();

        let config = RigConfig::load(&path).unwrap();
        assert_eq!(config.port, "/dev/ttyUSB7");
        assert_eq!(config.orchestrator.cooldown_secs, 5.0);
        assert_eq!(config.arm.poses.home, [120, 45, 45, 180]);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(RigConfig::load(Path::new("/nonexistent/rig.toml")).is_err());
    }
}
