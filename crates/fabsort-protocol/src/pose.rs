//! 位姿目录
//!
//! 一个位姿是四个舵机角度的固定组合（三个臂关节 + 夹爪）。
//! 目录在启动时由配置构建一次，之后只读。

use crate::{Angle, ProtocolError};
use serde::{Deserialize, Serialize};

/// 每个位姿的舵机数量（3 个臂关节 + 1 个夹爪）
pub const SERVO_COUNT: usize = 4;

/// 具名位姿
///
/// 静止时机械臂永远处于 `Home`；其余三个位姿只在
/// 分拣序列执行中途短暂出现。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseName {
    /// 初始/归位位姿（夹爪闭合）
    Home,
    /// 取料位姿
    Pickup,
    /// 次品料仓位姿
    Defective,
    /// 良品料仓位姿
    NonDefective,
}

impl PoseName {
    pub fn as_str(self) -> &'static str {
        match self {
            PoseName::Home => "home",
            PoseName::Pickup => "pickup",
            PoseName::Defective => "defective",
            PoseName::NonDefective => "non_defective",
        }
    }
}

impl std::fmt::Display for PoseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 位姿原始角度配置（未校验，来自 TOML）
///
/// 默认值是本部署的标定结果，最后一个分量是夹爪（180 = 闭合）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseDegrees {
    pub home: [u16; SERVO_COUNT],
    pub pickup: [u16; SERVO_COUNT],
    pub defective: [u16; SERVO_COUNT],
    pub non_defective: [u16; SERVO_COUNT],
}

impl Default for PoseDegrees {
    fn default() -> Self {
        Self {
            home: [120, 45, 45, 180],
            pickup: [0, 0, 180, 180],
            defective: [180, 0, 180, 180],
            non_defective: [90, 0, 180, 180],
        }
    }
}

/// 校验后的位姿目录
///
/// 构建成功即保证所有角度在量程内；之后只按名字查询，不再修改。
#[derive(Debug, Clone)]
pub struct PoseTable {
    home: [Angle; SERVO_COUNT],
    pickup: [Angle; SERVO_COUNT],
    defective: [Angle; SERVO_COUNT],
    non_defective: [Angle; SERVO_COUNT],
}

impl PoseTable {
    /// 从原始角度配置构建目录，逐项校验
    pub fn new(degrees: &PoseDegrees) -> Result<Self, ProtocolError> {
        Ok(Self {
            home: validate(degrees.home)?,
            pickup: validate(degrees.pickup)?,
            defective: validate(degrees.defective)?,
            non_defective: validate(degrees.non_defective)?,
        })
    }

    /// 按名字查询位姿角度
    pub fn get(&self, name: PoseName) -> [Angle; SERVO_COUNT] {
        match name {
            PoseName::Home => self.home,
            PoseName::Pickup => self.pickup,
            PoseName::Defective => self.defective,
            PoseName::NonDefective => self.non_defective,
        }
    }
}

impl Default for PoseTable {
    fn default() -> Self {
        // 默认角度是编译期常量，必然在量程内
        Self::new(&PoseDegrees::default()).expect("default pose table is in range")
    }
}

fn validate(raw: [u16; SERVO_COUNT]) -> Result<[Angle; SERVO_COUNT], ProtocolError> {
    Ok([
        Angle::new(raw[0])?,
        Angle::new(raw[1])?,
        Angle::new(raw[2])?,
        Angle::new(raw[3])?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue() {
        let table = PoseTable::default();
        let home = table.get(PoseName::Home);
        assert_eq!(home.map(|a| a.degrees()), [120, 45, 45, 180]);
        let pickup = table.get(PoseName::Pickup);
        assert_eq!(pickup.map(|a| a.degrees()), [0, 0, 180, 180]);
    }

    #[test]
    fn test_out_of_range_pose_rejected() {
        let mut degrees = PoseDegrees::default();
        degrees.pickup = [0, 0, 200, 180];
        assert!(PoseTable::new(&degrees).is_err());
    }

    #[test]
    fn test_pose_name_display() {
        assert_eq!(PoseName::NonDefective.to_string(), "non_defective");
        assert_eq!(PoseName::Home.to_string(), "home");
    }
}
