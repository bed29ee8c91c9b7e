//! 舵机角度类型
//!
//! 角度越界是构造期错误而不是运行期故障：`Angle` 一旦存在，
//! 取值必然在 0-180 度内，编码层无需再做范围检查。

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// 舵机角度（度），取值范围 `[0, 180]`
///
/// 序列化为裸整数（JSON 线格式中的 `angle` / `angles` 字段）。
/// 反序列化复用同一套校验，越界的线上数据会解码失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Angle(u8);

impl Angle {
    /// 量程下限（0 度）
    pub const MIN: Angle = Angle(0);

    /// 量程上限（180 度）
    pub const MAX: Angle = Angle(180);

    /// 构造角度，越界返回 [`ProtocolError::InvalidAngle`]
    pub fn new(degrees: u16) -> Result<Self, ProtocolError> {
        if degrees > Self::MAX.0 as u16 {
            return Err(ProtocolError::InvalidAngle { angle: degrees });
        }
        Ok(Angle(degrees as u8))
    }

    /// 角度值（度）
    pub fn degrees(self) -> u8 {
        self.0
    }
}

impl TryFrom<u16> for Angle {
    type Error = ProtocolError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Angle::new(degrees)
    }
}

impl From<Angle> for u16 {
    fn from(angle: Angle) -> u16 {
        angle.0 as u16
    }
}

impl std::fmt::Display for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}
