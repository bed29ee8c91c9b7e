//! 观测值与外部协作者接口
//!
//! 检测器与帧源是外部协作者：编排层只定义接口，不关心
//! 模型结构或相机选择。帧源的一切失败模式都收敛为
//! "本轮没有帧"。

use thiserror::Error;

/// 一帧原始图像
///
/// 编排层不解读像素，只原样转交给检测器。
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// 检测器在一帧上给出的单条观测
///
/// 逐帧即弃：除了作为冷却时间戳的依据外不做任何保留。
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// 缺陷类别名（固定标签集之一，如 Hole / Stitch / Seam）
    pub class_name: String,

    /// 置信度，`[0, 1]`
    pub confidence: f32,

    /// 边界框 `[x1, y1, x2, y2]`（呈现层画框用，门控不使用）
    pub bounding_box: [f32; 4],
}

impl Observation {
    pub fn new(class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            bounding_box: [0.0; 4],
        }
    }
}

/// 帧源错误
#[derive(Error, Debug)]
pub enum FrameSourceError {
    /// 本轮没有帧可取（相机断开、解码失败等都归于此）
    #[error("No frame available")]
    NoFrame,
}

/// 帧源（拉取式，每个循环节拍调用一次）
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, FrameSourceError>;
}

/// 缺陷检测器
pub trait DefectDetector {
    /// 对一帧做推理，返回全部观测（阈值过滤由编排层负责）
    fn detect(&mut self, frame: &Frame) -> Vec<Observation>;
}
