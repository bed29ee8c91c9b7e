//! 合成帧源与检测器
//!
//! 无相机、无推理模型时的试运行后端：固定尺寸的灰帧，
//! 按概率随机产生一条缺陷观测。用于演示与带臂联调。

use crate::config::RigConfig;
use fabsort_orchestrator::{DefectDetector, Frame, FrameSource, FrameSourceError, Observation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;

/// 每帧出现缺陷观测的概率
const DEFECT_PROBABILITY: f64 = 0.05;

pub fn pair(config: &RigConfig) -> (SyntheticSource, SyntheticDetector) {
    (
        SyntheticSource,
        SyntheticDetector {
            rng: StdRng::from_entropy(),
            class_names: config.class_names.clone(),
        },
    )
}

pub struct SyntheticSource;

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Frame, FrameSourceError> {
        Ok(Frame {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            data: vec![0x80; (FRAME_WIDTH * FRAME_HEIGHT) as usize],
        })
    }
}

pub struct SyntheticDetector {
    rng: StdRng,
    class_names: Vec<String>,
}

impl DefectDetector for SyntheticDetector {
    fn detect(&mut self, _frame: &Frame) -> Vec<Observation> {
        if self.class_names.is_empty() || !self.rng.gen_bool(DEFECT_PROBABILITY) {
            return Vec::new();
        }

        let class = &self.class_names[self.rng.gen_range(0..self.class_names.len())];
        let confidence = self.rng.gen_range(0.3..1.0f32);
        vec![Observation::new(class.clone(), confidence)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_always_has_frames() {
        let mut source = SyntheticSource;
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.width, 640);
        assert_eq!(frame.data.len(), 640 * 480);
    }

    #[test]
    fn test_detector_confidence_in_range() {
        let config = RigConfig::default();
        let (mut source, mut detector) = pair(&config);
        let frame = source.next_frame().unwrap();
        for _ in 0..200 {
            for observation in detector.detect(&frame) {
                assert!((0.0..=1.0).contains(&observation.confidence));
                assert!(config.class_names.contains(&observation.class_name));
            }
        }
    }
}
