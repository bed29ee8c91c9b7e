//! # Fabsort Orchestrator
//!
//! 检测到动作的编排层。
//!
//! 消费逐帧的缺陷观测流，套用置信度阈值与冷却策略，在条件
//! 满足时把分拣序列作为独立工作单元派发出去 —— 观测路径
//! （相机轮询、界面刷新）永远不会被一次数秒级的机械动作卡住。
//!
//! ## 模块
//!
//! - `observation`: 观测值与外部协作者接口（检测器、帧源）
//! - `orchestrator`: 触发门控与单槽派发
//! - `status`: 呈现层轮询的状态快照

pub mod observation;
pub mod orchestrator;
pub mod status;

pub use observation::{DefectDetector, Frame, FrameSource, FrameSourceError, Observation};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use status::StatusSnapshot;
