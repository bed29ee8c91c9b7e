//! # Fabsort Arm
//!
//! 机械臂状态机与连接监督者。
//!
//! ## 模块
//!
//! - `config`: 臂参数（夹爪通道、稳定延时、位姿标定）
//! - `controller`: [`Arm`] —— 位姿状态、busy 互斥、分拣序列
//! - `supervisor`: [`ArmSupervisor`] —— 串口会话生命周期、就绪探测
//!
//! ## 并发模型
//!
//! [`Arm`] 是廉价克隆的 `Arc` 句柄。动作路径（一次完整的
//! pick-and-place 序列）独占 IO 锁并在其中阻塞做稳定延时；
//! 帧处理路径只读 `ready`/`busy` 两个原子标志，永远不会被
//! 动作路径卡住。跨线程共享的可变状态仅此而已。

pub mod config;
pub mod controller;
pub mod error;
pub mod supervisor;

pub use config::ArmConfig;
pub use controller::Arm;
pub use error::ArmError;
pub use supervisor::ArmSupervisor;
