//! 呈现层状态快照

/// 编排层对外暴露的状态快照
///
/// 呈现层（状态行、操作面板）随时轮询；快照是值拷贝，
/// 不持有任何锁。
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// 串口会话就绪
    pub ready: bool,

    /// 有序列正在执行
    pub busy: bool,

    /// 自动触发开关
    pub auto_mode: bool,

    /// 当前置信度阈值
    pub detection_threshold: f32,

    /// 最近一条状态文本
    pub message: String,
}
