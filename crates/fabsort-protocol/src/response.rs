//! 控制器应答解析
//!
//! 运动命令是开环的：命令写出后等待固定的稳定时间，不存在
//! "确认完成" 协议。应答文本只进日志，解析永远不会失败 ——
//! 解析不了的字节原样保留为 [`Response::Unknown`]。

/// 控制器单行应答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// 非空 UTF-8 文本行（去除首尾空白）
    Ack(String),

    /// 空行或非 UTF-8 数据，原始内容按 lossy 方式保留
    Unknown(String),
}

impl Response {
    /// 日志用文本
    pub fn text(&self) -> &str {
        match self {
            Response::Ack(text) => text,
            Response::Unknown(raw) => raw,
        }
    }
}

/// 解析一条应答帧
pub fn decode_response(raw: &[u8]) -> Response {
    match std::str::from_utf8(raw) {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Response::Unknown(String::new())
            } else {
                Response::Ack(trimmed.to_string())
            }
        }
        Err(_) => Response::Unknown(String::from_utf8_lossy(raw).into_owned()),
    }
}
