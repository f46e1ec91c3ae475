//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError`，替代命令行入口中分散的 `.map_err(|e| e.to_string())`、
//! `format!(...)`、`expect()` 等不一致模式。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `SourceError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于 JSON 输出。

use serde::Serialize;

use crate::image_source::SourceError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 描述符构造、配置加载或定位解析失败
    #[error("{0}")]
    Source(#[from] SourceError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 命令行参数错误
    #[error("参数错误: {0}")]
    Usage(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Source(error) => error.code(),
            Self::Io(_) => "io",
            Self::Usage(_) => "usage",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
