//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“构造 → 配置加载 → 定位解析”链路中的所有失败来源。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 注意：描述符的配置方法（`tiling` / `region` / `dimensions`）永远不会产生错误，
//! 冲突组合按优先级规则静默修正；取消也不是错误，而是 `ResolveOutcome::Cancelled`。

/// 图片来源统一错误类型。
///
/// 该类型会在二进制入口被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("像素数据错误：{0}")]
    InvalidRaster(String),

    #[error("定位符错误：{0}")]
    InvalidLocator(String),

    #[error("解析上下文缺失：{0}")]
    MissingContext(String),

    #[error("解析器错误：{0}")]
    Resolver(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("后台任务错误：{0}")]
    Task(String),

    #[error("来源不支持解析：{0}")]
    NotDeferred(String),

    #[error("配置错误：{0}")]
    Config(String),
}

impl SourceError {
    /// 稳定错误码，供日志与 JSON 输出使用。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRaster(_) => "invalid_raster",
            Self::InvalidLocator(_) => "invalid_locator",
            Self::MissingContext(_) => "missing_context",
            Self::Resolver(_) => "resolver_failed",
            Self::Timeout(_) => "timeout",
            Self::Task(_) => "task_failed",
            Self::NotDeferred(_) => "not_deferred",
            Self::Config(_) => "invalid_config",
        }
    }
}
