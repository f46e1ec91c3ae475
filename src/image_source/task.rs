//! # 后台解析模块
//!
//! ## 设计思路
//!
//! 解析器可能阻塞在文件系统检查上，必须离开 UI/事件线程执行，并且随时可被调用方放弃。
//! 取消不是错误：结果用三态 `ResolveOutcome` 表达（成功 / 取消 / 失败）。
//!
//! ## 实现思路
//!
//! - `CancelFlag`：`AtomicBool` + `Notify`，既可轮询也可 `await`。
//! - `resolve_in_background`：`spawn_blocking` 执行解析，同时与取消信号、超时竞争。
//! - 取消请求之后才完成的结果一律丢弃，不产生部分副作用。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use super::locator::Locator;
use super::resolver::{LocatorResolver, ResolveContext};
use super::SourceError;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// 可克隆的取消句柄，所有克隆共享同一状态。
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    state: Arc<CancelState>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消；重复调用无副作用。
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            self.state.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// 等待取消发生；已取消时立即返回。
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_cancelled() {
                return;
            }

            notified.await;
        }
    }
}

/// 一次解析的终态。
#[derive(Debug)]
pub enum ResolveOutcome {
    Resolved(Locator),
    Cancelled,
    Failed(SourceError),
}

impl ResolveOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Resolved(locator) => Some(locator),
            _ => None,
        }
    }

    /// 转换为 `Result`，取消映射为 `Ok(None)`。
    pub fn into_result(self) -> Result<Option<Locator>, SourceError> {
        match self {
            Self::Resolved(locator) => Ok(Some(locator)),
            Self::Cancelled => Ok(None),
            Self::Failed(error) => Err(error),
        }
    }
}

/// 在阻塞线程池上执行一次解析。
///
/// # 示例
/// ```rust
/// use std::sync::Arc;
/// use tiled_image_source::image_source::{
///     CancelFlag, DirectResolver, ResolveContext, resolve_in_background,
/// };
///
/// # async fn demo() {
/// let outcome = resolve_in_background(
///     Box::new(DirectResolver::from_location("https://example.com/a.png")),
///     Arc::new(ResolveContext::new("com.example")),
///     CancelFlag::new(),
/// )
/// .await;
/// assert_eq!(outcome.locator().map(|l| l.as_str()), Some("https://example.com/a.png"));
/// # }
/// ```
pub async fn resolve_in_background(
    resolver: Box<dyn LocatorResolver>,
    context: Arc<ResolveContext>,
    cancel: CancelFlag,
) -> ResolveOutcome {
    if cancel.is_cancelled() {
        return ResolveOutcome::Cancelled;
    }

    let kind = resolver.kind();
    let timeout = Duration::from_millis(context.config().resolve_timeout_ms);
    let started = Instant::now();

    // 解析线程只看内部标志，调用方的标志不会被超时改写
    let worker_cancel = CancelFlag::new();
    let handle = {
        let worker_cancel = worker_cancel.clone();
        tokio::task::spawn_blocking(move || resolver.resolve(&context, &worker_cancel))
    };

    let joined = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            worker_cancel.cancel();
            log::debug!("🛑 定位解析已取消 - 解析器: {}", kind);
            return ResolveOutcome::Cancelled;
        }
        joined = tokio::time::timeout(timeout, handle) => joined,
    };

    let Ok(joined) = joined else {
        worker_cancel.cancel();
        log::warn!("⏱️ 定位解析超时 - 解析器: {} 限制: {}ms", kind, timeout.as_millis());
        return ResolveOutcome::Failed(SourceError::Timeout(format!(
            "定位解析超过 {}ms",
            timeout.as_millis()
        )));
    };

    if cancel.is_cancelled() {
        log::debug!("🛑 定位解析完成前已取消，丢弃结果 - 解析器: {}", kind);
        return ResolveOutcome::Cancelled;
    }

    match joined {
        Ok(Ok(locator)) => {
            log::info!(
                "✅ 定位解析完成 - 解析器: {} 定位符: {} 耗时: {}ms",
                kind,
                locator,
                started.elapsed().as_millis()
            );
            ResolveOutcome::Resolved(locator)
        }
        Ok(Err(error)) => {
            log::warn!("⚠️ 定位解析失败 - 解析器: {} 错误: {}", kind, error);
            ResolveOutcome::Failed(error)
        }
        Err(join_error) => ResolveOutcome::Failed(SourceError::Task(format!(
            "解析线程异常退出：{}",
            join_error
        ))),
    }
}
