//! # 图片来源模块（image_source）
//!
//! ## 设计思路
//!
//! 该模块把“来源识别 → 描述符配置 → 定位解析”按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `source`：描述符本体与不变量维护
//! - `resolver`：定位解析能力（直接定位符 / 资源 ID / 自定义）
//! - `locator`：定位符类型、裸路径规范化与缺失文件解码恢复
//! - `task`：后台执行、取消与超时
//! - `config/error`：配置与错误
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方
//!    ↓
//! ImageSource::{bitmap, cached_bitmap, rgba, resource, asset, uri, locator, resolver}
//!    ↓ 链式配置（tiling / region / dimensions，每次都重新断言不变量）
//! into_parts() 交给渲染器
//!    ├─ InMemory：直接使用位图（按 cached 决定是否释放）
//!    └─ Deferred：SourceOrigin::resolve → task.rs（spawn_blocking + 取消 + 超时）
//!                    └─ resolver.rs / locator.rs（规范化 + 缺失文件恢复）
//! ```

mod config;
mod error;
mod locator;
mod resolver;
mod source;
mod task;

pub use config::{DEFAULT_RESOURCE_SCHEME, ResolveConfig};
pub use error::SourceError;
pub use locator::{
    ASSET_SCHEME, FILE_SCHEME, Locator, Recovery, normalize_location, recover_missing_file,
};
pub use resolver::{DirectResolver, LocatorResolver, ResolveContext, ResourceResolver};
pub use source::{ImageSource, RasterHandle, Rect, SourceLayout, SourceOrigin};
pub use task::{CancelFlag, ResolveOutcome, resolve_in_background};
