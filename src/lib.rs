//! # 分块图片来源 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                调用方（位图 / 资源 / asset / URI）         │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ ImageSource 工厂 + 链式配置
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            本库 (Rust)                            │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  └─ image_source                                         │
//! │      ├─ source    描述符 + 不变量（区域 > 声明尺寸）        │
//! │      ├─ resolver  Direct / Resource / 自定义解析器         │
//! │      ├─ locator   路径规范化 + 缺失文件解码恢复            │
//! │      └─ task      spawn_blocking + 取消 + 超时             │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↓ into_parts()
//!   分块渲染器（外部协作方：解码、缓存、绘制均不在本库范围内）
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，命令行入口的返回类型 |
//! | [`image_source`] | 图片来源描述符、定位解析与后台执行 |

pub mod error;
pub mod image_source;
