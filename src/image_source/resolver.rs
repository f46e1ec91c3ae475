//! # 定位解析器模块
//!
//! ## 设计思路
//!
//! `LocatorResolver` 把“如何得到具体定位符”抽象为单一操作，描述符只持有解析器本身，
//! 无需关心来源类型。内置两种实现：
//! - `DirectResolver`：已知定位符（裸路径、完整 URI、asset），解析时做缺失文件恢复
//! - `ResourceResolver`：资源 ID，必须等到解析上下文（应用命名空间）可用时才能拼出定位符
//!
//! ## 实现思路
//!
//! `resolve` 是阻塞操作（可能访问文件系统），只应在后台线程执行，
//! 统一由 `task::resolve_in_background` 驱动并处理取消与超时。

use super::locator::{ASSET_SCHEME, FILE_SCHEME, Locator, normalize_location, recover_missing_file};
use super::task::CancelFlag;
use super::{ResolveConfig, SourceError};

/// 解析上下文：由宿主应用提供的运行时绑定。
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    namespace: String,
    config: ResolveConfig,
}

impl ResolveContext {
    /// 使用默认配置创建上下文。
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_config(namespace, ResolveConfig::default())
    }

    pub fn with_config(namespace: impl Into<String>, config: ResolveConfig) -> Self {
        Self {
            namespace: namespace.into(),
            config,
        }
    }

    /// 宿主应用命名空间（包名 / bundle id）。
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }
}

/// 定位解析能力。
///
/// 实现方可以在耗时步骤之间检查 `cancel`，发现已取消时返回任意错误即可，
/// 后台驱动会把结果统一折算为 `ResolveOutcome::Cancelled`。
pub trait LocatorResolver: Send + Sync {
    /// 阻塞式解析，禁止在 UI 线程调用。
    fn resolve(
        &self,
        context: &ResolveContext,
        cancel: &CancelFlag,
    ) -> Result<Locator, SourceError>;

    /// 解析器类别，仅用于日志与调试输出。
    fn kind(&self) -> &'static str {
        "custom"
    }
}

/// 已知定位符的解析器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectResolver {
    locator: Locator,
}

impl DirectResolver {
    /// 从字符串构造：无协议时按文件路径规范化。
    ///
    /// 空串、`"/"` 或纯空白规范化后（忽略空白）只剩 `file:///`，没有路径；
    /// 构造本身不失败，但 `resolve` 会返回 `SourceError::InvalidLocator`，
    /// 不会把裸 `file:///` 交给渲染器。
    pub fn from_location(raw: &str) -> Self {
        Self {
            locator: normalize_location(raw),
        }
    }

    /// 从结构化定位符构造：跳过规范化，只保留解析期的缺失文件恢复。
    pub fn from_locator(locator: Locator) -> Self {
        Self { locator }
    }

    /// 从 asset 相对名构造，等价于拼接 asset 前缀后走字符串构造。
    pub fn asset(asset_name: &str) -> Self {
        Self::from_location(&format!("{}{}", ASSET_SCHEME, asset_name))
    }

    /// 构造期得到的定位符（尚未做缺失文件恢复）。
    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl LocatorResolver for DirectResolver {
    fn resolve(
        &self,
        context: &ResolveContext,
        cancel: &CancelFlag,
    ) -> Result<Locator, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Task("解析已取消".to_string()));
        }

        let raw = self.locator.as_str().trim();
        if raw.is_empty() || raw == FILE_SCHEME {
            return Err(SourceError::InvalidLocator(format!(
                "定位符缺少路径：'{}'",
                self.locator
            )));
        }

        if !context.config().decode_missing_files {
            return Ok(self.locator.clone());
        }

        let recovery = recover_missing_file(self.locator.clone());
        if recovery.is_decoded() {
            log::info!("🔁 已使用解码后的定位符替代原值: {}", self.locator);
        }
        Ok(recovery.into_locator())
    }

    fn kind(&self) -> &'static str {
        "direct"
    }
}

/// 资源 ID 解析器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceResolver {
    res_id: u32,
}

impl ResourceResolver {
    pub fn new(res_id: u32) -> Self {
        Self { res_id }
    }

    pub fn res_id(&self) -> u32 {
        self.res_id
    }
}

impl LocatorResolver for ResourceResolver {
    fn resolve(
        &self,
        context: &ResolveContext,
        cancel: &CancelFlag,
    ) -> Result<Locator, SourceError> {
        if cancel.is_cancelled() {
            return Err(SourceError::Task("解析已取消".to_string()));
        }

        let namespace = context.namespace().trim();
        if namespace.is_empty() {
            return Err(SourceError::MissingContext(format!(
                "资源 {} 缺少应用命名空间",
                self.res_id
            )));
        }

        let scheme = context.config().checked_resource_scheme()?;

        Ok(Locator::parse(format!(
            "{}://{}/{}",
            scheme,
            namespace,
            self.res_id
        )))
    }

    fn kind(&self) -> &'static str {
        "resource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_name_gets_asset_prefix() {
        let resolver = DirectResolver::asset("images/a.png");
        assert_eq!(
            resolver.locator().as_str(),
            "file:///android_asset/images/a.png"
        );
    }

    #[test]
    fn structured_locator_skips_normalization() {
        let resolver = DirectResolver::from_locator(Locator::parse("relative/x.png"));
        assert_eq!(resolver.locator().as_str(), "relative/x.png");
    }

    #[test]
    fn direct_resolution_decodes_missing_encoded_file() {
        let resolver = DirectResolver::from_location("/no/such%20place/img.png");
        let locator = resolver
            .resolve(&ResolveContext::new("com.example"), &CancelFlag::new())
            .expect("direct resolution should not fail");
        assert_eq!(locator.as_str(), "file:///no/such place/img.png");
    }

    #[test]
    fn decode_fallback_can_be_disabled() {
        let config = ResolveConfig {
            decode_missing_files: false,
            ..ResolveConfig::default()
        };
        let context = ResolveContext::with_config("com.example", config);
        let resolver = DirectResolver::from_location("/no/such%20place/img.png");
        let locator = resolver
            .resolve(&context, &CancelFlag::new())
            .expect("direct resolution should not fail");
        assert_eq!(locator.as_str(), "file:///no/such%20place/img.png");
    }

    #[test]
    fn empty_location_is_rejected() {
        for resolver in [DirectResolver::from_location(""), DirectResolver::from_location("/")] {
            let result = resolver.resolve(&ResolveContext::new("com.example"), &CancelFlag::new());
            assert!(matches!(result, Err(SourceError::InvalidLocator(_))));
        }
    }

    #[test]
    fn resource_locator_embeds_namespace_and_id() {
        let locator = ResourceResolver::new(2131165312)
            .resolve(&ResolveContext::new("com.example.app"), &CancelFlag::new())
            .expect("resource resolution failed");
        assert_eq!(locator.as_str(), "android.resource://com.example.app/2131165312");
        assert_eq!(locator.as_str().matches("com.example.app").count(), 1);
    }

    #[test]
    fn resource_rejects_empty_scheme_from_code() {
        let config = ResolveConfig {
            resource_scheme: String::new(),
            ..ResolveConfig::default()
        };
        let context = ResolveContext::with_config("com.example", config);

        let result = ResourceResolver::new(7).resolve(&context, &CancelFlag::new());

        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[test]
    fn resource_rejects_scheme_with_separator_from_code() {
        let config = ResolveConfig {
            resource_scheme: "res://".to_string(),
            ..ResolveConfig::default()
        };
        let context = ResolveContext::with_config("com.example", config);

        let result = ResourceResolver::new(7).resolve(&context, &CancelFlag::new());

        assert!(matches!(result, Err(SourceError::Config(_))));
    }

    #[test]
    fn whitespace_location_is_rejected() {
        let resolver = DirectResolver::from_location("   ");
        let result = resolver.resolve(&ResolveContext::new("com.example"), &CancelFlag::new());
        assert!(matches!(result, Err(SourceError::InvalidLocator(_))));
    }

    #[test]
    fn resource_requires_namespace() {
        let result =
            ResourceResolver::new(7).resolve(&ResolveContext::new("  "), &CancelFlag::new());
        assert!(matches!(result, Err(SourceError::MissingContext(_))));
    }

    #[test]
    fn cancelled_flag_stops_resolution() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = ResourceResolver::new(7).resolve(&ResolveContext::new("com.example"), &cancel);
        assert!(result.is_err());
    }
}
