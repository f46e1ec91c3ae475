//! # 配置模块
//!
//! ## 设计思路
//!
//! 将定位解析阶段的“可调策略”集中到 `ResolveConfig`，保证运行时行为可观测、可调整、可测试。
//!
//! ## 实现思路
//!
//! - `Default` 提供与平台约定一致的默认值（`android.resource` 资源协议、开启解码回退）。
//! - 支持从 JSON 加载，缺省字段回落到默认值。
//! - `validate` 在加载后立即执行，尽早拒绝无效参数。

use serde::{Deserialize, Serialize};

use super::SourceError;

/// 平台资源协议默认值。
pub const DEFAULT_RESOURCE_SCHEME: &str = "android.resource";

/// 定位解析配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// 资源定位符使用的协议名（`<scheme>://<namespace>/<resId>`）。
    pub resource_scheme: String,
    /// 本地文件不存在时，是否尝试对整个定位符做百分号解码后再使用。
    pub decode_missing_files: bool,
    /// 单次后台解析允许的最长耗时（毫秒）。
    pub resolve_timeout_ms: u64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            resource_scheme: DEFAULT_RESOURCE_SCHEME.to_string(),
            decode_missing_files: true,
            resolve_timeout_ms: 10_000,
        }
    }
}

impl ResolveConfig {
    /// 从 JSON 文本解析配置并校验。
    ///
    /// # 示例
    /// ```rust
    /// use tiled_image_source::image_source::ResolveConfig;
    ///
    /// let config = ResolveConfig::from_json_str(r#"{ "resolve_timeout_ms": 500 }"#)?;
    /// assert_eq!(config.resolve_timeout_ms, 500);
    /// assert!(config.decode_missing_files);
    /// # Ok::<(), tiled_image_source::image_source::SourceError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SourceError::Config(format!("解析配置失败：{}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), SourceError> {
        self.checked_resource_scheme()?;
        if !(100..=120_000).contains(&self.resolve_timeout_ms) {
            return Err(SourceError::Config(
                "resolve_timeout_ms 必须在 100~120000 毫秒之间".to_string(),
            ));
        }
        Ok(())
    }

    /// 取出去除首尾空白后的资源协议名；为空或含 `:` / `/` 时返回配置错误。
    ///
    /// 代码中直接构造的配置不经过 `from_json_str`，解析资源时以此兜底。
    pub fn checked_resource_scheme(&self) -> Result<&str, SourceError> {
        let scheme = self.resource_scheme.trim();
        if scheme.is_empty() {
            return Err(SourceError::Config("resource_scheme 不能为空".to_string()));
        }
        if scheme.contains(':') || scheme.contains('/') {
            return Err(SourceError::Config(format!(
                "resource_scheme 不能包含 ':' 或 '/'：{}",
                scheme
            )));
        }
        Ok(scheme)
    }
}
