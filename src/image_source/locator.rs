//! # 定位符模块
//!
//! ## 设计思路
//!
//! `Locator` 是交给渲染器的最终“取字节地址”，采用宽松解析（永不失败），
//! 与平台 URI 解析器行为保持一致，避免在此处引入 URL 规范化带来的二次编码。
//!
//! ## 实现思路
//!
//! - 裸路径规范化：无 `://` 时视为文件路径，剥离至多一个前导 `/` 后拼接 `file:///`。
//! - 缺失文件恢复：本地文件不存在时，对**整个**定位符字符串做百分号解码再使用；
//!   解码失败时静默保留原值，结果用 `Recovery` 两分支显式表达，而非错误通道。

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use percent_encoding::percent_decode_str;
use serde::Serialize;

/// 本地文件协议前缀（三个斜杠）。
pub const FILE_SCHEME: &str = "file:///";

/// 打包资源（asset）协议前缀。
pub const ASSET_SCHEME: &str = "file:///android_asset/";

const SCHEME_SEPARATOR: &str = "://";

/// 已解析的具体定位符（类 URI 字符串）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    /// 宽松解析：原样保存，不做任何校验或编码。
    pub fn parse(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 协议名（`://` 之前的部分）；没有协议时返回 `None`。
    pub fn scheme(&self) -> Option<&str> {
        self.0
            .split_once(SCHEME_SEPARATOR)
            .map(|(scheme, _)| scheme)
            .filter(|scheme| !scheme.is_empty())
    }

    /// 是否为本地文件定位符（`file:///` 开头）。
    pub fn is_local_file(&self) -> bool {
        self.0.starts_with(FILE_SCHEME)
    }

    /// 本地文件对应的路径，保留前导 `/`：`file:///a/b.png` → `/a/b.png`。
    pub fn local_path(&self) -> Option<&Path> {
        if self.is_local_file() {
            Some(Path::new(&self.0[FILE_SCHEME.len() - 1..]))
        } else {
            None
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Locator {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&str> for Locator {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// 将调用方传入的字符串规范化为定位符。
///
/// - 含 `://`：视为完整定位符，原样使用。
/// - 否则视为文件路径：剥离至多一个前导 `/`，再拼接 `file:///`。
///
/// # 示例
/// ```rust
/// use tiled_image_source::image_source::normalize_location;
///
/// assert_eq!(normalize_location("relative/path.jpg").as_str(), "file:///relative/path.jpg");
/// assert_eq!(
///     normalize_location("/already/absolute.jpg").as_str(),
///     "file:///already/absolute.jpg"
/// );
/// assert_eq!(normalize_location("https://a.b/c.png").as_str(), "https://a.b/c.png");
/// ```
pub fn normalize_location(raw: &str) -> Locator {
    if raw.contains(SCHEME_SEPARATOR) {
        return Locator::parse(raw);
    }

    let path = raw.strip_prefix('/').unwrap_or(raw);
    Locator::parse(format!("{}{}", FILE_SCHEME, path))
}

/// 缺失文件恢复结果。
///
/// 两个分支都携带可用的定位符；恢复是尽力而为，永远不会产生错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// 使用了百分号解码后的定位符。
    Decoded(Locator),
    /// 保留原始定位符（文件存在、非本地文件、未启用或解码失败）。
    Original(Locator),
}

impl Recovery {
    pub fn into_locator(self) -> Locator {
        match self {
            Self::Decoded(locator) | Self::Original(locator) => locator,
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }
}

/// 本地文件不存在时，尝试用百分号解码后的整串定位符替代。
///
/// 会对文件系统做一次存在性检查（阻塞 I/O），只能在后台线程调用。
pub fn recover_missing_file(locator: Locator) -> Recovery {
    let Some(path) = locator.local_path() else {
        return Recovery::Original(locator);
    };

    if path.exists() {
        return Recovery::Original(locator);
    }

    match decode_locator_text(locator.as_str()) {
        Some(decoded) if decoded != locator.as_str() => {
            log::debug!("🔁 本地文件不存在，改用解码后的定位符: {}", decoded);
            Recovery::Decoded(Locator::parse(decoded))
        }
        Some(_) => Recovery::Original(locator),
        None => {
            log::debug!("↩️ 定位符百分号编码无效，保留原值: {}", locator);
            Recovery::Original(locator)
        }
    }
}

/// 按表单解码规则解码整串文本：`+` 视为空格，`%XX` 按 UTF-8 字节还原。
///
/// 出现不完整或非十六进制的 `%` 序列，或解码结果不是合法 UTF-8 时返回 `None`。
pub(crate) fn decode_locator_text(text: &str) -> Option<String> {
    if !has_valid_escapes(text) {
        return None;
    }

    let spaced: Cow<'_, str> = if text.contains('+') {
        Cow::Owned(text.replace('+', " "))
    } else {
        Cow::Borrowed(text)
    };

    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn has_valid_escapes(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let valid = bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            idx += 3;
        } else {
            idx += 1;
        }
    }
    true
}
