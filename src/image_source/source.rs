//! # 图片来源描述符
//!
//! ## 设计思路
//!
//! `ImageSource` 把“图片从哪里来、如何显示”的各种输入统一成一个值，交给分块渲染器消费。
//! 来源在构造时二选一且之后不可变：
//! - `SourceOrigin::InMemory`：内存中的位图，尺寸固定为位图原生尺寸
//! - `SourceOrigin::Deferred`：定位解析器，渲染器稍后在后台调用一次
//!
//! ## 实现思路
//!
//! 配置方法按值链式调用，每次修改后都重新断言不变量，因此调用顺序不影响最终状态：
//! 1. 设置了 `region` → 强制开启分块，宽高取区域宽高（区域优先级最高）
//! 2. 内存位图 → `dimensions` 为空操作（位图尺寸优先于声明尺寸）
//! 3. 存在区域时关闭分块的请求被忽略
//!
//! 冲突组合一律静默修正而不是报错，这是刻意的设计选择。

use std::fmt;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, RgbaImage};
use serde::Serialize;

use super::locator::Locator;
use super::resolver::{DirectResolver, LocatorResolver, ResolveContext, ResourceResolver};
use super::task::{CancelFlag, ResolveOutcome, resolve_in_background};
use super::SourceError;

/// 源图像素坐标系中的矩形区域。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// 内存位图句柄。
///
/// `cached = true` 表示位图由调用方持有，渲染器用完后不得释放。
#[derive(Debug, Clone)]
pub struct RasterHandle {
    image: Arc<DynamicImage>,
    cached: bool,
}

impl RasterHandle {
    pub fn image(&self) -> &Arc<DynamicImage> {
        &self.image
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    /// 渲染器用完后是否应由自己释放该位图。
    pub fn should_dispose(&self) -> bool {
        !self.cached
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// 描述符的来源，构造后不可切换。
pub enum SourceOrigin {
    InMemory(RasterHandle),
    Deferred(Box<dyn LocatorResolver>),
}

impl SourceOrigin {
    /// 在后台执行一次定位解析。
    ///
    /// 内存位图来源没有可解析的定位符，返回 `Failed(NotDeferred)`。
    pub async fn resolve(self, context: Arc<ResolveContext>, cancel: CancelFlag) -> ResolveOutcome {
        match self {
            Self::Deferred(resolver) => resolve_in_background(resolver, context, cancel).await,
            Self::InMemory(_) => ResolveOutcome::Failed(SourceError::NotDeferred(
                "内存位图来源无需定位解析".to_string(),
            )),
        }
    }
}

impl fmt::Debug for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory(raster) => f.debug_tuple("InMemory").field(raster).finish(),
            Self::Deferred(resolver) => f.debug_tuple("Deferred").field(&resolver.kind()).finish(),
        }
    }
}

/// 渲染器读取的布局参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLayout {
    pub tile: bool,
    pub width: u32,
    pub height: u32,
    pub region: Option<Rect>,
}

/// 规范化的图片来源描述符。
///
/// # 示例
/// ```rust
/// use tiled_image_source::image_source::{ImageSource, Rect};
///
/// let source = ImageSource::uri("photos/big.jpg")
///     .dimensions(8000, 6000)
///     .region(Some(Rect::new(100, 100, 612, 484)))
///     .tiling(false);
///
/// assert!(source.tile());
/// assert_eq!((source.width(), source.height()), (512, 384));
/// ```
#[derive(Debug)]
pub struct ImageSource {
    origin: SourceOrigin,
    layout: SourceLayout,
}

impl ImageSource {
    fn in_memory(image: Arc<DynamicImage>, cached: bool) -> Self {
        let (width, height) = image.dimensions();
        Self {
            origin: SourceOrigin::InMemory(RasterHandle { image, cached }),
            layout: SourceLayout {
                tile: false,
                width,
                height,
                region: None,
            },
        }
    }

    fn deferred(resolver: Box<dyn LocatorResolver>) -> Self {
        Self {
            origin: SourceOrigin::Deferred(resolver),
            layout: SourceLayout {
                tile: true,
                width: 0,
                height: 0,
                region: None,
            },
        }
    }

    /// 使用已加载的位图；渲染器接管所有权，用完即释放。
    pub fn bitmap(image: DynamicImage) -> Self {
        Self::in_memory(Arc::new(image), false)
    }

    /// 使用调用方缓存的位图（例如来自图片加载库）；渲染器不会释放它。
    pub fn cached_bitmap(image: Arc<DynamicImage>) -> Self {
        Self::in_memory(image, true)
    }

    /// 使用原始 RGBA 像素（`width * height * 4` 字节），不做解码。
    pub fn rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, SourceError> {
        let actual = pixels.len();
        let buffer = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            SourceError::InvalidRaster(format!(
                "像素长度 {} 与尺寸 {}x{} 不匹配",
                actual, width, height
            ))
        })?;
        Ok(Self::bitmap(DynamicImage::ImageRgba8(buffer)))
    }

    /// 使用资源 ID，定位符在解析时结合应用命名空间生成。
    pub fn resource(res_id: u32) -> Self {
        Self::deferred(Box::new(ResourceResolver::new(res_id)))
    }

    /// 使用打包 asset 的相对名，如 `images/a.png`。
    pub fn asset(asset_name: &str) -> Self {
        Self::deferred(Box::new(DirectResolver::asset(asset_name)))
    }

    /// 使用定位字符串；不含协议时视为文件路径。
    pub fn uri(location: &str) -> Self {
        Self::deferred(Box::new(DirectResolver::from_location(location)))
    }

    /// 使用结构化定位符。
    pub fn locator(locator: Locator) -> Self {
        Self::deferred(Box::new(DirectResolver::from_locator(locator)))
    }

    /// 使用自定义解析器。
    pub fn resolver(resolver: impl LocatorResolver + 'static) -> Self {
        Self::deferred(Box::new(resolver))
    }

    /// 开启或关闭分块；存在区域时关闭请求被忽略。
    pub fn tiling(mut self, tile: bool) -> Self {
        if !tile && self.layout.region.is_some() {
            log::debug!("↩️ 已设置显示区域，忽略关闭分块的请求");
        } else {
            self.layout.tile = tile;
        }
        self.assert_invariants();
        self
    }

    pub fn tiling_enabled(self) -> Self {
        self.tiling(true)
    }

    pub fn tiling_disabled(self) -> Self {
        self.tiling(false)
    }

    /// 设置显示区域。清除区域不会恢复之前的尺寸，需要时请重新声明。
    pub fn region(mut self, region: Option<Rect>) -> Self {
        self.layout.region = region;
        self.assert_invariants();
        self
    }

    /// 声明原图尺寸，仅对延迟解析来源生效；区域始终优先。
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        match self.origin {
            SourceOrigin::Deferred(_) => {
                self.layout.width = width;
                self.layout.height = height;
            }
            SourceOrigin::InMemory(_) => {
                log::debug!(
                    "↩️ 内存位图尺寸固定为 {}x{}，忽略声明尺寸 {}x{}",
                    self.layout.width,
                    self.layout.height,
                    width,
                    height
                );
            }
        }
        self.assert_invariants();
        self
    }

    fn assert_invariants(&mut self) {
        if let Some(region) = self.layout.region {
            self.layout.tile = true;
            self.layout.width = region.width();
            self.layout.height = region.height();
        }
    }

    pub fn tile(&self) -> bool {
        self.layout.tile
    }

    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn region_rect(&self) -> Option<Rect> {
        self.layout.region
    }

    pub fn layout(&self) -> SourceLayout {
        self.layout
    }

    /// 仅对内存位图有意义；延迟解析来源恒为 `false`。
    pub fn is_cached(&self) -> bool {
        matches!(&self.origin, SourceOrigin::InMemory(raster) if raster.is_cached())
    }

    pub fn raster(&self) -> Option<&RasterHandle> {
        match &self.origin {
            SourceOrigin::InMemory(raster) => Some(raster),
            SourceOrigin::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.origin, SourceOrigin::Deferred(_))
    }

    /// 交给渲染器：冻结描述符，拆出布局与来源。
    pub fn into_parts(self) -> (SourceLayout, SourceOrigin) {
        (self.layout, self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
    }

    #[test]
    fn bitmap_takes_native_dimensions() {
        let source = ImageSource::bitmap(raster(64, 32)).dimensions(1000, 1000);

        assert_eq!((source.width(), source.height()), (64, 32));
        assert!(!source.tile());
        assert!(!source.is_cached());
        assert!(source.raster().is_some_and(RasterHandle::should_dispose));
    }

    #[test]
    fn cached_bitmap_is_not_disposed() {
        let shared = Arc::new(raster(8, 8));
        let source = ImageSource::cached_bitmap(Arc::clone(&shared));

        assert!(source.is_cached());
        let handle = source.raster().expect("in-memory source has a raster");
        assert!(!handle.should_dispose());
        assert!(Arc::ptr_eq(handle.image(), &shared));
    }

    #[test]
    fn rgba_rejects_length_mismatch() {
        assert!(matches!(
            ImageSource::rgba(4, 4, vec![0; 10]),
            Err(SourceError::InvalidRaster(_))
        ));

        let source = ImageSource::rgba(2, 3, vec![0; 24]).expect("valid rgba buffer");
        assert_eq!((source.width(), source.height()), (2, 3));
    }

    #[test]
    fn deferred_sources_default_to_tiling() {
        for source in [
            ImageSource::uri("a.png"),
            ImageSource::asset("a.png"),
            ImageSource::resource(1),
            ImageSource::locator(Locator::parse("https://x/a.png")),
        ] {
            assert!(source.tile());
            assert!(source.is_deferred());
            assert!(!source.is_cached());
        }
    }

    #[test]
    fn region_overrides_dimensions_in_any_order() {
        let rect = Rect::new(10, 20, 110, 70);

        let before = ImageSource::uri("a.png").region(Some(rect)).dimensions(4000, 3000);
        let after = ImageSource::uri("a.png").dimensions(4000, 3000).region(Some(rect));

        assert_eq!(before.layout(), after.layout());
        assert_eq!((before.width(), before.height()), (100, 50));
    }

    #[test]
    fn tiling_cannot_be_disabled_with_region() {
        let source = ImageSource::uri("a.png")
            .region(Some(Rect::new(0, 0, 10, 10)))
            .tiling_disabled();
        assert!(source.tile());
    }

    #[test]
    fn tiling_can_be_disabled_without_region() {
        let source = ImageSource::uri("a.png").tiling_disabled();
        assert!(!source.tile());
        assert!(source.tiling_enabled().tile());
    }

    #[test]
    fn region_on_bitmap_overrides_native_size() {
        let source = ImageSource::bitmap(raster(64, 64)).region(Some(Rect::new(0, 0, 16, 8)));
        assert!(source.tile());
        assert_eq!((source.width(), source.height()), (16, 8));
    }

    #[test]
    fn clearing_region_keeps_derived_dimensions() {
        let source = ImageSource::uri("a.png")
            .dimensions(4000, 3000)
            .region(Some(Rect::new(0, 0, 30, 20)))
            .region(None);

        assert_eq!((source.width(), source.height()), (30, 20));
        assert!(source.region_rect().is_none());
        assert!(!source.tiling_disabled().tile());
    }

    #[test]
    fn into_parts_hands_over_layout_and_origin() {
        let (layout, origin) = ImageSource::resource(9).dimensions(10, 20).into_parts();
        assert_eq!(layout.width, 10);
        assert!(matches!(origin, SourceOrigin::Deferred(_)));
    }

    #[tokio::test]
    async fn in_memory_origin_cannot_be_resolved() {
        let (_, origin) = ImageSource::bitmap(raster(1, 1)).into_parts();
        let outcome = origin
            .resolve(Arc::new(ResolveContext::new("com.example")), CancelFlag::new())
            .await;
        assert!(matches!(outcome, ResolveOutcome::Failed(SourceError::NotDeferred(_))));
    }
}
