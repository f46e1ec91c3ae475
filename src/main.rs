//! # 分块图片来源 — 命令行入口
//!
//! 本文件仅负责日志初始化、参数解析与结果输出。
//! 业务逻辑分布在 `image_source` 子模块中，详见 `lib.rs` 架构文档。
//!
//! 用法：`tiled-image-source <uri|asset|resource> <value> [namespace]`
//! 可通过 `TILED_SOURCE_CONFIG` 指定 JSON 配置文件。

use std::sync::Arc;

use serde::Serialize;
use tiled_image_source::error::AppError;
use tiled_image_source::image_source::{
    CancelFlag, ImageSource, Locator, Rect, ResolveConfig, ResolveContext,
};

const CONFIG_ENV: &str = "TILED_SOURCE_CONFIG";
const DEFAULT_NAMESPACE: &str = "com.example.app";

#[derive(Debug, Serialize)]
struct ResolveReport {
    locator: Option<Locator>,
    cancelled: bool,
    tile: bool,
    width: u32,
    height: u32,
    region: Option<Rect>,
}

fn load_config() -> Result<ResolveConfig, AppError> {
    let Ok(path) = std::env::var(CONFIG_ENV) else {
        return Ok(ResolveConfig::default());
    };

    log::info!("⚙️ 读取配置文件: {}", path);
    let content = std::fs::read_to_string(&path)?;
    Ok(ResolveConfig::from_json_str(&content)?)
}

fn build_source(kind: &str, value: &str) -> Result<ImageSource, AppError> {
    match kind {
        "uri" => Ok(ImageSource::uri(value)),
        "asset" => Ok(ImageSource::asset(value)),
        "resource" => value
            .parse::<u32>()
            .map(ImageSource::resource)
            .map_err(|e| AppError::Usage(format!("资源 ID 无效 '{}': {}", value, e))),
        other => Err(AppError::Usage(format!(
            "未知来源类型：{}（可选：uri / asset / resource）",
            other
        ))),
    }
}

async fn run(args: Vec<String>) -> Result<ResolveReport, AppError> {
    let [kind, value, rest @ ..] = args.as_slice() else {
        return Err(AppError::Usage(
            "用法：tiled-image-source <uri|asset|resource> <value> [namespace]".to_string(),
        ));
    };
    let namespace = rest.first().map_or(DEFAULT_NAMESPACE, String::as_str);

    let config = load_config()?;
    let source = build_source(kind, value)?;
    let (layout, origin) = source.into_parts();

    let context = Arc::new(ResolveContext::with_config(namespace, config));
    let outcome = origin.resolve(context, CancelFlag::new()).await;
    let cancelled = outcome.is_cancelled();
    let locator = outcome.into_result()?;

    Ok(ResolveReport {
        locator,
        cancelled,
        tile: layout.tile,
        width: layout.width,
        height: layout.height,
        region: layout.region,
    })
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                log::error!("输出序列化失败: {err}");
                std::process::exit(1);
            }
        },
        Err(err) => {
            log::error!("解析失败 [{}]: {err}", err.code());
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
