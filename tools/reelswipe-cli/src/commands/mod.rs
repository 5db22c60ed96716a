pub mod check;
pub mod init_config;
pub mod replay;

use std::path::Path;

use anyhow::Context;
use reelswipe_common::config::AppConfig;
use reelswipe_gesture::{ExtractorKind, SwipeConfig};

use crate::keys::KeyScheme;

/// Validated settings for one detection session.
#[derive(Debug, Clone)]
pub struct Session {
    pub swipe: SwipeConfig,
    pub kind: ExtractorKind,
    pub keys: KeyScheme,
}

/// Load an explicit config file, or the standard one with default fallback.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

/// Turn raw config values into validated session settings.
pub fn resolve(config: &AppConfig) -> anyhow::Result<Session> {
    let swipe = SwipeConfig::from_settings(&config.swipe).context("Invalid swipe settings")?;
    let kind: ExtractorKind = config.detector.strategy_name().parse()?;
    let keys: KeyScheme = config.keys.parse()?;
    Ok(Session { swipe, kind, keys })
}
