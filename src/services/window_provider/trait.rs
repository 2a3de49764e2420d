use crate::config::Config;
use crate::error::{Result, YawiError};
use crate::platform::{Platform, SessionEnv, SUPPORTED_PLATFORMS};
use crate::utils::SystemCommandRunner;
use crate::window::WindowInfo;
use std::sync::Arc;

use super::gnome::GnomeProvider;
use super::hyprland::HyprlandProvider;
use super::macos::MacosProvider;
use super::sway::SwayProvider;

/// One implementation per supported platform, selected by [`create_window_provider`].
#[async_trait::async_trait]
pub trait WindowProvider: Send + Sync {
    /// Query the currently focused window.
    async fn get_active_window(&self) -> Result<WindowInfo>;

    /// Human-readable platform name.
    fn name(&self) -> &'static str;
}

/// Factory that maps a detected platform to its provider.
///
/// Only [`Platform::Unknown`] fails; provider preconditions such as missing
/// environment variables are checked when the query runs.
pub fn create_window_provider(
    platform: Platform,
    env: &SessionEnv,
    config: &Config,
) -> Result<Box<dyn WindowProvider>> {
    let timeout = config.query.timeout();
    match platform {
        Platform::Hyprland => Ok(Box::new(HyprlandProvider::new(env, &config.query))),
        Platform::Sway => Ok(Box::new(SwayProvider::new(env, &config.query))),
        Platform::Gnome => Ok(Box::new(GnomeProvider::new(timeout))),
        Platform::MacOs => Ok(Box::new(MacosProvider::new(
            &config.macos,
            Arc::new(SystemCommandRunner::new(timeout)),
        ))),
        Platform::Unknown => Err(YawiError::UnsupportedPlatform {
            supported: SUPPORTED_PLATFORMS.to_string(),
        }),
    }
}

/// Dispatch a query to the provider for `platform`. No retries, no fallback
/// to another platform.
pub async fn get_active_window_info(
    platform: Platform,
    env: &SessionEnv,
    config: &Config,
) -> Result<WindowInfo> {
    let provider = create_window_provider(platform, env, config)?;
    tracing::debug!(provider = provider.name(), "querying active window");
    provider.get_active_window().await
}
