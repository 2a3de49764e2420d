use crate::error::{Result, YawiError};
use crate::window::WindowInfo;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use zbus::Connection;

use super::r#trait::WindowProvider;

const BUS_NAME: &str = "org.gnome.Shell";
const OBJECT_PATH: &str = "/org/gnome/shell/extensions/FocusedWindow";
const INTERFACE: &str = "org.gnome.shell.extensions.FocusedWindow";
const METHOD: &str = "Get";

const EXTENSION_HINT: &str = "unable to get GNOME active window - \
    make sure the Focused Window D-Bus extension is installed and enabled";

/// JSON returned by the Focused Window D-Bus extension.
///
/// The extension reports a lot more (geometry, layer, monitor, flags);
/// unknown keys are accepted and dropped.
#[derive(Debug, Default, Deserialize)]
struct FocusedWindowInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    wm_class: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    id: Option<u64>,
}

impl From<FocusedWindowInfo> for WindowInfo {
    fn from(info: FocusedWindowInfo) -> Self {
        // The extension exposes no workspace name, the window id stands in.
        WindowInfo::new(info.title.unwrap_or_default())
            .with_class(info.wm_class.or(info.class).unwrap_or_default())
            .with_pid(info.pid.and_then(|p| u32::try_from(p).ok()).unwrap_or(0))
            .with_workspace(info.id.unwrap_or(0).to_string())
    }
}

pub struct GnomeProvider {
    timeout: Duration,
}

impl GnomeProvider {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn call_extension(&self) -> std::result::Result<String, String> {
        let connection = Connection::session()
            .await
            .map_err(|e| format!("failed to connect to D-Bus session bus: {e}"))?;

        let reply = connection
            .call_method(Some(BUS_NAME), OBJECT_PATH, Some(INTERFACE), METHOD, &())
            .await
            .map_err(|e| format!("failed to call {INTERFACE}.{METHOD}: {e}"))?;

        let json: String = reply
            .body()
            .deserialize()
            .map_err(|e| format!("unexpected {INTERFACE}.{METHOD} reply: {e}"))?;
        Ok(json)
    }
}

fn parse_focused_window(json: &str) -> std::result::Result<WindowInfo, String> {
    serde_json::from_str::<FocusedWindowInfo>(json)
        .map(WindowInfo::from)
        .map_err(|e| format!("failed to unmarshal focused window info: {e}"))
}

/// Bus, call and decode failures all look the same to the user: the
/// extension is the only remedy.
fn fold_failure(reason: &str) -> YawiError {
    debug!(%reason, "GNOME Shell query failed");
    crate::yawi_error!(unavailable, "{EXTENSION_HINT}")
}

fn window_from_reply(reply: std::result::Result<String, String>) -> Result<WindowInfo> {
    let json = reply.map_err(|reason| fold_failure(&reason))?;
    parse_focused_window(&json).map_err(|reason| fold_failure(&reason))
}

#[async_trait::async_trait]
impl WindowProvider for GnomeProvider {
    async fn get_active_window(&self) -> Result<WindowInfo> {
        let reply = tokio::time::timeout(self.timeout, self.call_extension())
            .await
            .unwrap_or_else(|_| Err(format!("timed out after {:?}", self.timeout)));
        window_from_reply(reply)
    }

    fn name(&self) -> &'static str {
        "GNOME Shell"
    }
}
