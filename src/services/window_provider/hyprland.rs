use crate::config::QueryConfig;
use crate::error::Result;
use crate::platform::{SessionEnv, HYPRLAND_SIGNATURE_VAR};
use crate::utils::with_deadline;
use crate::window::WindowInfo;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use super::r#trait::WindowProvider;

const DEFAULT_RUNTIME_DIR: &str = "/tmp";
const SOCKET_NAME: &str = ".socket.sock";
const REQUEST: &[u8] = b"activewindow";

/// Subset of the `activewindow` reply that the record is built from.
#[derive(Debug, Deserialize)]
struct HyprlandWindow {
    #[serde(default)]
    class: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    workspace: HyprlandWorkspace,
}

#[derive(Debug, Default, Deserialize)]
struct HyprlandWorkspace {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: Option<String>,
}

pub struct HyprlandProvider {
    signature: Option<String>,
    runtime_dir: String,
    timeout: Duration,
    max_response_bytes: usize,
}

impl HyprlandProvider {
    pub fn new(env: &SessionEnv, query: &QueryConfig) -> Self {
        Self {
            signature: env.hyprland_signature.clone(),
            runtime_dir: env
                .runtime_dir
                .clone()
                .unwrap_or_else(|| DEFAULT_RUNTIME_DIR.to_string()),
            timeout: query.timeout(),
            max_response_bytes: query.max_response_bytes,
        }
    }

    fn socket_path(&self) -> Result<PathBuf> {
        let signature = self.signature.as_deref().ok_or_else(|| {
            crate::yawi_error!(
                configuration,
                "{HYPRLAND_SIGNATURE_VAR} not found - are we really running under Hyprland?"
            )
        })?;

        Ok(PathBuf::from(&self.runtime_dir)
            .join("hypr")
            .join(signature)
            .join(SOCKET_NAME))
    }

    /// Reads until the compositor closes the connection, refusing replies
    /// larger than the configured cap.
    async fn read_response(&self, stream: &mut UnixStream) -> Result<String> {
        let mut response = Vec::with_capacity(4096);
        let limit = self.max_response_bytes as u64 + 1;

        with_deadline(
            self.timeout,
            "failed to read Hyprland response",
            (&mut *stream).take(limit).read_to_end(&mut response),
        )
        .await?;

        if response.len() > self.max_response_bytes {
            return Err(crate::yawi_error!(
                protocol,
                "Hyprland response exceeds {} bytes",
                self.max_response_bytes
            ));
        }

        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}

/// Turns the raw reply into a record. `Invalid` or an empty reply means
/// nothing is focused.
fn parse_active_window(response: &str) -> Result<WindowInfo> {
    let response = response.trim();
    if response.is_empty() || response == "Invalid" {
        return Err(crate::yawi_error!(not_found, "no active window found in Hyprland"));
    }

    let window: HyprlandWindow = serde_json::from_str(response).map_err(|e| {
        crate::yawi_error!(protocol, "failed to decode Hyprland JSON response: {e}")
    })?;

    let workspace = match window.workspace.name {
        Some(name) if !name.is_empty() => name,
        _ => window.workspace.id.to_string(),
    };

    Ok(WindowInfo::new(window.title)
        .with_class(window.class)
        .with_pid(window.pid.and_then(|p| u32::try_from(p).ok()).unwrap_or(0))
        .with_workspace(workspace))
}

#[async_trait::async_trait]
impl WindowProvider for HyprlandProvider {
    async fn get_active_window(&self) -> Result<WindowInfo> {
        let socket_path = self.socket_path()?;
        debug!(path = %socket_path.display(), "connecting to Hyprland");

        let mut stream = with_deadline(
            self.timeout,
            "failed to connect to Hyprland socket",
            UnixStream::connect(&socket_path),
        )
        .await?;

        with_deadline(
            self.timeout,
            "failed to send activewindow request",
            stream.write_all(REQUEST),
        )
        .await?;

        let response = self.read_response(&mut stream).await?;
        debug!(bytes = response.len(), "received Hyprland response");

        parse_active_window(&response)
    }

    fn name(&self) -> &'static str {
        "Hyprland"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::YawiError;
    use tokio::net::UnixListener;

    const SAMPLE: &str = r#"{
        "address": "0x55d5c1a0",
        "mapped": true,
        "hidden": false,
        "at": [10, 40],
        "size": [1900, 1020],
        "workspace": {"id": 3, "name": "work"},
        "floating": false,
        "monitor": 0,
        "class": "firefox",
        "title": "Mozilla Firefox",
        "initialClass": "firefox",
        "initialTitle": "Mozilla Firefox",
        "pid": 4242,
        "xwayland": false,
        "pinned": false,
        "fullscreen": false
    }"#;

    fn provider_for(runtime_dir: &str, signature: Option<&str>) -> HyprlandProvider {
        let env = SessionEnv {
            hyprland_signature: signature.map(str::to_string),
            runtime_dir: Some(runtime_dir.to_string()),
            ..SessionEnv::default()
        };
        HyprlandProvider::new(&env, &Config::default().query)
    }

    #[test]
    fn test_parse_full_window() {
        let window = parse_active_window(SAMPLE).unwrap();
        assert_eq!(window.title, "Mozilla Firefox");
        assert_eq!(window.class, "firefox");
        assert_eq!(window.pid, 4242);
        assert_eq!(window.workspace, "work");
    }

    #[test]
    fn test_workspace_falls_back_to_id() {
        let window = parse_active_window(
            r#"{"class":"kitty","title":"~","pid":7,"workspace":{"id":3,"name":""}}"#,
        )
        .unwrap();
        assert_eq!(window.workspace, "3");

        let window =
            parse_active_window(r#"{"class":"kitty","title":"~","workspace":{"id":-98}}"#).unwrap();
        assert_eq!(window.workspace, "-98");
        assert_eq!(window.pid, 0);
    }

    #[test]
    fn test_invalid_and_empty_mean_not_found() {
        for reply in ["Invalid", "", "  \n", "Invalid\n"] {
            let err = parse_active_window(reply).unwrap_err();
            assert!(matches!(err, YawiError::NotFound(_)), "{reply:?}: {err:?}");
        }
    }

    #[test]
    fn test_garbage_is_protocol_error() {
        let err = parse_active_window("Window 55d5c1a0 -> kitty:").unwrap_err();
        assert!(matches!(err, YawiError::Protocol(_)));
    }

    #[test]
    fn test_socket_path_layout() {
        let provider = provider_for("/run/user/1000", Some("abc_123"));
        assert_eq!(
            provider.socket_path().unwrap(),
            PathBuf::from("/run/user/1000/hypr/abc_123/.socket.sock")
        );
    }

    #[test]
    fn test_runtime_dir_defaults_to_tmp() {
        let env = SessionEnv {
            hyprland_signature: Some("sig".to_string()),
            ..SessionEnv::default()
        };
        let provider = HyprlandProvider::new(&env, &Config::default().query);
        assert_eq!(
            provider.socket_path().unwrap(),
            PathBuf::from("/tmp/hypr/sig/.socket.sock")
        );
    }

    #[tokio::test]
    async fn test_missing_signature_is_configuration_error() {
        let provider = provider_for("/tmp", None);
        let err = provider.get_active_window().await.unwrap_err();
        assert!(matches!(err, YawiError::Configuration(_)));
        assert!(err.to_string().contains(HYPRLAND_SIGNATURE_VAR));
    }

    #[tokio::test]
    async fn test_missing_socket_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_for(dir.path().to_str().unwrap(), Some("gone"));
        let err = provider.get_active_window().await.unwrap_err();
        assert!(matches!(err, YawiError::Connection { .. }));
    }

    async fn serve_once(
        dir: &std::path::Path,
        signature: &str,
        reply: &'static [u8],
    ) -> tokio::task::JoinHandle<Vec<u8>> {
        let socket_dir = dir.join("hypr").join(signature);
        std::fs::create_dir_all(&socket_dir).unwrap();
        let listener = UnixListener::bind(socket_dir.join(SOCKET_NAME)).unwrap();

        tokio::spawn(async move {
            let (mut conn, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; REQUEST.len()];
            conn.read_exact(&mut request).await.unwrap();
            conn.write_all(reply).await.unwrap();
            request
        })
    }

    #[tokio::test]
    async fn test_round_trip_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let server = serve_once(dir.path(), "sig", SAMPLE.as_bytes()).await;

        let provider = provider_for(dir.path().to_str().unwrap(), Some("sig"));
        let window = provider.get_active_window().await.unwrap();

        assert_eq!(server.await.unwrap(), REQUEST);
        assert_eq!(window.class, "firefox");
        assert_eq!(window.workspace, "work");
    }

    #[tokio::test]
    async fn test_invalid_over_socket_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let _server = serve_once(dir.path(), "sig", b"Invalid").await;

        let provider = provider_for(dir.path().to_str().unwrap(), Some("sig"));
        let err = provider.get_active_window().await.unwrap_err();
        assert!(matches!(err, YawiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_oversized_reply_is_rejected() {
        static BIG: [u8; 8192] = [b' '; 8192];
        let dir = tempfile::tempdir().unwrap();
        let _server = serve_once(dir.path(), "sig", &BIG).await;

        let mut provider = provider_for(dir.path().to_str().unwrap(), Some("sig"));
        provider.max_response_bytes = 4096;
        let err = provider.get_active_window().await.unwrap_err();
        assert!(matches!(err, YawiError::Protocol(_)));
    }
}
