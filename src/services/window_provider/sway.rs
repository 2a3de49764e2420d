use crate::config::QueryConfig;
use crate::error::Result;
use crate::platform::{SessionEnv, SWAYSOCK_VAR};
use crate::utils::with_deadline;
use crate::window::WindowInfo;
use serde::Deserialize;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use super::r#trait::WindowProvider;

const MAGIC: &[u8; 6] = b"i3-ipc";
const HEADER_LEN: usize = 14;
const GET_TREE: u32 = 4;

/// A node of the `GET_TREE` reply. Only the fields used for the search and
/// the record are kept; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct SwayNode {
    #[serde(default, rename = "type")]
    node_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    representation: Option<String>,
    #[serde(default)]
    window_properties: Option<WindowProperties>,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    nodes: Vec<SwayNode>,
    #[serde(default)]
    floating_nodes: Vec<SwayNode>,
}

#[derive(Debug, Default, Deserialize)]
struct WindowProperties {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

pub struct SwayProvider {
    socket_path: Option<String>,
    timeout: Duration,
    max_response_bytes: usize,
}

fn encode_request(message_type: u32) -> [u8; HEADER_LEN] {
    let mut frame = [0u8; HEADER_LEN];
    frame[..6].copy_from_slice(MAGIC);
    frame[6..10].copy_from_slice(&0u32.to_le_bytes());
    frame[10..].copy_from_slice(&message_type.to_le_bytes());
    frame
}

/// Validates the reply header and returns the payload length.
fn decode_header(header: &[u8; HEADER_LEN], max_len: usize) -> Result<usize> {
    if &header[..6] != MAGIC {
        return Err(crate::yawi_error!(
            protocol,
            "unexpected i3-ipc magic in Sway reply: {:?}",
            String::from_utf8_lossy(&header[..6])
        ));
    }

    let len = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
    if len > max_len {
        return Err(crate::yawi_error!(
            protocol,
            "Sway reply of {len} bytes exceeds {max_len} bytes"
        ));
    }

    Ok(len)
}

/// Depth-first: the node itself, then `nodes`, then `floating_nodes`.
fn find_focused(node: &SwayNode) -> Option<&SwayNode> {
    if node.focused && node.window_properties.is_some() {
        return Some(node);
    }

    node.nodes
        .iter()
        .chain(node.floating_nodes.iter())
        .find_map(find_focused)
}

fn parse_tree(payload: &[u8]) -> Result<WindowInfo> {
    let root: SwayNode = serde_json::from_slice(payload)
        .map_err(|e| crate::yawi_error!(protocol, "failed to decode Sway JSON response: {e}"))?;

    let focused = find_focused(&root)
        .ok_or_else(|| crate::yawi_error!(not_found, "no focused window found in Sway tree"))?;
    debug!(node_type = %focused.node_type, "found focused Sway node");

    let props = focused.window_properties.as_ref();
    let title = props.and_then(|p| p.title.clone()).unwrap_or_default();
    let class = props.and_then(|p| p.class.clone()).unwrap_or_default();
    let pid = focused
        .pid
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(0);
    let workspace = focused
        .representation
        .clone()
        .or_else(|| focused.name.clone())
        .unwrap_or_default();

    Ok(WindowInfo::new(title)
        .with_class(class)
        .with_pid(pid)
        .with_workspace(workspace))
}

impl SwayProvider {
    pub fn new(env: &SessionEnv, query: &QueryConfig) -> Self {
        Self {
            socket_path: env.swaysock.clone(),
            timeout: query.timeout(),
            max_response_bytes: query.max_response_bytes,
        }
    }

    async fn get_tree(&self, socket_path: &str) -> Result<Vec<u8>> {
        debug!(path = socket_path, "connecting to Sway");
        let mut stream = with_deadline(
            self.timeout,
            "failed to connect to Sway socket",
            UnixStream::connect(socket_path),
        )
        .await?;

        let request = encode_request(GET_TREE);
        with_deadline(
            self.timeout,
            "failed to send i3-ipc request",
            stream.write_all(&request),
        )
        .await?;

        let mut header = [0u8; HEADER_LEN];
        with_deadline(
            self.timeout,
            "failed to read Sway response header",
            stream.read_exact(&mut header),
        )
        .await?;

        let len = decode_header(&header, self.max_response_bytes)?;
        debug!(len, "reading Sway tree payload");

        let mut payload = vec![0u8; len];
        with_deadline(
            self.timeout,
            "failed to read Sway JSON payload",
            stream.read_exact(&mut payload),
        )
        .await?;

        Ok(payload)
    }
}

#[async_trait::async_trait]
impl WindowProvider for SwayProvider {
    async fn get_active_window(&self) -> Result<WindowInfo> {
        let socket_path = self.socket_path.as_deref().ok_or_else(|| {
            crate::yawi_error!(
                configuration,
                "{SWAYSOCK_VAR} environment variable not found - are we running under Sway?"
            )
        })?;

        let payload = self.get_tree(socket_path).await?;
        parse_tree(&payload)
    }

    fn name(&self) -> &'static str {
        "Sway"
    }
}
