use crate::config::MacosConfig;
use crate::error::Result;
use crate::utils::CommandRunner;
use crate::window::WindowInfo;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::r#trait::WindowProvider;

/// No accessibility permission needed: only the frontmost process is asked for.
const FRONTMOST_APP_SCRIPT: &str = r#"
tell application "System Events"
	set frontApp to first application process whose frontmost is true
	set appName to name of frontApp
	set appPID to unix id of frontApp
	return appName & "|" & (appPID as string)
end tell"#;

const LSAPPINFO_ARGS: [&str; 5] = ["info", "-only", "name,pid", "-app", "front"];

/// macOS has no workspace concept at this level.
const WORKSPACE: &str = "main";

pub struct MacosProvider {
    osascript: String,
    lsappinfo: String,
    runner: Arc<dyn CommandRunner>,
}

fn app_window(app_name: &str, pid: u32) -> WindowInfo {
    WindowInfo::new(app_name)
        .with_class(app_name)
        .with_pid(pid)
        .with_workspace(WORKSPACE)
}

/// Parses `<name>|<pid>`; an unparsable pid becomes `0`.
fn parse_frontmost_app(output: &str) -> Result<WindowInfo> {
    let output = output.trim();
    if output.is_empty() {
        return Err(crate::yawi_error!(protocol, "no active application found"));
    }

    let parts: Vec<&str> = output.split('|').collect();
    if parts.len() < 2 {
        return Err(crate::yawi_error!(
            protocol,
            "unexpected AppleScript output format: {output:?}"
        ));
    }

    let pid = parts[1].trim().parse::<u32>().unwrap_or(0);
    Ok(app_window(parts[0], pid))
}

struct LsappinfoPatterns {
    display_name: Regex,
    quoted: Regex,
    pid: Regex,
}

fn lsappinfo_patterns() -> &'static LsappinfoPatterns {
    static PATTERNS: OnceLock<LsappinfoPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| LsappinfoPatterns {
        display_name: Regex::new(r#""(?:LSDisplayName|name)"\s*=\s*"([^"]+)""#)
            .expect("valid display name pattern"),
        quoted: Regex::new(r#""([^"]+)""#).expect("valid name pattern"),
        pid: Regex::new(r#"\bpid"?\s*=\s*(\d+)"#).expect("valid pid pattern"),
    })
}

/// Accepts both `"LSDisplayName"="Safari" "pid"=812` and the bare
/// `"Safari" ... pid=812` layout; a missing pid is tolerated.
fn parse_lsappinfo(output: &str) -> Result<WindowInfo> {
    let patterns = lsappinfo_patterns();

    let app_name = patterns
        .display_name
        .captures(output)
        .or_else(|| patterns.quoted.captures(output))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            crate::yawi_error!(protocol, "could not parse app name from lsappinfo output")
        })?;

    let pid = patterns
        .pid
        .captures(output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);

    Ok(app_window(app_name, pid))
}

impl MacosProvider {
    pub fn new(config: &MacosConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            osascript: config.osascript_path.clone(),
            lsappinfo: config.lsappinfo_path.clone(),
            runner,
        }
    }

    async fn frontmost_app(&self) -> Result<WindowInfo> {
        let output = self
            .runner
            .run(&self.osascript, &["-e", FRONTMOST_APP_SCRIPT])
            .await?;
        parse_frontmost_app(&output)
    }

    async fn frontmost_app_lsappinfo(&self) -> Result<WindowInfo> {
        let output = self.runner.run(&self.lsappinfo, &LSAPPINFO_ARGS).await?;
        parse_lsappinfo(&output)
    }
}

#[async_trait::async_trait]
impl WindowProvider for MacosProvider {
    async fn get_active_window(&self) -> Result<WindowInfo> {
        match self.frontmost_app().await {
            Ok(window) => Ok(window),
            Err(e) => {
                warn!("AppleScript query failed ({e}), falling back to lsappinfo");
                let window = self.frontmost_app_lsappinfo().await?;
                debug!(app = %window.class, "lsappinfo fallback succeeded");
                Ok(window)
            }
        }
    }

    fn name(&self) -> &'static str {
        "macOS"
    }
}
