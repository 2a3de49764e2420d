//! Classifies the running desktop session from environment variables.
//!
//! Detection never probes sockets or buses; it only looks at the captured
//! [`SessionEnv`] and the OS name, so it is cheap and has no failure mode.

use std::fmt;

pub const HYPRLAND_SIGNATURE_VAR: &str = "HYPRLAND_INSTANCE_SIGNATURE";
pub const RUNTIME_DIR_VAR: &str = "XDG_RUNTIME_DIR";
pub const SWAYSOCK_VAR: &str = "SWAYSOCK";
pub const CURRENT_DESKTOP_VAR: &str = "XDG_CURRENT_DESKTOP";
pub const SESSION_DESKTOP_VAR: &str = "XDG_SESSION_DESKTOP";

pub const SUPPORTED_PLATFORMS: &str = "Hyprland, Sway, GNOME Shell (Linux), macOS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Unknown,
    Hyprland,
    Sway,
    Gnome,
    MacOs,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Hyprland => "Hyprland",
            Platform::Sway => "Sway",
            Platform::Gnome => "GNOME",
            Platform::MacOs => "macOS",
            Platform::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Snapshot of the variables the detector and providers read.
/// Empty values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEnv {
    pub hyprland_signature: Option<String>,
    pub runtime_dir: Option<String>,
    pub swaysock: Option<String>,
    pub current_desktop: Option<String>,
    pub session_desktop: Option<String>,
}

impl SessionEnv {
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        Self {
            hyprland_signature: get(HYPRLAND_SIGNATURE_VAR),
            runtime_dir: get(RUNTIME_DIR_VAR),
            swaysock: get(SWAYSOCK_VAR),
            current_desktop: get(CURRENT_DESKTOP_VAR),
            session_desktop: get(SESSION_DESKTOP_VAR),
        }
    }
}

/// Detect the platform of the current process from a captured environment.
pub fn detect(env: &SessionEnv) -> Platform {
    detect_from(env, std::env::consts::OS)
}

/// First match wins: OS, then Hyprland, Sway and GNOME variables.
pub fn detect_from(env: &SessionEnv, os: &str) -> Platform {
    // A macOS session can carry stray XDG variables, so the OS check goes first.
    if os == "macos" {
        return Platform::MacOs;
    }

    if env.hyprland_signature.is_some() {
        return Platform::Hyprland;
    }

    if env.swaysock.is_some() {
        return Platform::Sway;
    }

    let mentions_gnome = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.to_lowercase().contains("gnome"))
    };
    if mentions_gnome(&env.current_desktop) || mentions_gnome(&env.session_desktop) {
        return Platform::Gnome;
    }

    Platform::Unknown
}
