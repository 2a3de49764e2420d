use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OSASCRIPT: &str = "osascript";
pub const DEFAULT_LSAPPINFO: &str = "/System/Library/Frameworks/CoreServices.framework/Frameworks/LaunchServices.framework/Support/lsappinfo";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub query: QueryConfig,
    pub macos: MacosConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Deadline for each connect, read, write and helper run.
    pub timeout_ms: u64,
    /// Upper bound on a single IPC response.
    pub max_response_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MacosConfig {
    pub osascript_path: String,
    pub lsappinfo_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "warn".to_string(),
            },
            query: QueryConfig {
                timeout_ms: 2000,
                max_response_bytes: 1024 * 1024,
            },
            macos: MacosConfig {
                osascript_path: DEFAULT_OSASCRIPT.to_string(),
                lsappinfo_path: DEFAULT_LSAPPINFO.to_string(),
            },
        }
    }
}

impl QueryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// `~/.config/yawi/config.toml` (or the XDG equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("yawi").join("config.toml"))
    }

    /// Defaults, then the TOML file if given and present, then `YAWI_*`
    /// variables.
    pub fn load_optional(config_path: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(config_path)
            .extract()
            .with_context(|| format!("failed to load configuration from {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("YAWI_").split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("invalid log level: {}", self.logging.level),
        }

        if self.query.timeout_ms == 0 {
            anyhow::bail!("query.timeout_ms must be greater than 0");
        }

        if self.query.max_response_bytes < 4096 {
            anyhow::bail!("query.max_response_bytes must be at least 4096");
        }

        if self.macos.osascript_path.trim().is_empty() {
            anyhow::bail!("macos.osascript_path must not be empty");
        }

        if self.macos.lsappinfo_path.trim().is_empty() {
            anyhow::bail!("macos.lsappinfo_path must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.query.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let path = Path::new("does-not-exist.toml");
            let config = Config::load_optional(Some(path)).expect("defaults");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "yawi.toml",
                r#"
                [logging]
                level = "debug"

                [query]
                timeout_ms = 750
                "#,
            )?;
            jail.set_env("YAWI_QUERY__MAX_RESPONSE_BYTES", "8192");

            let config = Config::load_optional(Some(Path::new("yawi.toml"))).expect("config");
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.query.timeout_ms, 750);
            assert_eq!(config.query.max_response_bytes, 8192);
            assert_eq!(config.macos.osascript_path, DEFAULT_OSASCRIPT);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_apply_without_a_file() {
        Jail::expect_with(|jail| {
            jail.set_env("YAWI_QUERY__TIMEOUT_MS", "300");
            jail.set_env("YAWI_LOGGING__LEVEL", "info");

            let config = Config::load_optional(None).expect("config");
            assert_eq!(config.query.timeout_ms, 300);
            assert_eq!(config.logging.level, "info");
            assert_eq!(config.query.max_response_bytes, 1024 * 1024);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.query.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.query.max_response_bytes = 100;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.macos.lsappinfo_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        Jail::expect_with(|jail| {
            jail.create_file("broken.toml", "[query]\ntimeout_ms = \"soon\"\n")?;
            let err = Config::load_optional(Some(Path::new("broken.toml"))).unwrap_err();
            assert!(format!("{err:#}").contains("broken.toml"));
            Ok(())
        });
    }
}
