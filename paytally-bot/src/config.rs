use chrono_tz::Tz;
use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Telegram accepts at most eight buttons in one keyboard row
pub const MAX_RECENT_DAYS: u32 = 8;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BotConfig {
    #[serde(default)]
    pub bots: Vec<BotIdentityConfig>,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    pub database: Option<DatabaseConfig>,
}

/// One bot identity; each runs its own update loop
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BotIdentityConfig {
    pub name: String,
    pub token: String,
    pub api_base: Option<String>,
}

impl BotIdentityConfig {
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReportingConfig {
    /// IANA zone all report days and months are computed in
    pub timezone: String,
    /// Explicit-date buttons offered before yesterday in the report menu,
    /// at most `MAX_RECENT_DAYS`
    pub recent_days: u32,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Phnom_Penh".to_string(),
            recent_days: 3,
        }
    }
}

impl ReportingConfig {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Message(format!("invalid timezone: {}", self.timezone)))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollingConfig {
    /// Long-poll timeout passed to getUpdates
    pub timeout_secs: u64,
    /// Pause after a failed poll before trying again
    pub retry_delay_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_delay_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

const DEFAULT_CONFIG: &str = r#"
# One [[bots]] entry per bot identity. Each identity polls independently.
# [[bots]]
# name = "shop-main"
# token = "123456:ABC-your-bot-token"
# api_base = "https://api.telegram.org"

[reporting]
timezone = "Asia/Phnom_Penh"
# Date buttons shown before yesterday, 0 to 8
recent_days = 3

[polling]
timeout_secs = 30
retry_delay_secs = 5

[database]
# path = "/var/lib/paytally/db.sqlite"
"#;

impl BotConfig {
    /// Loads the config from `path`, or from the default location. A commented
    /// default file is written when none exists yet.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .build()?;

        let config: BotConfig = builder.try_deserialize()?;
        config.validate()?;

        Ok((config, config_path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bots.is_empty() {
            return Err(ConfigError::Message(
                "no bots configured, add a [[bots]] entry".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for bot in &self.bots {
            if bot.token.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "bot {:?} has an empty token",
                    bot.name
                )));
            }
            if !names.insert(bot.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "bot name {:?} is configured twice",
                    bot.name
                )));
            }
        }

        if self.reporting.recent_days > MAX_RECENT_DAYS {
            return Err(ConfigError::Message(format!(
                "recent_days is {}, at most {} date buttons fit in one row",
                self.reporting.recent_days, MAX_RECENT_DAYS
            )));
        }

        self.reporting.tz()?;
        Ok(())
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .as_ref()
            .and_then(|db| db.path.as_ref())
            .map(PathBuf::from)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("paytally").join("bot.toml")
    } else {
        PathBuf::from("bot.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("bot.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_bots_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[[bots]]
name = "shop-main"
token = "111:aaa"

[[bots]]
name = "shop-two"
token = "222:bbb"
api_base = "http://localhost:8081"

[reporting]
timezone = "Asia/Bangkok"
recent_days = 5
"#,
        );

        let (config, loaded_from) = BotConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.bots.len(), 2);
        assert_eq!(config.bots[0].api_base(), DEFAULT_API_BASE);
        assert_eq!(config.bots[1].api_base(), "http://localhost:8081");
        assert_eq!(config.reporting.recent_days, 5);
        assert_eq!(config.reporting.tz().unwrap(), chrono_tz::Asia::Bangkok);
        assert_eq!(config.polling.timeout_secs, 30);
        assert!(config.database_path().is_none());
    }

    #[test]
    fn test_missing_file_writes_default_and_asks_for_bots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bot.toml");

        let err = BotConfig::load(Some(&path)).unwrap_err();
        assert!(path.exists());
        assert!(err.to_string().contains("no bots configured"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[[bots]]
name = "a"
token = "1"

[[bots]]
name = "a"
token = "2"
"#,
        );
        let err = BotConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("configured twice"));
    }

    #[test]
    fn test_rejects_bad_timezone() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[[bots]]
name = "a"
token = "1"

[reporting]
timezone = "Mars/Olympus"
recent_days = 3
"#,
        );
        let err = BotConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid timezone"));
    }

    #[test]
    fn test_rejects_too_many_recent_days() {
        let dir = tempfile::tempdir().unwrap();
        let body = |days: u32| {
            format!(
                r#"
[[bots]]
name = "a"
token = "1"

[reporting]
timezone = "Asia/Phnom_Penh"
recent_days = {days}
"#
            )
        };

        let path = write_config(&dir, &body(MAX_RECENT_DAYS));
        let (config, _) = BotConfig::load(Some(&path)).unwrap();
        assert_eq!(config.reporting.recent_days, 8);

        let path = write_config(&dir, &body(50));
        let err = BotConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("recent_days is 50"));
    }
}
