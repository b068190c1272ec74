use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::FixedOffset;

/// Application-level constants
pub const APP_NAME: &str = "NanoLabs";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn default_log_filter() -> &'static str {
    "info,nanolabs=debug"
}

/// Runtime configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Credential for the external AI service. None is a first-class state:
    /// the pipeline runs its deterministic tiers only.
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    /// Reference timezone naive document dates are interpreted in.
    pub report_tz: FixedOffset,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env_var("NANOLABS_BIND")
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)));

        let data_dir = env_var("NANOLABS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let tz_offset_minutes: i32 = env_var("NANOLABS_TZ_OFFSET_MINUTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let report_tz = FixedOffset::east_opt(tz_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));

        Self {
            bind_addr,
            data_dir,
            ai_api_key: env_var("NANOLABS_AI_API_KEY").filter(|s| !s.is_empty()),
            ai_base_url: env_var("NANOLABS_AI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            ai_model: env_var("NANOLABS_AI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            ai_timeout_secs: env_var("NANOLABS_AI_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            report_tz,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("nanolabs.db")
    }

    /// Directory uploaded PDFs are stored under.
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// ~/NanoLabs/ on all platforms, current directory as a last resort.
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_under_data_dir() {
        let config = Config {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            data_dir: PathBuf::from("/tmp/nanolabs-test"),
            ai_api_key: None,
            ai_base_url: "https://api.openai.com/v1".into(),
            ai_model: "gpt-4o-mini".into(),
            ai_timeout_secs: 60,
            report_tz: FixedOffset::east_opt(0).unwrap(),
        };
        assert!(config.db_path().starts_with(&config.data_dir));
        assert!(config.reports_dir().ends_with("reports"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
