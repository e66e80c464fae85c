use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_QUIZ_DURATION_SECS: u32 = 1800;
const DEFAULT_COMPLETION_DELAY_SECS: u64 = 3;

/// Application configuration loaded from environment variables.
/// Start-up fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub quiz: QuizSettings,
}

/// Timing knobs for the live quiz runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    /// Countdown total, in seconds, for every quiz instance.
    pub duration_secs: u32,
    /// How long a submitted quiz stays readable before it is dropped.
    pub completion_delay: Duration,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_QUIZ_DURATION_SECS,
            completion_delay: Duration::from_secs(DEFAULT_COMPLETION_DELAY_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let duration_secs = optional_env("QUIZ_DURATION_SECS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("QUIZ_DURATION_SECS must be a whole number of seconds")?
            .unwrap_or(DEFAULT_QUIZ_DURATION_SECS);

        if duration_secs == 0 {
            anyhow::bail!("QUIZ_DURATION_SECS must be greater than zero");
        }

        let completion_delay = optional_env("QUIZ_COMPLETION_DELAY_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("QUIZ_COMPLETION_DELAY_SECS must be a whole number of seconds")?
            .unwrap_or(DEFAULT_COMPLETION_DELAY_SECS);

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            quiz: QuizSettings {
                duration_secs,
                completion_delay: Duration::from_secs(completion_delay),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
