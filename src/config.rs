use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEV_SESSION_SECRET: &str = "dev-only-session-secret-change-me";

/// Longest accepted session lifetime in seconds (30 days).
pub const MAX_SESSION_TTL: usize = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub database_max_connections: u32,

    // Session cookie
    pub session_secret: String,
    pub session_ttl: usize,

    // Reports + mail
    pub reports_dir: PathBuf,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: String,
    pub report_recipients: Vec<String>,

    pub seed_demo_data: bool,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            database_url: "sqlite://attendance.db".to_string(),
            database_max_connections: 5,
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_ttl: 28_800, // 8h, one school day
            reports_dir: PathBuf::from("reports"),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            mail_from: "attendance@localhost".to_string(),
            report_recipients: Vec::new(),
            seed_demo_data: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            session_secret: env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
            session_ttl: check_session_ttl(parse_var("SESSION_TTL", defaults.session_ttl)?)?,
            reports_dir: env::var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reports_dir),
            smtp_host: non_empty_var("SMTP_HOST"),
            smtp_port: parse_var("SMTP_PORT", defaults.smtp_port)?,
            smtp_username: non_empty_var("SMTP_USERNAME"),
            smtp_password: non_empty_var("SMTP_PASSWORD"),
            mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            report_recipients: env::var("REPORT_RECIPIENTS")
                .map(|raw| parse_recipients(&raw))
                .unwrap_or(defaults.report_recipients),
            seed_demo_data: parse_var("SEED_DEMO_DATA", defaults.seed_demo_data)?,
            log_dir: env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

fn check_session_ttl(ttl: usize) -> Result<usize> {
    anyhow::ensure!(
        (1..=MAX_SESSION_TTL).contains(&ttl),
        "SESSION_TTL must be between 1 and {MAX_SESSION_TTL} seconds, got {ttl}"
    );
    Ok(ttl)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Comma separated list, blanks dropped.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_are_trimmed_and_blank_entries_dropped() {
        let parsed = parse_recipients(" hod@college.edu, ,principal@college.edu,, ");
        assert_eq!(parsed, vec!["hod@college.edu", "principal@college.edu"]);
    }

    #[test]
    fn empty_recipient_list() {
        assert!(parse_recipients("").is_empty());
    }

    #[test]
    fn session_ttl_is_bounded() {
        assert_eq!(check_session_ttl(28_800).unwrap(), 28_800);
        assert_eq!(check_session_ttl(MAX_SESSION_TTL).unwrap(), MAX_SESSION_TTL);
        assert!(check_session_ttl(0).is_err());
        assert!(check_session_ttl(MAX_SESSION_TTL + 1).is_err());
        assert!(check_session_ttl(usize::MAX).is_err());
    }

    #[test]
    fn defaults_use_the_dev_secret() {
        assert!(Config::default().uses_dev_secret());
    }
}
