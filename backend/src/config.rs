use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{env, fmt, net::SocketAddr, str::FromStr};

/// Deployment profile selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
    Testing,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "default" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "testing" | "test" => Ok(Environment::Testing),
            other => Err(anyhow!("Invalid APP_ENV value: {}", other)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// How approve/reject treat a request that already carries a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// Any request may be decided again; the last decision wins.
    #[default]
    Overwrite,
    /// Only pending requests may be decided; others yield a conflict.
    PendingOnly,
}

impl FromStr for DecisionPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(DecisionPolicy::Overwrite),
            "pending_only" | "pending-only" => Ok(DecisionPolicy::PendingOnly),
            other => Err(anyhow!("Invalid DECISION_POLICY value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub enabled: bool,
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server: "smtp.gmail.com".to_string(),
            port: 587,
            use_tls: true,
            username: None,
            password: None,
            default_sender: "noreply@requestsystem.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub sql_echo: bool,
    pub seed_sample_requests: bool,
    pub time_zone: Tz,
    pub default_approver_name: String,
    pub default_approver_email: String,
    pub recent_requests_limit: i64,
    pub decision_policy: DecisionPolicy,
    pub mail: MailConfig,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let environment: Environment = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;
        let mut config = Self::for_environment(environment);

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| anyhow!("Invalid BIND_ADDR value: {}", addr))?;
        }

        if let Ok(filter) = env::var("RUST_LOG") {
            config.log_filter = filter;
        }

        config.sql_echo = env_flag("SQL_ECHO", config.sql_echo);
        config.seed_sample_requests =
            env_flag("SEED_SAMPLE_REQUESTS", config.seed_sample_requests);

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        config.time_zone = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        if let Ok(name) = env::var("DEFAULT_APPROVER_NAME") {
            config.default_approver_name = name;
        }
        if let Ok(email) = env::var("DEFAULT_APPROVER_EMAIL") {
            config.default_approver_email = email;
        }

        config.recent_requests_limit = env::var("RECENT_REQUESTS_LIMIT")
            .ok()
            .and_then(|value| value.parse().ok())
            .filter(|limit: &i64| *limit > 0)
            .unwrap_or(config.recent_requests_limit);

        if let Ok(policy) = env::var("DECISION_POLICY") {
            config.decision_policy = policy.parse()?;
        }

        config.mail = MailConfig {
            enabled: env_flag("MAIL_ENABLED", false),
            server: env::var("MAIL_SERVER").unwrap_or(config.mail.server),
            port: env::var("MAIL_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(config.mail.port),
            use_tls: env_flag("MAIL_USE_TLS", config.mail.use_tls),
            username: env::var("MAIL_USERNAME").ok().filter(|v| !v.is_empty()),
            password: env::var("MAIL_PASSWORD").ok().filter(|v| !v.is_empty()),
            default_sender: env::var("MAIL_DEFAULT_SENDER").unwrap_or(config.mail.default_sender),
        };

        Ok(config)
    }

    /// Profile defaults before any environment overrides are applied.
    pub fn for_environment(environment: Environment) -> Self {
        let (database_url, log_filter, sql_echo, seed_sample_requests) = match environment {
            Environment::Development => (
                "sqlite:./requests.db",
                "request_tracker_backend=debug,tower_http=debug",
                true,
                true,
            ),
            Environment::Production => (
                "sqlite:./requests.db",
                "request_tracker_backend=info,tower_http=info",
                false,
                false,
            ),
            Environment::Testing => (
                "sqlite::memory:",
                "request_tracker_backend=debug",
                false,
                false,
            ),
        };

        Config {
            environment,
            database_url: database_url.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            log_filter: log_filter.to_string(),
            sql_echo,
            seed_sample_requests,
            time_zone: chrono_tz::UTC,
            default_approver_name: "Manager".to_string(),
            default_approver_email: "manager@company.local".to_string(),
            recent_requests_limit: 5,
            decision_policy: DecisionPolicy::default(),
            mail: MailConfig::default(),
        }
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_flag(&value).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(2).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}
