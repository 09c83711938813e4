//! API server configuration.

use std::fmt;
use std::str::FromStr;

use shift_core::mail::SmtpSettings;
use url::Url;

/// Deployment environment. Controls cookie security and error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Configuration for the API server, built once at startup.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    pub environment: Environment,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Passphrase for entry content encryption.
    pub content_key: String,
    /// Public URL of the web app, used in email links.
    pub app_url: Url,
    /// `None` disables email delivery.
    pub smtp: Option<SmtpSettings>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("environment", &self.environment)
            .field("app_url", &self.app_url.as_str())
            .field("smtp", &self.smtp.as_ref().map(|s| s.host.as_str()))
            .finish_non_exhaustive()
    }
}

impl ApiConfig {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Cookies carry `Secure` everywhere except local development.
    pub fn cookie_secure(&self) -> bool {
        self.environment != Environment::Development
    }
}
