use std::time::Duration;

use schoolhub_core::notification::Locale;
use schoolhub_notify::delivery::email::EmailConfig;
use schoolhub_notify::delivery::whatsapp::WhatsAppConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. Email and WhatsApp are disabled unless configured.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    pub email: Option<EmailConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
    pub notify: NotifyConfig,
    /// First admin account, created at startup when no admin exists.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Message template and send settings.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub locale: Locale,
    /// Signature line of every message.
    pub school_name: String,
    /// Bound on a single channel send.
    pub send_timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            school_name: "SchoolHub".to_string(),
            send_timeout: Duration::from_secs(15),
        }
    }
}

/// Credentials for the bootstrap admin account.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `NOTIFY_LOCALE`            | `id`                       |
    /// | `NOTIFY_SCHOOL_NAME`       | `SchoolHub`                |
    /// | `NOTIFY_SEND_TIMEOUT_SECS` | `15`                       |
    /// | `ADMIN_BOOTSTRAP_USERNAME` | -- (bootstrap disabled)    |
    /// | `ADMIN_BOOTSTRAP_PASSWORD` | -- (bootstrap disabled)    |
    /// | `ADMIN_BOOTSTRAP_EMAIL`    | `admin@schoolhub.local`    |
    ///
    /// See [`JwtConfig::from_env`], [`EmailConfig::from_env`] and
    /// [`WhatsAppConfig::from_env`] for the remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let locale: Locale = std::env::var("NOTIFY_LOCALE")
            .unwrap_or_else(|_| "id".into())
            .parse()
            .expect("NOTIFY_LOCALE must be one of: id, en");

        let send_timeout_secs: u64 = std::env::var("NOTIFY_SEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("NOTIFY_SEND_TIMEOUT_SECS must be a valid u64");

        let notify = NotifyConfig {
            locale,
            school_name: std::env::var("NOTIFY_SCHOOL_NAME")
                .unwrap_or_else(|_| "SchoolHub".into()),
            send_timeout: Duration::from_secs(send_timeout_secs),
        };

        let bootstrap_admin = match (
            std::env::var("ADMIN_BOOTSTRAP_USERNAME"),
            std::env::var("ADMIN_BOOTSTRAP_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin {
                    username,
                    password,
                    email: std::env::var("ADMIN_BOOTSTRAP_EMAIL")
                        .unwrap_or_else(|_| "admin@schoolhub.local".into()),
                })
            }
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            email: EmailConfig::from_env(),
            whatsapp: WhatsAppConfig::from_env(),
            notify,
            bootstrap_admin,
        }
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_origins(" http://a.test, ,http://b.test "),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn bootstrap_admin_debug_hides_password() {
        let admin = BootstrapAdmin {
            username: "root".into(),
            password: "super-secret".into(),
            email: "root@school.test".into(),
        };
        assert!(!format!("{admin:?}").contains("super-secret"));
    }
}
