//! Runtime configuration from the environment.
//!
//! | Variable               | Default                  |
//! |------------------------|--------------------------|
//! | `BOI_PORT`             | `3000`                   |
//! | `BOI_CREDENTIALS_PATH` | `.boi/credentials.json`  |
//! | `BOI_AUTH`             | on (`off` disables)      |
//! | `BOI_SESSION_HOURS`    | `8`                      |

use std::env;
use std::path::PathBuf;

use crate::api::logs::log_warning;
use crate::auth::DEFAULT_CREDENTIALS_PATH;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_HOURS: i64 = 8;
/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub credentials_path: PathBuf,
    pub auth_enabled: bool,
    pub session_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            auth_enabled: true,
            session_hours: DEFAULT_SESSION_HOURS,
        }
    }
}

impl AppConfig {
    /// Read the process environment (call `dotenvy::dotenv()` first to pick up `.env`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parsed(&lookup, "BOI_PORT").unwrap_or(defaults.port);
        let session_hours = parsed(&lookup, "BOI_SESSION_HOURS")
            .filter(|h: &i64| *h > 0)
            .map(|h| h.min(MAX_SESSION_HOURS))
            .unwrap_or(defaults.session_hours);
        let credentials_path = lookup("BOI_CREDENTIALS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.credentials_path);
        let auth_enabled = !lookup("BOI_AUTH")
            .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "off" | "false" | "0" | "no"));

        Self {
            port,
            credentials_path,
            auth_enabled,
            session_hours,
        }
    }

    pub fn is_auth_enabled(&self) -> bool {
        self.auth_enabled
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log_warning(format!("Ignoring invalid {}={:?}", key, raw));
            None
        }
    }
}
