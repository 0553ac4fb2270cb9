//! Session state for the photo feed client.
//!
//! Holds the bearer token and the login identity. The token survives
//! restarts (system keyring, with a JSON file fallback when no keyring is
//! available); the display name lives for the current process only.

use api_client::Scope;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

const KEYRING_SERVICE_NAME: &str = "Fotolenta";
const KEYRING_TOKEN_KEY: &str = "api_token";

/// When set to `1`, the keyring is bypassed and tokens go straight to the
/// file store. Set automatically after a keyring failure so subsequent
/// calls stay consistent within the process.
pub const USE_FILE_STORE_ENV: &str = "FOTOLENTA_USE_FILE_STORE";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("token store error: {0}")]
    Store(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

fn token_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fotolenta")
        .join("token.json")
}

fn file_store_forced() -> bool {
    std::env::var(USE_FILE_STORE_ENV).map(|v| v == "1").unwrap_or(false)
}

fn read_token_file() -> Option<String> {
    let data = std::fs::read_to_string(token_store_path()).ok()?;
    serde_json::from_str::<StoredToken>(&data).ok().map(|s| s.token)
}

fn write_token_file(token: &str) -> Result<(), SessionError> {
    let path = token_store_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string(&StoredToken {
        token: token.to_string(),
    })?;
    std::fs::write(path, data)?;
    Ok(())
}

fn remove_token_file() {
    let _ = std::fs::remove_file(token_store_path());
}

/// Process-wide auth state, passed to every request-issuing component.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    display_name: Option<String>,
}

impl Session {
    /// Restore a session from the token store. Missing or unreadable state
    /// yields a logged-out session rather than an error.
    pub fn load() -> Self {
        let token = if file_store_forced() {
            read_token_file()
        } else {
            match Entry::new(KEYRING_SERVICE_NAME, KEYRING_TOKEN_KEY) {
                Ok(entry) => match entry.get_password() {
                    Ok(token) => Some(token),
                    Err(keyring::Error::NoEntry) => None,
                    Err(e) => {
                        tracing::warn!("keyring unavailable, trying file store: {}", e);
                        std::env::set_var(USE_FILE_STORE_ENV, "1");
                        read_token_file()
                    }
                },
                Err(e) => {
                    tracing::warn!("keyring unavailable, trying file store: {}", e);
                    std::env::set_var(USE_FILE_STORE_ENV, "1");
                    read_token_file()
                }
            }
        };
        Session {
            token,
            display_name: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Record a successful login and persist the token.
    pub fn login(&mut self, token: String, display_name: String) -> Result<(), SessionError> {
        self.store_token(&token)?;
        self.token = Some(token);
        self.display_name = Some(display_name);
        Ok(())
    }

    fn store_token(&self, token: &str) -> Result<(), SessionError> {
        if file_store_forced() {
            return write_token_file(token);
        }
        match Entry::new(KEYRING_SERVICE_NAME, KEYRING_TOKEN_KEY)
            .and_then(|entry| entry.set_password(token))
        {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("keyring write failed, falling back to file store: {}", e);
                std::env::set_var(USE_FILE_STORE_ENV, "1");
                write_token_file(token)
            }
        }
    }

    /// Terminate the session: logout, or forced by a 401 from the API.
    pub fn clear(&mut self) {
        self.token = None;
        self.display_name = None;
        if !file_store_forced() {
            if let Ok(entry) = Entry::new(KEYRING_SERVICE_NAME, KEYRING_TOKEN_KEY) {
                let _ = entry.delete_password();
            }
        }
        remove_token_file();
    }

    /// Decorate an image URL with the token as a `t` query parameter for
    /// personal-scope loads. Raw image loads cannot carry bearer headers,
    /// so the server accepts the query form instead.
    pub fn image_url(&self, url: &str, scope: Scope) -> String {
        let token = match (&self.token, scope) {
            (Some(token), Scope::Personal) => token,
            _ => return url.to_string(),
        };
        let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", url, sep, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_token(token: &str) -> Session {
        Session {
            token: Some(token.to_string()),
            display_name: None,
        }
    }

    #[test]
    fn image_url_appends_token_for_personal() {
        let s = session_with_token("abc");
        assert_eq!(s.image_url("/thumbs/1", Scope::Personal), "/thumbs/1?t=abc");
    }

    #[test]
    fn image_url_uses_ampersand_with_existing_query() {
        let s = session_with_token("abc");
        assert_eq!(
            s.image_url("/thumbs/1?w=100", Scope::Personal),
            "/thumbs/1?w=100&t=abc"
        );
    }

    #[test]
    fn image_url_percent_encodes_token() {
        let s = session_with_token("a+b c");
        assert_eq!(
            s.image_url("/thumbs/1", Scope::Personal),
            "/thumbs/1?t=a%2Bb+c"
        );
    }

    #[test]
    fn image_url_untouched_for_shared_scope() {
        let s = session_with_token("abc");
        assert_eq!(s.image_url("/thumbs/1", Scope::Shared), "/thumbs/1");
    }

    #[test]
    fn image_url_untouched_without_token() {
        let s = Session::default();
        assert_eq!(s.image_url("/thumbs/1", Scope::Personal), "/thumbs/1");
    }
}
