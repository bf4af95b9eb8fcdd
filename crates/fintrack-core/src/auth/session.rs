use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AuthToken;

/// Session file name in the config directory
const SESSION_FILE: &str = "session.json";

/// Token lifetime in hours, matching the backend's JWT expiry
const TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl SessionData {
    pub fn from_token(token: AuthToken, email: &str) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            email: email.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(TOKEN_EXPIRY_HOURS)
    }
}

pub struct Session {
    dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, data: None }
    }

    /// Load session from disk. Returns `false` when absent or expired.
    ///
    /// An expired session is still kept so `email()` names the account whose
    /// snapshots are on disk; `token()` and `is_valid()` ignore it.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;

        let valid = !data.is_expired();
        self.data = Some(data);
        Ok(valid)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents).context("Failed to write session file")?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Bearer token while the session is valid
    pub fn token(&self) -> Option<&str> {
        self.data
            .as_ref()
            .filter(|d| !d.is_expired())
            .map(|d| d.access_token.as_str())
    }

    /// Account email, also for an expired session
    pub fn email(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.email.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(age_hours: i64) -> SessionData {
        SessionData {
            access_token: "tok".to_string(),
            token_type: "bearer".to_string(),
            email: "ana@example.com".to_string(),
            created_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_expiry() {
        assert!(!data(1).is_expired());
        assert!(data(25).is_expired());
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(data(0));
        session.save().expect("save");

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(reloaded.load().expect("load"));
        assert_eq!(reloaded.token(), Some("tok"));
        assert_eq!(reloaded.email(), Some("ana@example.com"));

        reloaded.clear().expect("clear");
        assert!(!reloaded.is_valid());
        assert!(!Session::new(dir.path().to_path_buf()).load().expect("load"));
    }

    #[test]
    fn test_expired_session_keeps_only_email() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(data(30));
        session.save().expect("save");

        let mut reloaded = Session::new(dir.path().to_path_buf());
        assert!(!reloaded.load().expect("load"));
        assert!(reloaded.token().is_none());
        assert!(!reloaded.is_valid());
        // still identifies the account so its snapshots can be removed
        assert_eq!(reloaded.email(), Some("ana@example.com"));
    }

    #[test]
    fn test_from_token() {
        let token = AuthToken {
            access_token: "abc".to_string(),
            token_type: "bearer".to_string(),
        };
        let data = SessionData::from_token(token, "ana@example.com");
        assert_eq!(data.access_token, "abc");
        assert!(!data.is_expired());
    }
}
