use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, TimeZone, Utc};
use google_drive3::oauth2::storage::{TokenInfo, TokenStorage};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

/// Credential record persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl StoredCredential {
    fn from_token(scopes: &[&str], token: TokenInfo) -> Self {
        Self {
            token: token.access_token,
            refresh_token: token.refresh_token,
            expiry: token.expires_at.and_then(to_utc),
            scopes: scopes.iter().map(ToString::to_string).collect(),
            id_token: token.id_token,
        }
    }

    /// True if every requested scope was granted to this credential.
    #[must_use]
    pub fn covers(&self, scopes: &[&str]) -> bool {
        scopes
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }
}

impl From<StoredCredential> for TokenInfo {
    fn from(credential: StoredCredential) -> Self {
        TokenInfo {
            access_token: credential.token,
            refresh_token: credential.refresh_token,
            expires_at: credential.expiry.and_then(to_offset_date_time),
            id_token: credential.id_token,
        }
    }
}

fn to_utc(at: OffsetDateTime) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(at.unix_timestamp(), at.nanosecond()).single()
}

fn to_offset_date_time(at: DateTime<Utc>) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).ok()
}

/// Keeps the credential in a single JSON file. Loading, refreshing and the interactive
/// flow are driven by the authenticator, this only reads and writes the record.
#[derive(Debug, Clone)]
pub struct TokenFileStorage {
    path: PathBuf,
}

impl TokenFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` if nothing was persisted yet.
    pub fn load(&self) -> io::Result<Option<StoredCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Replaces the file atomically so a crash never leaves a half written token behind.
    pub fn save(&self, credential: &StoredCredential) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(credential)?;
        let mut file = AtomicWriteFile::open(&self.path)?;
        file.write_all(&json)?;
        file.commit()
    }
}

#[async_trait]
impl TokenStorage for TokenFileStorage {
    #[instrument(skip(self, token), fields(path = %self.path.display()))]
    async fn set(&self, scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        let mut credential = StoredCredential::from_token(scopes, token);
        if credential.refresh_token.is_none() {
            // refresh responses usually omit it
            credential.refresh_token = self
                .load()
                .ok()
                .flatten()
                .and_then(|previous| previous.refresh_token);
        }
        self.save(&credential)?;
        debug!("credential saved");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn get(&self, scopes: &[&str]) -> Option<TokenInfo> {
        let credential = match self.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!("no stored credential");
                return None;
            }
            Err(err) => {
                warn!("discarding unreadable credential: {err}");
                return None;
            }
        };
        if !credential.covers(scopes) {
            info!("stored credential was granted other scopes, authorization needed");
            return None;
        }
        Some(credential.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    const DRIVE: &str = "https://www.googleapis.com/auth/drive";
    const DRIVE_FILE: &str = "https://www.googleapis.com/auth/drive.file";

    fn storage() -> (TempDir, TokenFileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = TokenFileStorage::new(dir.path().join("token.json"));
        (dir, storage)
    }

    fn token(access: &str, refresh: Option<&str>) -> TokenInfo {
        TokenInfo {
            access_token: Some(access.to_string()),
            refresh_token: refresh.map(ToString::to_string),
            expires_at: Some(OffsetDateTime::from_unix_timestamp(1_900_000_000).unwrap()),
            id_token: None,
        }
    }

    #[tokio::test]
    async fn missing_file_yields_nothing() {
        let (_dir, storage) = storage();
        assert!(storage.get(&[DRIVE]).await.is_none());
        assert!(storage.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get() {
        let (_dir, storage) = storage();
        storage
            .set(&[DRIVE], token("access-1", Some("refresh-1")))
            .await
            .unwrap();

        let info = storage.get(&[DRIVE]).await.unwrap();
        assert_eq!(info.access_token.as_deref(), Some("access-1"));
        assert_eq!(info.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(
            info.expires_at.map(OffsetDateTime::unix_timestamp),
            Some(1_900_000_000)
        );

        let stored = storage.load().unwrap().unwrap();
        assert_eq!(stored.scopes, vec![DRIVE.to_string()]);
        assert_eq!(stored.expiry.map(|e| e.timestamp()), Some(1_900_000_000));
    }

    #[tokio::test]
    async fn other_scopes_are_not_served() {
        let (_dir, storage) = storage();
        storage
            .set(&[DRIVE_FILE], token("access-1", Some("refresh-1")))
            .await
            .unwrap();

        assert!(storage.get(&[DRIVE]).await.is_none());
        assert!(storage.get(&[DRIVE_FILE]).await.is_some());
    }

    #[tokio::test]
    async fn refresh_keeps_previous_refresh_token() {
        let (_dir, storage) = storage();
        storage
            .set(&[DRIVE], token("access-1", Some("refresh-1")))
            .await
            .unwrap();
        storage.set(&[DRIVE], token("access-2", None)).await.unwrap();

        let info = storage.get(&[DRIVE]).await.unwrap();
        assert_eq!(info.access_token.as_deref(), Some("access-2"));
        assert_eq!(info.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn corrupt_file_is_discarded() {
        let (_dir, storage) = storage();
        fs::write(storage.path(), "{not json").unwrap();

        assert!(storage.get(&[DRIVE]).await.is_none());
        assert!(logs_contain("discarding unreadable credential"));

        // the next successful authorization overwrites it
        storage
            .set(&[DRIVE], token("access-1", Some("refresh-1")))
            .await
            .unwrap();
        assert!(storage.get(&[DRIVE]).await.is_some());
    }

    #[test]
    fn reads_record_without_optional_fields() {
        let (_dir, storage) = storage();
        fs::write(
            storage.path(),
            r#"{"token": "abc", "scopes": ["https://www.googleapis.com/auth/drive"]}"#,
        )
        .unwrap();

        let stored = storage.load().unwrap().unwrap();
        assert_eq!(stored.token.as_deref(), Some("abc"));
        assert!(stored.refresh_token.is_none());
        assert!(stored.expiry.is_none());
        assert!(stored.covers(&[DRIVE]));
    }
}
