//! Usage: Credential storage (access/refresh token key-value store, memory and file backed).

use crate::shared::error::{ClientError, ClientResult};
use crate::shared::mutex_ext::MutexExt;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Synchronous key-value storage for session credentials.
///
/// Blank values are reported as absent.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    fn remove(&self, key: &str) -> ClientResult<()>;

    fn access_token(&self) -> ClientResult<Option<String>> {
        self.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> ClientResult<Option<String>> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn set_access_token(&self, token: &str) -> ClientResult<()> {
        self.set(ACCESS_TOKEN_KEY, token)
    }

    /// Drop both tokens.
    fn clear_session(&self) -> ClientResult<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access_token: Option<&str>, refresh_token: Option<&str>) -> Self {
        let mut values = HashMap::new();
        if let Some(token) = access_token {
            values.insert(ACCESS_TOKEN_KEY.to_string(), token.to_string());
        }
        if let Some(token) = refresh_token {
            values.insert(REFRESH_TOKEN_KEY.to_string(), token.to_string());
        }
        Self {
            values: Mutex::new(values),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.values.with_recovered(|values| non_blank(values.get(key))))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.values.with_recovered(|values| {
            values.insert(key.to_string(), value.to_string());
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.values.with_recovered(|values| values.remove(key));
        Ok(())
    }
}

/// JSON-object file store. Reads hit the disk every time so writes from other
/// processes sharing the file are observed.
///
/// Writes replace the file in a single rename, so lock-free reads always see
/// a complete previous or next version.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ClientResult<BTreeMap<String, String>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "failed to read credential file {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&content).map_err(|e| {
            ClientError::Storage(format!(
                "credential file {} is not a json object of strings: {e}",
                self.path.display()
            ))
        })
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> ClientResult<()> {
        let content = serde_json::to_vec_pretty(values)
            .map_err(|e| ClientError::Storage(format!("failed to serialize credentials: {e}")))?;
        crate::infra::fs_atomic::replace_file(&self.path, &content).map_err(ClientError::Storage)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(non_blank(self.load()?.get(key)))
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let _guard = self.write_lock.lock_or_recover();
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let _guard = self.write_lock.lock_or_recover();
        let mut values = self.load()?;
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_treats_blank_as_absent() {
        let store = MemoryCredentialStore::with_tokens(Some("  "), Some("refresh-1"));
        assert_eq!(store.access_token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn memory_store_overwrites_access_token() {
        let store = MemoryCredentialStore::with_tokens(Some("OLD"), None);
        store.set_access_token("NEW").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("NEW"));

        store.clear_session().unwrap();
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn file_store_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert_eq!(store.access_token().unwrap(), None);
        store.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");

        let first = FileCredentialStore::new(&path);
        first.set(ACCESS_TOKEN_KEY, "access-1").unwrap();
        first.set(REFRESH_TOKEN_KEY, "refresh-1").unwrap();

        let second = FileCredentialStore::new(&path);
        assert_eq!(second.access_token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(second.refresh_token().unwrap().as_deref(), Some("refresh-1"));

        second.clear_session().unwrap();
        assert_eq!(first.refresh_token().unwrap(), None);
    }

    #[test]
    fn file_store_reads_stay_consistent_during_concurrent_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        store.set_access_token("A0").unwrap();

        std::thread::scope(|scope| {
            let writer = scope.spawn(|| {
                for i in 0..300 {
                    store.set_access_token(&format!("A{i}")).unwrap();
                }
            });
            let mut reads = 0usize;
            while !writer.is_finished() || reads < 100 {
                assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R1"));
                assert!(store.access_token().unwrap().is_some());
                reads += 1;
            }
        });
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();

        let err = FileCredentialStore::new(&path).access_token().unwrap_err();
        assert_eq!(err.code(), "STORAGE_ERROR");
    }
}
