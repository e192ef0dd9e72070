//! File-backed credential store
//!
//! Credentials are kept as a flat JSON object. The file is re-read on every
//! access so that several handles or processes can share one session. Each
//! write holds an exclusive lock on a sibling `.lock` file for the whole
//! read-modify-write cycle and replaces the file through a uniquely named
//! 0600 temporary file in the same directory.

use super::CredentialStore;
use crate::CoreResult;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

type Entries = BTreeMap<String, String>;

/// Credential store persisted to a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Exclusive lock held until the returned file is dropped
    fn lock(&self) -> CoreResult<File> {
        std::fs::create_dir_all(self.dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        file.lock()?;
        Ok(file)
    }

    fn load(&self) -> CoreResult<Entries> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Entries::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &Entries) -> CoreResult<()> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote credential file {}", self.path.display());
        Ok(())
    }

    fn update<F>(&self, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut Entries),
    {
        let _lock = self.lock()?;
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(temp_dir.path().join("credentials.json"));

        assert!(store.get("token").unwrap().is_none());
        assert!(store.remove("token").is_ok());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store.set("token", "A1").unwrap();
        store.set("refreshToken", "R1").unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("A1"));
        assert_eq!(reopened.get("refreshToken").unwrap().as_deref(), Some("R1"));

        reopened.remove("token").unwrap();
        assert!(store.get("token").unwrap().is_none());
        assert_eq!(store.get("refreshToken").unwrap().as_deref(), Some("R1"));
    }

    #[test]
    fn test_file_is_plain_json_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        let store = FileCredentialStore::new(&path);
        store.set("token", "A1").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "token": "A1" }));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(matches!(
            store.get("token"),
            Err(CoreError::Serialization { .. })
        ));
    }

    #[test]
    fn test_concurrent_handles_keep_every_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        let first = FileCredentialStore::new(&path);
        let second = FileCredentialStore::new(&path);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200 {
                    first.set("token", &format!("A{i}")).unwrap();
                }
            });
            scope.spawn(|| {
                for i in 0..200 {
                    second.set("refreshToken", &format!("R{i}")).unwrap();
                }
            });
        });

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("A199"));
        assert_eq!(reopened.get("refreshToken").unwrap().as_deref(), Some("R199"));

        // Only the credential file and its lock are left behind
        let mut names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["credentials.json", "credentials.json.lock"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credentials.json");
        let store = FileCredentialStore::new(&path);
        store.set("token", "A1").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
