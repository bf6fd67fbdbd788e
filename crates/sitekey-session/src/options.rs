//! User options: the site pepper and the password length.
//!
//! Options are not secret in the sense of the master password, but the
//! pepper changes every derived password, so `Debug` masks it and the file
//! store writes with owner-only permissions.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Deserializer, Serialize};
use sitekey_core::derive::{DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use sitekey_core::CoreError;
use tracing::{debug, warn};

use crate::error::SessionError;

/// Default site pepper.
pub const DEFAULT_SECRET: &str = "";

/// Default derived password length.
pub const DEFAULT_LENGTH: usize = DEFAULT_PASSWORD_LENGTH;

// ── Options ────────────────────────────────────────────────────────

/// Persisted derivation options.
///
/// Serialized as `{"secret": "...", "len": 10}`. Missing fields take their
/// defaults. `len` also accepts a numeric string, as sent by HTML number
/// inputs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Options {
    /// Site pepper mixed into every derivation.
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Derived password length.
    #[serde(default = "default_len", deserialize_with = "deserialize_len")]
    pub len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            len: default_len(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("secret", &"***")
            .field("len", &self.len)
            .finish()
    }
}

impl Options {
    /// Check that the options can drive a derivation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] (wrapped) if `len` is outside
    /// the derivable range.
    pub fn validate(&self) -> Result<(), SessionError> {
        if (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&self.len) {
            Ok(())
        } else {
            Err(CoreError::InvalidConfig(format!(
                "password length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}, got {}",
                self.len
            ))
            .into())
        }
    }
}

fn default_secret() -> String {
    DEFAULT_SECRET.into()
}
const fn default_len() -> usize {
    DEFAULT_LENGTH
}

fn deserialize_len<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Len {
        Number(usize),
        Text(String),
    }

    match Len::deserialize(deserializer)? {
        Len::Number(n) => Ok(n),
        Len::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid length: {s:?}"))),
    }
}

// ── Provider seam ──────────────────────────────────────────────────

/// Source of the current options.
///
/// `load` may suspend on first access while the backing store is read.
pub trait OptionsProvider: Send + Sync {
    /// Snapshot of the current options.
    fn load(&self) -> impl Future<Output = Result<Options, SessionError>> + Send;

    /// Replace the stored options.
    fn store(&self, options: Options) -> impl Future<Output = Result<(), SessionError>> + Send;
}

// ── In-memory store ────────────────────────────────────────────────

/// Options held in memory only.
#[derive(Debug, Default)]
pub struct MemoryOptionsStore {
    options: Mutex<Options>,
}

impl MemoryOptionsStore {
    /// Start with `options`.
    #[must_use]
    pub const fn new(options: Options) -> Self {
        Self {
            options: Mutex::new(options),
        }
    }
}

impl OptionsProvider for MemoryOptionsStore {
    async fn load(&self) -> Result<Options, SessionError> {
        Ok(self
            .options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn store(&self, options: Options) -> Result<(), SessionError> {
        options.validate()?;
        *self.options.lock().unwrap_or_else(PoisonError::into_inner) = options;
        Ok(())
    }
}

// ── File store ─────────────────────────────────────────────────────

const OPTIONS_FILE: &str = "options.json";
const OPTIONS_TMP_FILE: &str = ".options.json.tmp";

/// Options persisted to `{dir}/options.json`.
///
/// The file is read on first `load` and cached afterwards; `store` writes
/// through and refreshes the cache.
#[derive(Debug)]
pub struct FileOptionsStore {
    dir: PathBuf,
    cache: tokio::sync::Mutex<Option<Options>>,
}

impl FileOptionsStore {
    /// Store options under `dir`. The directory must exist before `store`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: tokio::sync::Mutex::new(None),
        }
    }

    /// Directory holding the options file.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read options from disk.
    ///
    /// Returns [`Options::default()`] when the file is missing or contains
    /// invalid JSON (corrupt-file recovery).
    pub async fn read(dir: &Path) -> Options {
        let path = dir.join(OPTIONS_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), "options file unreadable, using defaults: {e}");
                Options::default()
            }),
            Err(e) => {
                debug!(path = %path.display(), "no options file, using defaults: {e}");
                Options::default()
            }
        }
    }

    /// Persist options to disk.
    ///
    /// Uses an atomic write pattern (write to `.tmp`, then rename) to
    /// prevent corruption from partial writes or crashes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the directory does not exist or the
    /// file system rejects the write/rename.
    pub async fn write(dir: &Path, options: &Options) -> Result<(), SessionError> {
        let path = dir.join(OPTIONS_FILE);
        let tmp = dir.join(OPTIONS_TMP_FILE);

        let json = serde_json::to_string_pretty(options)
            .map_err(|e| SessionError::Options(e.to_string()))?;

        tokio::fs::write(&tmp, &json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

impl OptionsProvider for FileOptionsStore {
    async fn load(&self) -> Result<Options, SessionError> {
        let mut cache = self.cache.lock().await;
        if let Some(options) = cache.as_ref() {
            return Ok(options.clone());
        }
        let options = Self::read(&self.dir).await;
        *cache = Some(options.clone());
        Ok(options)
    }

    async fn store(&self, options: Options) -> Result<(), SessionError> {
        options.validate()?;
        let mut cache = self.cache.lock().await;
        Self::write(&self.dir, &options).await?;
        debug!(len = options.len, "options stored");
        *cache = Some(options);
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_values_are_correct() {
        let options = Options::default();
        assert_eq!(options.secret, "");
        assert_eq!(options.len, 10);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let options: Options = serde_json::from_str("{}").unwrap();
        assert_eq!(options, Options::default());

        let options: Options = serde_json::from_str(r#"{"len": 16}"#).unwrap();
        assert_eq!(options.secret, "");
        assert_eq!(options.len, 16);
    }

    #[test]
    fn len_accepts_numeric_string() {
        let options: Options = serde_json::from_str(r#"{"secret": "x", "len": "12"}"#).unwrap();
        assert_eq!(options.len, 12);
    }

    #[test]
    fn len_rejects_garbage() {
        assert!(serde_json::from_str::<Options>(r#"{"len": "twelve"}"#).is_err());
        assert!(serde_json::from_str::<Options>(r#"{"len": -1}"#).is_err());
    }

    #[test]
    fn validate_bounds() {
        for len in [3, 10, 22] {
            let options = Options { secret: String::new(), len };
            assert!(options.validate().is_ok(), "len {len}");
        }
        for len in [0, 1, 2, 23] {
            let options = Options { secret: String::new(), len };
            let err = options.validate().unwrap_err();
            assert!(
                matches!(err, SessionError::Core(CoreError::InvalidConfig(_))),
                "len {len}"
            );
        }
    }

    #[test]
    fn debug_masks_secret() {
        let options = Options {
            secret: "pepper".into(),
            len: 10,
        };
        let debug = format!("{options:?}");
        assert!(!debug.contains("pepper"));
        assert!(debug.contains("len: 10"));
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryOptionsStore::default();
        assert_eq!(store.load().await.unwrap(), Options::default());

        let options = Options {
            secret: "pepper".into(),
            len: 16,
        };
        store.store(options.clone()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), options);
    }

    #[tokio::test]
    async fn memory_store_rejects_invalid() {
        let store = MemoryOptionsStore::default();
        let bad = Options {
            secret: String::new(),
            len: 0,
        };
        assert!(store.store(bad).await.is_err());
        assert_eq!(store.load().await.unwrap(), Options::default());
    }

    #[tokio::test]
    async fn file_store_returns_default_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileOptionsStore::new(dir.path());
        assert_eq!(store.load().await.unwrap(), Options::default());
    }

    #[tokio::test]
    async fn file_store_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let options = Options {
            secret: "pepper".into(),
            len: 14,
        };
        FileOptionsStore::new(dir.path())
            .store(options.clone())
            .await
            .unwrap();

        // A fresh store reads from disk.
        let reloaded = FileOptionsStore::new(dir.path()).load().await.unwrap();
        assert_eq!(reloaded, options);
        assert!(!dir.path().join(OPTIONS_TMP_FILE).exists());
    }

    #[tokio::test]
    async fn file_store_recovers_from_corrupt_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(OPTIONS_FILE), "{not json").unwrap();
        let store = FileOptionsStore::new(dir.path());
        assert_eq!(store.load().await.unwrap(), Options::default());
    }

    #[tokio::test]
    async fn file_store_caches_first_load() {
        let dir = TempDir::new().unwrap();
        let store = FileOptionsStore::new(dir.path());
        assert_eq!(store.load().await.unwrap(), Options::default());

        // Changes behind the store's back are not observed after first load.
        std::fs::write(dir.path().join(OPTIONS_FILE), r#"{"secret":"x","len":20}"#).unwrap();
        assert_eq!(store.load().await.unwrap(), Options::default());
    }

    #[tokio::test]
    async fn file_store_reads_persisted_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(OPTIONS_FILE),
            r#"{"secret":"pepper","len":12}"#,
        )
        .unwrap();
        let options = FileOptionsStore::new(dir.path()).load().await.unwrap();
        assert_eq!(options.secret, "pepper");
        assert_eq!(options.len, 12);
    }

    #[tokio::test]
    async fn file_store_write_fails_for_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = FileOptionsStore::new(dir.path().join("missing"));
        let err = store.store(Options::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        FileOptionsStore::new(dir.path())
            .store(Options::default())
            .await
            .unwrap();
        let mode = std::fs::metadata(dir.path().join(OPTIONS_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
