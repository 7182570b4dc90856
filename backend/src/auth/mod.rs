//! User credentials - salted password hashes with an optional expiry.
//!
//! Stores sit behind [`CredentialStore`] so the server and CLI never care
//! whether users live in a JSON file or in memory.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{CredentialError, CredentialResult};

/// Credential file location (relative to current dir)
pub const DEFAULT_CREDENTIALS_PATH: &str = ".boi/credentials.json";

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    /// `salt$hex(sha256(salt + password))`
    pub password_hash: String,
    /// No expiry when absent
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Key-value access to user credentials.
pub trait CredentialStore: Send + Sync {
    /// Find a user by exact name.
    fn lookup(&self, username: &str) -> CredentialResult<Option<Credential>>;

    /// Add a user. Fails with [`CredentialError::DuplicateUser`] if the name is taken.
    fn create(
        &self,
        username: &str,
        password_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> CredentialResult<Credential>;
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn new_credential(
    users: &HashMap<String, Credential>,
    username: &str,
    password_hash: &str,
    expires_at: Option<DateTime<Utc>>,
) -> CredentialResult<Credential> {
    if username.trim().is_empty() {
        return Err(CredentialError::InvalidUser("username is empty".into()));
    }
    if users.contains_key(username) {
        return Err(CredentialError::DuplicateUser(username.to_string()));
    }
    Ok(Credential {
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        expires_at,
        created_at: Utc::now(),
    })
}

// =============================================================================
// File store
// =============================================================================

/// Users kept in one JSON document, rewritten on every change.
///
/// Writes are serialized within the process; across processes the last
/// write wins.
pub struct FileCredentialStore {
    path: PathBuf,
    users: Mutex<HashMap<String, Credential>>,
}

impl FileCredentialStore {
    /// Open (or start) the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> CredentialResult<Self> {
        let path = PathBuf::from(path.as_ref());
        let users = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, users: &HashMap<String, Credential>) -> CredentialResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let sorted: BTreeMap<_, _> = users.iter().collect();
        let content = serde_json::to_string_pretty(&sorted)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn lookup(&self, username: &str) -> CredentialResult<Option<Credential>> {
        Ok(locked(&self.users).get(username).cloned())
    }

    fn create(
        &self,
        username: &str,
        password_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> CredentialResult<Credential> {
        let mut users = locked(&self.users);
        let credential = new_credential(&users, username, password_hash, expires_at)?;
        users.insert(credential.username.clone(), credential.clone());
        if let Err(e) = self.persist(&users) {
            users.remove(username);
            return Err(e);
        }
        Ok(credential)
    }
}

// =============================================================================
// Memory store
// =============================================================================

/// Users held in memory only.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn lookup(&self, username: &str) -> CredentialResult<Option<Credential>> {
        Ok(locked(&self.users).get(username).cloned())
    }

    fn create(
        &self,
        username: &str,
        password_hash: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> CredentialResult<Credential> {
        let mut users = locked(&self.users);
        let credential = new_credential(&users, username, password_hash, expires_at)?;
        users.insert(credential.username.clone(), credential.clone());
        Ok(credential)
    }
}

// =============================================================================
// Passwords
// =============================================================================

fn digest(salt: &str, password: &str) -> String {
    let hash = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    hex::encode(hash)
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

/// Check a password against a stored `salt$hash`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

/// Hash `password` and add the user, valid for `valid_days` from `now` when given.
pub fn register(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
    valid_days: Option<i64>,
    now: DateTime<Utc>,
) -> CredentialResult<Credential> {
    if password.is_empty() {
        return Err(CredentialError::InvalidUser("password is empty".into()));
    }
    let expires_at = match valid_days {
        Some(days) => Some(
            Duration::try_days(days)
                .and_then(|valid| now.checked_add_signed(valid))
                .ok_or_else(|| CredentialError::InvalidUser("expiry out of range".into()))?,
        ),
        None => None,
    };
    store.create(username.trim(), &hash_password(password), expires_at)
}

/// Check a login attempt.
///
/// Unknown users and wrong passwords fail the same way; the expiry is only
/// reported once the password is right.
pub fn authenticate(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
    now: DateTime<Utc>,
) -> CredentialResult<Credential> {
    let credential = store
        .lookup(username.trim())?
        .ok_or(CredentialError::InvalidCredentials)?;

    if !verify_password(password, &credential.password_hash) {
        return Err(CredentialError::InvalidCredentials);
    }
    if credential.is_expired(now) {
        return Err(CredentialError::Expired(credential.username));
    }
    Ok(credential)
}
