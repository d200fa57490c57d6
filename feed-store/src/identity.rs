//! Локальная личность пользователя: имя и аватар в key-value хранилище.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use feed_client::User;
use thiserror::Error;
use tracing::warn;

/// Ключ отображаемого имени.
pub const USER_KEY: &str = "USER";
/// Ключ аватара.
pub const AVATAR_KEY: &str = "AVATAR";

/// Ошибки сохранения локальной личности.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Ошибка чтения или записи хранилища.
    #[error("identity storage io error: {0}")]
    Io(#[from] io::Error),

    /// Не удалось сериализовать содержимое хранилища.
    #[error("identity storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Хранилище недоступно (например, отравлен мьютекс).
    #[error("identity storage unavailable: {0}")]
    Unavailable(String),
}

/// Результат операций хранилища личности.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Постоянное key-value хранилище локальной личности.
///
/// Валидации здесь нет: непустое имя проверяет вызывающая сторона.
pub trait IdentityStore: Send + Sync {
    /// Читает личность. Отсутствующие ключи дают пустые строки; ошибкой это
    /// не считается.
    fn load(&self) -> User;

    /// Записывает имя и аватар, полностью заменяя прежние значения.
    fn save(&self, user: &User) -> IdentityResult<()>;

    /// `true`, если в хранилище нет ни одного ключа (первый визит).
    fn is_empty(&self) -> bool;
}

type Entries = BTreeMap<String, String>;

fn user_from_entries(entries: &Entries) -> User {
    User {
        name: entries.get(USER_KEY).cloned().unwrap_or_default(),
        avatar: entries.get(AVATAR_KEY).cloned().unwrap_or_default(),
    }
}

fn write_user(entries: &mut Entries, user: &User) {
    entries.insert(USER_KEY.to_string(), user.name.clone());
    entries.insert(AVATAR_KEY.to_string(), user.avatar.clone());
}

/// Хранилище личности в JSON-файле вида `{"USER": "...", "AVATAR": "..."}`.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    /// Хранилище в файле `path`. Файл создаётся при первом сохранении.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Путь к файлу хранилища.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> IdentityResult<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn read_entries_or_empty(&self) -> Entries {
        self.read_entries().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "identity storage is unreadable");
            Entries::new()
        })
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> User {
        user_from_entries(&self.read_entries_or_empty())
    }

    fn save(&self, user: &User) -> IdentityResult<()> {
        let mut entries = self.read_entries_or_empty();
        write_user(&mut entries, user);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string_pretty(&entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.read_entries_or_empty().is_empty()
    }
}

/// Хранилище личности в памяти процесса.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    entries: Mutex<Entries>,
}

impl MemoryIdentityStore {
    /// Пустое хранилище.
    pub fn new() -> Self {
        Self::default()
    }

    /// Хранилище с уже сохранённой личностью.
    pub fn with_user(user: &User) -> Self {
        let mut entries = Entries::new();
        write_user(&mut entries, user);
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> User {
        match self.entries.lock() {
            Ok(entries) => user_from_entries(&entries),
            Err(_) => {
                warn!("identity storage mutex poisoned");
                User::default()
            }
        }
    }

    fn save(&self, user: &User) -> IdentityResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| IdentityError::Unavailable("mutex poisoned".to_string()))?;
        write_user(&mut entries, user);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.is_empty())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_starts_empty() {
        let store = MemoryIdentityStore::new();
        assert!(store.is_empty());
        assert_eq!(store.load(), User::default());
    }

    #[test]
    fn memory_store_save_replaces_previous_values() {
        let store = MemoryIdentityStore::with_user(&User::new("alice", "data:a"));
        store
            .save(&User::new("bob", ""))
            .expect("save must succeed");

        assert_eq!(store.load(), User::new("bob", ""));
        assert!(!store.is_empty());
    }

    #[test]
    fn file_store_missing_file_loads_empty_user() {
        let dir = tempfile::tempdir().expect("tempdir must be created");
        let store = FileIdentityStore::new(dir.path().join("identity.json"));

        assert!(store.is_empty());
        assert_eq!(store.load(), User::default());
    }

    #[test]
    fn file_store_round_trips_under_two_keys() {
        let dir = tempfile::tempdir().expect("tempdir must be created");
        let path = dir.path().join("nested").join("identity.json");
        let store = FileIdentityStore::new(&path);

        store
            .save(&User::new("alice", "data:image/png;base64,AA=="))
            .expect("save must succeed");

        let raw = fs::read_to_string(&path).expect("file must exist");
        let entries: Entries = serde_json::from_str(&raw).expect("file must be json");
        assert_eq!(entries.get(USER_KEY).map(String::as_str), Some("alice"));
        assert_eq!(
            entries.get(AVATAR_KEY).map(String::as_str),
            Some("data:image/png;base64,AA==")
        );

        let reopened = FileIdentityStore::new(&path);
        assert_eq!(
            reopened.load(),
            User::new("alice", "data:image/png;base64,AA==")
        );
    }

    #[test]
    fn file_store_keeps_foreign_keys_and_counts_them_as_visit() {
        let dir = tempfile::tempdir().expect("tempdir must be created");
        let path = dir.path().join("identity.json");
        fs::write(&path, r#"{"THEME":"dark"}"#).expect("seed must be written");

        let store = FileIdentityStore::new(&path);
        assert!(!store.is_empty());
        assert_eq!(store.load(), User::default());

        store.save(&User::new("carol", "")).expect("save must succeed");
        let raw = fs::read_to_string(&path).expect("file must exist");
        assert!(raw.contains("THEME"));
    }

    #[test]
    fn file_store_corrupt_file_loads_empty_user() {
        let dir = tempfile::tempdir().expect("tempdir must be created");
        let path = dir.path().join("identity.json");
        fs::write(&path, "{not-json").expect("seed must be written");

        let store = FileIdentityStore::new(&path);
        assert_eq!(store.load(), User::default());
    }
}
