//! Durable session storage
//!
//! [`SessionStore`] keeps the transcript and the current city in a
//! [`KeyValueStore`]. The key names and the JSON transcript format are the
//! ones the web client uses, so a session can move between front ends.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::state::{Message, Session};

/// Key holding the serialized transcript
pub const TRANSCRIPT_KEY: &str = "chatHistory";

/// Key holding the current city as plain text
pub const CITY_KEY: &str = "currentCity";

/// Values that have ended up stored as a city but are never a real place
pub const CITY_BLOCKLIST: &[&str] = &["погода", "погоди", "weather"];

/// Minimal durable string storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, lost when dropped
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk
///
/// Every call reads the file; every write rewrites it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/gid/session.json`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::Storage("Could not determine data directory".to_string()))?;

        Ok(data_dir.join("gid").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Case-insensitive check against [`CITY_BLOCKLIST`]
pub fn is_blocked_city(city: &str) -> bool {
    let lowered = city.trim().to_lowercase();
    CITY_BLOCKLIST.iter().any(|blocked| *blocked == lowered)
}

/// Transcript and city persistence on top of a [`KeyValueStore`]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Persisted transcript, or an empty one if nothing usable is stored
    pub fn load(&self) -> Vec<Message> {
        let raw = match self.store.get(TRANSCRIPT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read transcript, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(error = %e, "stored transcript is malformed, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save(&mut self, transcript: &[Message]) -> Result<()> {
        let raw = serde_json::to_string(transcript)?;
        self.store.set(TRANSCRIPT_KEY, &raw)?;
        debug!(messages = transcript.len(), "transcript saved");
        Ok(())
    }

    pub fn append(&mut self, message: Message) -> Result<()> {
        let mut transcript = self.load();
        transcript.push(message);
        self.save(&transcript)
    }

    /// Stores `city` unless it is blank; a blank value never overwrites a real one.
    pub fn set_city(&mut self, city: &str) -> Result<()> {
        if city.trim().is_empty() {
            debug!("ignoring blank city");
            return Ok(());
        }

        self.store.set(CITY_KEY, city)?;
        debug!(city, "city saved");
        Ok(())
    }

    /// Current city, with blocklisted placeholders dropped from storage
    pub fn get_city(&mut self) -> Option<String> {
        let city = match self.store.get(CITY_KEY) {
            Ok(city) => city?,
            Err(e) => {
                warn!(error = %e, "failed to read city");
                return None;
            }
        };

        if is_blocked_city(&city) {
            warn!(city = %city, "removing placeholder city from storage");
            if let Err(e) = self.store.remove(CITY_KEY) {
                warn!(error = %e, "failed to remove placeholder city");
            }
            return None;
        }

        if city.trim().is_empty() {
            return None;
        }

        Some(city)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(TRANSCRIPT_KEY)?;
        self.store.remove(CITY_KEY)?;
        debug!("session cleared");
        Ok(())
    }

    /// Rebuilds the in-memory session from storage
    pub fn restore(&mut self) -> Session {
        Session {
            transcript: self.load(),
            current_city: self.get_city(),
        }
    }
}
