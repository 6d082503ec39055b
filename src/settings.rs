use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};
use tokio::sync::watch;

/// User focus preferences. Field names match the extension storage keys,
/// so a settings file written by the browser surface loads unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub warnings_enabled: bool,
    pub extension_paused: bool,
    pub preferred_content: Vec<String>,
    pub non_preferred_content: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            warnings_enabled: true,
            extension_paused: false,
            preferred_content: Vec::new(),
            non_preferred_content: Vec::new(),
        }
    }
}

/// Disk-backed preference store. Reads go through an in-memory copy;
/// every mutation persists before it is observable, and subscribers get
/// the updated snapshot through a watch channel.
pub struct PreferenceStore {
    path: PathBuf,
    data: RwLock<Preferences>,
    changes: watch::Sender<Preferences>,
}

impl PreferenceStore {
    /// Opens the store, creating the file with defaults on first run.
    /// A corrupt file falls back to defaults rather than failing startup.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            let defaults = Preferences::default();
            persist_to(&path, &defaults)?;
            defaults
        };

        let (changes, _) = watch::channel(data.clone());
        Ok(Self {
            path,
            data: RwLock::new(data),
            changes,
        })
    }

    pub fn snapshot(&self) -> Preferences {
        self.data.read().unwrap().clone()
    }

    /// Change feed; receivers see the snapshot current at subscription
    /// time and every persisted update after it.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.changes.subscribe()
    }

    pub fn set_warnings_enabled(&self, enabled: bool) -> Result<()> {
        self.update(|prefs| prefs.warnings_enabled = enabled)
    }

    pub fn set_extension_paused(&self, paused: bool) -> Result<()> {
        self.update(|prefs| prefs.extension_paused = paused)
    }

    pub fn set_preferred_content(&self, topics: Vec<String>) -> Result<()> {
        self.update(|prefs| prefs.preferred_content = topics)
    }

    pub fn set_non_preferred_content(&self, topics: Vec<String>) -> Result<()> {
        self.update(|prefs| prefs.non_preferred_content = topics)
    }

    /// Re-reads the file, replacing the in-memory copy. Used when another
    /// process owns the settings surface and edits the file directly.
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {}", self.path.display()))?;
        let data: Preferences = serde_json::from_str(&contents)?;
        let updated = {
            let mut guard = self.data.write().unwrap();
            *guard = data;
            guard.clone()
        };
        let _ = self.changes.send(updated);
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) -> Result<()> {
        let updated = {
            let mut guard = self.data.write().unwrap();
            apply(&mut guard);
            persist_to(&self.path, &guard)?;
            guard.clone()
        };
        let _ = self.changes.send(updated);
        Ok(())
    }
}

fn persist_to(path: &Path, data: &Preferences) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let serialized = serde_json::to_string_pretty(data)?;
    fs::write(path, serialized)
        .with_context(|| format!("Failed to write preferences to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> PreferenceStore {
        PreferenceStore::new(dir.path().join("settings.json")).unwrap()
    }

    #[test]
    fn first_run_writes_defaults_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = PreferenceStore::new(path.clone()).unwrap();

        assert_eq!(store.snapshot(), Preferences::default());
        let on_disk: Preferences =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(on_disk.warnings_enabled);
        assert!(!on_disk.extension_paused);
    }

    #[test]
    fn partial_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"extensionPaused": true}"#).unwrap();

        let store = PreferenceStore::new(path).unwrap();
        let prefs = store.snapshot();
        assert!(prefs.extension_paused);
        assert!(prefs.warnings_enabled);
        assert!(prefs.preferred_content.is_empty());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();

        let store = PreferenceStore::new(path).unwrap();
        assert_eq!(store.snapshot(), Preferences::default());
    }

    #[test]
    fn mutations_persist_and_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = store_in(&dir);
            store.set_extension_paused(true).unwrap();
            store
                .set_non_preferred_content(vec!["gaming".into(), "gossip".into()])
                .unwrap();
        }
        let reopened = store_in(&dir);
        let prefs = reopened.snapshot();
        assert!(prefs.extension_paused);
        assert_eq!(prefs.non_preferred_content, vec!["gaming", "gossip"]);
    }

    #[test]
    fn subscribers_observe_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut rx = store.subscribe();

        assert!(rx.borrow().warnings_enabled);
        store.set_warnings_enabled(false).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().warnings_enabled);
    }

    #[test]
    fn stored_keys_use_extension_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = PreferenceStore::new(path.clone()).unwrap();
        store.set_preferred_content(vec!["rust".into()]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"warningsEnabled\""));
        assert!(raw.contains("\"preferredContent\""));
        assert!(raw.contains("\"nonPreferredContent\""));
    }
}
