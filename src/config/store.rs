//! Generic key/value persistence on a TOML document.
//!
//! Only the addressed `[section] key` is touched; every other table and key in
//! the file survives a write.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use toml::{Table, Value};
use tracing::debug;

const CLOUD_SECTION: &str = "cloud";
const DEFAULT_PROJECT_KEY: &str = "default_project";

/// Read `[section] key` from `file`. A missing file, section or key is `None`.
pub fn get_config_value(file: &Path, section: &str, key: &str) -> Result<Option<String>> {
    if !file.exists() {
        return Ok(None);
    }
    let table: Table = fs::read_to_string(file)?.parse()?;
    Ok(table
        .get(section)
        .and_then(Value::as_table)
        .and_then(|s| s.get(key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
}

/// Write `[section] key = value` into `file`, creating it (and its directory)
/// when needed.
pub fn set_config_value(file: &Path, section: &str, key: &str, value: &str) -> Result<()> {
    let mut table: Table = if file.exists() {
        fs::read_to_string(file)?.parse()?
    } else {
        Table::new()
    };

    let entry = table
        .entry(section.to_string())
        .or_insert_with(|| Value::Table(Table::new()));
    let Value::Table(section_table) = entry else {
        return Err(eyre!("`{section}` in {} is not a table", file.display()));
    };
    section_table.insert(key.to_string(), Value::String(value.to_string()));

    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(file, toml::to_string_pretty(&table)?)?;
    debug!(path = %file.display(), section, key, "Saved config value");
    Ok(())
}

/// Where the browser persists the default project.
pub trait ConfigStore: Send + Sync {
    fn default_project(&self) -> Result<Option<String>>;
    fn set_default_project(&self, project: &str) -> Result<()>;
}

/// [`ConfigStore`] backed by the user's config file.
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigStore for TomlConfigStore {
    fn default_project(&self) -> Result<Option<String>> {
        get_config_value(&self.path, CLOUD_SECTION, DEFAULT_PROJECT_KEY)
    }

    fn set_default_project(&self, project: &str) -> Result<()> {
        set_config_value(&self.path, CLOUD_SECTION, DEFAULT_PROJECT_KEY, project)
    }
}

/// In-memory store, used when no config directory exists and by tests.
#[derive(Default)]
pub struct MemoryStore {
    project: Mutex<Option<String>>,
}

impl ConfigStore for MemoryStore {
    fn default_project(&self) -> Result<Option<String>> {
        let project = self
            .project
            .lock()
            .map_err(|_| eyre!("config store lock poisoned"))?;
        Ok(project.clone())
    }

    fn set_default_project(&self, project: &str) -> Result<()> {
        let mut current = self
            .project
            .lock()
            .map_err(|_| eyre!("config store lock poisoned"))?;
        *current = Some(project.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("config.toml");

        assert_eq!(get_config_value(&file, "cloud", "default_project").unwrap(), None);
        set_config_value(&file, "cloud", "default_project", "p-123").unwrap();
        assert_eq!(
            get_config_value(&file, "cloud", "default_project").unwrap().as_deref(),
            Some("p-123")
        );
    }

    #[test]
    fn test_set_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(
            &file,
            "[theme]\nname = \"Catppuccin Latte\"\n\n[cloud]\nother = \"x\"\n",
        )
        .unwrap();

        set_config_value(&file, "cloud", "default_project", "p-9").unwrap();

        let table: Table = fs::read_to_string(&file).unwrap().parse().unwrap();
        assert_eq!(table["theme"]["name"].as_str(), Some("Catppuccin Latte"));
        assert_eq!(table["cloud"]["other"].as_str(), Some("x"));
        assert_eq!(table["cloud"]["default_project"].as_str(), Some("p-9"));
    }

    #[test]
    fn test_non_table_section_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(&file, "cloud = 3\n").unwrap();
        assert!(set_config_value(&file, "cloud", "default_project", "p").is_err());
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlConfigStore::new(dir.path().join("config.toml"));
        store.set_default_project("abc").unwrap();
        assert_eq!(store.default_project().unwrap().as_deref(), Some("abc"));

        let memory = MemoryStore::default();
        assert_eq!(memory.default_project().unwrap(), None);
        memory.set_default_project("xyz").unwrap();
        assert_eq!(memory.default_project().unwrap().as_deref(), Some("xyz"));
    }
}
