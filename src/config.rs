use serde_derive::Deserialize;
use std::io::Read;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use thiserror::*;

/// Environment variable naming the YAML config file.
pub const CONFIG_ENV: &str = "TODOLIST_CONFIG";

pub const APPWRITE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
pub const PROJECT_ID: &str = "679f460b001cb5d392bd";
pub const DATABASE_ID: &str = "679f473500213f729a36";
pub const COLLECTION_ID: &str = "679f4753000b743d333d";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error {0} when reading config")]
    IoError(#[from] std::io::Error),
    #[error("cannot open config file '{0}' : {1}")]
    OpeningError(PathBuf, std::io::Error),
    #[error("UTF8 format error when reading config")]
    Utf8Error,
    #[error("format error {0} when reading config")]
    FormatError(#[from] serde_yaml::Error),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Appwrite,
    /// Throwaway in-process collection, handy without a project at hand.
    Memory,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Appwrite
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppwriteConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    #[serde(default = "default_collection_id")]
    pub collection_id: String,
    pub api_key: Option<String>,
    pub timeout_millis: Option<u64>,
}

impl Default for AppwriteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: default_project_id(),
            database_id: default_database_id(),
            collection_id: default_collection_id(),
            api_key: None,
            timeout_millis: None,
        }
    }
}

fn default_endpoint() -> String {
    APPWRITE_ENDPOINT.to_string()
}

fn default_project_id() -> String {
    PROJECT_ID.to_string()
}

fn default_database_id() -> String {
    DATABASE_ID.to_string()
}

fn default_collection_id() -> String {
    COLLECTION_ID.to_string()
}

#[derive(Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub appwrite: AppwriteConfig,
    pub log: Option<crate::log::Log>,
}

impl Config {
    pub fn from_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(&s)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let p = path.as_ref();
        let mut file = File::open(p).map_err(|e| ConfigError::OpeningError(p.to_owned(), e))?;
        let mut contents = vec![];
        file.read_to_end(&mut contents)?;
        let contents = String::from_utf8(contents).map_err(|_| ConfigError::Utf8Error)?;
        let config = Config::from_str(&contents)?;
        Ok(config)
    }

    /// Reads the file named by `TODOLIST_CONFIG`, or falls back to the
    /// built-in project settings.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Config::from_file(path),
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Appwrite);
        assert_eq!(config.appwrite.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(config.appwrite.project_id, "679f460b001cb5d392bd");
        assert_eq!(config.appwrite.database_id, "679f473500213f729a36");
        assert_eq!(config.appwrite.collection_id, "679f4753000b743d333d");
        assert!(config.log.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_str(
            r#"
        log:
            level: debug
        appwrite:
            endpoint: http://localhost/v1
            api_key: secret
            timeout_millis: 3000
        "#,
        )
        .unwrap();

        assert_eq!(config.appwrite.endpoint, "http://localhost/v1");
        assert_eq!(config.appwrite.project_id, PROJECT_ID);
        assert_eq!(config.appwrite.api_key.as_deref(), Some("secret"));
        assert_eq!(config.appwrite.timeout_millis, Some(3000));
        assert_eq!(config.log.unwrap().level, "debug");
    }

    #[test]
    fn test_memory_backend() {
        let config = Config::from_str("backend: memory").unwrap();
        assert_eq!(config.backend, Backend::Memory);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("todolist-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "appwrite:\n    project_id: other").unwrap();

        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.appwrite.project_id, "other");

        let err = Config::from_file(&path).err().unwrap();
        assert!(matches!(err, ConfigError::OpeningError(_, _)));
    }
}
