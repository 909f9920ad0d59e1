//! Endpoint configuration and the on-disk config store

use std::fs;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::types::{QuotrackError, Result};

/// One monitored relay endpoint.
///
/// The id stays stable across edits; it is identity, not content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointConfig {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub api_id: String,
    #[serde(default = "default_include_in_summary")]
    pub include_in_summary: bool,
}

fn default_include_in_summary() -> bool {
    true
}

impl EndpointConfig {
    /// Create a config with a fresh id
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            base_url: base_url.into(),
            api_id: api_id.into(),
            include_in_summary: true,
        }
    }

    pub fn user_stats_url(&self) -> String {
        format!(
            "{}/apiStats/api/user-stats",
            self.base_url.trim_end_matches('/')
        )
    }

    pub fn model_stats_url(&self) -> String {
        format!(
            "{}/apiStats/api/user-model-stats",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Durable, ordered list of endpoint configs with change notification.
///
/// Mutations persist to disk, then notify subscribers. Readers get a
/// snapshot copy; a refresh pass holds its copy for the whole pass.
pub struct ConfigStore {
    path: PathBuf,
    endpoints: RwLock<Vec<EndpointConfig>>,
    changed: watch::Sender<()>,
}

impl ConfigStore {
    /// Open the store at the default location (~/.quotrack/config.json)
    pub fn open() -> Result<Self> {
        Self::with_path(Self::default_path()?)
    }

    /// Open a store backed by a custom file (for testing)
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let endpoints = Self::load(&path)?;
        let (changed, _) = watch::channel(());
        Ok(Self {
            path,
            endpoints: RwLock::new(endpoints),
            changed,
        })
    }

    fn default_path() -> Result<PathBuf> {
        let home = directories::UserDirs::new()
            .ok_or_else(|| QuotrackError::Config("failed to get home directory".into()))?
            .home_dir()
            .to_path_buf();
        Ok(home.join(".quotrack").join("config.json"))
    }

    fn load(path: &PathBuf) -> Result<Vec<EndpointConfig>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| QuotrackError::Config(format!("invalid config format: {e}")))
    }

    fn save(&self, endpoints: &[EndpointConfig]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(endpoints)
            .map_err(|e| QuotrackError::Config(format!("serialization failed: {e}")))?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Current endpoint list, in display order (snapshot copy)
    pub fn endpoints(&self) -> Vec<EndpointConfig> {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up an endpoint by display name
    pub fn find_by_name(&self, name: &str) -> Option<EndpointConfig> {
        self.endpoints().into_iter().find(|ep| ep.name == name)
    }

    /// Append an endpoint, persist, and notify subscribers
    pub fn add(&self, endpoint: EndpointConfig) -> Result<()> {
        let snapshot = {
            let mut endpoints = self
                .endpoints
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            endpoints.push(endpoint);
            endpoints.clone()
        };
        self.save(&snapshot)?;
        let _ = self.changed.send(());
        Ok(())
    }

    /// Replace the endpoint with a matching id, keeping its position
    pub fn update(&self, endpoint: EndpointConfig) -> Result<()> {
        let snapshot = {
            let mut endpoints = self
                .endpoints
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = endpoints
                .iter_mut()
                .find(|ep| ep.id == endpoint.id)
                .ok_or_else(|| {
                    QuotrackError::Config(format!("no endpoint with id {}", endpoint.id))
                })?;
            *slot = endpoint;
            endpoints.clone()
        };
        self.save(&snapshot)?;
        let _ = self.changed.send(());
        Ok(())
    }

    /// Remove the endpoint with a matching id
    pub fn remove(&self, id: Uuid) -> Result<()> {
        let snapshot = {
            let mut endpoints = self
                .endpoints
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = endpoints.len();
            endpoints.retain(|ep| ep.id != id);
            if endpoints.len() == before {
                return Err(QuotrackError::Config(format!("no endpoint with id {id}")));
            }
            endpoints.clone()
        };
        self.save(&snapshot)?;
        let _ = self.changed.send(());
        Ok(())
    }

    /// Change notification stream; receivers wake after every mutation
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.changed.subscribe()
    }
}
