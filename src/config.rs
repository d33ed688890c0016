use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "./config.json";

/// Persisted settings. A missing or unreadable file yields the empty value,
/// which the bootstrap flow then fills in interactively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, deserialize_with = "null_as_default")]
    pub api_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub domains: Vec<String>,
    /// Fully-qualified record names managed per domain, in selection order
    #[serde(default, deserialize_with = "subdomain_lists")]
    pub selected_subdomains: BTreeMap<String, Vec<String>>,
}

/// A `null` field reads as empty instead of rejecting the whole file.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn subdomain_lists<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let lists: Option<BTreeMap<String, Option<Vec<String>>>> = Option::deserialize(deserializer)?;
    Ok(lists
        .unwrap_or_default()
        .into_iter()
        .map(|(domain, names)| (domain, names.unwrap_or_default()))
        .collect())
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No usable config file at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Ignoring unparsable config file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, json).map_err(|e| {
            Error::config(format!(
                "Failed to save config file {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Configuration saved successfully.");
        Ok(())
    }

    /// Saves, reporting a failure without aborting; the in-memory value stays
    /// authoritative for the rest of the run.
    pub fn persist<P: AsRef<Path>>(&self, path: P) {
        if let Err(e) = self.save(path) {
            log::error!("{}", e);
        }
    }

    pub fn subdomains(&self, domain: &str) -> &[String] {
        self.selected_subdomains
            .get(domain)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends names not already selected for `domain`, returning how many
    /// were new.
    pub fn add_subdomains<I>(&mut self, domain: &str, names: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let selected = self
            .selected_subdomains
            .entry(domain.to_string())
            .or_default();

        let mut added = 0;
        for name in names {
            if !selected.contains(&name) {
                selected.push(name);
                added += 1;
            }
        }
        added
    }
}
