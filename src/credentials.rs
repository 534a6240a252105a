//! Stored credentials for logged-in environments
//!
//! `keys.yaml` sits next to `main_config.yaml` and keeps, per environment, the
//! username, the base64-encoded password and the OAuth client obtained through
//! dynamic client registration at login time.

use anyhow::{anyhow, Context, Result};
use dialoguer::{Input, Password};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::Path, path::PathBuf};

use crate::config::config_dir;
use crate::constants::KEYS_FILE;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    pub username: String,
    /// base64 of the plain password
    pub password: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

impl StoredCredential {
    pub fn new(creds: &BasicCredentials, client_id: &str, client_secret: &str) -> Self {
        StoredCredential {
            username: creds.username.clone(),
            password: base64::encode(&creds.password),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    pub fn basic(&self) -> Result<BasicCredentials> {
        let raw = base64::decode(&self.password)
            .with_context(|| format!("stored password for '{}' is corrupt", self.username))?;
        Ok(BasicCredentials {
            username: self.username.clone(),
            password: String::from_utf8(raw)?,
        })
    }

    pub fn has_client(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct KeyStore {
    #[serde(default)]
    pub environments: BTreeMap<String, StoredCredential>,
}

impl KeyStore {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(KeyStore::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading keys file {}", path.display()))?;
        if data.trim().is_empty() {
            return Ok(KeyStore::default());
        }
        let store: KeyStore = serde_yaml::from_str(&data)?;
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)?;
        fs::write(path, data).with_context(|| format!("writing keys file {}", path.display()))?;
        Ok(())
    }

    pub fn get(&self, env: &str) -> Option<&StoredCredential> {
        self.environments.get(env)
    }

    pub fn insert(&mut self, env: &str, cred: StoredCredential) {
        self.environments.insert(env.to_string(), cred);
    }

    pub fn remove(&mut self, env: &str) -> Option<StoredCredential> {
        self.environments.remove(env)
    }
}

pub fn keys_path() -> PathBuf {
    config_dir().join(KEYS_FILE)
}

/// Username and plain password
#[derive(Debug, Clone, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Value for an `Authorization: Basic ...` header
    pub fn header_value(&self) -> String {
        format!(
            "Basic {}",
            base64::encode_config(
                format!("{}:{}", self.username, self.password),
                base64::STANDARD
            )
        )
    }
}

/// Work out which credentials a command runs with
///
/// Flags win. Missing values come from the stored login for `env` when the
/// username matches (or none was given), and are prompted for otherwise.
pub fn resolve_credentials(
    env: &str,
    username: Option<&str>,
    password: Option<&str>,
    store: &KeyStore,
) -> Result<BasicCredentials> {
    let username = username.filter(|u| !u.is_empty());
    let password = password.filter(|p| !p.is_empty());

    if let (Some(u), Some(p)) = (username, password) {
        return Ok(BasicCredentials {
            username: u.to_string(),
            password: p.to_string(),
        });
    }

    if let Some(stored) = store.get(env) {
        if username.is_none() || username == Some(stored.username.as_str()) {
            tracing::debug!("using stored credentials of '{}' for {}", stored.username, env);
            let mut creds = stored.basic()?;
            if let Some(p) = password {
                creds.password = p.to_string();
            }
            return Ok(creds);
        }
    }

    let username = match username {
        Some(u) => u.to_string(),
        None => Input::<String>::new()
            .with_prompt(format!("Username for {env}"))
            .interact_text()
            .context("reading username")?,
    };
    if username.trim().is_empty() {
        return Err(anyhow!("username cannot be empty"));
    }
    let password = match password {
        Some(p) => p.to_string(),
        None => Password::new()
            .with_prompt(format!("Password for {username}"))
            .interact()
            .context("reading password")?,
    };
    Ok(BasicCredentials { username, password })
}
