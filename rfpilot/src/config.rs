//! Credential and logging configuration.
//!
//! The core only ever consumes a resolved credential record; how the file
//! gets provisioned (vault export, CI secret, ...) is out of scope.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AutomationError;

/// Everything needed to reach one WMS environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvCredentials {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub warehouse_code: String,
    pub schema: String,
}

/// Credentials keyed by environment name ("qa", "uat", ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialStore {
    environments: HashMap<String, EnvCredentials>,
}

impl CredentialStore {
    pub fn from_json(raw: &str) -> Result<Self, AutomationError> {
        serde_json::from_str(raw)
            .map_err(|e| AutomationError::ConfigError(format!("credential parse: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AutomationError::ConfigError(format!(
                "credential file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&raw)
    }

    pub fn resolve(&self, environment: &str) -> Result<&EnvCredentials, AutomationError> {
        self.environments.get(environment).ok_or_else(|| {
            AutomationError::ConfigError(format!("unknown environment: {environment}"))
        })
    }
}

/// Explicit logging/verbosity configuration, created once at composition
/// time and read-only afterwards. Replaces the module-level mutable
/// toggles of earlier revisions.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log frame-text previews after each RF primitive.
    pub verbose_rf: bool,
    /// Log every poll tick of the change-wait loop.
    pub verbose_wait: bool,
}

/// Behavior knobs for the RF layers, fixed per session.
#[derive(Debug, Clone, Default)]
pub struct RfOptions {
    pub wait: crate::wait::WaitConfig,
    pub log: LogConfig,
    /// Auto-accept informational banners after auto-enter scans.
    pub auto_accept_info: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_environments_from_json() {
        let store = CredentialStore::from_json(
            r#"{
                "environments": {
                    "qa": {
                        "server_url": "https://wms-qa.example/rf",
                        "username": "rfuser",
                        "password": "hunter2",
                        "warehouse_code": "WH1",
                        "schema": "WMS_QA"
                    }
                }
            }"#,
        )
        .unwrap();

        let qa = store.resolve("qa").unwrap();
        assert_eq!(qa.warehouse_code, "WH1");
        assert!(matches!(
            store.resolve("prod"),
            Err(AutomationError::ConfigError(_))
        ));
    }
}
