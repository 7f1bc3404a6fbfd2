//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the session and the
//! HTTP client. Library code never reads environment variables itself; binaries read them
//! and hand the raw values to the `*_from_env_value` helpers below.

use crate::constants::DEFAULT_API_BASE_URL;
use crate::record::PatientPath;
use crate::registry::FieldRegistry;
use crate::{KardexError, KardexResult};
use std::path::PathBuf;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_base_url: String,
    patient_path: PatientPath,
    registry: FieldRegistry,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// The base URL must be an `http://` or `https://` URL; a trailing slash is dropped so
    /// endpoint paths can be appended directly.
    pub fn new(
        api_base_url: impl Into<String>,
        patient_path: PatientPath,
        registry: FieldRegistry,
    ) -> KardexResult<Self> {
        let api_base_url = api_base_url.into();
        let trimmed = api_base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(KardexError::InvalidInput(
                "api_base_url cannot be empty".into(),
            ));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(KardexError::InvalidInput(format!(
                "api_base_url must start with http:// or https://, got '{trimmed}'"
            )));
        }

        Ok(Self {
            api_base_url: trimmed.to_string(),
            patient_path,
            registry,
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Absolute URL for an endpoint path such as `/api/recepcion-ficha/`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn patient_path(&self) -> PatientPath {
        self.patient_path
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            patient_path: PatientPath::default(),
            registry: FieldRegistry::default(),
        }
    }
}

/// Parse the API base URL from an optional value, falling back to the local default.
pub fn api_base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

/// Parse the patient path from an optional value.
///
/// If `value` is `None` or empty/whitespace, returns [`PatientPath::IngresoPaciente`].
pub fn patient_path_from_env_value(value: Option<String>) -> KardexResult<PatientPath> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<PatientPath>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Load the field registry from an optional YAML override file.
pub fn registry_from_env_value(value: Option<PathBuf>) -> KardexResult<FieldRegistry> {
    match value {
        Some(path) => {
            tracing::info!("loading field registry from {}", path.display());
            FieldRegistry::load(&path)
        }
        None => Ok(FieldRegistry::default()),
    }
}
