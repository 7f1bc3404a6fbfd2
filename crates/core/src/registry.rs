//! Field registry: the single mapping from [`FieldId`] to host control ids.
//!
//! The registry is built once at startup and shared by the rule engine, the hydrator and
//! whatever host renders the form. Deployments whose templates use different element ids
//! override individual entries from a YAML file:
//!
//! ```yaml
//! controls:
//!   national_id: rut_paciente
//!   death_date: fecha_defuncion
//! ```
//!
//! Unlisted fields keep their default ids. Unknown keys are rejected so that a typo in
//! the file fails loudly at startup instead of silently leaving a control unbound.

use crate::fields::FieldId;
use crate::{KardexError, KardexResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRegistry {
    controls: BTreeMap<FieldId, String>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        let controls = FieldId::ALL
            .into_iter()
            .map(|f| (f, f.default_control_id().to_string()))
            .collect();
        Self { controls }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryWire {
    #[serde(default)]
    controls: BTreeMap<FieldId, String>,
}

impl FieldRegistry {
    /// Parse registry overrides from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`KardexError::RegistrySchema`] with the offending path when the YAML does
    /// not match the expected shape, and [`KardexError::InvalidInput`] when an override is
    /// blank or two fields end up bound to the same control.
    pub fn from_yaml_str(yaml_text: &str) -> KardexResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, RegistryWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(KardexError::RegistrySchema {
                    path,
                    message: source.to_string(),
                });
            }
        };

        let mut registry = Self::default();
        for (field, control_id) in wire.controls {
            let control_id = control_id.trim();
            if control_id.is_empty() {
                return Err(KardexError::InvalidInput(format!(
                    "control id for '{field}' cannot be empty"
                )));
            }
            registry.controls.insert(field, control_id.to_string());
        }
        registry.ensure_unique()?;
        Ok(registry)
    }

    /// Load registry overrides from a YAML file.
    pub fn load(path: &Path) -> KardexResult<Self> {
        let text = std::fs::read_to_string(path).map_err(KardexError::RegistryRead)?;
        Self::from_yaml_str(&text)
    }

    fn ensure_unique(&self) -> KardexResult<()> {
        let mut seen: HashMap<&str, FieldId> = HashMap::new();
        for (field, control_id) in &self.controls {
            if let Some(other) = seen.insert(control_id.as_str(), *field) {
                return Err(KardexError::InvalidInput(format!(
                    "control id '{control_id}' is bound to both '{other}' and '{field}'"
                )));
            }
        }
        Ok(())
    }

    pub fn control_id(&self, field: FieldId) -> &str {
        self.controls
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_control_id())
    }

    /// Reverse lookup used when the host reports a change event by element id.
    pub fn field_for_control(&self, control_id: &str) -> Option<FieldId> {
        self.controls
            .iter()
            .find(|(_, id)| id.as_str() == control_id)
            .map(|(field, _)| *field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.controls.iter().map(|(f, id)| (*f, id.as_str()))
    }
}
