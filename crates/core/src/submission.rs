//! Response envelopes of the form-submit and mark-received endpoints, and application of
//! server-side validation errors to the form.

use crate::constants::FEEDBACK_SEPARATOR;
use crate::fields::FieldId;
use crate::form::PatientForm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Envelope returned by an AJAX form POST.
///
/// Success: `{ "success": true, "message": "...", "level": "success" }`.
/// Failure: `{ "success": false, "message": "...", "errors": { "field": ["..."] } }`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FormResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

/// What the host should show after a submission round trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SubmitOutcome {
    Accepted {
        message: Option<String>,
        level: Option<String>,
    },
    Rejected {
        message: Option<String>,
        /// Error keys that matched no control on the form.
        unmatched: Vec<String>,
    },
}

impl FormResponse {
    /// Resolve the envelope against `form`: on failure the per-field errors are attached.
    pub fn resolve(self, form: &mut PatientForm) -> SubmitOutcome {
        if self.success {
            form.clear_feedback();
            return SubmitOutcome::Accepted {
                message: self.message,
                level: self.level,
            };
        }
        let unmatched = apply_server_errors(form, &self.errors);
        SubmitOutcome::Rejected {
            message: self.message,
            unmatched,
        }
    }
}

/// Attach server-side validation messages to their controls.
///
/// Earlier feedback is cleared first. Each matching control receives its messages joined
/// with `", "`. Keys that name no field on the form are returned so the caller can show
/// them elsewhere.
pub fn apply_server_errors(
    form: &mut PatientForm,
    errors: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    form.clear_feedback();

    let mut unmatched = Vec::new();
    for (name, messages) in errors {
        match FieldId::from_form_name(name) {
            Some(field) => {
                form.control_mut(field).feedback = Some(messages.join(FEEDBACK_SEPARATOR));
            }
            None => unmatched.push(name.clone()),
        }
    }
    if !unmatched.is_empty() {
        tracing::debug!(?unmatched, "server errors without a matching control");
    }
    unmatched
}

/// Body of a mark-received POST (the CSRF token is added by the transport).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReceivedRequest {
    /// Reception timestamp; the backend uses "now" when absent or unparseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_entrada: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacion_entrada: Option<String>,
}

impl MarkReceivedRequest {
    pub fn form_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(fecha) = &self.fecha_entrada {
            pairs.push(("fecha_entrada", fecha.clone()));
        }
        if let Some(obs) = &self.observacion_entrada {
            pairs.push(("observacion_entrada", obs.clone()));
        }
        pairs
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarkReceivedResponse {
    pub ok: bool,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_success_envelope() {
        let resp: FormResponse = serde_json::from_value(json!({
            "success": true,
            "message": "Paciente guardado",
            "level": "success"
        }))
        .expect("envelope");
        assert!(resp.success);
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn failure_attaches_joined_messages() {
        let mut form = PatientForm::default();
        let resp: FormResponse = serde_json::from_value(json!({
            "success": false,
            "message": "Revise el formulario",
            "errors": {
                "rut": ["Ya existe", "Formato inválido"],
                "__all__": ["Error general"]
            }
        }))
        .expect("envelope");

        let outcome = resp.resolve(&mut form);

        assert_eq!(
            form.control(FieldId::NationalId).feedback.as_deref(),
            Some("Ya existe, Formato inválido")
        );
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                message: Some("Revise el formulario".into()),
                unmatched: vec!["__all__".into()],
            }
        );
    }

    #[test]
    fn new_errors_replace_old_feedback() {
        let mut form = PatientForm::default();
        form.control_mut(FieldId::Passport).feedback = Some("stale".into());

        let errors = BTreeMap::from([("nombre".to_string(), vec!["Requerido".to_string()])]);
        apply_server_errors(&mut form, &errors);

        assert!(form.control(FieldId::Passport).feedback.is_none());
        assert_eq!(form.control(FieldId::Name).feedback.as_deref(), Some("Requerido"));
    }

    #[test]
    fn success_clears_feedback() {
        let mut form = PatientForm::default();
        form.control_mut(FieldId::Name).feedback = Some("Requerido".into());
        let resp = FormResponse {
            success: true,
            message: None,
            level: None,
            errors: BTreeMap::new(),
        };
        assert!(matches!(resp.resolve(&mut form), SubmitOutcome::Accepted { .. }));
        assert!(form.control(FieldId::Name).feedback.is_none());
    }

    #[test]
    fn mark_received_pairs_skip_missing_values() {
        let request = MarkReceivedRequest {
            fecha_entrada: Some("2024-05-01T10:00".into()),
            observacion_entrada: None,
        };
        assert_eq!(
            request.form_pairs(),
            vec![("fecha_entrada", "2024-05-01T10:00".to_string())]
        );
    }

    #[test]
    fn mark_received_response_variants() {
        let ok: MarkReceivedResponse =
            serde_json::from_value(json!({ "ok": true, "id": 900 })).expect("ok");
        assert_eq!(ok.id, Some(900));
        let err: MarkReceivedResponse =
            serde_json::from_value(json!({ "ok": false, "error": "No encontrado" })).expect("err");
        assert_eq!(err.error.as_deref(), Some("No encontrado"));
    }
}
