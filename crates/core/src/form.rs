//! In-memory model of the patient intake form.
//!
//! [`PatientForm`] holds one [`Control`] per registered field. The rule engine, the
//! hydrator and the submission checks operate on this model; a host (browser binding,
//! terminal front end, test) renders it using the control ids from the
//! [`FieldRegistry`].

use crate::constants::{CHECKBOX_ON_VALUE, CSRF_FIELD_NAME};
use crate::fields::{FieldId, FieldKind};
use crate::registry::FieldRegistry;
use crate::rules::{self, PatientFlags};
use serde::Serialize;
use std::collections::BTreeMap;

/// State of a single form control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Control {
    pub control_id: String,
    pub kind: FieldKind,
    /// Text content, or the selected option's value for selects. Unused for checkboxes.
    pub value: String,
    /// Display text of the selected option, when it differs from `value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub checked: bool,
    pub enabled: bool,
    pub required: bool,
    /// Server-side validation message attached next to the control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Control {
    fn new(control_id: &str, kind: FieldKind) -> Self {
        Self {
            control_id: control_id.to_string(),
            kind,
            value: String::new(),
            label: None,
            checked: false,
            enabled: true,
            required: false,
            feedback: None,
        }
    }

    /// Empty the control: checkboxes are unchecked, everything else loses its value.
    pub fn clear(&mut self) {
        match self.kind {
            FieldKind::Checkbox => self.checked = false,
            FieldKind::Text | FieldKind::Select | FieldKind::Date => {
                self.value.clear();
                self.label = None;
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        match self.kind {
            FieldKind::Checkbox => !self.checked,
            _ => self.value.trim().is_empty(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PatientForm {
    #[serde(skip)]
    registry: FieldRegistry,
    controls: BTreeMap<FieldId, Control>,
    #[serde(skip_serializing_if = "Option::is_none")]
    focused: Option<FieldId>,
}

impl Default for PatientForm {
    fn default() -> Self {
        Self::new(FieldRegistry::default())
    }
}

impl PatientForm {
    /// Build an empty form with one control per registered field.
    ///
    /// Field state is not reconciled here; call [`rules::apply_rules`] (or
    /// [`PatientForm::initialised`]) before showing the form.
    pub fn new(registry: FieldRegistry) -> Self {
        let controls = registry
            .iter()
            .map(|(field, control_id)| (field, Control::new(control_id, field.kind())))
            .collect();
        Self {
            registry,
            controls,
            focused: None,
        }
    }

    /// Build an empty form and apply the rules for the all-false flags, the state a
    /// freshly loaded intake page starts in.
    pub fn initialised(registry: FieldRegistry) -> Self {
        let mut form = Self::new(registry);
        rules::apply_rules(&mut form);
        form
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn control(&self, field: FieldId) -> &Control {
        // Every FieldId is inserted in `new`; the registry always covers all of them.
        &self.controls[&field]
    }

    pub fn control_mut(&mut self, field: FieldId) -> &mut Control {
        self.controls
            .get_mut(&field)
            .unwrap_or_else(|| unreachable!("form is missing control for {field}"))
    }

    pub fn value(&self, field: FieldId) -> &str {
        &self.control(field).value
    }

    pub fn is_checked(&self, field: FieldId) -> bool {
        self.control(field).checked
    }

    pub fn set_value(&mut self, field: FieldId, value: impl Into<String>) {
        let control = self.control_mut(field);
        control.value = value.into();
        control.label = None;
    }

    pub fn set_checked(&mut self, field: FieldId, checked: bool) {
        self.control_mut(field).checked = checked;
    }

    /// Select an option whose stored value differs from its display text (record
    /// dropdowns store the record id but show its number).
    pub fn set_selected(
        &mut self,
        field: FieldId,
        value: impl Into<String>,
        label: impl Into<String>,
    ) {
        let control = self.control_mut(field);
        control.value = value.into();
        control.label = Some(label.into());
    }

    /// Read the patient status flags from their checkboxes.
    pub fn flags(&self) -> PatientFlags {
        PatientFlags {
            newborn: self.is_checked(FieldId::Newborn),
            foreign_national: self.is_checked(FieldId::Foreign),
            deceased: self.is_checked(FieldId::Deceased),
        }
    }

    /// Handle a host change event. Returns `true` when the change touched a status flag
    /// and the field rules were re-applied.
    pub fn on_change(&mut self, control_id: &str) -> bool {
        match self.registry.field_for_control(control_id) {
            Some(field) if field.is_flag() => {
                rules::apply_rules(self);
                true
            }
            _ => false,
        }
    }

    pub fn focus(&mut self, field: FieldId) {
        self.focused = Some(field);
    }

    pub fn focused(&self) -> Option<FieldId> {
        self.focused
    }

    pub fn clear_feedback(&mut self) {
        for control in self.controls.values_mut() {
            control.feedback = None;
        }
    }

    /// Reset every control to its empty state and drop focus and feedback.
    pub fn reset(&mut self) {
        for control in self.controls.values_mut() {
            control.clear();
            control.feedback = None;
        }
        self.focused = None;
        rules::apply_rules(self);
    }

    /// Name/value pairs a browser would submit for this form.
    ///
    /// Disabled controls and unchecked checkboxes are omitted. The CSRF token goes first.
    pub fn form_data(&self, csrf_token: &str) -> Vec<(String, String)> {
        let mut data = vec![(CSRF_FIELD_NAME.to_string(), csrf_token.to_string())];
        for (field, control) in &self.controls {
            if !control.enabled {
                continue;
            }
            let value = match control.kind {
                FieldKind::Checkbox if control.checked => CHECKBOX_ON_VALUE.to_string(),
                FieldKind::Checkbox => continue,
                _ => control.value.clone(),
            };
            data.push((field.form_name().to_string(), value));
        }
        data
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Control)> {
        self.controls.iter().map(|(f, c)| (*f, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_has_every_field_empty_and_enabled() {
        let form = PatientForm::default();
        assert_eq!(form.iter().count(), FieldId::ALL.len());
        for (_, control) in form.iter() {
            assert!(control.enabled);
            assert!(!control.required);
            assert!(control.is_blank());
        }
    }

    #[test]
    fn clear_respects_control_kind() {
        let mut form = PatientForm::default();
        form.set_checked(FieldId::UseMotherAsGuardian, true);
        form.set_selected(FieldId::RecordNumber, "12", "Ficha 4410");

        form.control_mut(FieldId::UseMotherAsGuardian).clear();
        form.control_mut(FieldId::RecordNumber).clear();

        assert!(!form.is_checked(FieldId::UseMotherAsGuardian));
        assert_eq!(form.value(FieldId::RecordNumber), "");
        assert!(form.control(FieldId::RecordNumber).label.is_none());
    }

    #[test]
    fn flags_follow_checkboxes() {
        let mut form = PatientForm::default();
        form.set_checked(FieldId::Newborn, true);
        form.set_checked(FieldId::Deceased, true);

        let flags = form.flags();
        assert!(flags.newborn);
        assert!(!flags.foreign_national);
        assert!(flags.deceased);
    }

    #[test]
    fn change_on_flag_reapplies_rules() {
        let mut form = PatientForm::initialised(FieldRegistry::default());
        assert!(!form.control(FieldId::DeathDate).enabled);

        form.set_checked(FieldId::Deceased, true);
        assert!(form.on_change("fallecido_paciente"));

        assert!(form.control(FieldId::DeathDate).enabled);
        assert!(form.control(FieldId::DeathDate).required);
    }

    #[test]
    fn change_on_other_control_is_ignored() {
        let mut form = PatientForm::initialised(FieldRegistry::default());
        assert!(!form.on_change("nombre_paciente"));
        assert!(!form.on_change("not_a_control"));
    }

    #[test]
    fn form_data_skips_disabled_and_unchecked_controls() {
        let mut form = PatientForm::initialised(FieldRegistry::default());
        form.set_value(FieldId::NationalId, "12345678-5");
        form.set_checked(FieldId::Deceased, true);
        form.on_change("fallecido_paciente");
        form.set_value(FieldId::DeathDate, "02/05/2020");

        let data = form.form_data("tok");
        assert_eq!(data[0], ("csrfmiddlewaretoken".to_string(), "tok".to_string()));
        assert!(data.contains(&("rut".to_string(), "12345678-5".to_string())));
        assert!(data.contains(&("fallecido".to_string(), "on".to_string())));
        assert!(data.contains(&("fecha_fallecimiento".to_string(), "02/05/2020".to_string())));
        assert!(!data.iter().any(|(name, _)| name == "recien_nacido"));
        assert!(!data.iter().any(|(name, _)| name == "nie"));
    }

    #[test]
    fn reset_clears_values_focus_and_feedback() {
        let mut form = PatientForm::initialised(FieldRegistry::default());
        form.set_value(FieldId::Name, "Ana");
        form.set_checked(FieldId::Foreign, true);
        form.control_mut(FieldId::Name).feedback = Some("too short".into());
        form.focus(FieldId::Name);

        form.reset();

        assert_eq!(form.value(FieldId::Name), "");
        assert!(!form.is_checked(FieldId::Foreign));
        assert!(form.control(FieldId::Name).feedback.is_none());
        assert!(form.focused().is_none());
        assert!(form.control(FieldId::NationalId).required);
    }
}
