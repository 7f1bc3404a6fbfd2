//! Field-rule engine.
//!
//! Maps the three patient status flags to the enabled/required state of the governed
//! fields. Each governed field starts enabled and optional; every one of the eight flag
//! combinations then disables a fixed set and marks a fixed set required. The match in
//! [`rule_row`] is exhaustive over the combinations, so exactly one row applies.

use crate::fields::FieldId;
use crate::form::PatientForm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Patient status as read from the newborn/foreign/deceased checkboxes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientFlags {
    pub newborn: bool,
    pub foreign_national: bool,
    pub deceased: bool,
}

impl PatientFlags {
    pub fn new(newborn: bool, foreign_national: bool, deceased: bool) -> Self {
        Self {
            newborn,
            foreign_national,
            deceased,
        }
    }

    /// All eight combinations, in (newborn, foreign, deceased) binary order.
    pub fn all() -> impl Iterator<Item = PatientFlags> {
        (0u8..8).map(|bits| PatientFlags::new(bits & 4 != 0, bits & 2 != 0, bits & 1 != 0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRequirement {
    pub enabled: bool,
    pub required: bool,
}

/// Computed state of every governed field for one flag combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldState(BTreeMap<FieldId, FieldRequirement>);

impl FieldState {
    pub fn get(&self, field: FieldId) -> Option<FieldRequirement> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, FieldRequirement)> + '_ {
        self.0.iter().map(|(f, r)| (*f, *r))
    }

    pub fn enabled_fields(&self) -> Vec<FieldId> {
        self.iter().filter(|(_, r)| r.enabled).map(|(f, _)| f).collect()
    }

    pub fn disabled_fields(&self) -> Vec<FieldId> {
        self.iter().filter(|(_, r)| !r.enabled).map(|(f, _)| f).collect()
    }

    pub fn required_fields(&self) -> Vec<FieldId> {
        self.iter().filter(|(_, r)| r.required).map(|(f, _)| f).collect()
    }
}

use FieldId::{
    DeathDate, ForeignId, MotherNationalId, NationalId, Occupation, PartnerName, Passport,
    TempGuardianId, UseMotherAsGuardian,
};

/// Disabled and required fields for one flag combination.
fn rule_row(flags: PatientFlags) -> (&'static [FieldId], &'static [FieldId]) {
    match (flags.newborn, flags.foreign_national, flags.deceased) {
        (false, false, false) => (
            &[ForeignId, Passport, TempGuardianId, UseMotherAsGuardian, DeathDate],
            &[NationalId],
        ),
        (false, false, true) => (
            &[ForeignId, Passport, TempGuardianId, UseMotherAsGuardian],
            &[DeathDate, NationalId],
        ),
        (true, false, false) => (
            &[ForeignId, Passport, Occupation, PartnerName, DeathDate],
            &[TempGuardianId, MotherNationalId],
        ),
        (true, false, true) => (
            &[ForeignId, Passport, Occupation, PartnerName],
            &[DeathDate, MotherNationalId],
        ),
        (false, true, false) => (
            &[TempGuardianId, UseMotherAsGuardian, Occupation, DeathDate],
            &[],
        ),
        (false, true, true) => (
            &[TempGuardianId, UseMotherAsGuardian, Occupation],
            &[DeathDate],
        ),
        (true, true, false) => (
            &[Occupation, PartnerName, DeathDate],
            &[TempGuardianId, MotherNationalId],
        ),
        (true, true, true) => (&[Occupation, PartnerName], &[DeathDate, MotherNationalId]),
    }
}

/// Compute the state of every governed field for `flags`.
pub fn compute_field_state(flags: PatientFlags) -> FieldState {
    let (disabled, required) = rule_row(flags);
    let state = FieldId::GOVERNED
        .into_iter()
        .map(|field| {
            let enabled = !disabled.contains(&field);
            let requirement = FieldRequirement {
                enabled,
                required: enabled && required.contains(&field),
            };
            (field, requirement)
        })
        .collect();
    FieldState(state)
}

/// Write `state` into the form.
///
/// Controls that are disabled are cleared and lose their required marker. Enabled
/// controls take the computed required marker and keep their value.
pub fn apply_field_state(form: &mut PatientForm, state: &FieldState) {
    for (field, requirement) in state.iter() {
        let control = form.control_mut(field);
        control.enabled = requirement.enabled;
        if requirement.enabled {
            control.required = requirement.required;
        } else {
            control.clear();
            control.required = false;
        }
    }
}

/// Recompute field state from the form's own flag checkboxes and apply it.
pub fn apply_rules(form: &mut PatientForm) -> FieldState {
    let flags = form.flags();
    let state = compute_field_state(flags);
    tracing::debug!(
        ?flags,
        disabled = ?state.disabled_fields(),
        required = ?state.required_fields(),
        "applying field rules"
    );
    apply_field_state(form, &state);
    state
}
