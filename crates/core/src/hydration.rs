//! Record hydration: write a fetched record into the intake form.
//!
//! Only keys present in the record are written; everything else keeps its current value.
//! Date fields are converted from ISO to `DD/MM/YYYY` on the way in. Once all values are
//! written the field rules run once so that enabled/required state matches the loaded
//! status flags.

use crate::constants::{COVER_SHEET_PDF_PREFIX, STICKERS_PDF_PREFIX};
use crate::dates::{display_or_placeholder, iso_to_display};
use crate::fields::{FieldId, FieldKind};
use crate::form::PatientForm;
use crate::record::{FichaRecord, PatientRecord};
use crate::rules::{self, FieldState};
use serde::Serialize;

/// A value taken from a record, before it is written to its control.
enum Incoming<'a> {
    Text(&'a str),
    Checked(bool),
    Owned(String),
}

fn text(value: &Option<String>) -> Option<Incoming<'_>> {
    value.as_deref().map(Incoming::Text)
}

fn owned(value: &Option<impl ToString>) -> Option<Incoming<'static>> {
    value.as_ref().map(|v| Incoming::Owned(v.to_string()))
}

fn checked(value: Option<bool>) -> Option<Incoming<'static>> {
    value.map(Incoming::Checked)
}

fn patient_values(record: &PatientRecord) -> Vec<(FieldId, Option<Incoming<'_>>)> {
    vec![
        (FieldId::Name, text(&record.nombre)),
        (FieldId::PaternalSurname, text(&record.apellido_paterno)),
        (FieldId::MaternalSurname, text(&record.apellido_materno)),
        (FieldId::NationalId, text(&record.rut)),
        (FieldId::MotherNationalId, text(&record.rut_madre)),
        (FieldId::BirthDate, text(&record.fecha_nacimiento)),
        (FieldId::Sex, text(&record.sexo)),
        (FieldId::MaritalStatus, text(&record.estado_civil)),
        (FieldId::FatherNames, text(&record.nombres_padre)),
        (FieldId::MotherNames, text(&record.nombres_madre)),
        (FieldId::PartnerName, text(&record.nombre_pareja)),
        (FieldId::Address, text(&record.direccion)),
        (FieldId::Phone1, text(&record.numero_telefono1)),
        (FieldId::Phone2, text(&record.numero_telefono2)),
        (FieldId::Passport, text(&record.pasaporte)),
        (FieldId::ForeignId, text(&record.nie)),
        (FieldId::TempGuardianId, text(&record.rut_responsable_temporal)),
        (
            FieldId::UseMotherAsGuardian,
            checked(record.usar_rut_madre_como_responsable),
        ),
        (FieldId::Newborn, checked(record.recien_nacido)),
        (FieldId::Foreign, checked(record.extranjero)),
        (FieldId::Deceased, checked(record.fallecido)),
        (FieldId::DeathDate, text(&record.fecha_fallecimiento)),
        (FieldId::Occupation, text(&record.ocupacion)),
        (FieldId::LegalRepresentative, text(&record.representante_legal)),
        (FieldId::SocialName, text(&record.nombre_social)),
        (FieldId::Commune, owned(&record.comuna)),
        (FieldId::HealthPlan, owned(&record.prevision)),
        (FieldId::User, owned(&record.usuario)),
        (FieldId::PatientCode, text(&record.codigo)),
    ]
}

/// What hydration changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HydrationReport {
    /// Controls that received a value from the record, in write order.
    pub written: Vec<FieldId>,
    /// Field state applied after writing.
    pub field_state: FieldState,
}

/// Write every present field of `record` into `form`, then re-apply the field rules.
pub fn hydrate(record: &PatientRecord, form: &mut PatientForm) -> HydrationReport {
    let mut written = Vec::new();

    for (field, incoming) in patient_values(record) {
        let Some(incoming) = incoming else {
            continue;
        };
        let control = form.control_mut(field);
        match (control.kind, incoming) {
            (FieldKind::Checkbox, Incoming::Checked(on)) => control.checked = on,
            (FieldKind::Date, Incoming::Text(value)) => {
                control.value = iso_to_display(value);
                control.label = None;
            }
            (_, Incoming::Text(value)) => {
                control.value = value.to_string();
                control.label = None;
            }
            (_, Incoming::Owned(value)) => {
                control.value = value;
                control.label = None;
            }
            (kind, Incoming::Checked(_)) => {
                tracing::warn!(%field, ?kind, "boolean value for non-checkbox control ignored");
                continue;
            }
        }
        written.push(field);
    }

    let field_state = rules::apply_rules(form);
    tracing::debug!(written = written.len(), "hydrated patient form");

    HydrationReport {
        written,
        field_state,
    }
}

/// Record-level display data that lives outside the form controls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FichaSummary {
    pub ficha_id: i64,
    pub record_number: Option<String>,
    /// Creation date as `DD/MM/YYYY`, or `-`.
    pub created_at: String,
    /// Last update date as `DD/MM/YYYY`, or `-`.
    pub updated_at: String,
    pub cover_sheet_url: String,
    pub stickers_url: String,
    pub report: HydrationReport,
}

/// Hydrate the form from a fetched record and its patient.
///
/// Besides the patient fields this selects the record in the record-number dropdown and
/// fills the patient-code dropdown from the record code when the patient has none.
pub fn hydrate_ficha(ficha: &FichaRecord, form: &mut PatientForm) -> FichaSummary {
    let record_number = ficha.number.as_ref().map(ToString::to_string);
    if let Some(number) = &record_number {
        form.set_selected(FieldId::RecordNumber, ficha.id.to_string(), number.clone());
    }

    let mut report = hydrate(&ficha.patient, form);

    if ficha.patient.codigo.is_none() {
        if let Some(code) = &ficha.code {
            form.set_value(FieldId::PatientCode, code.clone());
            report.written.push(FieldId::PatientCode);
        }
    }
    if record_number.is_some() {
        report.written.insert(0, FieldId::RecordNumber);
    }

    FichaSummary {
        ficha_id: ficha.id,
        record_number,
        created_at: display_or_placeholder(ficha.created_at.as_deref()),
        updated_at: display_or_placeholder(ficha.updated_at.as_deref()),
        cover_sheet_url: format!("{COVER_SHEET_PDF_PREFIX}{}/", ficha.id),
        stickers_url: format!("{STICKERS_PDF_PREFIX}{}/", ficha.id),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PatientPath, WireValue};
    use crate::registry::FieldRegistry;
    use serde_json::json;

    fn form() -> PatientForm {
        PatientForm::initialised(FieldRegistry::default())
    }

    #[test]
    fn writes_present_fields_and_reformats_dates() {
        let mut form = form();
        let record = PatientRecord {
            nombre: Some("Ana".into()),
            rut: Some("12345678-5".into()),
            fecha_nacimiento: Some("1990-05-02".into()),
            comuna: Some(WireValue::Number(13101)),
            ..Default::default()
        };

        let report = hydrate(&record, &mut form);

        assert_eq!(form.value(FieldId::Name), "Ana");
        assert_eq!(form.value(FieldId::NationalId), "12345678-5");
        assert_eq!(form.value(FieldId::BirthDate), "02/05/1990");
        assert_eq!(form.value(FieldId::Commune), "13101");
        assert_eq!(
            report.written,
            vec![FieldId::Name, FieldId::NationalId, FieldId::BirthDate, FieldId::Commune]
        );
    }

    #[test]
    fn absent_fields_are_left_untouched() {
        let mut form = form();
        form.set_value(FieldId::Address, "Av. Siempre Viva 742");
        form.set_checked(FieldId::Deceased, true);
        rules::apply_rules(&mut form);
        form.set_value(FieldId::DeathDate, "01/01/2020");

        let record = PatientRecord {
            nombre: Some("Ana".into()),
            fallecido: Some(true),
            ..Default::default()
        };
        hydrate(&record, &mut form);

        assert_eq!(form.value(FieldId::Address), "Av. Siempre Viva 742");
        assert_eq!(form.value(FieldId::DeathDate), "01/01/2020");
    }

    #[test]
    fn malformed_dates_pass_through() {
        let mut form = form();
        let record = PatientRecord {
            fecha_nacimiento: Some("not-a-date".into()),
            ..Default::default()
        };
        hydrate(&record, &mut form);
        assert_eq!(form.value(FieldId::BirthDate), "not-a-date");
    }

    #[test]
    fn flags_from_record_drive_field_state() {
        let mut form = form();
        let record = PatientRecord {
            recien_nacido: Some(true),
            fallecido: Some(true),
            fecha_fallecimiento: Some("2024-02-10T00:00:00".into()),
            rut_responsable_temporal: Some("11111111-1".into()),
            ocupacion: Some("Carpintero".into()),
            ..Default::default()
        };

        let report = hydrate(&record, &mut form);

        assert_eq!(form.value(FieldId::DeathDate), "10/02/2024");
        assert!(form.control(FieldId::DeathDate).required);
        assert!(form.control(FieldId::TempGuardianId).enabled);
        assert_eq!(form.value(FieldId::TempGuardianId), "11111111-1");
        // Occupation is disabled for newborns, so the loaded value is cleared.
        assert!(!form.control(FieldId::Occupation).enabled);
        assert_eq!(form.value(FieldId::Occupation), "");
        assert_eq!(
            report.field_state.required_fields(),
            vec![FieldId::MotherNationalId, FieldId::DeathDate]
        );
    }

    #[test]
    fn unchecking_flags_from_record_clears_dependent_fields() {
        let mut form = form();
        form.set_checked(FieldId::Foreign, true);
        rules::apply_rules(&mut form);
        form.set_value(FieldId::Passport, "P998877");

        let record = PatientRecord {
            extranjero: Some(false),
            ..Default::default()
        };
        hydrate(&record, &mut form);

        assert!(!form.is_checked(FieldId::Foreign));
        assert_eq!(form.value(FieldId::Passport), "");
    }

    #[test]
    fn ficha_hydration_fills_record_metadata() {
        let value = json!({
            "id": 55,
            "numero_ficha_sistema": 4410,
            "codigo": "F-55",
            "created_at": "2024-01-10T09:00:00-03:00",
            "ingreso_paciente": { "paciente": { "nombre": "Ana", "rut": "12345678-5" } }
        });
        let ficha = FichaRecord::from_value(&value, PatientPath::IngresoPaciente).expect("ficha");
        let mut form = form();

        let summary = hydrate_ficha(&ficha, &mut form);

        assert_eq!(summary.record_number.as_deref(), Some("4410"));
        assert_eq!(summary.created_at, "10/01/2024");
        assert_eq!(summary.updated_at, "-");
        assert_eq!(summary.cover_sheet_url, "/kardex/pdfs/ficha/55/");
        assert_eq!(summary.stickers_url, "/kardex/pdfs/stickers/ficha/55/");

        let record_select = form.control(FieldId::RecordNumber);
        assert_eq!(record_select.value, "55");
        assert_eq!(record_select.label.as_deref(), Some("4410"));
        assert_eq!(form.value(FieldId::PatientCode), "F-55");
        assert_eq!(summary.report.written.first(), Some(&FieldId::RecordNumber));
        assert_eq!(summary.report.written.last(), Some(&FieldId::PatientCode));
    }

    #[test]
    fn patient_code_wins_over_record_code() {
        let value = json!({
            "id": 8,
            "codigo": "F-8",
            "paciente": { "codigo": "PAC-1" }
        });
        let ficha = FichaRecord::from_value(&value, PatientPath::Paciente).expect("ficha");
        let mut form = form();

        hydrate_ficha(&ficha, &mut form);

        assert_eq!(form.value(FieldId::PatientCode), "PAC-1");
    }
}
