//! Wire models for records returned by the Kardex REST backend.
//!
//! Responsibilities:
//! - Define the flat [`PatientRecord`] the hydrator writes into a form
//! - Locate the patient object inside fetch-by-id responses via a configurable [`PatientPath`]
//! - Flatten the two list envelopes (bare array or `{ "results": [...] }`)
//!
//! Notes:
//! - Backend payloads carry more keys than modelled here; unknown keys are ignored
//! - Every patient scalar is optional so that an absent key (leave the control alone)
//!   is distinguishable from an empty string (clear it)

use crate::{KardexError, KardexResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// A scalar the backend sends either as a number or as a string (catalog foreign keys,
/// record numbers).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for WireValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireValue::Number(n) => write!(f, "{n}"),
            WireValue::Text(s) => f.write_str(s),
        }
    }
}

/// Flat patient record as serialised by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellido_paterno: Option<String>,
    #[serde(default)]
    pub apellido_materno: Option<String>,
    #[serde(default)]
    pub rut_madre: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub estado_civil: Option<String>,
    #[serde(default)]
    pub nombres_padre: Option<String>,
    #[serde(default)]
    pub nombres_madre: Option<String>,
    #[serde(default)]
    pub nombre_pareja: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub numero_telefono1: Option<String>,
    #[serde(default)]
    pub numero_telefono2: Option<String>,
    #[serde(default)]
    pub pasaporte: Option<String>,
    #[serde(default)]
    pub nie: Option<String>,
    #[serde(default)]
    pub rut_responsable_temporal: Option<String>,
    #[serde(default)]
    pub usar_rut_madre_como_responsable: Option<bool>,
    #[serde(default)]
    pub recien_nacido: Option<bool>,
    #[serde(default)]
    pub extranjero: Option<bool>,
    #[serde(default)]
    pub fallecido: Option<bool>,
    #[serde(default)]
    pub fecha_fallecimiento: Option<String>,
    #[serde(default)]
    pub ocupacion: Option<String>,
    #[serde(default)]
    pub representante_legal: Option<String>,
    #[serde(default)]
    pub nombre_social: Option<String>,
    #[serde(default)]
    pub comuna: Option<WireValue>,
    #[serde(default)]
    pub prevision: Option<WireValue>,
    #[serde(default)]
    pub usuario: Option<WireValue>,
}

impl PatientRecord {
    /// `"{nombre} {apellido_paterno} {apellido_materno}"` with missing parts skipped.
    pub fn full_name(&self) -> String {
        [&self.nombre, &self.apellido_paterno, &self.apellido_materno]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Where the patient object sits inside a fetch-by-id response.
///
/// Different backend endpoints nest it differently and none is canonical, so the shape
/// is chosen by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatientPath {
    /// `ingreso_paciente.paciente`
    #[default]
    IngresoPaciente,
    /// `paciente.paciente`
    NestedPaciente,
    /// `paciente`
    Paciente,
}

impl PatientPath {
    pub fn as_str(self) -> &'static str {
        match self {
            PatientPath::IngresoPaciente => "ingreso_paciente.paciente",
            PatientPath::NestedPaciente => "paciente.paciente",
            PatientPath::Paciente => "paciente",
        }
    }

    fn segments(self) -> &'static [&'static str] {
        match self {
            PatientPath::IngresoPaciente => &["ingreso_paciente", "paciente"],
            PatientPath::NestedPaciente => &["paciente", "paciente"],
            PatientPath::Paciente => &["paciente"],
        }
    }

    /// Follow the path into `value`. Returns `None` when a segment is missing or the
    /// target is not an object.
    pub fn extract<'a>(self, value: &'a Value) -> Option<&'a Value> {
        let target = self
            .segments()
            .iter()
            .try_fold(value, |node, key| node.get(key))?;
        target.is_object().then_some(target)
    }
}

impl FromStr for PatientPath {
    type Err = KardexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ingreso_paciente.paciente" => Ok(PatientPath::IngresoPaciente),
            "paciente.paciente" => Ok(PatientPath::NestedPaciente),
            "paciente" => Ok(PatientPath::Paciente),
            other => Err(KardexError::UnknownPatientPath(other.to_string())),
        }
    }
}

impl std::fmt::Display for PatientPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct FichaHeaderWire {
    id: i64,
    #[serde(default)]
    numero_ficha_sistema: Option<WireValue>,
    #[serde(default)]
    numero_ficha: Option<WireValue>,
    #[serde(default)]
    codigo: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// A patient record ("ficha") with its patient, as returned by fetch-by-id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FichaRecord {
    pub id: i64,
    /// Record number assigned by the system, falling back to the legacy number.
    pub number: Option<WireValue>,
    pub code: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub patient: PatientRecord,
}

impl FichaRecord {
    /// Decode a fetch-by-id response, reading the patient from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KardexError::MissingPatient`] if `path` does not lead to an object and
    /// [`KardexError::Deserialization`] if the header or patient has unexpected types.
    pub fn from_value(value: &Value, path: PatientPath) -> KardexResult<Self> {
        let header =
            FichaHeaderWire::deserialize(value).map_err(KardexError::Deserialization)?;
        let patient_value = path
            .extract(value)
            .ok_or(KardexError::MissingPatient(path.as_str()))?;
        let patient =
            PatientRecord::deserialize(patient_value).map_err(KardexError::Deserialization)?;

        Ok(Self {
            id: header.id,
            number: header.numero_ficha_sistema.or(header.numero_ficha),
            code: header.codigo,
            created_at: header.created_at,
            updated_at: header.updated_at,
            patient,
        })
    }
}

#[derive(Deserialize)]
struct ReceptionWire {
    movimiento: IdWire,
    #[serde(default)]
    paciente: Option<PatientRecord>,
    #[serde(default)]
    ficha: Option<ReceptionFichaWire>,
}

#[derive(Deserialize)]
struct IdWire {
    id: i64,
}

#[derive(Deserialize)]
struct ReceptionFichaWire {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    numero_ficha: Option<WireValue>,
}

/// A record movement awaiting reception.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceptionRecord {
    pub movement_id: i64,
    pub patient_name: String,
    pub rut: Option<String>,
    pub ficha_id: Option<i64>,
    pub ficha_number: Option<WireValue>,
}

impl ReceptionRecord {
    pub fn from_value(value: &Value) -> KardexResult<Self> {
        let wire = ReceptionWire::deserialize(value).map_err(KardexError::Deserialization)?;
        let patient = wire.paciente.unwrap_or_default();
        let (ficha_id, ficha_number) = wire
            .ficha
            .map(|f| (f.id, f.numero_ficha))
            .unwrap_or((None, None));
        Ok(Self {
            movement_id: wire.movimiento.id,
            patient_name: patient.full_name(),
            rut: patient.rut,
            ficha_id,
            ficha_number,
        })
    }
}

/// A list response: either a bare array or a paginated `{ "results": [...] }` object.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LookupResponse<T> {
    Bare(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> LookupResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            LookupResponse::Bare(items) => items,
            LookupResponse::Paged { results } => results,
        }
    }
}

/// One entry of a searchable dropdown.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectOption {
    /// Option ids arrive as numbers from some endpoints and as strings from others.
    #[serde(deserialize_with = "id_from_wire")]
    pub id: String,
    pub text: String,
}

fn id_from_wire<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    WireValue::deserialize(deserializer).map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient_json() -> Value {
        json!({
            "id": 7,
            "rut": "12345678-5",
            "nombre": "Ana",
            "apellido_paterno": "Pérez",
            "apellido_materno": "Soto",
            "fecha_nacimiento": "1990-05-02",
            "recien_nacido": false,
            "comuna": 13101,
            "prevision": "FONASA-A",
            "unmodelled_key": true
        })
    }

    #[test]
    fn patient_ignores_unknown_keys_and_keeps_missing_as_none() {
        let patient: PatientRecord = serde_json::from_value(patient_json()).expect("patient");
        assert_eq!(patient.rut.as_deref(), Some("12345678-5"));
        assert_eq!(patient.comuna, Some(WireValue::Number(13101)));
        assert_eq!(patient.prevision, Some(WireValue::Text("FONASA-A".into())));
        assert_eq!(patient.fecha_fallecimiento, None);
        assert_eq!(patient.fallecido, None);
    }

    #[test]
    fn null_values_are_treated_as_missing() {
        let patient: PatientRecord =
            serde_json::from_value(json!({ "fecha_fallecimiento": null, "nie": "" }))
                .expect("patient");
        assert_eq!(patient.fecha_fallecimiento, None);
        assert_eq!(patient.nie.as_deref(), Some(""));
    }

    #[test]
    fn full_name_skips_missing_parts() {
        let patient: PatientRecord = serde_json::from_value(patient_json()).expect("patient");
        assert_eq!(patient.full_name(), "Ana Pérez Soto");

        let partial = PatientRecord {
            nombre: Some("Luis".into()),
            apellido_materno: Some("Rojas".into()),
            ..Default::default()
        };
        assert_eq!(partial.full_name(), "Luis Rojas");
    }

    #[test]
    fn extracts_patient_from_each_configured_path() {
        let ingreso = json!({ "id": 1, "ingreso_paciente": { "paciente": patient_json() } });
        let nested = json!({ "id": 1, "paciente": { "paciente": patient_json() } });
        let flat = json!({ "id": 1, "paciente": patient_json() });

        for (value, path) in [
            (&ingreso, PatientPath::IngresoPaciente),
            (&nested, PatientPath::NestedPaciente),
            (&flat, PatientPath::Paciente),
        ] {
            let ficha = FichaRecord::from_value(value, path).expect("ficha");
            assert_eq!(ficha.patient.nombre.as_deref(), Some("Ana"), "path {path}");
        }
    }

    #[test]
    fn wrong_path_reports_missing_patient() {
        let flat = json!({ "id": 1, "paciente": patient_json() });
        let err = FichaRecord::from_value(&flat, PatientPath::IngresoPaciente)
            .expect_err("no ingreso_paciente");
        assert!(matches!(err, KardexError::MissingPatient("ingreso_paciente.paciente")));

        // `paciente` exists but is the patient itself, whose `paciente` key is absent.
        let err = FichaRecord::from_value(&flat, PatientPath::NestedPaciente)
            .expect_err("no nested paciente");
        assert!(matches!(err, KardexError::MissingPatient(_)));
    }

    #[test]
    fn ficha_prefers_system_number() {
        let value = json!({
            "id": 55,
            "numero_ficha_sistema": 4410,
            "numero_ficha": "A-12",
            "created_at": "2024-01-10T09:00:00-03:00",
            "paciente": patient_json()
        });
        let ficha = FichaRecord::from_value(&value, PatientPath::Paciente).expect("ficha");
        assert_eq!(ficha.id, 55);
        assert_eq!(ficha.number, Some(WireValue::Number(4410)));
        assert_eq!(ficha.updated_at, None);

        let legacy = json!({ "id": 56, "numero_ficha": "A-12", "paciente": {} });
        let ficha = FichaRecord::from_value(&legacy, PatientPath::Paciente).expect("ficha");
        assert_eq!(ficha.number, Some(WireValue::Text("A-12".into())));
    }

    #[test]
    fn ficha_without_id_is_a_deserialization_error() {
        let value = json!({ "paciente": patient_json() });
        let err = FichaRecord::from_value(&value, PatientPath::Paciente).expect_err("no id");
        assert!(matches!(err, KardexError::Deserialization(_)));
    }

    #[test]
    fn patient_path_parses_from_config_strings() {
        assert_eq!(
            "paciente.paciente".parse::<PatientPath>().expect("path"),
            PatientPath::NestedPaciente
        );
        assert_eq!(
            " ingreso_paciente.paciente ".parse::<PatientPath>().expect("path"),
            PatientPath::IngresoPaciente
        );
        assert!(matches!(
            "patient".parse::<PatientPath>(),
            Err(KardexError::UnknownPatientPath(_))
        ));
    }

    #[test]
    fn reception_record_collects_display_fields() {
        let value = json!({
            "movimiento": { "id": 900 },
            "paciente": { "rut": "9876543-2", "nombre": "Rosa", "apellido_paterno": "Díaz" },
            "ficha": { "id": 31, "numero_ficha": 1200 }
        });
        let reception = ReceptionRecord::from_value(&value).expect("reception");
        assert_eq!(reception.movement_id, 900);
        assert_eq!(reception.patient_name, "Rosa Díaz");
        assert_eq!(reception.rut.as_deref(), Some("9876543-2"));
        assert_eq!(reception.ficha_id, Some(31));
        assert_eq!(reception.ficha_number, Some(WireValue::Number(1200)));
    }

    #[test]
    fn lookup_response_accepts_both_envelopes() {
        let bare: LookupResponse<SelectOption> =
            serde_json::from_value(json!([{ "id": "1", "text": "a" }])).expect("bare");
        let paged: LookupResponse<SelectOption> =
            serde_json::from_value(json!({ "count": 1, "results": [{ "id": "1", "text": "a" }] }))
                .expect("paged");
        assert_eq!(bare.into_items(), paged.into_items());
    }

    #[test]
    fn select_option_ids_may_be_numeric() {
        let paged: LookupResponse<SelectOption> =
            serde_json::from_value(json!({ "results": [{ "id": 900, "text": "9876543-2" }] }))
                .expect("paged");
        assert_eq!(
            paged.into_items(),
            vec![SelectOption {
                id: "900".into(),
                text: "9876543-2".into(),
            }]
        );

        let bare: LookupResponse<SelectOption> =
            serde_json::from_value(json!([{ "id": 31, "text": "a" }, { "id": "A-12", "text": "b" }]))
                .expect("bare");
        let ids: Vec<String> = bare.into_items().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, ["31", "A-12"]);
    }
}
