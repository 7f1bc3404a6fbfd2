//! Closed set of intake form controls.
//!
//! Every control the library reads or writes has a [`FieldId`]. Each id knows its default
//! host control id (the element id in the rendered form), the field name the backend
//! uses in submitted data and validation errors, and the [`FieldKind`] that decides how
//! the control is cleared and whether hydrated values need date reformatting.

use serde::{Deserialize, Serialize};

/// How a control holds its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Checkbox,
    Select,
    Date,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    // Governed by the rule engine.
    NationalId,
    ForeignId,
    Passport,
    Occupation,
    PartnerName,
    TempGuardianId,
    UseMotherAsGuardian,
    MotherNationalId,
    DeathDate,
    // Status flags.
    Newborn,
    Foreign,
    Deceased,
    // Hydrated only.
    Name,
    PaternalSurname,
    MaternalSurname,
    BirthDate,
    Sex,
    MaritalStatus,
    FatherNames,
    MotherNames,
    Address,
    Phone1,
    Phone2,
    LegalRepresentative,
    SocialName,
    Commune,
    HealthPlan,
    User,
    RecordNumber,
    PatientCode,
}

impl FieldId {
    /// Fields whose enabled/required state depends on the patient flags.
    pub const GOVERNED: [FieldId; 9] = [
        FieldId::NationalId,
        FieldId::ForeignId,
        FieldId::Passport,
        FieldId::Occupation,
        FieldId::PartnerName,
        FieldId::TempGuardianId,
        FieldId::UseMotherAsGuardian,
        FieldId::MotherNationalId,
        FieldId::DeathDate,
    ];

    /// Checkboxes the patient flags are read from.
    pub const FLAGS: [FieldId; 3] = [FieldId::Newborn, FieldId::Foreign, FieldId::Deceased];

    pub const ALL: [FieldId; 30] = [
        FieldId::NationalId,
        FieldId::ForeignId,
        FieldId::Passport,
        FieldId::Occupation,
        FieldId::PartnerName,
        FieldId::TempGuardianId,
        FieldId::UseMotherAsGuardian,
        FieldId::MotherNationalId,
        FieldId::DeathDate,
        FieldId::Newborn,
        FieldId::Foreign,
        FieldId::Deceased,
        FieldId::Name,
        FieldId::PaternalSurname,
        FieldId::MaternalSurname,
        FieldId::BirthDate,
        FieldId::Sex,
        FieldId::MaritalStatus,
        FieldId::FatherNames,
        FieldId::MotherNames,
        FieldId::Address,
        FieldId::Phone1,
        FieldId::Phone2,
        FieldId::LegalRepresentative,
        FieldId::SocialName,
        FieldId::Commune,
        FieldId::HealthPlan,
        FieldId::User,
        FieldId::RecordNumber,
        FieldId::PatientCode,
    ];

    /// Element id of the control in the stock intake template.
    pub fn default_control_id(self) -> &'static str {
        match self {
            FieldId::NationalId => "id_rut",
            FieldId::ForeignId => "nie_paciente",
            FieldId::Passport => "pasaporte_paciente",
            FieldId::Occupation => "ocupacion_paciente",
            FieldId::PartnerName => "nombre_pareja_paciente",
            FieldId::TempGuardianId => "rut_responsable_temporal_paciente",
            FieldId::UseMotherAsGuardian => "usar_rut_madre_como_responsable_paciente",
            FieldId::MotherNationalId => "id_rut_madre",
            FieldId::DeathDate => "fecha_fallecimiento_paciente",
            FieldId::Newborn => "recien_nacido_paciente",
            FieldId::Foreign => "extranjero_paciente",
            FieldId::Deceased => "fallecido_paciente",
            FieldId::Name => "nombre_paciente",
            FieldId::PaternalSurname => "apellido_paterno_paciente",
            FieldId::MaternalSurname => "apellido_materno_paciente",
            FieldId::BirthDate => "id_fecha_nacimiento",
            FieldId::Sex => "sexo_paciente",
            FieldId::MaritalStatus => "estado_civil_paciente",
            FieldId::FatherNames => "nombres_padre_paciente",
            FieldId::MotherNames => "nombres_madre_paciente",
            FieldId::Address => "direccion_paciente",
            FieldId::Phone1 => "numero_telefono1_paciente",
            FieldId::Phone2 => "numero_telefono2_paciente",
            FieldId::LegalRepresentative => "representante_legal_paciente",
            FieldId::SocialName => "nombre_social_paciente",
            FieldId::Commune => "comuna_paciente",
            FieldId::HealthPlan => "prevision_paciente",
            FieldId::User => "usuario_paciente",
            FieldId::RecordNumber => "id_ficha",
            FieldId::PatientCode => "id_codigo",
        }
    }

    /// Name of the field in submitted form data and server-side error maps.
    pub fn form_name(self) -> &'static str {
        match self {
            FieldId::NationalId => "rut",
            FieldId::ForeignId => "nie",
            FieldId::Passport => "pasaporte",
            FieldId::Occupation => "ocupacion",
            FieldId::PartnerName => "nombre_pareja",
            FieldId::TempGuardianId => "rut_responsable_temporal",
            FieldId::UseMotherAsGuardian => "usar_rut_madre_como_responsable",
            FieldId::MotherNationalId => "rut_madre",
            FieldId::DeathDate => "fecha_fallecimiento",
            FieldId::Newborn => "recien_nacido",
            FieldId::Foreign => "extranjero",
            FieldId::Deceased => "fallecido",
            FieldId::Name => "nombre",
            FieldId::PaternalSurname => "apellido_paterno",
            FieldId::MaternalSurname => "apellido_materno",
            FieldId::BirthDate => "fecha_nacimiento",
            FieldId::Sex => "sexo",
            FieldId::MaritalStatus => "estado_civil",
            FieldId::FatherNames => "nombres_padre",
            FieldId::MotherNames => "nombres_madre",
            FieldId::Address => "direccion",
            FieldId::Phone1 => "numero_telefono1",
            FieldId::Phone2 => "numero_telefono2",
            FieldId::LegalRepresentative => "representante_legal",
            FieldId::SocialName => "nombre_social",
            FieldId::Commune => "comuna",
            FieldId::HealthPlan => "prevision",
            FieldId::User => "usuario",
            FieldId::RecordNumber => "ficha",
            FieldId::PatientCode => "codigo",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FieldId::UseMotherAsGuardian
            | FieldId::Newborn
            | FieldId::Foreign
            | FieldId::Deceased => FieldKind::Checkbox,
            FieldId::DeathDate | FieldId::BirthDate => FieldKind::Date,
            FieldId::Sex
            | FieldId::MaritalStatus
            | FieldId::Commune
            | FieldId::HealthPlan
            | FieldId::User
            | FieldId::RecordNumber
            | FieldId::PatientCode => FieldKind::Select,
            _ => FieldKind::Text,
        }
    }

    pub fn is_flag(self) -> bool {
        Self::FLAGS.contains(&self)
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.form_name() == name)
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.form_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn control_ids_and_form_names_are_unique() {
        let ids: HashSet<_> = FieldId::ALL.iter().map(|f| f.default_control_id()).collect();
        let names: HashSet<_> = FieldId::ALL.iter().map(|f| f.form_name()).collect();
        assert_eq!(ids.len(), FieldId::ALL.len());
        assert_eq!(names.len(), FieldId::ALL.len());
    }

    #[test]
    fn from_form_name_finds_every_field() {
        for field in FieldId::ALL {
            assert_eq!(FieldId::from_form_name(field.form_name()), Some(field));
        }
        assert_eq!(FieldId::from_form_name("no_such_field"), None);
    }

    #[test]
    fn flags_are_checkboxes() {
        for flag in FieldId::FLAGS {
            assert_eq!(flag.kind(), FieldKind::Checkbox);
            assert!(flag.is_flag());
        }
        assert!(!FieldId::NationalId.is_flag());
    }

    #[test]
    fn date_fields_are_marked() {
        assert_eq!(FieldId::DeathDate.kind(), FieldKind::Date);
        assert_eq!(FieldId::BirthDate.kind(), FieldKind::Date);
        assert_eq!(FieldId::Passport.kind(), FieldKind::Text);
    }
}
