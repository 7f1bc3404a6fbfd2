//! # Kardex Core
//!
//! Form logic for the Kardex patient intake screen.
//!
//! This crate contains the host-independent parts of the intake form:
//! - The field-rule engine mapping the patient status flags to enabled/required state
//! - Record hydration from backend payloads, including ISO to `DD/MM/YYYY` conversion
//! - Client-side submission checks and application of server-side field errors
//! - Sequenced record lookups and the reception flow, behind the [`KardexBackend`] seam
//!
//! **No transport concerns**: the HTTP client lives in `kardex-api-client`; rendering and
//! event wiring belong to whatever host drives a [`PatientForm`].

pub mod backend;
pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod fields;
pub mod form;
pub mod hydration;
pub mod lookup;
pub mod record;
pub mod registry;
pub mod rules;
pub mod session;
pub mod submission;
pub mod validation;

pub use backend::KardexBackend;
pub use config::CoreConfig;
pub use error::{KardexError, KardexResult, SubmissionError};
pub use fields::{FieldId, FieldKind};
pub use form::{Control, PatientForm};
pub use hydration::{hydrate, hydrate_ficha, FichaSummary, HydrationReport};
pub use lookup::{LookupKind, SearchOutcome};
pub use record::{FichaRecord, PatientPath, PatientRecord, ReceptionRecord, SelectOption};
pub use registry::FieldRegistry;
pub use rules::{apply_rules, compute_field_state, FieldState, PatientFlags};
pub use session::IntakeSession;
pub use submission::{FormResponse, MarkReceivedRequest, MarkReceivedResponse, SubmitOutcome};
pub use validation::{sanitize_positive_number, validate_submission};
