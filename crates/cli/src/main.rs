use anyhow::Context;
use api_client::HttpBackend;
use clap::{Parser, Subcommand};
use kardex_core::config::{
    api_base_url_from_env_value, patient_path_from_env_value, registry_from_env_value,
};
use kardex_core::dates::{display_to_iso, iso_to_display};
use kardex_core::rules::{compute_field_state, PatientFlags};
use kardex_core::validation::check_before_submit;
use kardex_core::{
    apply_rules, sanitize_positive_number, CoreConfig, FieldId, FieldKind, FieldRegistry,
    IntakeSession, LookupKind, MarkReceivedRequest, PatientForm, SearchOutcome,
};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kardex")]
#[command(about = "Kardex patient intake form tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show field state for a combination of status flags
    Rules {
        #[arg(long)]
        newborn: bool,
        #[arg(long)]
        foreign: bool,
        #[arg(long)]
        deceased: bool,
        /// Print every flag combination instead
        #[arg(long)]
        all: bool,
    },
    /// Convert a date between ISO and DD/MM/YYYY
    FormatDate {
        value: String,
        /// Convert DD/MM/YYYY to ISO instead
        #[arg(long)]
        to_iso: bool,
    },
    /// Normalise a positive integer input the way numeric form fields do
    Number { value: String },
    /// Search records by rut, codigo or ficha
    Lookup {
        kind: LookupKind,
        term: String,
    },
    /// Fetch a record by id and print the hydrated form
    Fetch { ficha_id: i64 },
    /// Hydrate a form from a record JSON file
    Hydrate { path: PathBuf },
    /// Search by rut, codigo or ficha and print the form hydrated from the first match
    Load { kind: LookupKind, term: String },
    /// Look up a scanned RUT and print the hydrated form
    Scan { rut: String },
    /// Check form values (JSON object of form name to value) against the submission rules
    Check { path: PathBuf },
    /// Check and submit form values to a form action
    Submit {
        path: PathBuf,
        /// Form action, e.g. /kardex/pacientes/nuevo/
        #[arg(long)]
        action: String,
        #[arg(long)]
        csrf: String,
    },
    /// Mark a record movement as received
    Receive {
        movement_id: i64,
        #[arg(long)]
        csrf: String,
        /// Reception timestamp; the backend uses the current time when omitted
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
}

/// Resolve configuration from the environment.
///
/// # Environment Variables
/// - `KARDEX_API_BASE_URL`: backend base URL (default: "http://127.0.0.1:8000")
/// - `KARDEX_PATIENT_PATH`: where the patient sits in fetched records
///   (default: "ingreso_paciente.paciente")
/// - `KARDEX_FIELD_REGISTRY`: optional YAML file overriding control ids
fn load_config() -> anyhow::Result<CoreConfig> {
    let api_base_url = api_base_url_from_env_value(std::env::var("KARDEX_API_BASE_URL").ok());
    let patient_path = patient_path_from_env_value(std::env::var("KARDEX_PATIENT_PATH").ok())?;
    let registry = registry_from_env_value(
        std::env::var("KARDEX_FIELD_REGISTRY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from),
    )?;
    Ok(CoreConfig::new(api_base_url, patient_path, registry)?)
}

fn session(cfg: Arc<CoreConfig>) -> anyhow::Result<IntakeSession<HttpBackend>> {
    let backend = HttpBackend::new(cfg.clone())?;
    Ok(IntakeSession::new(backend, cfg))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json_file(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Build a form from `{ "form_name": value }` pairs and apply the field rules.
///
/// Booleans set checkboxes; strings and numbers set values. Values of controls the
/// rules disable are cleared, as a browser would never submit them.
fn form_from_values(
    registry: FieldRegistry,
    values: &Map<String, Value>,
) -> anyhow::Result<PatientForm> {
    let mut form = PatientForm::new(registry);
    for (name, value) in values {
        let field = FieldId::from_form_name(name)
            .ok_or_else(|| anyhow::anyhow!("unknown form field '{name}'"))?;
        match (field.kind(), value) {
            (_, Value::Null) => {}
            (FieldKind::Checkbox, Value::Bool(on)) => form.set_checked(field, *on),
            (FieldKind::Checkbox, Value::String(text)) => form.set_checked(field, text == "on"),
            (FieldKind::Checkbox, other) => {
                anyhow::bail!("checkbox '{name}' expects a boolean, got {other}")
            }
            (_, Value::String(text)) => form.set_value(field, text.clone()),
            (_, Value::Number(n)) => form.set_value(field, n.to_string()),
            (_, other) => anyhow::bail!("unsupported value for '{name}': {other}"),
        }
    }
    apply_rules(&mut form);
    Ok(form)
}

fn form_from_file(registry: FieldRegistry, path: &Path) -> anyhow::Result<PatientForm> {
    match read_json_file(path)? {
        Value::Object(values) => form_from_values(registry, &values),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("kardex=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'kardex --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(load_config()?);

    match command {
        Commands::Rules {
            newborn,
            foreign,
            deceased,
            all,
        } => {
            if all {
                let table: Vec<Value> = PatientFlags::all()
                    .map(|flags| {
                        let state = compute_field_state(flags);
                        json!({
                            "flags": flags,
                            "disabled": state.disabled_fields(),
                            "required": state.required_fields(),
                        })
                    })
                    .collect();
                print_json(&table)?;
            } else {
                print_json(&compute_field_state(PatientFlags::new(newborn, foreign, deceased)))?;
            }
        }
        Commands::FormatDate { value, to_iso } => {
            if to_iso {
                match display_to_iso(&value) {
                    Some(iso) => println!("{iso}"),
                    None => anyhow::bail!("'{value}' is not a DD/MM/YYYY date"),
                }
            } else {
                println!("{}", iso_to_display(&value));
            }
        }
        Commands::Number { value } => {
            println!("{}", sanitize_positive_number(&value));
        }
        Commands::Lookup { kind, term } => {
            let session = session(cfg)?;
            match session.search(kind, &term).await? {
                SearchOutcome::Current(options) => print_json(&options)?,
                SearchOutcome::Superseded => {}
            }
        }
        Commands::Fetch { ficha_id } => {
            let mut session = session(cfg)?;
            let summary = session.select(ficha_id).await?;
            print_json(&json!({ "ficha": summary, "form": session.form() }))?;
        }
        Commands::Hydrate { path } => {
            let value = read_json_file(&path)?;
            let ficha = kardex_core::FichaRecord::from_value(&value, cfg.patient_path())?;
            let mut form = PatientForm::initialised(cfg.registry().clone());
            let summary = kardex_core::hydrate_ficha(&ficha, &mut form);
            print_json(&json!({ "ficha": summary, "form": form }))?;
        }
        Commands::Load { kind, term } => {
            let mut session = session(cfg)?;
            let summary = session.load_first(kind, &term).await?;
            print_json(&json!({ "ficha": summary, "form": session.form() }))?;
        }
        Commands::Scan { rut } => {
            let mut session = session(cfg)?;
            if let Some(summary) = session.scan_rut(&rut).await? {
                print_json(&json!({ "ficha": summary, "form": session.form() }))?;
            }
        }
        Commands::Check { path } => {
            let mut form = form_from_file(cfg.registry().clone(), &path)?;
            match check_before_submit(&mut form) {
                Ok(()) => print_json(&json!({ "valid": true, "data": form.form_data("") }))?,
                Err(err) => print_json(&json!({
                    "valid": false,
                    "field": err.field,
                    "control": form.registry().control_id(err.field),
                    "message": err.message,
                }))?,
            }
        }
        Commands::Submit { path, action, csrf } => {
            let mut session = session(cfg.clone())?;
            *session.form_mut() = form_from_file(cfg.registry().clone(), &path)?;
            let outcome = session.submit(&action, &csrf).await?;
            print_json(&json!({ "outcome": outcome, "form": session.form() }))?;
        }
        Commands::Receive {
            movement_id,
            csrf,
            date,
            note,
        } => {
            let mut session = session(cfg)?;
            let record = session.select_reception(movement_id).await?;
            tracing::info!(movement_id, patient = %record.patient_name, "receiving movement");
            let request = MarkReceivedRequest {
                fecha_entrada: date,
                observacion_entrada: note,
            };
            print_json(&session.receive(&request, &csrf).await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn values_fill_controls_and_rules_clear_disabled_ones() {
        let form = form_from_values(
            FieldRegistry::default(),
            &values(json!({
                "rut": "12345678-5",
                "extranjero": false,
                "pasaporte": "P998877",
                "fallecido": "on",
                "fecha_fallecimiento": "02/05/2020"
            })),
        )
        .expect("form");

        assert_eq!(form.value(FieldId::NationalId), "12345678-5");
        assert!(form.is_checked(FieldId::Deceased));
        assert_eq!(form.value(FieldId::DeathDate), "02/05/2020");
        // Passport is disabled for non-foreign patients.
        assert_eq!(form.value(FieldId::Passport), "");
    }

    #[test]
    fn unknown_fields_and_bad_checkbox_values_are_rejected() {
        assert!(form_from_values(FieldRegistry::default(), &values(json!({ "foo": "x" }))).is_err());
        assert!(
            form_from_values(FieldRegistry::default(), &values(json!({ "recien_nacido": 1 })))
                .is_err()
        );
    }

    #[test]
    fn form_file_must_hold_an_object() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("form.json");
        std::fs::write(&path, "[1, 2]").expect("write");
        assert!(form_from_file(FieldRegistry::default(), &path).is_err());

        std::fs::write(&path, r#"{ "nombre": "Ana" }"#).expect("write");
        let form = form_from_file(FieldRegistry::default(), &path).expect("form");
        assert_eq!(form.value(FieldId::Name), "Ana");
    }
}
