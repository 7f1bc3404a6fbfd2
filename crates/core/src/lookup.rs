//! Lookup plumbing for the searchable record dropdowns.
//!
//! - [`LookupKind`]: the `tipo` discriminator sent with every search
//! - [`candidate_option`]: turns one search hit into a dropdown entry
//! - [`RequestSequencer`]: only the response to the latest search is applied
//! - [`RutScan`]: suppresses repeated lookups for the same scanned RUT

use crate::record::{PatientPath, SelectOption};
use kardex_types::Rut;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a free-text search term is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    /// National id (RUT).
    Rut,
    /// Patient code.
    Codigo,
    /// Record number.
    Ficha,
}

impl LookupKind {
    /// Value of the `tipo` query parameter.
    pub fn as_query_value(self) -> &'static str {
        match self {
            LookupKind::Rut => "rut",
            LookupKind::Codigo => "codigo",
            LookupKind::Ficha => "ficha",
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl std::str::FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rut" => Ok(LookupKind::Rut),
            "codigo" => Ok(LookupKind::Codigo),
            "ficha" => Ok(LookupKind::Ficha),
            other => Err(format!("unknown lookup kind '{other}'")),
        }
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build the dropdown entry for one search hit.
///
/// The option id is always the record id. The text depends on what was searched:
/// `Ficha: {number}` for record numbers, the patient code or RUT otherwise. Hits without
/// an id or without the displayed value are skipped.
pub fn candidate_option(kind: LookupKind, hit: &Value, path: PatientPath) -> Option<SelectOption> {
    let id = scalar_text(hit.get("id"))?;
    let text = match kind {
        LookupKind::Ficha => {
            let number = scalar_text(hit.get("numero_ficha_sistema"))
                .or_else(|| scalar_text(hit.get("numero_ficha")))?;
            format!("Ficha: {number}")
        }
        LookupKind::Codigo => scalar_text(path.extract(hit)?.get("codigo"))?,
        LookupKind::Rut => scalar_text(path.extract(hit)?.get("rut"))?,
    };
    Some(SelectOption { id, text })
}

/// Ticket identifying one issued request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Hands out monotonically increasing tickets so that a response can be checked against
/// the latest request when it resolves.
///
/// Uses an atomic counter so tickets can be issued through a shared reference while
/// earlier requests are still in flight.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket that supersedes every earlier one.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// `true` if no newer ticket has been issued since `ticket`.
    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Result of a sequenced search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response belongs to the latest search; show these options.
    Current(Vec<SelectOption>),
    /// A newer search was issued while this one was in flight; discard.
    Superseded,
}

/// Remembers the last scanned RUT so that leaving the field twice with the same value does
/// not trigger a second lookup.
#[derive(Clone, Debug, Default)]
pub struct RutScan {
    last: Option<Rut>,
}

impl RutScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise `raw` and return it if it should be looked up: non-empty and different
    /// from the previously accepted value.
    pub fn accept(&mut self, raw: &str) -> Option<Rut> {
        let rut = Rut::new(raw).ok()?;
        if self.last.as_ref() == Some(&rut) {
            return None;
        }
        self.last = Some(rut.clone());
        Some(rut)
    }

    /// Forget the last value so the next scan is looked up even if it repeats.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
