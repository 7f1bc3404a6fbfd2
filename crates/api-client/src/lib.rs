//! # API Client
//!
//! HTTP implementation of [`kardex_core::KardexBackend`] for the Kardex REST backend.
//!
//! Handles:
//! - Record lookups and fetch-by-id against `/api/ingreso-paciente-ficha/`
//! - Reception search, fetch and mark-received against `/api/recepcion-ficha/`
//! - Form-encoded submissions carrying the CSRF token
//!
//! Transport failures are mapped into [`kardex_core::KardexError::Backend`]; a 404 on an
//! item endpoint becomes [`kardex_core::KardexError::NotFound`].

#![warn(rust_2018_idioms)]

mod client;
mod error;

pub use client::HttpBackend;
pub use error::{ClientError, ClientResult};
