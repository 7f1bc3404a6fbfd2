//! Constants used throughout the Kardex core crate.
//!
//! Endpoint paths, wire field names and display formats live here so the client, the
//! session and the hydrator agree on them.

/// Backend base URL used when no explicit URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

/// Collection endpoint for record ("ficha") lookups and fetch-by-id.
pub const FICHA_ENDPOINT: &str = "/api/ingreso-paciente-ficha/";

/// Collection endpoint for records awaiting reception.
pub const RECEPTION_ENDPOINT: &str = "/api/recepcion-ficha/";

/// Action segment appended to a reception item URL to mark it received.
pub const MARK_RECEIVED_ACTION: &str = "mark_received/";

/// Form field carrying the CSRF token on every POST.
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";

/// Header marking a request as AJAX so the backend answers with JSON envelopes.
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// `chrono` format of ISO calendar dates on the wire.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// `chrono` format of dates shown in the form.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Text shown for a record timestamp the backend did not send.
pub const MISSING_DATE_PLACEHOLDER: &str = "-";

/// Cover sheet PDF for a record; the record id and a trailing slash are appended.
pub const COVER_SHEET_PDF_PREFIX: &str = "/kardex/pdfs/ficha/";

/// Sticker sheet PDF for a record; the record id and a trailing slash are appended.
pub const STICKERS_PDF_PREFIX: &str = "/kardex/pdfs/stickers/ficha/";

/// Joins multiple server-side messages for one field.
pub const FEEDBACK_SEPARATOR: &str = ", ";

/// Value a checked checkbox contributes to submitted form data.
pub const CHECKBOX_ON_VALUE: &str = "on";
