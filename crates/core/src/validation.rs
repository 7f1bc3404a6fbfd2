//! Client-side checks run once when the intake form is submitted.
//!
//! Rules are evaluated in a fixed order and the first failure wins; later rules are not
//! evaluated. A failure blocks the submission before any request is made and moves focus
//! to the offending control.

use crate::error::SubmissionError;
use crate::fields::FieldId;
use crate::form::PatientForm;

/// Check the form against the submission rules for its current flags.
///
/// # Errors
///
/// Returns the first failing rule as a [`SubmissionError`]:
/// 1. deceased patients need a death date;
/// 2. newborns need a temporary guardian RUT or the mother-as-guardian checkbox;
/// 3. foreign non-newborns need a foreign id or a passport;
/// 4. standard patients need a national id.
pub fn validate_submission(form: &PatientForm) -> Result<(), SubmissionError> {
    let flags = form.flags();
    // Whitespace-only values count as blank for every rule, including the death date.
    let blank = |field: FieldId| form.value(field).trim().is_empty();

    if flags.deceased && blank(FieldId::DeathDate) {
        return Err(SubmissionError {
            field: FieldId::DeathDate,
            message: "A date of death is required for deceased patients.",
        });
    }

    if flags.newborn && blank(FieldId::TempGuardianId) && !form.is_checked(FieldId::UseMotherAsGuardian)
    {
        return Err(SubmissionError {
            field: FieldId::TempGuardianId,
            message: "Enter a temporary guardian RUT or use the mother's RUT as guardian.",
        });
    }

    if flags.foreign_national
        && !flags.newborn
        && blank(FieldId::ForeignId)
        && blank(FieldId::Passport)
    {
        return Err(SubmissionError {
            field: FieldId::ForeignId,
            message: "Foreign patients need at least a foreign id (NIE) or a passport number.",
        });
    }

    if !flags.newborn && !flags.foreign_national && !flags.deceased && blank(FieldId::NationalId)
    {
        return Err(SubmissionError {
            field: FieldId::NationalId,
            message: "The RUT is required for standard patients.",
        });
    }

    Ok(())
}

/// Run [`validate_submission`] and focus the offending control on failure.
pub fn check_before_submit(form: &mut PatientForm) -> Result<(), SubmissionError> {
    if let Err(err) = validate_submission(form) {
        tracing::debug!(field = %err.field, "submission blocked by client-side check");
        form.focus(err.field);
        return Err(err);
    }
    Ok(())
}

/// Normalise a positive integer input: digits only, one leading zero dropped, and a lone
/// `0` becomes empty.
pub fn sanitize_positive_number(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    let digits = match digits.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => digits,
    };
    if digits == "0" {
        String::new()
    } else {
        digits
    }
}
