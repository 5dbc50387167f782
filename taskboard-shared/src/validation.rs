/// Field rules shared by the input types
///
/// Length limits on the input types mirror the column sizes in the
/// migrations, so oversized values are rejected before they reach the
/// database.

use validator::ValidationError;

/// Rejects values made only of whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Must not be blank".into());
        return Err(error);
    }

    Ok(())
}
