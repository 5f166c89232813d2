pub mod disposal_notes;
pub mod disposal_requests;
pub mod goods_issue_notes;
pub mod pick_allocations;

use validator::ValidationError;

/// Rejects strings that are empty or whitespace-only. Document numbers and
/// goods codes come from form fields that pad with spaces.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("\t\n").is_err());
        assert!(not_blank("YCX-0001").is_ok());
        assert!(not_blank("  YCX-0001  ").is_ok());
    }
}
