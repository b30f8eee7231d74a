//! Validation helpers shared across trivia content

use std::time::Duration;

/// Validation result type for duration validation
type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds.
///
/// This is a custom validation function for use with the `garde` crate.
/// It checks if the duration in seconds is within the inclusive range
/// defined by `MIN_SECONDS` and `MAX_SECONDS`.
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside the specified bounds.
pub fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates a millisecond duration, used for sub-second tunables
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is longer than `MAX_MILLIS`.
pub fn validate_millis<const MAX_MILLIS: u64>(val: &Duration, _ctx: &()) -> ValidationResult {
    if val.as_millis() <= u128::from(MAX_MILLIS) {
        Ok(())
    } else {
        Err(garde::Error::new(format!("longer than {MAX_MILLIS}ms")))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_validate_duration_bounds() {
        assert!(validate_duration::<1, 10>(&Duration::from_secs(1), &()).is_ok());
        assert!(validate_duration::<1, 10>(&Duration::from_secs(10), &()).is_ok());
        assert!(validate_duration::<1, 10>(&Duration::from_millis(500), &()).is_err());
        assert!(validate_duration::<1, 10>(&Duration::from_secs(11), &()).is_err());
    }

    #[test]
    fn test_validate_millis() {
        assert!(validate_millis::<500>(&Duration::ZERO, &()).is_ok());
        assert!(validate_millis::<500>(&Duration::from_millis(500), &()).is_ok());
        assert!(validate_millis::<500>(&Duration::from_millis(501), &()).is_err());
    }
}
