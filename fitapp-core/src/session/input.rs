//! Lenient parsing of form input into set values.
//!
//! Empty or malformed text clears the field instead of failing.

use crate::session::model::{SetField, SetValue};

pub fn parse_optional_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whole, non-negative rep count. Fractions are truncated.
pub fn parse_optional_reps(raw: &str) -> Option<u32> {
    parse_optional_number(raw)
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.trunc() as u32)
}

impl SetField {
    pub fn parse(self, raw: &str) -> SetValue {
        match self {
            SetField::Weight => SetValue::Weight(parse_optional_number(raw)),
            SetField::Reps => SetValue::Reps(parse_optional_reps(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_parse_and_garbage_clears() {
        assert_eq!(parse_optional_number("102.5"), Some(102.5));
        assert_eq!(parse_optional_number(" 80 "), Some(80.0));
        assert_eq!(parse_optional_number(""), None);
        assert_eq!(parse_optional_number("   "), None);
        assert_eq!(parse_optional_number("heavy"), None);
        assert_eq!(parse_optional_number("inf"), None);
        assert_eq!(parse_optional_number("NaN"), None);
    }

    #[test]
    fn reps_are_whole_and_non_negative() {
        assert_eq!(parse_optional_reps("8"), Some(8));
        assert_eq!(parse_optional_reps("7.9"), Some(7));
        assert_eq!(parse_optional_reps("-3"), None);
        assert_eq!(parse_optional_reps("x"), None);
    }

    #[test]
    fn field_parse_picks_the_value_kind() {
        assert_eq!(SetField::Weight.parse("20"), SetValue::Weight(Some(20.0)));
        assert_eq!(SetField::Reps.parse("12"), SetValue::Reps(Some(12)));
        assert_eq!(SetField::Reps.parse(""), SetValue::Reps(None));
    }
}
