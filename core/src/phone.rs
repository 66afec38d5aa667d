//! Phone number helpers.
//!
//! Phones are stored unmasked (digits only); the display mask follows the Brazilian
//! layout used by the field staff.

/// Keeps only the ASCII digits of `value`
#[must_use]
pub fn remove_phone_mask(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Formats a phone number for display.
///
/// - 10 digits: `(AA) NNNN-NNNN`
/// - 11 digits: `(AA) NNNNN-NNNN`
/// - 13 digits: `+CC (AA) NNNNN-NNNN`
///
/// Any other length is returned unmasked.
#[must_use]
pub fn format_phone_for_display(value: &str) -> String {
    let digits = remove_phone_mask(value);
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        13 => format!(
            "+{} ({}) {}-{}",
            &digits[..2],
            &digits[2..4],
            &digits[4..9],
            &digits[9..]
        ),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_remove_mask() {
        assert_eq!(remove_phone_mask("+55 (11) 99999-0000"), "5511999990000");
        assert_eq!(remove_phone_mask("abc"), "");
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(format_phone_for_display("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone_for_display("11999990000"), "(11) 99999-0000");
        assert_eq!(format_phone_for_display("5511999990000"), "+55 (11) 99999-0000");
        assert_eq!(format_phone_for_display("12345"), "12345");
    }

    proptest! {
        #[test]
        fn prop_mask_round_trip(digits in "[0-9]{10}|[0-9]{11}|[0-9]{13}") {
            let bare = remove_phone_mask(&digits);
            prop_assert_eq!(remove_phone_mask(&format_phone_for_display(&bare)), bare);
        }

        #[test]
        fn prop_display_is_idempotent(raw in "[0-9 ()+-]{0,20}") {
            let once = format_phone_for_display(&raw);
            prop_assert_eq!(format_phone_for_display(&once), once.clone());
        }
    }
}
