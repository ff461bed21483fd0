//! Human-readable booking numbers: `TT-<year>-<sequence>`, the sequence
//! zero-padded to five digits and unique per tenant per year.

const PREFIX: &str = "TT";

pub fn format_booking_number(year: i32, sequence: u32) -> String {
    format!("{}-{}-{:05}", PREFIX, year, sequence)
}

/// Splits a booking number back into `(year, sequence)`.
pub fn parse_booking_number(number: &str) -> Option<(i32, u32)> {
    let mut parts = number.splitn(3, '-');
    if parts.next()? != PREFIX {
        return None;
    }
    let year = parts.next()?.parse().ok()?;
    let sequence = parts.next()?;
    if sequence.len() < 5 || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((year, sequence.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_sequence() {
        assert_eq!(format_booking_number(2026, 1), "TT-2026-00001");
        assert_eq!(format_booking_number(2026, 42), "TT-2026-00042");
        // Overflowing five digits widens instead of wrapping.
        assert_eq!(format_booking_number(2027, 123_456), "TT-2027-123456");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_booking_number("TT-2026-00017"), Some((2026, 17)));
        assert_eq!(parse_booking_number("TT-2026-123456"), Some((2026, 123_456)));
        assert_eq!(parse_booking_number("TT-2026-17"), None);
        assert_eq!(parse_booking_number("BK-2026-00017"), None);
        assert_eq!(parse_booking_number("TT-2026-0001a"), None);
    }
}
