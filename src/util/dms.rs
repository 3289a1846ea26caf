use std::fmt;

/// An angle in degrees, minutes and seconds.
///
/// `seconds` keeps full precision so that converting back is lossless; only
/// the `Display` impl rounds it to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub negative: bool,
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl Dms {
    /// Seconds rounded to two decimals, for display.
    pub fn rounded_seconds(&self) -> f64 {
        (self.seconds * 100.0).round() / 100.0
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        write!(
            f,
            "{}{}°{}'{:.2}\"",
            sign, self.degrees, self.minutes, self.seconds
        )
    }
}

/// Splits decimal degrees into degrees, minutes and seconds.
///
/// # Example
/// ```
/// use geo_radius::{decimal_to_dms, dms_to_decimal};
///
/// let dms = decimal_to_dms(-74.0060);
/// assert!(dms.negative);
/// assert_eq!(dms.degrees, 74);
/// assert_eq!(dms.to_string(), "-74°0'21.60\"");
/// assert!((dms_to_decimal(&dms) + 74.0060).abs() < 1e-12);
/// ```
pub fn decimal_to_dms(decimal: f64) -> Dms {
    let negative = decimal < 0.0;
    let abs = decimal.abs();

    let degrees = abs.floor();
    let minutes = ((abs - degrees) * 60.0).floor();
    let seconds = (abs - degrees) * 3600.0 - minutes * 60.0;

    Dms {
        negative,
        degrees: degrees as u32,
        minutes: minutes as u32,
        seconds,
    }
}

/// Joins degrees, minutes and seconds back into decimal degrees.
pub fn dms_to_decimal(dms: &Dms) -> f64 {
    let magnitude = dms.degrees as f64 + dms.minutes as f64 / 60.0 + dms.seconds / 3600.0;
    if dms.negative { -magnitude } else { magnitude }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_lossless() {
        for value in [0.0, 40.7128, -74.0060, 51.507_351_2, -0.000_01, 179.999_999, -89.5] {
            let back = dms_to_decimal(&decimal_to_dms(value));
            assert!((back - value).abs() < 1e-12, "{value} -> {back}");
        }
    }

    #[test]
    fn test_components() {
        let dms = decimal_to_dms(40.7128);
        assert!(!dms.negative);
        assert_eq!(dms.degrees, 40);
        assert_eq!(dms.minutes, 42);
        assert!((dms.rounded_seconds() - 46.08).abs() < 1e-9);
    }

    #[test]
    fn test_small_negative_keeps_sign() {
        let dms = decimal_to_dms(-0.5);
        assert!(dms.negative);
        assert_eq!(dms.degrees, 0);
        assert_eq!(dms.minutes, 30);
        assert!((dms_to_decimal(&dms) + 0.5).abs() < 1e-12);
    }
}
