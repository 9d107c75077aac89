//! Fixed bucket orderings
//!
//! The source spreadsheets label every aggregate row with a mileage bucket
//! (`KM2`) and a vehicle-age bucket (`MONTHS`). These orderings decide both
//! which labels are displayed and in what order. A label found in data but
//! missing here never reaches the grid; an entry listed here but absent from
//! the data still gets a row/column, rendered empty.

use std::fmt;
use std::str::FromStr;

/// Mileage buckets, lowest first.
pub const MILEAGE_BUCKETS: [&str; 5] = ["~3만km", "~6만km", "~9만km", "~12만km", "12만km초과"];

/// Age buckets used by the published statistics files.
pub const AGE_BUCKETS_COARSE: [&str; 11] = [
    "~1년", "~2년", "~3년", "~4년", "~5년", "~6년", "~7년", "7~10년", "10~15년", "15~20년",
    "20년 초과",
];

/// Year-by-year age buckets used by the later statistics files.
pub const AGE_BUCKETS_FINE: [&str; 21] = [
    "~1년", "~2년", "~3년", "~4년", "~5년", "~6년", "~7년", "~8년", "~9년", "~10년", "~11년",
    "~12년", "~13년", "~14년", "~15년", "~16년", "~17년", "~18년", "~19년", "~20년",
    "20년 초과",
];

/// Granularity of the age axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeScale {
    #[default]
    Coarse,
    Fine,
}

impl AgeScale {
    pub fn buckets(self) -> &'static [&'static str] {
        match self {
            AgeScale::Coarse => &AGE_BUCKETS_COARSE,
            AgeScale::Fine => &AGE_BUCKETS_FINE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgeScale::Coarse => "coarse",
            AgeScale::Fine => "fine",
        }
    }
}

impl fmt::Display for AgeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coarse" | "11" => Ok(AgeScale::Coarse),
            "fine" | "21" => Ok(AgeScale::Fine),
            other => Err(format!("unknown age scale '{}' (expected coarse or fine)", other)),
        }
    }
}

/// Index of `label` within `order`, if it is a displayable bucket.
pub fn position(order: &[&str], label: &str) -> Option<usize> {
    order.iter().position(|b| *b == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_sizes() {
        assert_eq!(MILEAGE_BUCKETS.len(), 5);
        assert_eq!(AgeScale::Coarse.buckets().len(), 11);
        assert_eq!(AgeScale::Fine.buckets().len(), 21);
    }

    #[test]
    fn test_orderings_have_no_duplicates() {
        for order in [&MILEAGE_BUCKETS[..], &AGE_BUCKETS_COARSE[..], &AGE_BUCKETS_FINE[..]] {
            for (i, label) in order.iter().enumerate() {
                assert_eq!(position(order, label), Some(i), "duplicate bucket {}", label);
            }
        }
    }

    #[test]
    fn test_position_unknown_label() {
        assert_eq!(position(&MILEAGE_BUCKETS, "~15만km"), None);
        assert_eq!(position(&AGE_BUCKETS_COARSE, "~8년"), None);
        assert_eq!(position(&AGE_BUCKETS_FINE, "~8년"), Some(7));
    }

    #[test]
    fn test_age_scale_parse() {
        assert_eq!("coarse".parse::<AgeScale>(), Ok(AgeScale::Coarse));
        assert_eq!("FINE".parse::<AgeScale>(), Ok(AgeScale::Fine));
        assert_eq!("21".parse::<AgeScale>(), Ok(AgeScale::Fine));
        assert!("monthly".parse::<AgeScale>().is_err());
    }

    #[test]
    fn test_scales_share_endpoints() {
        // Both scales start and end on the same buckets
        assert_eq!(AGE_BUCKETS_COARSE[0], AGE_BUCKETS_FINE[0]);
        assert_eq!(AGE_BUCKETS_COARSE[10], AGE_BUCKETS_FINE[20]);
    }
}
