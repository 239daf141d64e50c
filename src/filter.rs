//! Size and age threshold parsing plus the eligibility predicate shared by
//! the scanner.
//!
//! Sizes are decimal (`1KB` = 1000 bytes); a bare number is a raw byte
//! count. Ages are `<integer><unit>` with `d` days, `y` years (365 days),
//! `h` hours and `m` minutes.

use std::time::{Duration, SystemTime};

use thiserror::Error;

/// A malformed threshold expression. Surfaced before any scan starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid size '{0}': expected <number><KB|MB|GB|TB> or a raw byte count")]
    InvalidSize(String),
    #[error("invalid age '{0}': expected <integer><d|y|h|m>")]
    InvalidAge(String),
    #[error("unknown age unit '{0}': use d (days), y (years), h (hours) or m (minutes)")]
    UnknownAgeUnit(char),
}

const SIZE_UNITS: [(&str, u64); 4] = [
    ("KB", 1_000),
    ("MB", 1_000_000),
    ("GB", 1_000_000_000),
    ("TB", 1_000_000_000_000),
];

/// Parse a human-readable size expression into a byte count.
///
/// Fractional amounts are allowed (`1.5GB`) and truncate towards zero.
pub fn parse_size(input: &str) -> Result<u64, ParseError> {
    let upper = input.trim().to_uppercase();
    for (suffix, unit_bytes) in SIZE_UNITS {
        if let Some(amount) = upper.strip_suffix(suffix) {
            let value: f64 = amount
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidSize(input.to_string()))?;
            let bytes = value * unit_bytes as f64;
            // Reject anything outside the u64 range instead of saturating.
            if !value.is_finite() || value < 0.0 || bytes >= u64::MAX as f64 {
                return Err(ParseError::InvalidSize(input.to_string()));
            }
            return Ok(bytes as u64);
        }
    }
    // No recognised suffix: the whole string is a byte count.
    upper
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidSize(input.to_string()))
}

/// Parse a human-readable age expression into a [`Duration`].
pub fn parse_age(input: &str) -> Result<Duration, ParseError> {
    let trimmed = input.trim();
    let unit = trimmed
        .chars()
        .next_back()
        .ok_or_else(|| ParseError::InvalidAge(input.to_string()))?;
    let amount_str = &trimmed[..trimmed.len() - unit.len_utf8()];
    let amount: u64 = amount_str
        .parse()
        .map_err(|_| ParseError::InvalidAge(input.to_string()))?;
    let seconds_per_unit: u64 = match unit.to_ascii_lowercase() {
        'd' => 86_400,
        'y' => 365 * 86_400,
        'h' => 3_600,
        'm' => 60,
        other => return Err(ParseError::UnknownAgeUnit(other)),
    };
    amount
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| ParseError::InvalidAge(input.to_string()))
}

/// The two thresholds applied during a scan. `max_age` of `None` means no
/// age filter; `min_size` defaults to zero (everything passes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filters {
    pub max_age: Option<Duration>,
    pub min_size: u64,
}

impl Filters {
    /// Whether a file with the given size and mtime survives both filters,
    /// evaluated against `now`.
    pub fn is_eligible(&self, size: u64, mtime: SystemTime, now: SystemTime) -> bool {
        if size < self.min_size {
            return false;
        }
        match self.max_age {
            None => true,
            Some(limit) => match now.duration_since(mtime) {
                Ok(age) => age <= limit,
                // An mtime in the future counts as age zero.
                Err(_) => true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes_for_every_unit() {
        assert_eq!(parse_size("1KB").unwrap(), 1_000);
        assert_eq!(parse_size("10MB").unwrap(), 10_000_000);
        assert_eq!(parse_size("2GB").unwrap(), 2_000_000_000);
        assert_eq!(parse_size("3TB").unwrap(), 3_000_000_000_000);
    }

    #[test]
    fn parses_bare_integer_as_bytes() {
        assert_eq!(parse_size("12345").unwrap(), 12_345);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn size_parsing_is_case_insensitive() {
        assert_eq!(parse_size("512mb").unwrap(), 512_000_000);
        assert_eq!(parse_size("1kb").unwrap(), 1_000);
    }

    #[test]
    fn fractional_sizes_truncate() {
        assert_eq!(parse_size("1.5KB").unwrap(), 1_500);
        assert_eq!(parse_size("0.1MB").unwrap(), 100_000);
    }

    #[test]
    fn rejects_malformed_sizes() {
        assert!(matches!(parse_size("abc"), Err(ParseError::InvalidSize(_))));
        assert!(matches!(parse_size("12.5"), Err(ParseError::InvalidSize(_))));
        assert!(matches!(parse_size("-1MB"), Err(ParseError::InvalidSize(_))));
        assert!(matches!(parse_size(""), Err(ParseError::InvalidSize(_))));
    }

    #[test]
    fn parses_ages_for_every_unit() {
        assert_eq!(parse_age("3d").unwrap(), Duration::from_secs(3 * 86_400));
        assert_eq!(parse_age("2y").unwrap(), Duration::from_secs(730 * 86_400));
        assert_eq!(parse_age("5h").unwrap(), Duration::from_secs(5 * 3_600));
        assert_eq!(parse_age("10m").unwrap(), Duration::from_secs(600));
    }

    #[test]
    fn rejects_unknown_age_unit() {
        assert_eq!(parse_age("5x"), Err(ParseError::UnknownAgeUnit('x')));
    }

    #[test]
    fn rejects_malformed_ages() {
        assert!(matches!(parse_age("d"), Err(ParseError::InvalidAge(_))));
        assert!(matches!(parse_age(""), Err(ParseError::InvalidAge(_))));
        assert!(matches!(parse_age("x7d"), Err(ParseError::InvalidAge(_))));
        assert!(matches!(parse_age("-3d"), Err(ParseError::InvalidAge(_))));
    }

    #[test]
    fn rejects_age_amounts_that_overflow_seconds() {
        assert!(matches!(
            parse_age("300000000000000d"),
            Err(ParseError::InvalidAge(_))
        ));
        assert!(matches!(
            parse_age(&format!("{}y", u64::MAX)),
            Err(ParseError::InvalidAge(_))
        ));
        // The largest representable amounts still parse.
        assert!(parse_age("100000y").is_ok());
    }

    #[test]
    fn rejects_sizes_beyond_the_u64_range() {
        assert!(matches!(
            parse_size("1e30TB"),
            Err(ParseError::InvalidSize(_))
        ));
        assert!(matches!(
            parse_size("99999999999TB"),
            Err(ParseError::InvalidSize(_))
        ));
        assert!(parse_size("18TB").is_ok());
    }

    #[test]
    fn eligibility_applies_both_thresholds() {
        let now = SystemTime::now();
        let filters = Filters {
            max_age: Some(Duration::from_secs(30 * 86_400)),
            min_size: 1_000_000,
        };

        let fresh = now - Duration::from_secs(10 * 86_400);
        let stale = now - Duration::from_secs(40 * 86_400);

        assert!(filters.is_eligible(2_000_000, fresh, now));
        assert!(!filters.is_eligible(100, fresh, now));
        assert!(!filters.is_eligible(2_000_000, stale, now));
    }

    #[test]
    fn no_age_filter_accepts_any_mtime() {
        let now = SystemTime::now();
        let filters = Filters::default();
        let ancient = now - Duration::from_secs(10 * 365 * 86_400);
        assert!(filters.is_eligible(0, ancient, now));
    }

    #[test]
    fn future_mtime_counts_as_age_zero() {
        let now = SystemTime::now();
        let filters = Filters {
            max_age: Some(Duration::from_secs(60)),
            min_size: 0,
        };
        assert!(filters.is_eligible(1, now + Duration::from_secs(120), now));
    }
}
