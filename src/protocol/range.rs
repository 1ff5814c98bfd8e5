//! Range argument codec
//!
//! Validates and serializes the protocol's `lower:upper` window
//! argument. Either bound may be open; an empty range selects the
//! full interval (`:`).

use std::fmt;

use crate::error::{MpdError, Result};

/// A validated numeric interval argument.
///
/// Serialized bare on the wire (never quoted) as `lower:upper`, with
/// open bounds rendered empty: `10:20`, `10:`, or `:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    lower: Option<u64>,
    upper: Option<u64>,
}

impl Range {
    /// The full interval, serialized as `:`
    pub fn full() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// A half-open interval from `lower` onwards, serialized as `lower:`
    pub fn from_lower(lower: u64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// Build a range from optional bounds.
    ///
    /// Fails with a command error when `upper < lower` or when an upper
    /// bound is given without a lower one (the protocol requires an
    /// integer to start the range).
    pub fn new(lower: Option<u64>, upper: Option<u64>) -> Result<Self> {
        if lower.is_none() && upper.is_some() {
            return Err(MpdError::Command(
                "integer expected to start the range".to_string(),
            ));
        }
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Err(MpdError::Command(format!(
                    "wrong range: {lower} > {upper}"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Parse a range from 0, 1 or 2 string elements.
    ///
    /// An empty element is an open bound. Non-numeric elements and more
    /// than two elements fail with a command error; nothing reaches the
    /// wire in that case.
    pub fn parse(elements: &[&str]) -> Result<Self> {
        if elements.len() > 2 {
            return Err(MpdError::Command(
                "range wrong size (0, 1 or 2 allowed)".to_string(),
            ));
        }
        let lower = elements.first().map(|e| parse_bound(e)).transpose()?.flatten();
        let upper = elements.get(1).map(|e| parse_bound(e)).transpose()?.flatten();
        Self::new(lower, upper)
    }

    pub fn lower(&self) -> Option<u64> {
        self.lower
    }

    pub fn upper(&self) -> Option<u64> {
        self.upper
    }
}

fn parse_bound(element: &str) -> Result<Option<u64>> {
    if element.is_empty() {
        return Ok(None);
    }
    element
        .parse::<u64>()
        .map(Some)
        .map_err(|_| MpdError::Command(format!("not an integer: \"{element}\"")))
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Some(lower) => write!(f, "{lower}:")?,
            None => write!(f, ":")?,
        }
        if let Some(upper) = self.upper {
            write!(f, "{upper}")?;
        }
        Ok(())
    }
}

impl TryFrom<std::ops::Range<u64>> for Range {
    type Error = MpdError;

    fn try_from(range: std::ops::Range<u64>) -> Result<Self> {
        Self::new(Some(range.start), Some(range.end))
    }
}

impl From<std::ops::RangeFrom<u64>> for Range {
    fn from(range: std::ops::RangeFrom<u64>) -> Self {
        Self::from_lower(range.start)
    }
}

impl From<std::ops::RangeFull> for Range {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full() {
        assert_eq!(Range::full().to_string(), ":");
        assert_eq!(Range::from(..).to_string(), ":");
    }

    #[test]
    fn test_render_lower_only() {
        assert_eq!(Range::from_lower(10).to_string(), "10:");
        assert_eq!(Range::from(10..).to_string(), "10:");
    }

    #[test]
    fn test_render_both_bounds() {
        let range = Range::new(Some(10), Some(12)).unwrap();
        assert_eq!(range.to_string(), "10:12");
        assert_eq!(Range::try_from(10..12).unwrap().to_string(), "10:12");
    }

    #[test]
    fn test_reversed_bounds_rejected() {
        assert!(matches!(
            Range::new(Some(12), Some(10)),
            Err(MpdError::Command(_))
        ));
        assert!(Range::try_from(12..10).is_err());
    }

    #[test]
    fn test_upper_without_lower_rejected() {
        assert!(matches!(
            Range::new(None, Some(10)),
            Err(MpdError::Command(_))
        ));
    }

    #[test]
    fn test_parse_elements() {
        assert_eq!(Range::parse(&[]).unwrap().to_string(), ":");
        assert_eq!(Range::parse(&["10"]).unwrap().to_string(), "10:");
        assert_eq!(Range::parse(&["10", "12"]).unwrap().to_string(), "10:12");
        assert_eq!(Range::parse(&["", ""]).unwrap().to_string(), ":");
    }

    #[test]
    fn test_parse_non_numeric_rejected() {
        assert!(matches!(
            Range::parse(&["10", "t"]),
            Err(MpdError::Command(_))
        ));
    }

    #[test]
    fn test_parse_too_many_elements_rejected() {
        assert!(matches!(
            Range::parse(&["10", "1", "1"]),
            Err(MpdError::Command(_))
        ));
    }
}
