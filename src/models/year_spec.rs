//! Year selection parsed from the command line.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Accepted card years, inclusive.
pub const YEAR_BOUNDS: (u32, u32) = (1800, 2100);

/// Which years a batch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSpec {
    /// `1986`
    Single(u32),
    /// `1980-1985`, both ends inclusive
    Range { start: u32, end: u32 },
    /// `1989,1990,1993`; entries may themselves be ranges
    List(Vec<u32>),
}

impl YearSpec {
    /// Ascending, distinct, non-empty sequence of years.
    pub fn years(&self) -> Vec<u32> {
        match self {
            Self::Single(year) => vec![*year],
            Self::Range { start, end } => (*start..=*end).collect(),
            Self::List(years) => years.clone(),
        }
    }
}

impl FromStr for YearSpec {
    type Err = AppError;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AppError::year_spec(input, "no years given"));
        }

        if input.contains(',') {
            let mut years = BTreeSet::new();
            for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (start, end) = parse_bounds(input, part)?;
                years.extend(start..=end);
            }
            if years.is_empty() {
                return Err(AppError::year_spec(input, "no years given"));
            }
            return Ok(Self::List(years.into_iter().collect()));
        }

        if input.contains('-') {
            let (start, end) = parse_bounds(input, input)?;
            Ok(Self::Range { start, end })
        } else {
            Ok(Self::Single(parse_year(input, input)?))
        }
    }
}

/// Inclusive bounds of a `year` or `start-end` token.
fn parse_bounds(input: &str, part: &str) -> Result<(u32, u32)> {
    match part.split_once('-') {
        Some((start, end)) => {
            let start = parse_year(input, start)?;
            let end = parse_year(input, end)?;
            if start > end {
                return Err(AppError::year_spec(
                    input,
                    format!("range start {start} is after end {end}"),
                ));
            }
            Ok((start, end))
        }
        None => {
            let year = parse_year(input, part)?;
            Ok((year, year))
        }
    }
}

fn parse_year(input: &str, token: &str) -> Result<u32> {
    let token = token.trim();
    let year: u32 = token
        .parse()
        .map_err(|_| AppError::year_spec(input, format!("'{token}' is not a year")))?;
    let (min, max) = YEAR_BOUNDS;
    if !(min..=max).contains(&year) {
        return Err(AppError::year_spec(
            input,
            format!("{year} is outside {min}-{max}"),
        ));
    }
    Ok(year)
}

impl fmt::Display for YearSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(year) => write!(f, "{year}"),
            Self::Range { start, end } => write!(f, "{start}-{end}"),
            Self::List(years) => {
                let joined: Vec<String> = years.iter().map(u32::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        let spec: YearSpec = "1986".parse().unwrap();
        assert_eq!(spec, YearSpec::Single(1986));
        assert_eq!(spec.years(), vec![1986]);
    }

    #[test]
    fn test_range_expands_inclusive() {
        let spec: YearSpec = "1980-1985".parse().unwrap();
        assert_eq!(
            spec.years(),
            vec![1980, 1981, 1982, 1983, 1984, 1985]
        );
    }

    #[test]
    fn test_list_keeps_order() {
        let spec: YearSpec = "1993,1997,2001".parse().unwrap();
        assert_eq!(spec.years(), vec![1993, 1997, 2001]);
    }

    #[test]
    fn test_list_sorted_and_distinct() {
        let spec: YearSpec = "2001, 1993,1993".parse().unwrap();
        assert_eq!(spec.years(), vec![1993, 2001]);
    }

    #[test]
    fn test_list_with_range_entry() {
        let spec: YearSpec = "1980-1982,1990".parse().unwrap();
        assert_eq!(spec.years(), vec![1980, 1981, 1982, 1990]);
    }

    #[test]
    fn test_degenerate_range() {
        let spec: YearSpec = "1999-1999".parse().unwrap();
        assert_eq!(spec.years(), vec![1999]);
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "abc", "1985-1980", "19x6", "0", ",", "1980-", "-5"] {
            let result = bad.parse::<YearSpec>();
            assert!(
                matches!(result, Err(AppError::YearSpec { .. })),
                "expected error for {bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_out_of_window_years() {
        for bad in ["1980-198500", "1-4294967295", "1799", "2101", "1990,20000"] {
            assert!(
                matches!(bad.parse::<YearSpec>(), Err(AppError::YearSpec { .. })),
                "expected error for {bad:?}"
            );
        }
        let spec: YearSpec = "1800-1801,2100".parse().unwrap();
        assert_eq!(spec.years(), vec![1800, 1801, 2100]);
    }

    #[test]
    fn test_display_round_trip() {
        let spec: YearSpec = "1980-1985".parse().unwrap();
        assert_eq!(spec.to_string(), "1980-1985");
    }
}
