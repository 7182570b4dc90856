//! Row selection expressions.
//!
//! ```text
//! ALL | ""      every record
//! first N       the first N records
//! last N        the last N records
//! A-B           records A through B, 1-based and inclusive
//! ```
//!
//! Matching is case-insensitive. Anything unrecognised selects every record.

use std::fmt;

/// A parsed selection expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    First(usize),
    Last(usize),
    /// Inclusive 1-based bounds, clamped when applied.
    Range { start: i64, end: i64 },
}

impl Selection {
    /// Parse an expression. Never fails: malformed input yields [`Selection::All`].
    pub fn parse(expr: &str) -> Self {
        let choice = expr.trim().to_lowercase();

        if choice.is_empty() || choice == "all" {
            return Selection::All;
        }

        if choice.starts_with("first") {
            if let Some(n) = count_token(&choice) {
                return Selection::First(n);
            }
        }

        if choice.starts_with("last") {
            if let Some(n) = count_token(&choice) {
                return Selection::Last(n);
            }
        }

        if let Some((a, b)) = choice.split_once('-') {
            if let (Ok(start), Ok(end)) = (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
                return Selection::Range { start, end };
            }
        }

        Selection::All
    }

    /// Slice `records` according to this selection.
    pub fn apply<'a, T>(&self, records: &'a [T]) -> &'a [T] {
        let len = records.len();
        match *self {
            Selection::All => records,
            Selection::First(n) => &records[..n.min(len)],
            Selection::Last(n) => &records[len - n.min(len)..],
            Selection::Range { start, end } => {
                let start = start.max(1);
                let end = end.min(len as i64);
                if start <= end {
                    &records[(start - 1) as usize..end as usize]
                } else {
                    // TODO: an inverted or out-of-bounds range still returns every
                    // record; revisit once we decide whether the form should reject it.
                    records
                }
            }
        }
    }
}

/// Second whitespace token as an all-digit count.
fn count_token(choice: &str) -> Option<usize> {
    let token = choice.split_whitespace().nth(1)?;
    if token.chars().all(|c| c.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "ALL"),
            Selection::First(n) => write!(f, "first {}", n),
            Selection::Last(n) => write!(f, "last {}", n),
            Selection::Range { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

/// Parse `expr` and slice `records` in one step.
pub fn select_rows<'a, T>(records: &'a [T], expr: &str) -> &'a [T] {
    Selection::parse(expr).apply(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Vec<u32> {
        (1..=10).collect()
    }

    #[test]
    fn test_all_and_empty() {
        let s = seq();
        assert_eq!(select_rows(&s, "ALL"), &s[..]);
        assert_eq!(select_rows(&s, "  all "), &s[..]);
        assert_eq!(select_rows(&s, ""), &s[..]);
    }

    #[test]
    fn test_first() {
        let s = seq();
        assert!(select_rows(&s, "first 0").is_empty());
        assert_eq!(select_rows(&s, "First 3"), &[1, 2, 3]);
        assert_eq!(select_rows(&s, "first 100"), &s[..]);
    }

    #[test]
    fn test_last() {
        let s = seq();
        assert_eq!(select_rows(&s, "LAST 2"), &[9, 10]);
        assert!(select_rows(&s, "last 0").is_empty());
        assert_eq!(select_rows(&s, "last 50"), &s[..]);
    }

    #[test]
    fn test_range_inclusive_one_based() {
        let s = seq();
        for a in 1..=s.len() {
            for b in a..=s.len() {
                let expr = format!("{}-{}", a, b);
                assert_eq!(select_rows(&s, &expr), &s[a - 1..b], "expr {expr}");
            }
        }
    }

    #[test]
    fn test_range_clamped() {
        let s = seq();
        assert_eq!(select_rows(&s, "0-3"), &[1, 2, 3]);
        assert_eq!(select_rows(&s, "8 - 40"), &[8, 9, 10]);
    }

    #[test]
    fn test_inverted_range_returns_all() {
        let s = seq();
        assert_eq!(select_rows(&s, "7-3"), &s[..]);
        assert_eq!(select_rows(&s, "20-30"), &s[..]);
        assert_eq!(select_rows(&s, "3--5"), &s[..]);
    }

    #[test]
    fn test_unrecognised_returns_all() {
        let s = seq();
        for expr in ["some", "first", "first ten", "last -2", "a-b", "-5", "first 5-10"] {
            assert_eq!(select_rows(&s, expr), &s[..], "expr {expr}");
        }
    }

    #[test]
    fn test_empty_input() {
        let s: Vec<u32> = Vec::new();
        assert!(select_rows(&s, "first 3").is_empty());
        assert!(select_rows(&s, "last 3").is_empty());
        assert!(select_rows(&s, "1-3").is_empty());
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(Selection::parse("first 5").to_string(), "first 5");
        assert_eq!(Selection::parse(" LAST 2").to_string(), "last 2");
        assert_eq!(Selection::parse("34-134").to_string(), "34-134");
        assert_eq!(Selection::parse("whatever").to_string(), "ALL");
    }
}
