//! Unicode formatting for equations
use std::ops::Range;

use crate::value::Value;

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Format a number with `precision` decimals
///
/// Values inside `fixed_range` use fixed notation, everything else scientific notation.
pub fn float<T: Value>(n: T, fixed_range: Option<Range<T>>, precision: usize) -> String {
    match fixed_range {
        Some(range) if range.contains(&n) => format!("{n:.precision$}"),
        _ => format!("{n:.precision$e}"),
    }
}

/// Writes an exponent in superscript. Characters other than digits and signs are dropped.
pub fn superscript(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '+' => Some('⁺'),
            '-' => Some('⁻'),
            _ => c.to_digit(10).map(|d| SUPERSCRIPT_DIGITS[d as usize]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superscript() {
        assert_eq!(superscript("-12"), "⁻¹²");
        assert_eq!(superscript("+907"), "⁺⁹⁰⁷");
        assert_eq!(superscript("x?"), "");
    }

    #[test]
    fn test_float() {
        assert_eq!(float(12.345, Some(1e-3..1e3), 1), "12.3");
        assert_eq!(float(12345.0, Some(1e-3..1e3), 1), "1.2e4");
        assert_eq!(float(0.5, None, 2), "5.00e-1");
    }
}
