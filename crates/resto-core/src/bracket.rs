//! # Commission Brackets
//!
//! An ordered list of contiguous numeric ranges, each mapped to a fixed
//! payout amount. Pure data + lookup, no dependencies beyond `Money`.
//!
//! ## Bracket Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  brackets (sorted by min, matched in order, first match wins):          │
//! │                                                                         │
//! │    [100 ────────── 500]   fixed 100                                    │
//! │    [501 ────────── 750]   fixed 200                                    │
//! │                                                                         │
//! │  value 500  → first bracket (upper end inclusive)                      │
//! │  value 501  → second bracket                                           │
//! │  value 750  → second bracket (last max is inclusive, not a catch-all)  │
//! │  value 751  → no match → zero                                          │
//! │  value 50   → below first min → zero                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Upper ends are inclusive on every bracket. Plans are written with
//! non-touching ranges ([100,500],[501,750]), so amounts strictly between
//! two brackets fall into the gap and pay zero. Values exactly equal to a
//! bracket's `max` match that bracket. Payouts at boundaries depend on
//! this exact behavior, so do not tighten it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::money::Money;

// =============================================================================
// Bracket
// =============================================================================

/// A contiguous amount range mapped to a fixed payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Lower bound (inclusive).
    pub min: Money,
    /// Upper bound (inclusive).
    pub max: Money,
    /// Fixed payout for amounts in this range.
    pub fixed: Money,
}

impl Bracket {
    pub const fn new(min: Money, max: Money, fixed: Money) -> Self {
        Bracket { min, max, fixed }
    }
}

// =============================================================================
// Lenient Parsing
// =============================================================================

/// Parses a loosely-typed bracket list into strict `Bracket` values.
///
/// The JSON column has been written by several generations of admin tooling,
/// so entries show up as `{min,max,fixed}` or `{from,to,amount}`, with
/// amounts as numbers or stringly-typed values ("1,500", "2 000.50").
/// Any entry whose min/max/fixed cannot be coerced to a finite number is
/// dropped silently. The result is sorted ascending by `min`.
///
/// This is the single normalization point; nothing downstream ever sees the
/// raw JSON shapes.
///
/// ## Example
/// ```rust
/// use resto_core::bracket::parse_brackets;
/// use serde_json::json;
///
/// let raw = json!([
///     {"from": "501", "to": 750, "amount": 200},
///     {"min": 100, "max": 500, "fixed": "100"},
///     {"min": "garbage", "max": 1, "fixed": 1},
/// ]);
/// let brackets = parse_brackets(&raw);
/// assert_eq!(brackets.len(), 2);
/// assert_eq!(brackets[0].min.cents(), 10_000); // sorted ascending
/// ```
pub fn parse_brackets(raw: &Value) -> Vec<Bracket> {
    let entries = match raw.as_array() {
        Some(arr) => arr,
        None => return Vec::new(),
    };

    let mut brackets: Vec<Bracket> = entries.iter().filter_map(parse_entry).collect();
    brackets.sort_by_key(|b| b.min);
    brackets
}

/// Parses one bracket entry, tolerating both field-name spellings.
fn parse_entry(entry: &Value) -> Option<Bracket> {
    let obj = entry.as_object()?;

    let min = obj.get("min").or_else(|| obj.get("from"))?;
    let max = obj.get("max").or_else(|| obj.get("to"))?;
    let fixed = obj.get("fixed").or_else(|| obj.get("amount"))?;

    Some(Bracket {
        min: Money::parse_loose(min)?,
        max: Money::parse_loose(max)?,
        fixed: Money::parse_loose(fixed)?,
    })
}

/// Parses a bracket list from stored JSON text, tolerating unparseable text
/// (treated as an empty list).
pub fn parse_brackets_str(raw: &str) -> Vec<Bracket> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => parse_brackets(&value),
        Err(_) => Vec::new(),
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// Resolves the fixed payout for `amount` against a sorted bracket list.
///
/// A value matches a bracket on `min <= v <= max`; the first match in
/// ascending order wins. No match (below the first `min`, above the last
/// `max`, or in a gap between brackets) yields zero: commission is never
/// negative and never extrapolated.
pub fn lookup(brackets: &[Bracket], amount: Money) -> Money {
    for b in brackets {
        if amount >= b.min && amount <= b.max {
            return b.fixed;
        }
    }
    Money::zero()
}

/// The next bracket boundary above `amount`, with its payout.
///
/// Scans forward through the sorted list for the first bracket whose `min`
/// lies strictly above `amount`. Used by the commission preview to show the
/// next sales target. `None` when the amount already sits in (or above) the
/// top bracket.
pub fn next_target(brackets: &[Bracket], amount: Money) -> Option<(Money, Money)> {
    brackets
        .iter()
        .find(|b| b.min > amount)
        .map(|b| (b.min, b.fixed))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_brackets() -> Vec<Bracket> {
        // Amounts in currency units, stored as cents
        vec![
            Bracket::new(Money::from_units(100), Money::from_units(500), Money::from_units(100)),
            Bracket::new(Money::from_units(501), Money::from_units(750), Money::from_units(200)),
        ]
    }

    #[test]
    fn test_lookup_spec_examples() {
        let b = plan_brackets();
        assert_eq!(lookup(&b, Money::from_units(500)), Money::from_units(100));
        assert_eq!(lookup(&b, Money::from_units(501)), Money::from_units(200));
        assert_eq!(lookup(&b, Money::from_units(50)), Money::zero());
    }

    #[test]
    fn test_last_bracket_inclusive_upper_end() {
        let b = plan_brackets();
        // 750 is exactly the last bracket's max: matches (inclusive)
        assert_eq!(lookup(&b, Money::from_units(750)), Money::from_units(200));
        // 751 falls through to zero
        assert_eq!(lookup(&b, Money::from_cents(75_001)), Money::zero());
    }

    #[test]
    fn test_boundary_amounts_match_their_bracket() {
        let b = plan_brackets();
        assert_eq!(lookup(&b, Money::from_units(100)), Money::from_units(100));
        assert_eq!(lookup(&b, Money::from_cents(49_999)), Money::from_units(100));
        // 500.50 sits in the gap between the two brackets
        assert_eq!(lookup(&b, Money::from_cents(50_050)), Money::zero());
    }

    #[test]
    fn test_single_bracket_is_last_and_inclusive() {
        let b = vec![Bracket::new(
            Money::from_units(0),
            Money::from_units(100),
            Money::from_units(10),
        )];
        assert_eq!(lookup(&b, Money::from_units(100)), Money::from_units(10));
        assert_eq!(lookup(&b, Money::from_cents(10_001)), Money::zero());
    }

    #[test]
    fn test_empty_brackets_yield_zero() {
        assert_eq!(lookup(&[], Money::from_units(100)), Money::zero());
    }

    #[test]
    fn test_monotonic_within_bracket() {
        // Two amounts in the same bracket resolve to the same commission
        let b = plan_brackets();
        assert_eq!(
            lookup(&b, Money::from_units(200)),
            lookup(&b, Money::from_units(499))
        );
    }

    #[test]
    fn test_parse_both_field_spellings() {
        let raw = json!([
            {"min": 100, "max": 500, "fixed": 100},
            {"from": 501, "to": 750, "amount": 200},
        ]);
        let b = parse_brackets(&raw);
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].fixed, Money::from_units(200));
    }

    #[test]
    fn test_parse_sorts_by_min() {
        let raw = json!([
            {"min": 501, "max": 750, "fixed": 200},
            {"min": 100, "max": 500, "fixed": 100},
        ]);
        let b = parse_brackets(&raw);
        assert_eq!(b[0].min, Money::from_units(100));
        assert_eq!(b[1].min, Money::from_units(501));
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        let raw = json!([
            {"min": 100, "max": 500, "fixed": 100},
            {"min": "not a number", "max": 500, "fixed": 100},
            {"min": 501, "max": 750},
            "just a string",
            {"min": 900, "max": "1,200", "fixed": "2 000"},
        ]);
        let b = parse_brackets(&raw);
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].max, Money::from_units(1200));
        assert_eq!(b[1].fixed, Money::from_units(2000));
    }

    #[test]
    fn test_parse_non_array_is_empty() {
        assert!(parse_brackets(&json!({"min": 1})).is_empty());
        assert!(parse_brackets(&json!(null)).is_empty());
        assert!(parse_brackets_str("not json at all").is_empty());
    }

    #[test]
    fn test_next_target() {
        let b = plan_brackets();
        // Below all brackets: first boundary is next
        assert_eq!(
            next_target(&b, Money::from_units(50)),
            Some((Money::from_units(100), Money::from_units(100)))
        );
        // Inside the first bracket: next boundary is the second bracket
        assert_eq!(
            next_target(&b, Money::from_units(300)),
            Some((Money::from_units(501), Money::from_units(200)))
        );
        // In or above the top bracket: no further target
        assert_eq!(next_target(&b, Money::from_units(600)), None);
        assert_eq!(next_target(&b, Money::from_units(800)), None);
    }
}
