//! Fixed-point amount formatting
//!
//! Balances and transfer amounts are carried in smallest units; the
//! configured precision divisor (a power of ten) only matters when an
//! amount is rendered for display.

/// Format an amount of smallest units as a decimal string
///
/// `precision` is the number of smallest units per whole token. A
/// precision of 1 (or 0) renders the raw amount.
pub fn format_amount(amount: u64, precision: u64) -> String {
    if precision <= 1 {
        return amount.to_string();
    }

    let whole = amount / precision;
    let frac = amount % precision;
    let width = precision.ilog10() as usize;

    format!("{}.{:0width$}", whole, frac, width = width)
}
