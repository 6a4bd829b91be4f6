//! Turning consumption into itemized bills.

mod bill;
mod calculator;

pub use bill::{Bill, SlabCharge};
pub use calculator::BillCalculator;

/// Rounds a monetary amount to 2 decimals, half away from zero.
///
/// Halves are judged on the shortest decimal form of `amount`, so `1.005`
/// rounds up even though its binary value lies just below it.
#[must_use]
pub fn round_money(amount: f64) -> f64 {
    let shortest = format!("{amount:e}");
    let cents = shortest
        .split_once('e')
        .and_then(|(mantissa, exponent)| {
            let exponent: i32 = exponent.parse().ok()?;
            format!("{mantissa}e{}", exponent + 2).parse::<f64>().ok()
        })
        .unwrap_or(amount * 100.0);
    cents.round() / 100.0
}
