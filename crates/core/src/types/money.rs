//! Money display formatting.

use rust_decimal::Decimal;

/// Format a decimal amount as a USD price string (e.g., "$19.99").
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}
