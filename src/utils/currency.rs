/// Amount helpers for the mobile-money gateway.
///
/// The STK push API only accepts whole shillings, so every amount is coerced
/// to an integer before a payment row is created.
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};

pub const MIN_AMOUNT: i64 = 1;

/// Amount as it arrives in a request body: either a JSON number or a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

/// Parse user input into whole shillings, truncating any fractional part.
pub fn parse_amount_to_shillings(input: &AmountInput) -> Result<i64, String> {
    let value = match input {
        AmountInput::Number(n) => *n,
        AmountInput::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| "Invalid amount format".to_string())?,
    };

    if !value.is_finite() {
        return Err("Invalid amount format".to_string());
    }

    let shillings = value.trunc();
    if shillings < MIN_AMOUNT as f64 {
        return Err(format!("Amount must be at least KES {}", MIN_AMOUNT));
    }
    if shillings > i64::MAX as f64 {
        return Err("Amount is too large".to_string());
    }

    Ok(shillings as i64)
}

/// Whole shillings from a stored decimal (job budgets).
pub fn decimal_to_shillings(amount: &BigDecimal) -> Result<i64, String> {
    let shillings = amount
        .with_scale(0)
        .to_i64()
        .ok_or_else(|| "Amount is out of range".to_string())?;

    if shillings < MIN_AMOUNT {
        return Err(format!("Amount must be at least KES {}", MIN_AMOUNT));
    }
    Ok(shillings)
}

pub fn format_shillings(amount: &BigDecimal) -> String {
    format!("KES {}", amount.with_scale(2))
}
