//! Token → denom resolution and base-unit arithmetic.
//!
//! Amounts are handled as decimal text and converted with integer math so
//! `1.234567` is exactly `1234567` base units. Extra fractional digits are
//! truncated, never rounded.

use std::collections::HashMap;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::TokenConfig;

/// Static token → denom lookup table.
#[derive(Debug, Clone)]
pub struct DenomTable {
    native_token: String,
    native_denom: String,
    decimals: u32,
    known: HashMap<String, String>,
}

impl DenomTable {
    /// Build the table from configuration. Token keys are case-insensitive.
    pub fn from_config(config: &TokenConfig) -> Self {
        let mut known: HashMap<String, String> = config
            .extra
            .iter()
            .map(|(token, denom)| (token.to_lowercase(), denom.clone()))
            .collect();
        known.insert(config.native_token.to_lowercase(), config.native_denom.clone());

        Self {
            native_token: config.native_token.to_lowercase(),
            native_denom: config.native_denom.clone(),
            decimals: config.decimals,
            known,
        }
    }

    /// Resolve a token symbol to its denom; unknown tokens map to `u<token>`.
    pub fn resolve(&self, token: &str) -> String {
        let token = token.trim().to_lowercase();
        match self.known.get(&token) {
            Some(denom) => denom.clone(),
            None => format!("u{}", token),
        }
    }

    /// Ticker shown next to formatted amounts (`uosmo` → `OSMO`, `factory/.../LAB` → `LAB`).
    pub fn ticker(&self, denom: &str) -> String {
        if let Some((token, _)) = self.known.iter().find(|(_, d)| d.as_str() == denom) {
            return token.to_uppercase();
        }
        if let Some(last) = denom.rsplit('/').next().filter(|_| denom.contains('/')) {
            return last.to_uppercase();
        }
        match denom.strip_prefix('u') {
            Some(rest) if !rest.is_empty() => rest.to_uppercase(),
            _ => denom.to_uppercase(),
        }
    }

    pub fn native_token(&self) -> &str {
        &self.native_token
    }

    pub fn native_denom(&self) -> &str {
        &self.native_denom
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Convert a human amount to base units (`floor(amount * 10^decimals)`).
    pub fn to_base_units(&self, amount: &str) -> BlockchainResult<u128> {
        to_base_units(amount, self.decimals)
    }

    /// Render base units as `<whole>.<fraction> <TICKER>`.
    pub fn format(&self, amount: u128, denom: &str) -> String {
        format!("{} {}", format_units(amount, self.decimals), self.ticker(denom))
    }
}

/// Largest exponent accepted in `1.5e3` style amounts.
const MAX_EXPONENT: i64 = 38;

/// Parse decimal text into `(mantissa, scale)` with no precision loss.
///
/// An `e`/`E` exponent is folded into the scale, so `1e-6` is `(1, 6)` and
/// `1.5e3` is `(1500, 0)`. JSON numbers reach us in that form.
pub fn parse_decimal(raw: &str) -> BlockchainResult<(u128, u32)> {
    let invalid = || BlockchainError::InvalidAmount(raw.to_string());
    let text = raw.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    if text.is_empty() || text.starts_with('-') {
        return Err(invalid());
    }

    let (body, exponent) = match text.split_once(['e', 'E']) {
        Some((body, exp)) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            let exponent: i64 = exp.parse().map_err(|_| invalid())?;
            if exponent.abs() > MAX_EXPONENT {
                return Err(invalid());
            }
            (body, exponent)
        }
        None => (text, 0),
    };

    let (whole, fraction) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };
    if (whole.is_empty() && fraction.is_empty())
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let digits = format!("{}{}", whole, fraction);
    let digits = digits.trim_start_matches('0');
    let mantissa = if digits.is_empty() {
        0
    } else {
        digits.parse::<u128>().map_err(|_| invalid())?
    };

    let scale = fraction.len() as i64 - exponent;
    if scale >= 0 {
        let scale = u32::try_from(scale).map_err(|_| invalid())?;
        Ok((mantissa, scale))
    } else {
        let factor = 10u128
            .checked_pow(u32::try_from(-scale).map_err(|_| invalid())?)
            .ok_or_else(invalid)?;
        Ok((mantissa.checked_mul(factor).ok_or_else(invalid)?, 0))
    }
}

/// `floor(amount * 10^decimals)` computed exactly from decimal text.
pub fn to_base_units(amount: &str, decimals: u32) -> BlockchainResult<u128> {
    let (mantissa, scale) = parse_decimal(amount)?;
    let overflow = || BlockchainError::InvalidAmount(format!("{} is too large", amount));

    if scale <= decimals {
        let factor = 10u128.checked_pow(decimals - scale).ok_or_else(overflow)?;
        mantissa.checked_mul(factor).ok_or_else(overflow)
    } else {
        let divisor = 10u128.checked_pow(scale - decimals).ok_or_else(overflow)?;
        Ok(mantissa / divisor)
    }
}

/// Render base units with exactly `decimals` fractional digits.
pub fn format_units(amount: u128, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let factor = 10u128.pow(decimals);
    format!(
        "{}.{:0width$}",
        amount / factor,
        amount % factor,
        width = decimals as usize
    )
}
