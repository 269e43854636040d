//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every operation enforces the same
//! invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{AccountId, EngineError, Money, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

pub(crate) fn parse_account_id(value: &str) -> ResultEngine<AccountId> {
    parse_uuid(value, "account").map(AccountId::from_uuid)
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Key used for case-insensitive matching and ordering of free text.
pub(crate) fn fold_text(value: &str) -> String {
    value.trim().nfkc().collect::<String>().to_lowercase()
}

pub(crate) fn ensure_non_negative_quantity(quantity: i64) -> ResultEngine<()> {
    if quantity < 0 {
        return Err(EngineError::InvalidInput(
            "quantity must be >= 0".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_non_negative_price(price: Money) -> ResultEngine<()> {
    if price.is_negative() {
        return Err(EngineError::InvalidInput("price must be >= 0".to_string()));
    }
    Ok(())
}

pub(crate) fn ensure_threshold(threshold: Option<i64>) -> ResultEngine<()> {
    if threshold.is_some_and(|t| t < 0) {
        return Err(EngineError::InvalidInput(
            "low stock threshold must be >= 0".to_string(),
        ));
    }
    Ok(())
}
