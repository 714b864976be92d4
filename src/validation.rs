//! Field checks shared by request bodies. Field names in messages are the JSON (camelCase) names.

use crate::error::AppError;
use bigdecimal::{BigDecimal, Zero};
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
    })
}

/// Trimmed length must be within `min..=max` characters.
pub fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len == 0 && min > 0 {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if len < min {
        return Err(AppError::Validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if len > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn check_optional_length(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) => check_length(field, v, 0, max),
        None => Ok(()),
    }
}

pub fn check_email(field: &str, value: &str) -> Result<(), AppError> {
    if value.len() > 254 || !email_regex().is_match(value.trim()) {
        return Err(AppError::Validation(format!("{} must be a valid email", field)));
    }
    Ok(())
}

/// Strictly positive amount, at most `max`, with no more than two decimal places.
pub fn check_amount(field: &str, value: &BigDecimal, max: &BigDecimal) -> Result<(), AppError> {
    if value <= &BigDecimal::zero() {
        return Err(AppError::Validation(format!("{} must be greater than 0", field)));
    }
    if value > max {
        return Err(AppError::Validation(format!("{} must be at most {}", field, max)));
    }
    if value.with_scale(2) != *value {
        return Err(AppError::Validation(format!(
            "{} must have at most 2 decimal places",
            field
        )));
    }
    Ok(())
}

pub fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), AppError> {
    if value < min || value > max {
        return Err(AppError::Validation(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(())
}

pub fn check_url(field: &str, value: &str) -> Result<(), AppError> {
    let v = value.trim();
    if !(v.starts_with("http://") || v.starts_with("https://")) || v.len() > 2048 {
        return Err(AppError::Validation(format!("{} must be an http(s) URL", field)));
    }
    Ok(())
}
