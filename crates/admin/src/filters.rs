//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Text shown for optional fields that were left empty.
const NOT_SET: &str = "Not set";

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Show a placeholder for blank text.
///
/// Usage in templates: `{{ product.description|or_not_set }}`
#[askama::filter_fn]
pub fn or_not_set(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(not_set_if_blank(&value.to_string()))
}

fn not_set_if_blank(value: &str) -> String {
    if value.trim().is_empty() {
        NOT_SET.to_string()
    } else {
        value.to_string()
    }
}
