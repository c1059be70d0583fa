//! Client-side form validation.
//!
//! Validators collect every failure instead of stopping at the first, so a
//! form can show the whole list before anything is submitted.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered list of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.push(field, message);
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Ticker symbols: 1 to 15 chars, upper-case letters, digits, and `. - ^ =`.
pub fn is_valid_symbol(symbol: &str) -> bool {
    (1..=15).contains(&symbol.len())
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || ".-^=".contains(c))
}

/// Validate a symbol list; reports each bad symbol once plus an empty-list error.
pub fn validate_symbols(field: &str, symbols: &[String], errors: &mut ValidationErrors) {
    if symbols.is_empty() {
        errors.push(field, "at least one symbol is required");
        return;
    }
    for s in symbols {
        if !is_valid_symbol(s) {
            errors.push(field, format!("invalid symbol '{s}'"));
        }
    }
    let mut seen = std::collections::HashSet::new();
    for s in symbols {
        if !seen.insert(s) {
            errors.push(field, format!("duplicate symbol '{s}'"));
        }
    }
}

/// Validate `start < end` and that `end` is not after `today`.
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
    errors: &mut ValidationErrors,
) {
    match (start, end) {
        (None, _) => errors.push("start_date", "start date is required"),
        (_, None) => errors.push("end_date", "end date is required"),
        (Some(s), Some(e)) => {
            errors.check(s < e, "end_date", "end date must be after start date");
            errors.check(e <= today, "end_date", "end date cannot be in the future");
        }
    }
}
