use pings_types::models::StringEnum;

use crate::error::ApiError;

/// Collects required fields and reports every missing one at once.
///
/// A field is missing when absent, `null` or an empty string.
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a field's value, noting it as missing if there is none.
    pub fn take(&mut self, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::MissingFields(self.missing))
        }
    }
}

/// Parse one of the fixed string enums, naming the accepted values on failure.
pub fn one_of<T: StringEnum>(field: &'static str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::invalid(field, format!("Invalid {}. Must be one of: {}", field, T::choices())))
}

/// A value used as one segment of a storage key.
pub fn key_segment(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(ApiError::invalid(field, format!("Invalid {}: must not contain path separators", field)));
    }
    Ok(())
}

/// Optional empty strings are treated as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
