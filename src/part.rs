use crate::error::{ConfigError, PartError};
use std::sync::Arc;

const DEFAULT_NUMERIC_FIRST_VALUE: &str = "0";

/// Configuration of a numeric part. Its value is bumped by incrementing the first run of digits
/// in it, keeping any text before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericConfig {
    first_value: String,
    optional_value: String,
}

impl NumericConfig {
    /// Returns a numeric configuration.
    ///
    /// - `first_value` is the value the part is reset to. Defaults to `"0"`.
    /// - `optional_value` is the value at which the part may be left out of a serialized version.
    ///   Defaults to `first_value`.
    ///
    /// # Errors
    ///
    /// - Returns [`ConfigError::NonNumericFirstValue`] if `first_value` has no digits.
    pub fn new(
        part: &str,
        first_value: Option<&str>,
        optional_value: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let first_value = first_value.unwrap_or(DEFAULT_NUMERIC_FIRST_VALUE);
        if split_first_number(first_value).is_none() {
            return Err(ConfigError::NonNumericFirstValue {
                part: part.to_string(),
                value: first_value.to_string(),
            });
        }
        Ok(Self {
            first_value: first_value.to_string(),
            optional_value: optional_value.unwrap_or(first_value).to_string(),
        })
    }
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            first_value: DEFAULT_NUMERIC_FIRST_VALUE.to_string(),
            optional_value: DEFAULT_NUMERIC_FIRST_VALUE.to_string(),
        }
    }
}

/// Configuration of a part that steps through an explicit list of values, like
/// `dev`, `rc`, `final`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesConfig {
    values: Vec<String>,
    first_value: String,
    optional_value: String,
}

impl ValuesConfig {
    /// Returns a value list configuration. `first_value` and `optional_value` both default to the
    /// first entry of `values`, and must be entries of `values` when given.
    ///
    /// # Errors
    ///
    /// - Returns [`ConfigError::EmptyValues`] if `values` is empty.
    /// - Returns [`ConfigError::ValueNotListed`] if `first_value` or `optional_value` is not in
    ///   `values`.
    pub fn new(
        part: &str,
        values: Vec<String>,
        first_value: Option<&str>,
        optional_value: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let Some(head) = values.first() else {
            return Err(ConfigError::EmptyValues {
                part: part.to_string(),
            });
        };

        let first_value = first_value.unwrap_or(head).to_string();
        let optional_value = optional_value.unwrap_or(head).to_string();

        for (field, value) in [
            ("first value", &first_value),
            ("optional value", &optional_value),
        ] {
            if !values.contains(value) {
                return Err(ConfigError::ValueNotListed {
                    part: part.to_string(),
                    field,
                    value: value.clone(),
                    values,
                });
            }
        }

        Ok(Self {
            values,
            first_value,
            optional_value,
        })
    }

    /// The configured values, in bump order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// How a part's value behaves when bumped or reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartConfig {
    /// Plain increment of the first number in the value.
    Numeric(NumericConfig),
    /// Advance to the next entry of a list.
    Values(ValuesConfig),
}

impl PartConfig {
    fn first_value(&self) -> &str {
        match self {
            PartConfig::Numeric(config) => &config.first_value,
            PartConfig::Values(config) => &config.first_value,
        }
    }

    fn optional_value(&self) -> &str {
        match self {
            PartConfig::Numeric(config) => &config.optional_value,
            PartConfig::Values(config) => &config.optional_value,
        }
    }

    fn next_value(&self, value: &str) -> Result<String, PartError> {
        match self {
            PartConfig::Numeric(_) => {
                let (prefix, number, suffix) =
                    split_first_number(value).ok_or_else(|| PartError::NoDigits {
                        value: value.to_string(),
                    })?;
                let number: u64 = number.parse().map_err(|_| PartError::Overflow {
                    value: value.to_string(),
                })?;
                let next = number.checked_add(1).ok_or_else(|| PartError::Overflow {
                    value: value.to_string(),
                })?;
                Ok(format!("{prefix}{next}{suffix}"))
            }
            PartConfig::Values(config) => {
                let index = config
                    .values
                    .iter()
                    .position(|v| v == value)
                    .ok_or_else(|| PartError::NotInValues {
                        value: value.to_string(),
                        values: config.values.clone(),
                    })?;
                config
                    .values
                    .get(index + 1)
                    .cloned()
                    .ok_or_else(|| PartError::AlreadyLast {
                        value: value.to_string(),
                        values: config.values.clone(),
                    })
            }
        }
    }
}

impl Default for PartConfig {
    fn default() -> Self {
        PartConfig::Numeric(NumericConfig::default())
    }
}

/// Splits `value` around its first run of ASCII digits.
fn split_first_number(value: &str) -> Option<(&str, &str, &str)> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let len = value[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len() - start);
    Some((
        &value[..start],
        &value[start..start + len],
        &value[start + len..],
    ))
}

/// A single named component value of a [`Version`](crate::Version), together with the
/// configuration that decides how it is bumped and reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPart {
    value: String,
    config: Arc<PartConfig>,
}

impl VersionPart {
    /// Returns a part holding `value`. A missing value (from a capture group that did not take
    /// part in a match) becomes the configuration's first value.
    pub fn new(value: Option<&str>, config: Arc<PartConfig>) -> Self {
        let value = value.unwrap_or_else(|| config.first_value()).to_string();
        Self { value, config }
    }

    /// The current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns a part advanced by one step.
    ///
    /// # Errors
    ///
    /// - Numeric parts: [`PartError::NoDigits`] or [`PartError::Overflow`].
    /// - Value-list parts: [`PartError::NotInValues`] or [`PartError::AlreadyLast`].
    pub fn bump(&self) -> Result<Self, PartError> {
        Ok(Self {
            value: self.config.next_value(&self.value)?,
            config: Arc::clone(&self.config),
        })
    }

    /// Returns a part reset to the configuration's first value.
    pub fn null(&self) -> Self {
        Self {
            value: self.config.first_value().to_string(),
            config: Arc::clone(&self.config),
        }
    }

    /// Returns true if this part may be left out of a serialized version.
    pub fn is_optional(&self) -> bool {
        self.value == self.config.optional_value()
    }
}
