use crate::error::TemplateError;
use chrono::{
    format::{Item, StrftimeItems},
    Local, NaiveDateTime, Utc,
};
use indexmap::IndexMap;

/// Rendering of a timestamp without a format spec, e.g. `2024-01-02 03:04:05.000000`.
const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A value available to templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text, rendered as is.
    Text(String),
    /// A point in time, rendered with an optional strftime spec: `{now:%Y.%m}`.
    Timestamp(NaiveDateTime),
}

impl Value {
    pub(crate) fn render(&self, field: &str, spec: Option<&str>) -> Result<String, TemplateError> {
        match (self, spec) {
            (Value::Text(text), None) => Ok(text.clone()),
            (Value::Text(_), Some(spec)) => Err(TemplateError::UnsupportedSpec {
                field: field.to_string(),
                spec: spec.to_string(),
            }),
            (Value::Timestamp(timestamp), spec) => {
                let spec = spec.unwrap_or(DEFAULT_TIMESTAMP_FORMAT);
                // chrono panics while displaying bad items, so reject them up front
                if StrftimeItems::new(spec).any(|item| matches!(item, Item::Error)) {
                    return Err(TemplateError::InvalidTimestampSpec {
                        field: field.to_string(),
                        spec: spec.to_string(),
                    });
                }
                Ok(timestamp
                    .format_with_items(StrftimeItems::new(spec))
                    .to_string())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(timestamp: NaiveDateTime) -> Self {
        Value::Timestamp(timestamp)
    }
}

/// Extra named values available to every template, next to a version's own parts.
///
/// The ambient context holds `now` and `utcnow` timestamps and every environment variable under a
/// `$`-prefixed key. Bumping adds `current_version` and `new_version`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: IndexMap<String, Value>,
}

impl Context {
    /// Returns a context with no values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context of the running process: the current local and UTC time, and the
    /// environment.
    pub fn ambient() -> Self {
        let mut context = Self::new();
        context.insert("now", Local::now().naive_local());
        context.insert("utcnow", Utc::now().naive_utc());
        // variables that are not valid unicode are left out
        for (key, value) in std::env::vars_os() {
            if let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) {
                context.insert(format!("${key}"), value);
            }
        }
        context
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Adds externally supplied text pairs, e.g. version control information.
    pub fn extend_text<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.insert(key, Value::Text(value.into()));
        }
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Iterates over the values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
