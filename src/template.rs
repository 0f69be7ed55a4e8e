use crate::{context::Value, error::TemplateError};
use core::{
    fmt::{self, Display},
    str::FromStr,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TemplateToken {
    /// Literal text, already unescaped (`{{` is stored as `{`).
    Literal(String),

    /// A `{name}` or `{name:spec}` placeholder.
    Field { name: String, spec: Option<String> },
}

/// A brace-placeholder template, like `{major}.{minor}.{patch}` or
/// `version = "{current_version}"`.
///
/// Placeholders name a version part or a context value. `{{` and `}}` produce literal braces. A
/// placeholder may carry a format spec after a colon, which is only meaningful for timestamps:
/// `{now:%Y-%m-%d}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<TemplateToken>,
}

impl Template {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::UnterminatedField`] for a `{` with no closing `}`.
    /// - [`TemplateError::UnmatchedClosingBrace`] for a lone `}`.
    /// - [`TemplateError::EmptyFieldName`] for `{}` or `{:spec}`.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut rest = template;
        let mut tokens = Vec::new();

        while !rest.is_empty() {
            let (literal, consume_len) = if rest.starts_with("{{") {
                ("{", 2)
            } else if rest.starts_with("}}") {
                ("}", 2)
            } else if rest.starts_with('}') {
                return Err(TemplateError::UnmatchedClosingBrace {
                    template: template.to_string(),
                });
            } else if rest.starts_with('{') {
                let closing_index =
                    rest.find('}')
                        .ok_or_else(|| TemplateError::UnterminatedField {
                            template: template.to_string(),
                        })?;
                let inner = &rest[1..closing_index];
                let (name, spec) = match inner.split_once(':') {
                    Some((name, spec)) => (name, Some(spec.to_string())),
                    None => (inner, None),
                };
                if name.is_empty() {
                    return Err(TemplateError::EmptyFieldName {
                        template: template.to_string(),
                    });
                }
                tokens.push(TemplateToken::Field {
                    name: name.to_string(),
                    spec,
                });
                rest = &rest[closing_index + 1..];
                continue;
            } else {
                // up to the next brace, which is handled above
                let end = rest.find(['{', '}']).unwrap_or(rest.len());
                (&rest[..end], end)
            };

            // merge adjacent literals so rendering is a straight walk
            if let Some(TemplateToken::Literal(last_literal)) = tokens.last_mut() {
                last_literal.push_str(literal);
            } else {
                tokens.push(TemplateToken::Literal(literal.to_string()));
            }

            rest = &rest[consume_len..];
        }

        Ok(Self {
            source: template.to_string(),
            tokens,
        })
    }

    /// The field names referenced by this template, in order of appearance.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            TemplateToken::Field { name, .. } => Some(name.as_str()),
            TemplateToken::Literal(_) => None,
        })
    }

    /// Renders the template, looking up each field with `lookup`.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::MissingField`] if `lookup` has no value for a field.
    /// - [`TemplateError::UnsupportedSpec`] or [`TemplateError::InvalidTimestampSpec`] if a
    ///   field's format spec does not suit its value.
    pub fn render<'a, F>(&self, lookup: F) -> Result<String, TemplateError>
    where
        F: Fn(&str) -> Option<&'a Value>,
    {
        let mut rendered = String::with_capacity(self.source.len());
        for token in &self.tokens {
            match token {
                TemplateToken::Literal(text) => rendered.push_str(text),
                TemplateToken::Field { name, spec } => {
                    let value = lookup(name).ok_or_else(|| TemplateError::MissingField {
                        field: name.clone(),
                        template: self.source.clone(),
                    })?;
                    rendered.push_str(&value.render(name, spec.as_deref())?);
                }
            }
        }
        Ok(rendered)
    }

    /// The template string as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
