use crate::{
    context::{Context, Value},
    error::{ConfigError, SerializeError, TemplateError},
    part::{PartConfig, VersionPart},
    report::Reporter,
    template::Template,
    version::Version,
};
use regex::{Captures, Regex, RegexBuilder};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Default parse pattern: three dot-separated numbers.
pub const DEFAULT_PARSE_PATTERN: &str = r"(?P<major>\d+)\.(?P<minor>\d+)\.(?P<patch>\d+)";
/// Default serialization format.
pub const DEFAULT_SERIALIZE_FORMAT: &str = "{major}.{minor}.{patch}";
/// Default search template.
pub const DEFAULT_SEARCH: &str = "{current_version}";
/// Default replace template.
pub const DEFAULT_REPLACE: &str = "{new_version}";

/// Builds a [`VersionConfig`]. Every setting starts at its documented default.
#[derive(Debug, Clone)]
pub struct VersionConfigBuilder {
    parse: String,
    serialize: Vec<String>,
    search: String,
    replace: String,
    part_configs: HashMap<String, Arc<PartConfig>>,
}

impl Default for VersionConfigBuilder {
    fn default() -> Self {
        Self {
            parse: DEFAULT_PARSE_PATTERN.to_string(),
            serialize: vec![DEFAULT_SERIALIZE_FORMAT.to_string()],
            search: DEFAULT_SEARCH.to_string(),
            replace: DEFAULT_REPLACE.to_string(),
            part_configs: HashMap::new(),
        }
    }
}

impl VersionConfigBuilder {
    /// Sets the parse pattern, a regex whose named groups become version parts. It is compiled in
    /// verbose mode: whitespace is ignored and `#` starts a comment.
    pub fn parse(mut self, pattern: impl Into<String>) -> Self {
        self.parse = pattern.into();
        self
    }

    /// Sets the serialization formats, in order of preference. The first one also defines the
    /// canonical component order.
    pub fn serialize<S: Into<String>>(mut self, formats: impl IntoIterator<Item = S>) -> Self {
        self.serialize = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the search template.
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the replace template.
    pub fn replace(mut self, replace: impl Into<String>) -> Self {
        self.replace = replace.into();
        self
    }

    /// Configures how the part named `name` is bumped and reset. Unconfigured parts are numeric.
    pub fn part(mut self, name: impl Into<String>, config: PartConfig) -> Self {
        self.part_configs.insert(name.into(), Arc::new(config));
        self
    }

    /// Uses an already shared set of part configurations.
    pub fn part_configs(mut self, part_configs: HashMap<String, Arc<PartConfig>>) -> Self {
        self.part_configs = part_configs;
        self
    }

    /// Compiles the pattern and templates.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPattern`] if the parse pattern is not a valid regex.
    /// - [`ConfigError::NoSerializeFormats`] if no serialization format was given.
    /// - [`ConfigError::Template`] if any template is malformed.
    pub fn build(self) -> Result<VersionConfig, ConfigError> {
        let parse_regex = RegexBuilder::new(&self.parse)
            .ignore_whitespace(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: self.parse.clone(),
                source,
            })?;

        if self.serialize.is_empty() {
            return Err(ConfigError::NoSerializeFormats);
        }
        let serialize_formats = self
            .serialize
            .iter()
            .map(|format| Template::parse(format))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(VersionConfig {
            parse_regex,
            serialize_formats,
            search: Template::parse(&self.search)?,
            replace: Template::parse(&self.replace)?,
            part_configs: self.part_configs,
            default_part_config: Arc::new(PartConfig::default()),
        })
    }
}

/// The result of rendering a version with one serialization format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attempt {
    /// Every component that needs representation is in the format.
    Complete(String),
    /// The format rendered, but leaves out components that need representation.
    Incomplete(String),
}

/// Picks a format from per-format attempts, in declared order: the first complete rendering wins,
/// otherwise the first rendering at all. An error stops the selection.
pub(crate) fn select_attempt<I>(attempts: I) -> Result<Option<(usize, String)>, SerializeError>
where
    I: IntoIterator<Item = Result<Attempt, SerializeError>>,
{
    let mut fallback = None;
    for (idx, attempt) in attempts.into_iter().enumerate() {
        match attempt? {
            Attempt::Complete(rendered) => return Ok(Some((idx, rendered))),
            Attempt::Incomplete(rendered) => {
                if fallback.is_none() {
                    fallback = Some((idx, rendered));
                }
            }
        }
    }
    Ok(fallback)
}

/// Everything needed to parse a version, serialize it back and find it in a file: the parse
/// pattern, the serialization formats, the search and replace templates, and how each part
/// behaves.
///
/// # Example
///
/// ```
/// use verbump::prelude::*;
///
/// let config = VersionConfig::builder()
///     .parse(r"(?P<major>\d+)\.(?P<minor>\d+)(\.(?P<patch>\d+))?")
///     .serialize(["{major}.{minor}.{patch}", "{major}.{minor}"])
///     .build()
///     .unwrap();
/// let version = config.parse("1.2", &Collector::new()).unwrap();
/// let order: Vec<&str> = config.order().collect();
/// let next = version.bump("minor", &order).unwrap();
/// assert_eq!("1.3.0", config.serialize(&next, &Context::new()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct VersionConfig {
    parse_regex: Regex,
    serialize_formats: Vec<Template>,
    search: Template,
    replace: Template,
    part_configs: HashMap<String, Arc<PartConfig>>,
    default_part_config: Arc<PartConfig>,
}

impl VersionConfig {
    /// Returns a builder starting from the defaults: pattern `major.minor.patch`, format
    /// `{major}.{minor}.{patch}`, search `{current_version}`, replace `{new_version}`.
    pub fn builder() -> VersionConfigBuilder {
        VersionConfigBuilder::default()
    }

    /// Returns a copy of this configuration with other search and replace templates.
    ///
    /// # Errors
    ///
    /// - [`TemplateError`] if either template is malformed.
    pub fn with_search_replace(&self, search: &str, replace: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            search: Template::parse(search)?,
            replace: Template::parse(replace)?,
            ..self.clone()
        })
    }

    pub(crate) fn parse_regex(&self) -> &Regex {
        &self.parse_regex
    }

    /// The serialization formats, in order of preference.
    pub fn serialize_formats(&self) -> &[Template] {
        &self.serialize_formats
    }

    /// The search template.
    pub fn search(&self) -> &Template {
        &self.search
    }

    /// The replace template.
    pub fn replace(&self) -> &Template {
        &self.replace
    }

    /// The configuration of the part named `name`, numeric if not configured.
    pub fn part_config(&self, name: &str) -> Arc<PartConfig> {
        self.part_configs
            .get(name)
            .map_or_else(|| Arc::clone(&self.default_part_config), Arc::clone)
    }

    /// The canonical component order: the field names of the first serialization format, in the
    /// order they appear. Earlier components are higher-order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.serialize_formats
            .first()
            .into_iter()
            .flat_map(|format| format.field_names())
            .filter(move |name| seen.insert(*name))
    }

    /// Parses the first match of the parse pattern in `version_str` into a [`Version`]. Its
    /// original text is the matched substring.
    ///
    /// Returns `None`, and reports a warning, if the pattern does not match.
    pub fn parse(&self, version_str: &str, reporter: &dyn Reporter) -> Option<Version> {
        reporter.info(&format!(
            "Parsing version '{}' using regexp '{}'",
            version_str,
            self.one_line_pattern()
        ));

        let Some(captures) = self.parse_regex.captures(version_str) else {
            reporter.warn(&format!(
                "Evaluating 'parse' option: '{}' does not parse current version '{}'",
                self.parse_regex.as_str(),
                version_str
            ));
            return None;
        };

        let version = self.version_from_captures(&captures, |_, part| part);
        reporter.info(&format!("Parsed the following values: {version}"));
        Some(version)
    }

    /// Builds a version from the named groups of a match. `map_part` may replace a part, given its
    /// name.
    pub(crate) fn version_from_captures<F>(&self, captures: &Captures, map_part: F) -> Version
    where
        F: Fn(&str, VersionPart) -> VersionPart,
    {
        let original = captures.get(0).map(|m| m.as_str().to_string());
        let parts = self
            .parse_regex
            .capture_names()
            .flatten()
            .map(|name| {
                let value = captures.name(name).map(|m| m.as_str());
                let part = VersionPart::new(value, self.part_config(name));
                (name.to_string(), map_part(name, part))
            });
        Version::new(parts, original)
    }

    /// The parse pattern with comments and line breaks removed.
    fn one_line_pattern(&self) -> String {
        self.parse_regex
            .as_str()
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .collect()
    }

    /// The components of `version` that a format must contain to be complete: walking the
    /// canonical order, every non-optional part, and every optional part before the first
    /// non-optional one.
    fn keys_needing_representation<'a>(&'a self, version: &Version) -> Vec<&'a str> {
        let mut found_required = false;
        let mut keys = Vec::new();
        for name in self.order() {
            // names that only the context provides never need representation
            let Some(part) = version.get(name) else {
                continue;
            };
            if !part.is_optional() {
                found_required = true;
                keys.push(name);
            } else if !found_required {
                keys.push(name);
            }
        }
        keys
    }

    fn attempt(
        &self,
        version: &Version,
        format: &Template,
        context: &Context,
    ) -> Result<Attempt, SerializeError> {
        let parts: HashMap<&str, Value> = version
            .iter()
            .map(|(name, part)| (name, Value::Text(part.value().to_string())))
            .collect();

        let rendered = format
            .render(|name| parts.get(name).or_else(|| context.get(name)))
            .map_err(|err| match err {
                TemplateError::MissingField { field, .. } => SerializeError::MissingValue {
                    key: field,
                    version: version.to_string(),
                },
                err => SerializeError::Template(err),
            })?;

        let in_format: HashSet<&str> = format.field_names().collect();
        let complete = self
            .keys_needing_representation(version)
            .into_iter()
            .all(|key| in_format.contains(key));

        Ok(if complete {
            Attempt::Complete(rendered)
        } else {
            Attempt::Incomplete(rendered)
        })
    }

    fn select(
        &self,
        version: &Version,
        context: &Context,
    ) -> Result<(usize, String), SerializeError> {
        let attempts = self
            .serialize_formats
            .iter()
            .map(|format| self.attempt(version, format, context));
        select_attempt(attempts)?.ok_or_else(|| SerializeError::NoSuitableFormat {
            version: version.to_string(),
        })
    }

    /// Returns the serialization format [`VersionConfig::serialize`] would use for `version`.
    ///
    /// # Errors
    ///
    /// See [`VersionConfig::serialize`].
    pub fn choose_serialize_format(
        &self,
        version: &Version,
        context: &Context,
    ) -> Result<&Template, SerializeError> {
        let (idx, _) = self.select(version, context)?;
        Ok(&self.serialize_formats[idx])
    }

    /// Renders `version` with the most suitable serialization format.
    ///
    /// Formats are tried in order. The first one that contains every component needing
    /// representation is used: every non-optional component, and every optional component that
    /// comes before the first non-optional one in the canonical order. If none does, the first
    /// format that rendered at all is used. Fields not found in the version are looked up in
    /// `context`.
    ///
    /// # Errors
    ///
    /// - [`SerializeError::MissingValue`] as soon as a tried format references a field that
    ///   neither `version` nor `context` has.
    /// - [`SerializeError::NoSuitableFormat`] if no format rendered.
    pub fn serialize(&self, version: &Version, context: &Context) -> Result<String, SerializeError> {
        self.select(version, context).map(|(_, rendered)| rendered)
    }
}
