use crate::{
    config::{VersionConfig, VersionConfigBuilder},
    error::ConfigError,
    file::{unified_diff, ConfiguredFile, Replacement},
    part::{NumericConfig, PartConfig, ValuesConfig},
    report::Reporter,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use toml_edit::{DocumentMut, Item};

/// The default settings file name, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = ".bumpversion.toml";

/// Files taken as the version source when none is configured. The first one that exists wins.
pub const VERSION_SOURCE_CANDIDATES: [&str; 3] = ["setup.py", "plugin.json", "VERSION"];

const CURRENT_VERSION_KEY: &str = "current_version";

/// How a single part behaves, from a `[part.NAME]` table.
///
/// A part with `values` steps through that list. Any other part is numeric.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PartSection {
    /// The values to step through, in order.
    pub values: Option<Vec<String>>,
    /// The value the part is reset to.
    pub first_value: Option<String>,
    /// The value at which the part may be left out of a serialized version.
    pub optional_value: Option<String>,
}

impl PartSection {
    fn to_config(&self, name: &str) -> Result<PartConfig, ConfigError> {
        let first_value = self.first_value.as_deref();
        let optional_value = self.optional_value.as_deref();
        Ok(match &self.values {
            Some(values) => PartConfig::Values(ValuesConfig::new(
                name,
                values.clone(),
                first_value,
                optional_value,
            )?),
            None => PartConfig::Numeric(NumericConfig::new(name, first_value, optional_value)?),
        })
    }
}

/// A file to rewrite, from a `[[file]]` entry. Unset fields inherit the global settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSection {
    /// The file to rewrite.
    pub path: PathBuf,
    /// Parse pattern.
    pub parse: Option<String>,
    /// Serialization formats.
    pub serialize: Option<Vec<String>>,
    /// Search template.
    pub search: Option<String>,
    /// Replace template.
    pub replace: Option<String>,
}

impl FileSection {
    /// A binding for `path` that inherits every global setting.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parse: None,
            serialize: None,
            search: None,
            replace: None,
        }
    }
}

/// Values given on the command line. Each one that is set wins over the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Overrides {
    pub current_version: Option<String>,
    pub parse: Option<String>,
    /// Replaces the configured formats when not empty.
    pub serialize: Vec<String>,
    pub search: Option<String>,
    pub replace: Option<String>,
    /// Files to rewrite in addition to the configured ones, with the global settings.
    pub files: Vec<PathBuf>,
}

/// The contents of a settings file.
///
/// ```toml
/// current_version = "1.2.3"
/// serialize = ["{major}.{minor}.{patch}"]
///
/// [part.release]
/// values = ["dev", "rc", "final"]
///
/// [[file]]
/// path = "setup.py"
/// search = "version='{current_version}'"
/// replace = "version='{new_version}'"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// The version as it is now.
    pub current_version: Option<String>,
    /// Parse pattern. See [`VersionConfigBuilder::parse`].
    pub parse: Option<String>,
    /// Serialization formats, in order of preference.
    pub serialize: Option<Vec<String>>,
    /// Search template.
    pub search: Option<String>,
    /// Replace template.
    pub replace: Option<String>,
    /// A file whose version, when found, is authoritative over `current_version`. Defaults to the
    /// first of [`VERSION_SOURCE_CANDIDATES`] that exists.
    pub version_source: Option<PathBuf>,
    /// Per-part behavior, by part name.
    #[serde(default)]
    pub part: IndexMap<String, PartSection>,
    /// Files to rewrite, in order.
    #[serde(default)]
    pub file: Vec<FileSection>,
}

fn overlay(
    mut builder: VersionConfigBuilder,
    parse: &Option<String>,
    serialize: &Option<Vec<String>>,
    search: &Option<String>,
    replace: &Option<String>,
) -> VersionConfigBuilder {
    if let Some(parse) = parse {
        builder = builder.parse(parse);
    }
    if let Some(serialize) = serialize {
        builder = builder.serialize(serialize);
    }
    if let Some(search) = search {
        builder = builder.search(search);
    }
    if let Some(replace) = replace {
        builder = builder.replace(replace);
    }
    builder
}

impl Settings {
    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read.
    /// - [`ConfigError::Toml`] if it is not valid TOML, has unknown keys, or values of the wrong
    ///   type.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns these settings with `overrides` applied.
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if overrides.current_version.is_some() {
            self.current_version = overrides.current_version;
        }
        if overrides.parse.is_some() {
            self.parse = overrides.parse;
        }
        if !overrides.serialize.is_empty() {
            self.serialize = Some(overrides.serialize);
        }
        if overrides.search.is_some() {
            self.search = overrides.search;
        }
        if overrides.replace.is_some() {
            self.replace = overrides.replace;
        }
        self.file
            .extend(overrides.files.into_iter().map(FileSection::new));
        self
    }

    /// The version source: the configured one, or else the first of
    /// [`VERSION_SOURCE_CANDIDATES`] that is a file in `root`.
    pub fn version_source_in(&self, root: &Path) -> Option<PathBuf> {
        self.version_source.clone().or_else(|| {
            VERSION_SOURCE_CANDIDATES
                .iter()
                .map(|name| root.join(name))
                .find(|path| path.is_file())
        })
    }

    /// Builds the configuration of every `[part.NAME]` table.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`] if a part's values or first value are invalid.
    pub fn part_configs(&self) -> Result<HashMap<String, Arc<PartConfig>>, ConfigError> {
        self.part
            .iter()
            .map(|(name, section)| Ok((name.clone(), Arc::new(section.to_config(name)?))))
            .collect()
    }

    fn builder(&self, part_configs: &HashMap<String, Arc<PartConfig>>) -> VersionConfigBuilder {
        overlay(
            VersionConfig::builder().part_configs(part_configs.clone()),
            &self.parse,
            &self.serialize,
            &self.search,
            &self.replace,
        )
    }

    /// Builds the global version configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`] if the pattern or a template is invalid.
    pub fn version_config(
        &self,
        part_configs: &HashMap<String, Arc<PartConfig>>,
    ) -> Result<VersionConfig, ConfigError> {
        self.builder(part_configs).build()
    }

    /// Binds every `[[file]]` entry to its configuration, in the order they are listed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`] if a pattern or a template is invalid.
    pub fn configured_files(
        &self,
        part_configs: &HashMap<String, Arc<PartConfig>>,
    ) -> Result<Vec<ConfiguredFile>, ConfigError> {
        self.file
            .iter()
            .map(|section| {
                let config = overlay(
                    self.builder(part_configs),
                    &section.parse,
                    &section.serialize,
                    &section.search,
                    &section.replace,
                )
                .build()?;
                Ok(ConfiguredFile::new(&section.path, config))
            })
            .collect()
    }
}

/// Sets `current_version` in the settings file at `path` to `new_version`, adding the key if it
/// is missing. The rest of the file is kept as written, and an existing value keeps its spacing
/// and trailing comment.
///
/// # Errors
///
/// - [`ConfigError::Read`] or [`ConfigError::Write`] if the file cannot be read or written.
/// - [`ConfigError::Edit`] if the file is not valid TOML.
pub(crate) fn write_current_version(
    path: &Path,
    new_version: &str,
    dry_run: bool,
    reporter: &dyn Reporter,
) -> Result<Replacement, ConfigError> {
    let before = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut document: DocumentMut = before.parse().map_err(|source| ConfigError::Edit {
        path: path.to_path_buf(),
        source,
    })?;

    match document
        .get_mut(CURRENT_VERSION_KEY)
        .and_then(Item::as_value_mut)
    {
        Some(value) => {
            let decor = value.decor().clone();
            *value = toml_edit::Value::from(new_version);
            *value.decor_mut() = decor;
        }
        None => document[CURRENT_VERSION_KEY] = toml_edit::value(new_version),
    }
    let after = document.to_string();

    reporter.info(&format!(
        "{} to config file {}:",
        if dry_run { "Would write" } else { "Writing" },
        path.display()
    ));
    if before == after {
        return Ok(Replacement {
            changed: false,
            diff: None,
        });
    }

    let diff = unified_diff(path, &before, &after);
    reporter.info(&diff);
    if !dry_run {
        fs::write(path, after.as_bytes()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(Replacement {
        changed: true,
        diff: Some(diff),
    })
}
