use std::path::PathBuf;

/// Errors from advancing a single version part.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PartError {
    /// A numeric part's value has no digits to increment.
    #[error("Value `{value}` should contain at least one digit to be bumped")]
    NoDigits {
        /// The offending value.
        value: String,
    },

    /// A numeric part's value is too large to increment.
    #[error("Numeric value `{value}` cannot be incremented without overflowing")]
    Overflow {
        /// The offending value.
        value: String,
    },

    /// A value-list part holds a value that is not in its list.
    #[error("Value `{value}` should be one of {values:?}")]
    NotInValues {
        /// The offending value.
        value: String,
        /// The configured values.
        values: Vec<String>,
    },

    /// A value-list part is already at its last value.
    #[error("Value `{value}` is already the last of {values:?} and cannot be bumped")]
    AlreadyLast {
        /// The offending value.
        value: String,
        /// The configured values.
        values: Vec<String>,
    },
}

/// Errors from parsing or rendering a brace-placeholder template.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TemplateError {
    /// A `{` is never closed.
    #[error("Opening brace in template `{template}` should be closed with `}}` or escaped as `{{{{`")]
    UnterminatedField { template: String },

    /// A `}` is neither closing a field nor escaped.
    #[error("Closing brace in template `{template}` should be escaped as `}}}}`")]
    UnmatchedClosingBrace { template: String },

    /// A field has no name.
    #[error("Field in template `{template}` should have a name")]
    EmptyFieldName { template: String },

    /// No value was found for a field.
    #[error("Did not find a value for field `{field}` of template `{template}`")]
    MissingField { field: String, template: String },

    /// A format spec was given for a text value.
    #[error("Field `{field}` holds text, which does not accept format spec `{spec}`")]
    UnsupportedSpec { field: String, spec: String },

    /// A timestamp format spec is not valid strftime.
    #[error("Format spec `{spec}` for field `{field}` is not a valid strftime format")]
    InvalidTimestampSpec { field: String, spec: String },
}

/// Errors from rendering a [`Version`](crate::Version) with serialization templates.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SerializeError {
    /// A template referenced a field that neither the version nor the context provides.
    #[error("Did not find key `{key}` in {version} when serializing version number")]
    MissingValue {
        /// The missing field name.
        key: String,
        /// The version being serialized, as `name=value` pairs.
        version: String,
    },

    /// No template could be rendered at all.
    #[error("Did not find suitable serialization format for {version}")]
    NoSuitableFormat {
        /// The version being serialized, as `name=value` pairs.
        version: String,
    },

    /// A template failed to render for another reason.
    #[error("{0}")]
    Template(#[from] TemplateError),
}

/// Errors from deriving a new [`Version`](crate::Version).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    /// The requested component is not part of the version or its canonical order.
    #[error("To bump `{name}`, it should be a component of the version and of its first serialization format")]
    UnknownComponent {
        /// The requested component name.
        name: String,
    },

    /// The component itself could not be bumped.
    #[error("{0}")]
    Part(#[from] PartError),
}

/// Errors from building a [`VersionConfig`](crate::VersionConfig) or loading settings.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum ConfigError {
    /// The parse pattern does not compile.
    #[error("Parse pattern `{pattern}` is not a valid regex: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// The list of serialization formats is empty.
    #[error("At least one serialization format should be configured")]
    NoSerializeFormats,

    /// A value-list part has no values.
    #[error("Part `{part}` should configure at least one value")]
    EmptyValues { part: String },

    /// A value-list part names a first or optional value outside its list.
    #[error("Part `{part}` has {field} `{value}`, which should be one of {values:?}")]
    ValueNotListed {
        part: String,
        field: &'static str,
        value: String,
        values: Vec<String>,
    },

    /// A numeric part has a first value without digits.
    #[error("Part `{part}` has first value `{value}`, which should contain a number")]
    NonNumericFirstValue { part: String, value: String },

    #[error("{0}")]
    Template(#[from] TemplateError),

    /// The settings file cannot be read.
    #[error("Could not read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid.
    #[error("Config file {} is not valid: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The settings file cannot be parsed for editing.
    #[error("Config file {} cannot be edited: {source}", path.display())]
    Edit {
        path: PathBuf,
        source: toml_edit::TomlError,
    },

    /// The settings file cannot be written.
    #[error("Could not write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from operating on a [`ConfiguredFile`](crate::ConfiguredFile).
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum FileError {
    /// The file cannot be read or written.
    #[error("Could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not UTF-8 text.
    #[error("File {} should be valid UTF-8", path.display())]
    Decode { path: PathBuf },

    /// The file does not mention the version it should.
    #[error("Did not find '{original}' or '{search}' in file {}", path.display())]
    VersionNotFound {
        path: PathBuf,
        original: String,
        search: String,
    },

    #[error("{0}")]
    Serialize(#[from] SerializeError),

    #[error("{0}")]
    Template(#[from] TemplateError),
}

/// Errors from a whole bump run.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum BumpError {
    /// The requested part is not in the canonical order.
    #[error("Part `{part}` should be one of the components {order:?}")]
    UnknownPart { part: String, order: Vec<String> },

    /// Neither the settings nor the version source yield a current version.
    #[error("Could not determine the current version: set `current_version` or `version_source`")]
    NoCurrentVersion,

    /// An explicit new version does not match the parse pattern.
    #[error("New version `{new_version}` does not match the parse pattern")]
    UnparseableNewVersion { new_version: String },

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    File(#[from] FileError),

    #[error("{0}")]
    Serialize(#[from] SerializeError),

    #[error("{0}")]
    Version(#[from] VersionError),
}
