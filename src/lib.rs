//! # verbump
//!
//! A library for finding, incrementing and rewriting arbitrarily-formatted versions across the
//! files of a project.
//!
//! Instead of conforming to a specific versioning scheme, a version is whatever a regular
//! expression with named groups captures, and it is written back with brace templates like
//! `{major}.{minor}.{patch}`.
//!
//! ## Examples
//!
//! Parse, bump and serialize a version:
//!
//! ```
//! use verbump::prelude::*;
//!
//! let config = VersionConfig::builder().build().unwrap();
//! let version = config.parse("1.2.3", &Collector::new()).unwrap();
//! let order: Vec<&str> = config.order().collect();
//! let next = version.bump("minor", &order).unwrap();
//! assert_eq!(config.serialize(&next, &Context::new()).unwrap(), "1.3.0");
//! ```
//!
//! Value lists and optional parts:
//!
//! ```
//! use verbump::prelude::*;
//!
//! let release = ValuesConfig::new(
//!     "release",
//!     vec!["dev".to_string(), "final".to_string()],
//!     None,
//!     Some("final"),
//! )
//! .unwrap();
//! let config = VersionConfig::builder()
//!     .parse(r"(?P<major>\d+)\.(?P<minor>\d+)(-(?P<release>[a-z]+))?")
//!     .serialize(["{major}.{minor}-{release}", "{major}.{minor}"])
//!     .part("release", PartConfig::Values(release))
//!     .build()
//!     .unwrap();
//! let order: Vec<&str> = config.order().collect();
//!
//! let version = config.parse("1.4", &Collector::new()).unwrap();
//! let next = version.bump("minor", &order).unwrap();
//! assert_eq!(config.serialize(&next, &Context::new()).unwrap(), "1.5-dev");
//!
//! let next = next.bump("release", &order).unwrap();
//! assert_eq!(config.serialize(&next, &Context::new()).unwrap(), "1.5-final");
//! ```
//!
//! ## Important Terms
//!
//! - **Part**: A single named component of a version, like `major` or `release`. It's modeled by
//!   [`VersionPart`]. A part is either numeric, bumped by incrementing the first number in it, or
//!   steps through a list of values. Each part has a *first value* it is reset to and an
//!   *optional value* at which it may be left out of a serialized version.
//! - **Version**: An ordered mapping from part names to parts, modeled by [`Version`].
//! - **Order**: The part names in the order they appear in the first serialization format.
//!   Bumping a part resets every part after it in this order.
//! - **Context**: Named values other than parts that templates may reference, like `now` or
//!   `$USER`. It's modeled by [`Context`].
//! - **Configured file**: A file together with the configuration of how the version is written
//!   in it. It's modeled by [`ConfiguredFile`].
//!
//! ## Templates
//!
//! Serialization formats and the search and replace templates use brace placeholders.
//!
//! | Placeholder | Example | Description |
//! |---|---|---|
//! | `{name}` | `{major}` | A part of the version, or a context value |
//! | `{name:spec}` | `{now:%Y.%m}` | A timestamp context value rendered with a strftime spec |
//! | `{{` / `}}` | `{{` | A literal brace |
//! | `{current_version}` | | The serialized current version, in search and replace templates |
//! | `{new_version}` | | The serialized new version, in search and replace templates |
//! | `{$NAME}` | `{$BUILD_NUMBER}` | The environment variable `NAME` |
//!
//! ## Format Selection
//!
//! A version may have several serialization formats. When serializing, the formats are tried in
//! order, and the first one that contains every part *needing representation* is used. A part
//! needs representation unless it holds its optional value and some part before it in the order
//! does not. If no format is complete, the first one that renders is used. A format that
//! references a value nobody provides is an error.
#![warn(missing_docs)]

mod bump;
mod config;
mod context;
mod error;
mod file;
mod part;
mod report;
mod settings;
mod template;
mod version;

pub use crate::bump::{BumpOutcome, BumpRequest, Bumper};
pub use crate::config::{
    VersionConfig, VersionConfigBuilder, DEFAULT_PARSE_PATTERN, DEFAULT_REPLACE, DEFAULT_SEARCH,
    DEFAULT_SERIALIZE_FORMAT,
};
pub use crate::context::{Context, Value};
pub use crate::error::{
    BumpError, ConfigError, FileError, PartError, SerializeError, TemplateError, VersionError,
};
pub use crate::file::{ConfiguredFile, FoundVersion, Replacement};
pub use crate::part::{NumericConfig, PartConfig, ValuesConfig, VersionPart};
pub use crate::report::{Collector, Reporter, Severity, TracingReporter};
pub use crate::settings::{
    FileSection, Overrides, PartSection, Settings, DEFAULT_SETTINGS_FILE,
    VERSION_SOURCE_CANDIDATES,
};
pub use crate::template::Template;
pub use crate::version::Version;

/// A convenience module appropriate for glob imports (`use verbump::prelude::*;`).
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::BumpError;
    #[doc(no_inline)]
    pub use crate::BumpRequest;
    #[doc(no_inline)]
    pub use crate::Bumper;
    #[doc(no_inline)]
    pub use crate::Collector;
    #[doc(no_inline)]
    pub use crate::ConfiguredFile;
    #[doc(no_inline)]
    pub use crate::Context;
    #[doc(no_inline)]
    pub use crate::PartConfig;
    #[doc(no_inline)]
    pub use crate::Reporter;
    #[doc(no_inline)]
    pub use crate::Settings;
    #[doc(no_inline)]
    pub use crate::ValuesConfig;
    #[doc(no_inline)]
    pub use crate::Version;
    #[doc(no_inline)]
    pub use crate::VersionConfig;
    #[doc(no_inline)]
    pub use crate::VersionPart;
}
