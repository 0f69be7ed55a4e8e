use crate::{
    config::VersionConfig,
    context::Context,
    error::FileError,
    report::Reporter,
    version::Version,
};
use similar::TextDiff;
use std::{
    fmt::{self, Display},
    fs,
    path::{Path, PathBuf},
};

/// A version found in a file by [`ConfiguredFile::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundVersion {
    /// The version as written in the file.
    pub version: Version,
    /// The same version with the requested part reset to its null value.
    pub nulled: Version,
}

/// What [`ConfiguredFile::replace`] did, or would have done in a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Whether the file content changed.
    pub changed: bool,
    /// Unified diff of the change, if any.
    pub diff: Option<String>,
}

/// A file in which a version lives, together with the [`VersionConfig`] describing how the
/// version is written there.
#[derive(Debug, Clone)]
pub struct ConfiguredFile {
    path: PathBuf,
    config: VersionConfig,
}

impl ConfiguredFile {
    /// Binds `config` to the file at `path`. The file is not touched until an operation needs it.
    pub fn new(path: impl Into<PathBuf>, config: VersionConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// The bound file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The bound configuration.
    pub fn config(&self) -> &VersionConfig {
        &self.config
    }

    fn read_bytes(&self) -> Result<Vec<u8>, FileError> {
        fs::read(&self.path).map_err(|source| FileError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn read(&self) -> Result<String, FileError> {
        String::from_utf8(self.read_bytes()?).map_err(|_| FileError::Decode {
            path: self.path.clone(),
        })
    }

    fn write(&self, content: &str) -> Result<(), FileError> {
        fs::write(&self.path, content.as_bytes()).map_err(|source| FileError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Searches the file line by line for the parse pattern and returns the version on the first
    /// matching line, along with a copy whose `part` is reset to its null value. Returns `None` if
    /// no line matches.
    ///
    /// Lines are decoded one at a time, so text after the matching line is never looked at.
    ///
    /// # Errors
    ///
    /// - [`FileError::Io`] if the file cannot be read.
    /// - [`FileError::Decode`] if a line up to the first match is not UTF-8 text.
    pub fn find(&self, part: &str) -> Result<Option<FoundVersion>, FileError> {
        let bytes = self.read_bytes()?;
        let regex = self.config.parse_regex();

        for raw_line in bytes.split(|byte| *byte == b'\n') {
            let line = std::str::from_utf8(raw_line).map_err(|_| FileError::Decode {
                path: self.path.clone(),
            })?;
            let line = line.strip_suffix('\r').unwrap_or(line);
            let Some(captures) = regex.captures(line) else {
                continue;
            };
            let version = self.config.version_from_captures(&captures, |_, p| p);
            let nulled = self.config.version_from_captures(&captures, |name, p| {
                if name == part {
                    p.null()
                } else {
                    p
                }
            });
            return Ok(Some(FoundVersion {
                version,
                nulled: nulled.without_original(),
            }));
        }

        Ok(None)
    }

    /// Returns true if the file contains `search`, where the first and last lines of `search` may
    /// sit inside longer lines of the file but any lines in between must match whole lines.
    ///
    /// An empty `search` is never found. A match is reported with the 1-based number of the line
    /// it starts on.
    ///
    /// # Errors
    ///
    /// - [`FileError::Io`] or [`FileError::Decode`] if the file cannot be read as UTF-8 text.
    pub fn contains(&self, search: &str, reporter: &dyn Reporter) -> Result<bool, FileError> {
        let content = self.read()?;
        let search_lines: Vec<&str> = search.lines().collect();
        let (Some(first), Some(last)) = (search_lines.first(), search_lines.last()) else {
            return Ok(false);
        };
        let file_lines: Vec<&str> = content.lines().collect();
        let n = search_lines.len();

        for (start, window) in file_lines.windows(n).enumerate() {
            let interior_equal = n < 3 || window[1..n - 1] == search_lines[1..n - 1];
            if window[0].contains(first) && window[n - 1].contains(last) && interior_equal {
                reporter.info(&format!(
                    "Found '{}' in {} at line {}: {}",
                    search,
                    self.path.display(),
                    start + 1,
                    window[n - 1].trim_end()
                ));
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Checks that the file mentions `version`, either as rendered by the search template or as
    /// the text it was originally parsed from. Meant to run before any file is written.
    ///
    /// # Errors
    ///
    /// - [`FileError::VersionNotFound`] if neither is in the file.
    /// - [`FileError::Serialize`] or [`FileError::Template`] if the version or search template
    ///   cannot be rendered.
    pub fn should_contain_version(
        &self,
        version: &Version,
        context: &Context,
        reporter: &dyn Reporter,
    ) -> Result<(), FileError> {
        let serialized = self.config.serialize(version, context)?;
        let mut context = context.clone();
        context.insert("current_version", serialized);
        let search = self.config.search().render(|name| context.get(name))?;

        if self.contains(&search, reporter)? {
            return Ok(());
        }
        if let Some(original) = version.original() {
            if self.contains(original, reporter)? {
                return Ok(());
            }
        }

        Err(FileError::VersionNotFound {
            path: self.path.clone(),
            original: version.original().unwrap_or_default().to_string(),
            search,
        })
    }

    /// Replaces `current_version` with `new_version` in the file.
    ///
    /// Both versions are serialized and made available to the search and replace templates as
    /// `current_version` and `new_version`. Every occurrence of the rendered search text is
    /// replaced with the rendered replace text. If the search text is not in the file, every
    /// occurrence of the text `current_version` was parsed from is replaced instead.
    ///
    /// Changes are reported as a unified diff. The file is written only if its content changed
    /// and `dry_run` is false.
    ///
    /// # Errors
    ///
    /// - [`FileError::Io`] or [`FileError::Decode`] if the file cannot be read or written.
    /// - [`FileError::Serialize`] or [`FileError::Template`] if rendering fails.
    pub fn replace(
        &self,
        current_version: &Version,
        new_version: &Version,
        context: &Context,
        dry_run: bool,
        reporter: &dyn Reporter,
    ) -> Result<Replacement, FileError> {
        let before = self.read()?;

        let mut context = context.clone();
        let current_str = self.config.serialize(current_version, &context)?;
        let new_str = self.config.serialize(new_version, &context)?;
        context.insert("current_version", current_str);
        context.insert("new_version", new_str);

        let search_for = self.config.search().render(|name| context.get(name))?;
        let replace_with = self.config.replace().render(|name| context.get(name))?;

        let after = if !search_for.is_empty() && before.contains(&search_for) {
            before.replace(&search_for, &replace_with)
        } else {
            match current_version.original() {
                Some(original) if !original.is_empty() => before.replace(original, &replace_with),
                _ => before.clone(),
            }
        };

        if before == after {
            reporter.info(&format!(
                "{} file {}",
                if dry_run { "Would not change" } else { "Not changing" },
                self.path.display()
            ));
            return Ok(Replacement {
                changed: false,
                diff: None,
            });
        }

        reporter.info(&format!(
            "{} file {}:",
            if dry_run { "Would change" } else { "Changing" },
            self.path.display()
        ));
        let diff = unified_diff(&self.path, &before, &after);
        reporter.info(&diff);

        if !dry_run {
            self.write(&after)?;
        }

        Ok(Replacement {
            changed: true,
            diff: Some(diff),
        })
    }

}

/// Renders the change from `before` to `after` as a unified diff with `a/` and `b/` headers.
pub(crate) fn unified_diff(path: &Path, before: &str, after: &str) -> String {
    let path = path.display().to_string();
    TextDiff::from_lines(before, after)
        .unified_diff()
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string()
}

impl Display for ConfiguredFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
