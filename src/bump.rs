use crate::{
    context::Context,
    error::BumpError,
    file::ConfiguredFile,
    report::Reporter,
    settings::{write_current_version, Settings},
    version::Version,
};
use std::path::PathBuf;

/// What to bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpRequest {
    /// The component to bump, like `minor`.
    pub part: String,
    /// Use this version instead of deriving one by bumping `part`.
    pub new_version: Option<String>,
    /// Report what would change without writing anything.
    pub dry_run: bool,
}

impl BumpRequest {
    /// A request to bump `part`, writing files.
    pub fn new(part: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            new_version: None,
            dry_run: false,
        }
    }
}

/// The result of a bump run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    /// The serialized current version.
    pub current_version: String,
    /// The serialized new version.
    pub new_version: String,
    /// Files whose content changed, or would have in a dry run, in the order they were processed.
    pub changed: Vec<PathBuf>,
}

/// Runs a bump across every configured file.
pub struct Bumper<'r> {
    settings: Settings,
    settings_path: Option<PathBuf>,
    root: PathBuf,
    context: Context,
    reporter: &'r dyn Reporter,
}

impl<'r> Bumper<'r> {
    /// Returns a bumper for `settings` that renders templates with the ambient context.
    pub fn new(settings: Settings, reporter: &'r dyn Reporter) -> Self {
        Self {
            settings,
            settings_path: None,
            root: PathBuf::new(),
            context: Context::ambient(),
            reporter,
        }
    }

    /// Sets `current_version` in the settings file at `path` after the other files are written.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Looks for a default version source in `root` instead of the working directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Renders templates with `context` instead of the ambient one.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Bumps `request.part` and rewrites the version in the version source, every configured file
    /// and the settings file, in that order.
    ///
    /// The current version is the `current_version` setting. If it is missing or does not parse,
    /// the version found in the version source file is used. Without a configured source, the
    /// first existing file of [`VERSION_SOURCE_CANDIDATES`](crate::VERSION_SOURCE_CANDIDATES) is
    /// the source. If both are present and disagree on
    /// any component other than the bumped one, the new version is the source file's version with
    /// the bumped component reset.
    ///
    /// Every configured file is checked to contain the current version before anything is
    /// written.
    ///
    /// # Errors
    ///
    /// - [`BumpError::UnknownPart`] if `request.part` is not a component of the first
    ///   serialization format.
    /// - [`BumpError::NoCurrentVersion`] if no current version could be determined.
    /// - [`BumpError::UnparseableNewVersion`] if `request.new_version` does not parse.
    /// - Any configuration, file, serialization or version error along the way.
    pub fn run(&self, request: &BumpRequest) -> Result<BumpOutcome, BumpError> {
        let reporter = self.reporter;
        let part_configs = self.settings.part_configs()?;
        let config = self.settings.version_config(&part_configs)?;
        let files = self.settings.configured_files(&part_configs)?;

        let order: Vec<&str> = config.order().collect();
        if !order.contains(&request.part.as_str()) {
            return Err(BumpError::UnknownPart {
                part: request.part.clone(),
                order: order.iter().map(|name| name.to_string()).collect(),
            });
        }

        let configured = self
            .settings
            .current_version
            .as_deref()
            .and_then(|version| config.parse(version, reporter));

        let source = self
            .settings
            .version_source_in(&self.root)
            .map(|path| ConfiguredFile::new(path, config.clone()));
        let found = match &source {
            Some(source) => source.find(&request.part)?,
            None => None,
        };

        let current = configured
            .clone()
            .or_else(|| found.as_ref().map(|found| found.version.clone()))
            .ok_or(BumpError::NoCurrentVersion)?;

        let source_disagrees = match (&found, &configured) {
            (Some(found), Some(configured)) => found
                .version
                .compare(&order, configured)
                .into_iter()
                .any(|(name, same)| name != request.part && !same),
            _ => false,
        };

        let new = if let Some(new_version) = &request.new_version {
            config
                .parse(new_version, reporter)
                .ok_or_else(|| BumpError::UnparseableNewVersion {
                    new_version: new_version.clone(),
                })?
        } else if let (true, Some(found), Some(source)) = (source_disagrees, &found, &source) {
            reporter.info(&format!("Using version from {}", source.path().display()));
            found.nulled.clone()
        } else {
            reporter.info(&format!("Attempting to increment part '{}'", request.part));
            current.bump(&request.part, &order)?
        };
        reporter.info(&format!("Values are now: {new}"));

        let current_version = config.serialize(&current, &self.context)?;
        let new_version = config.serialize(&new, &self.context)?;
        reporter.info(&format!("New version will be '{new_version}'"));

        if request.dry_run {
            reporter.info("Dry run active, won't touch any files.");
        }

        for file in &files {
            file.should_contain_version(&current, &self.context, reporter)?;
        }

        let mut changed = Vec::new();
        let mut replace = |file: &ConfiguredFile, from: &Version| -> Result<(), BumpError> {
            let replacement = file.replace(from, &new, &self.context, request.dry_run, reporter)?;
            if replacement.changed {
                changed.push(file.path().to_path_buf());
            }
            Ok(())
        };

        if let (Some(source), Some(found)) = (&source, &found) {
            reporter.info(&format!("Update info in {}", source.path().display()));
            replace(source, &found.version)?;
        }
        for file in &files {
            replace(file, &current)?;
        }
        if let Some(path) = &self.settings_path {
            if write_current_version(path, &new_version, request.dry_run, reporter)?.changed {
                changed.push(path.clone());
            }
        }

        Ok(BumpOutcome {
            current_version,
            new_version,
            changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FileError,
        report::{Collector, Severity},
        settings::{FileSection, Overrides},
    };
    use rstest::*;
    use std::fs;
    use tempfile::TempDir;

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (name, content) in files {
                fs::write(dir.path().join(name), content).unwrap();
            }
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn read(&self, name: &str) -> String {
            fs::read_to_string(self.path(name)).unwrap()
        }

        fn settings(&self, current_version: Option<&str>, files: &[&str]) -> Settings {
            Settings {
                current_version: current_version.map(String::from),
                ..Settings::default()
            }
            .apply(Overrides {
                files: files.iter().map(|name| self.path(name)).collect(),
                ..Overrides::default()
            })
        }
    }

    fn bumper<'r>(project: &Project, settings: Settings, collector: &'r Collector) -> Bumper<'r> {
        Bumper::new(settings, collector)
            .with_root(project.dir.path())
            .with_context(Context::new())
    }

    fn run(
        project: &Project,
        settings: Settings,
        request: &BumpRequest,
        collector: &Collector,
    ) -> Result<BumpOutcome, BumpError> {
        bumper(project, settings, collector).run(request)
    }

    #[test]
    fn test_bump_minor() {
        let project = Project::new(&[
            ("package.py", "setup(\n    version='1.2.3',\n)\n"),
            ("VERSION.txt", "1.2.3\n"),
        ]);
        let mut settings = project.settings(Some("1.2.3"), &["VERSION.txt"]);
        settings.file.insert(
            0,
            FileSection {
                search: Some("version='{current_version}'".to_string()),
                replace: Some("version='{new_version}'".to_string()),
                ..FileSection::new(project.path("package.py"))
            },
        );

        let collector = Collector::new();
        let outcome = run(&project, settings, &BumpRequest::new("minor"), &collector).unwrap();

        assert_eq!("1.2.3", outcome.current_version);
        assert_eq!("1.3.0", outcome.new_version);
        assert_eq!(
            vec![project.path("package.py"), project.path("VERSION.txt")],
            outcome.changed
        );
        assert_eq!("setup(\n    version='1.3.0',\n)\n", project.read("package.py"));
        assert_eq!("1.3.0\n", project.read("VERSION.txt"));
        assert!(collector
            .messages(Severity::Info)
            .contains(&"Attempting to increment part 'minor'".to_string()));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let project = Project::new(&[("VERSION.txt", "1.2.3\n")]);
        let settings = project.settings(Some("1.2.3"), &["VERSION.txt"]);
        let request = BumpRequest {
            dry_run: true,
            ..BumpRequest::new("major")
        };

        let outcome = run(&project, settings, &request, &Collector::new()).unwrap();
        assert_eq!("2.0.0", outcome.new_version);
        assert_eq!(vec![project.path("VERSION.txt")], outcome.changed);
        assert_eq!("1.2.3\n", project.read("VERSION.txt"));
    }

    #[test]
    fn test_unknown_part() {
        let project = Project::new(&[]);
        let settings = project.settings(Some("1.2.3"), &[]);
        let res = run(&project, settings, &BumpRequest::new("build"), &Collector::new());
        assert!(matches!(
            res,
            Err(BumpError::UnknownPart { part, order }) if part == "build" && order == ["major", "minor", "patch"]
        ));
    }

    #[test]
    fn test_no_current_version() {
        let project = Project::new(&[]);
        let settings = project.settings(None, &[]);
        let res = run(&project, settings, &BumpRequest::new("patch"), &Collector::new());
        assert!(matches!(res, Err(BumpError::NoCurrentVersion)));
    }

    #[test]
    fn test_preflight_stops_before_any_write() {
        let project = Project::new(&[("a.txt", "1.2.3\n"), ("b.txt", "nothing here\n")]);
        let settings = project.settings(Some("1.2.3"), &["a.txt", "b.txt"]);

        let res = run(&project, settings, &BumpRequest::new("patch"), &Collector::new());
        assert!(matches!(
            res,
            Err(BumpError::File(FileError::VersionNotFound { .. }))
        ));
        assert_eq!("1.2.3\n", project.read("a.txt"));
    }

    #[test]
    fn test_explicit_new_version() {
        let project = Project::new(&[("VERSION.txt", "1.2.3\n")]);
        let settings = project.settings(Some("1.2.3"), &["VERSION.txt"]);
        let request = BumpRequest {
            new_version: Some("4.5.6".to_string()),
            ..BumpRequest::new("patch")
        };

        let outcome = run(&project, settings, &request, &Collector::new()).unwrap();
        assert_eq!("4.5.6", outcome.new_version);
        assert_eq!("4.5.6\n", project.read("VERSION.txt"));

        let settings = project.settings(Some("4.5.6"), &[]);
        let request = BumpRequest {
            new_version: Some("latest".to_string()),
            ..BumpRequest::new("patch")
        };
        assert!(matches!(
            run(&project, settings, &request, &Collector::new()),
            Err(BumpError::UnparseableNewVersion { .. })
        ));
    }

    #[test]
    fn test_version_source_only() {
        let project = Project::new(&[("VERSION", "version: 0.9.1\n")]);
        let settings = Settings {
            version_source: Some(project.path("VERSION")),
            ..project.settings(None, &[])
        };

        let outcome =
            run(&project, settings, &BumpRequest::new("patch"), &Collector::new()).unwrap();
        assert_eq!("0.9.1", outcome.current_version);
        assert_eq!("0.9.2", outcome.new_version);
        assert_eq!("version: 0.9.2\n", project.read("VERSION"));
    }

    #[test]
    fn test_version_source_agrees_except_bumped_part() {
        let project = Project::new(&[("VERSION", "1.2.7\n")]);
        let settings = Settings {
            version_source: Some(project.path("VERSION")),
            ..project.settings(Some("1.2.3"), &[])
        };

        let outcome =
            run(&project, settings, &BumpRequest::new("patch"), &Collector::new()).unwrap();
        assert_eq!("1.2.4", outcome.new_version);
        assert_eq!("1.2.4\n", project.read("VERSION"));
    }

    #[test]
    fn test_version_source_disagrees() {
        let project = Project::new(&[("VERSION", "2.0.4\n"), ("other.txt", "at 1.2.3\n")]);
        let settings = Settings {
            version_source: Some(project.path("VERSION")),
            ..project.settings(Some("1.2.3"), &["other.txt"])
        };

        let collector = Collector::new();
        let outcome = run(&project, settings, &BumpRequest::new("patch"), &collector).unwrap();
        assert_eq!("1.2.3", outcome.current_version);
        assert_eq!("2.0.0", outcome.new_version);
        assert_eq!("2.0.0\n", project.read("VERSION"));
        assert_eq!("at 2.0.0\n", project.read("other.txt"));
        assert!(collector
            .messages(Severity::Info)
            .iter()
            .any(|message| message.starts_with("Using version from ")));
    }

    fn load_settings(project: &Project) -> Settings {
        Settings::load(&project.path(".bumpversion.toml")).unwrap()
    }

    #[test]
    fn test_settings_file_rewritten() {
        let settings_text = "current_version = \"1.2.3\"\nparse = '(?P<major>\\d+)\\.(?P<minor>\\d+)\\.(?P<patch>\\d+)'\n";
        let project = Project::new(&[(".bumpversion.toml", settings_text)]);

        let outcome = bumper(&project, load_settings(&project), &Collector::new())
            .with_settings_path(project.path(".bumpversion.toml"))
            .run(&BumpRequest::new("patch"))
            .unwrap();

        assert_eq!(vec![project.path(".bumpversion.toml")], outcome.changed);
        assert_eq!(
            "current_version = \"1.2.4\"\nparse = '(?P<major>\\d+)\\.(?P<minor>\\d+)\\.(?P<patch>\\d+)'\n",
            project.read(".bumpversion.toml")
        );
        assert_eq!(
            Some("1.2.4"),
            load_settings(&project).current_version.as_deref()
        );
    }

    #[rstest]
    #[case("current_version = '1.2.3'\n")]
    #[case("current_version=\"1.2.3\"\n")]
    #[case("current_version = \"1.2.3\" # bumped by hand\n")]
    fn test_settings_file_spellings(#[case] settings_text: &str) {
        let project = Project::new(&[(".bumpversion.toml", settings_text)]);

        let outcome = bumper(&project, load_settings(&project), &Collector::new())
            .with_settings_path(project.path(".bumpversion.toml"))
            .run(&BumpRequest::new("patch"))
            .unwrap();

        assert_eq!("1.2.4", outcome.new_version);
        assert_eq!(
            Some("1.2.4"),
            load_settings(&project).current_version.as_deref()
        );
        assert!(!project.read(".bumpversion.toml").contains("1.2.3"));
    }

    #[test]
    fn test_settings_file_with_overridden_version() {
        let project = Project::new(&[
            (".bumpversion.toml", "current_version = \"1.0.0\"\n"),
            ("VERSION.txt", "1.2.3\n"),
        ]);
        let settings = load_settings(&project).apply(Overrides {
            current_version: Some("1.2.3".to_string()),
            files: vec![project.path("VERSION.txt")],
            ..Overrides::default()
        });

        bumper(&project, settings, &Collector::new())
            .with_settings_path(project.path(".bumpversion.toml"))
            .run(&BumpRequest::new("patch"))
            .unwrap();

        assert_eq!("1.2.4\n", project.read("VERSION.txt"));
        assert_eq!("current_version = \"1.2.4\"\n", project.read(".bumpversion.toml"));
    }

    #[test]
    fn test_settings_file_with_only_version_source() {
        let project = Project::new(&[
            (".bumpversion.toml", "version_source = \"VERSION\"\n"),
            ("VERSION", "version: 0.9.1\n"),
        ]);
        let settings = Settings {
            version_source: Some(project.path("VERSION")),
            ..load_settings(&project)
        };

        let outcome = bumper(&project, settings, &Collector::new())
            .with_settings_path(project.path(".bumpversion.toml"))
            .run(&BumpRequest::new("patch"))
            .unwrap();

        assert_eq!(
            vec![project.path("VERSION"), project.path(".bumpversion.toml")],
            outcome.changed
        );
        let reloaded = load_settings(&project);
        assert_eq!(Some("0.9.2"), reloaded.current_version.as_deref());
        assert_eq!(Some(PathBuf::from("VERSION")), reloaded.version_source);
    }

    #[test]
    fn test_settings_file_dry_run() {
        let settings_text = "current_version = \"1.2.3\"\n";
        let project = Project::new(&[(".bumpversion.toml", settings_text)]);
        let collector = Collector::new();

        let outcome = bumper(&project, load_settings(&project), &collector)
            .with_settings_path(project.path(".bumpversion.toml"))
            .run(&BumpRequest {
                dry_run: true,
                ..BumpRequest::new("minor")
            })
            .unwrap();

        assert_eq!(vec![project.path(".bumpversion.toml")], outcome.changed);
        assert_eq!(settings_text, project.read(".bumpversion.toml"));
        assert!(collector
            .messages(Severity::Info)
            .iter()
            .any(|message| message.starts_with("Would write to config file ")));
    }

    #[test]
    fn test_default_version_source() {
        let project = Project::new(&[("VERSION", "3.1.4\n"), ("notes.txt", "3.1.4\n")]);
        let settings = project.settings(None, &["notes.txt"]);

        let outcome =
            run(&project, settings, &BumpRequest::new("minor"), &Collector::new()).unwrap();

        assert_eq!("3.1.4", outcome.current_version);
        assert_eq!("3.2.0", outcome.new_version);
        assert_eq!(
            vec![project.path("VERSION"), project.path("notes.txt")],
            outcome.changed
        );
        assert_eq!("3.2.0\n", project.read("VERSION"));
    }
}
