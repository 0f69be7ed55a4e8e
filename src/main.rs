use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use tracing::Level;
use verbump::{
    BumpError, BumpRequest, Bumper, ConfigError, Overrides, Settings, TracingReporter,
    DEFAULT_SETTINGS_FILE,
};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Bump(#[from] BumpError),
}

/// Bumps a version and rewrites it in every file that mentions it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Part of the version to be bumped
    part: String,

    /// Files to change, in addition to the configured ones
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Settings file to read and update. Defaults to `.bumpversion.toml`, if it exists.
    #[arg(long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Version that needs to be updated
    #[arg(long, value_name = "VERSION")]
    current_version: Option<String>,

    /// New version that should be in the files, instead of the bumped one
    #[arg(long, value_name = "VERSION")]
    new_version: Option<String>,

    /// Regex parsing the version string
    #[arg(long, value_name = "REGEX")]
    parse: Option<String>,

    /// How to format what is parsed back to a version. Repeat to give several, in order of
    /// preference.
    #[arg(long, value_name = "FORMAT")]
    serialize: Vec<String>,

    /// Template for complete string to search
    #[arg(long, value_name = "SEARCH")]
    search: Option<String>,

    /// Template for complete string to replace
    #[arg(long, value_name = "REPLACE")]
    replace: Option<String>,

    /// Don't write any files, just pretend
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print more about what is done. Repeat for even more.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// List the current and new versions on stdout
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// The settings file to use: the given one, or the default one if it exists.
    fn settings_path(&self) -> Option<PathBuf> {
        self.config_file.clone().or_else(|| {
            let default = Path::new(DEFAULT_SETTINGS_FILE);
            default.exists().then(|| default.to_path_buf())
        })
    }
}

type Output = (String, i32);

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.level())
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match do_work(cli) {
        Ok((output, exit_code)) => {
            if !output.is_empty() {
                println!("{output}");
            }
            std::process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn do_work(cli: Cli) -> Result<Output, CliError> {
    let settings_path = cli.settings_path();
    let settings = match &settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .apply(Overrides {
        current_version: cli.current_version,
        parse: cli.parse,
        serialize: cli.serialize,
        search: cli.search,
        replace: cli.replace,
        files: cli.files,
    });

    let reporter = TracingReporter;
    let mut bumper = Bumper::new(settings, &reporter);
    if let Some(path) = settings_path {
        bumper = bumper.with_settings_path(path);
    }

    let outcome = bumper.run(&BumpRequest {
        part: cli.part,
        new_version: cli.new_version,
        dry_run: cli.dry_run,
    })?;

    let output = if cli.list {
        format!(
            "current_version={}\nnew_version={}",
            outcome.current_version, outcome.new_version
        )
    } else {
        String::new()
    };
    Ok((output, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "verbump",
            "minor",
            "setup.py",
            "VERSION",
            "--serialize",
            "{major}.{minor}.{patch}",
            "--serialize",
            "{major}.{minor}",
            "-n",
            "-vv",
        ])
        .unwrap();
        assert_eq!("minor", cli.part);
        assert_eq!(
            vec![PathBuf::from("setup.py"), PathBuf::from("VERSION")],
            cli.files
        );
        assert_eq!(2, cli.serialize.len());
        assert!(cli.dry_run);
        assert_eq!(Level::DEBUG, cli.level());
        assert!(!cli.list);
    }

    #[test]
    fn test_part_required() {
        assert!(Cli::try_parse_from(["verbump"]).is_err());
    }

    #[test]
    fn test_do_work_list() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("bump.toml");
        let version = dir.path().join("VERSION");
        fs::write(&settings, "current_version = \"0.1.9\"\n").unwrap();
        fs::write(&version, "0.1.9\n").unwrap();

        let cli = Cli::try_parse_from([
            "verbump",
            "patch",
            version.to_str().unwrap(),
            "--config-file",
            settings.to_str().unwrap(),
            "--list",
        ])
        .unwrap();
        let (output, exit_code) = do_work(cli).unwrap();

        assert_eq!(0, exit_code);
        assert_eq!("current_version=0.1.9\nnew_version=0.1.10", output);
        assert_eq!("0.1.10\n", fs::read_to_string(&version).unwrap());
        assert_eq!(
            "current_version = \"0.1.10\"\n",
            fs::read_to_string(&settings).unwrap()
        );
    }

    #[test]
    fn test_do_work_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "verbump",
            "patch",
            "--config-file",
            dir.path().join("nope.toml").to_str().unwrap(),
        ])
        .unwrap();
        assert!(matches!(
            do_work(cli),
            Err(CliError::Config(ConfigError::Read { .. }))
        ));
    }
}
