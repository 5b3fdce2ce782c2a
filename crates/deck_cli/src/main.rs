mod render;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use deck_core::{
    parse_course_id, CollisionPolicy, Connection, CourseId, HarvestRequest, ModuleId,
    ModuleSelection, OutputMode,
};
use deck_engine::{AtomicFileWriter, FetchSettings, HarvestError, OutputArtifact, Session};
use engine_logging::{engine_error, engine_info, LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

use crate::render::TerminalProgress;
use crate::settings::Settings;

const DEFAULT_OUTPUT_DIR: &str = "canvas_powerpoints";
const DEFAULT_ARCHIVE: &str = "canvas_powerpoints.zip";

#[derive(Parser)]
#[command(
    name = "canvas-decks",
    version,
    about = "Collect the PowerPoint decks of a Canvas course"
)]
struct Cli {
    /// Canvas host, e.g. school.instructure.com
    #[arg(long, env = "CANVAS_URL", global = true)]
    base_url: Option<String>,
    /// API access token
    #[arg(long, env = "CANVAS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    /// RON settings file with defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal, global = true)]
    log: LogTarget,
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List courses with an active enrollment
    Courses,
    /// List the modules of a course
    Modules {
        #[arg(short, long, value_parser = parse_course_id)]
        course: CourseId,
    },
    /// Download every presentation of a course
    Download {
        #[arg(short, long, value_parser = parse_course_id)]
        course: CourseId,
        /// Only these modules (repeatable); all modules when omitted
        #[arg(short, long = "module")]
        modules: Vec<ModuleId>,
        /// Output directory (default: canvas_powerpoints)
        #[arg(long, conflicts_with = "archive")]
        out: Option<PathBuf>,
        /// Write a zip archive instead of a directory tree
        #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_ARCHIVE)]
        archive: Option<PathBuf>,
        /// rename, prefix or numbered
        #[arg(long, value_parser = parse_policy)]
        policy: Option<CollisionPolicy>,
    },
}

fn parse_policy(raw: &str) -> Result<CollisionPolicy, deck_core::ConfigError> {
    raw.parse()
}

impl Cli {
    fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LogTarget::Both => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }

    /// Progress already goes to stdout, so the terminal only gets warnings by default.
    fn log_level(&self) -> LevelFilter {
        match (self.verbose, self.log) {
            (true, _) => LevelFilter::Debug,
            (false, LogTarget::Terminal) => LevelFilter::Warn,
            (false, _) => LevelFilter::Info,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.log_level());

    let log_to_file = cli.log != LogTarget::Terminal;
    let result = execute(cli);
    if let Err(err) = &result {
        if log_to_file {
            engine_error!("{:#}", err);
        }
        if let Some(hint) = hint_for(err) {
            eprintln!("{hint}");
        }
    }
    result
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    }
    .overlay(cli.base_url.clone(), cli.token.clone());
    let session = connect(&settings)?;

    match cli.command {
        Commands::Courses => {
            let courses = session.courses()?;
            if courses.is_empty() {
                println!("No active courses found.");
            }
            for course in courses {
                println!("{:>10}  {}", course.id, course.name);
            }
        }
        Commands::Modules { course } => {
            let course = session.course(course)?;
            println!("{} ({})", course.name, course.id);
            for module in session.modules(course.id)? {
                println!("{:>10}  {}", module.id, module.name);
            }
        }
        Commands::Download {
            course,
            modules,
            out,
            archive,
            policy,
        } => {
            let output = match &archive {
                Some(_) => OutputMode::Archive,
                None => OutputMode::Directory(
                    out.or_else(|| settings.output_dir.clone())
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
                ),
            };
            let request = HarvestRequest {
                course_id: course,
                modules: if modules.is_empty() {
                    ModuleSelection::All
                } else {
                    ModuleSelection::from_ids(modules)
                },
                output,
                collision: policy.or(settings.policy).unwrap_or_default(),
            };
            engine_info!("Starting download: {:?}", request);

            let progress = TerminalProgress::new(cli.verbose);
            let summary = session.harvest(&request, &progress)?;

            match summary.artifact {
                OutputArtifact::Directory(root) => {
                    println!(
                        "Saved {} presentation(s) to {}",
                        summary.files_retrieved,
                        root.display()
                    );
                }
                OutputArtifact::Archive(bytes) => {
                    let path = archive.unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE));
                    write_archive(&path, &bytes)?;
                    println!(
                        "Saved {} presentation(s) to {}",
                        summary.files_retrieved,
                        path.display()
                    );
                }
            }
            if summary.duplicates_skipped > 0 || summary.unresolved > 0 {
                println!(
                    "{} duplicate reference(s) skipped, {} file(s) could not be resolved",
                    summary.duplicates_skipped, summary.unresolved
                );
            }
        }
    }
    Ok(())
}

fn connect(settings: &Settings) -> anyhow::Result<Session> {
    let Some(base_url) = settings.base_url.as_deref() else {
        bail!("no Canvas URL given: use --base-url, CANVAS_URL or base_url in the settings file");
    };
    let Some(token) = settings.token.as_deref() else {
        bail!("no API token given: use --token, CANVAS_TOKEN or token in the settings file");
    };
    let connection = Connection::new(base_url, token).context("invalid connection settings")?;
    engine_info!("Connecting to {}", connection.base_url);
    Ok(Session::new(&connection, FetchSettings::default())?)
}

fn write_archive(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = path.file_name() else {
        bail!("archive path {} has no file name", path.display());
    };
    AtomicFileWriter::new(dir.to_path_buf())
        .write(&file_name.to_string_lossy(), bytes)
        .with_context(|| format!("failed to write archive {}", path.display()))?;
    Ok(())
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    let harvest = err.downcast_ref::<HarvestError>()?;
    if harvest.is_unauthorized() {
        Some("Hint: the API token was rejected. Check that it is valid and not expired.")
    } else if harvest.is_not_found() {
        Some("Hint: the course was not found. Check the course id and your enrollment.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn download_collects_modules_and_policy() {
        let cli = Cli::try_parse_from([
            "canvas-decks",
            "download",
            "--course",
            "42",
            "--module",
            "7",
            "-m",
            "9",
            "--policy",
            "numbered",
        ])
        .unwrap();

        match cli.command {
            Commands::Download {
                course,
                modules,
                out,
                archive,
                policy,
            } => {
                assert_eq!(course, 42);
                assert_eq!(modules, vec![7, 9]);
                assert_eq!(out, None);
                assert_eq!(archive, None);
                assert_eq!(policy, Some(CollisionPolicy::Numbered));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bare_archive_flag_uses_default_name() {
        let cli = Cli::try_parse_from(["canvas-decks", "download", "-c", "1", "--archive"])
            .unwrap();
        let Commands::Download { archive, .. } = cli.command else {
            panic!("expected download");
        };
        assert_eq!(archive, Some(PathBuf::from(DEFAULT_ARCHIVE)));
    }

    #[test]
    fn out_and_archive_conflict() {
        let parsed = Cli::try_parse_from([
            "canvas-decks",
            "download",
            "-c",
            "1",
            "--out",
            "decks",
            "--archive",
            "decks.zip",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_course_id_is_rejected() {
        assert!(Cli::try_parse_from(["canvas-decks", "modules", "--course", "0"]).is_err());
    }

    #[test]
    fn verbose_raises_log_level() {
        let cli = Cli::try_parse_from(["canvas-decks", "-v", "courses"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert_eq!(cli.log_destination(), LogDestination::Terminal);

        let cli = Cli::try_parse_from(["canvas-decks", "courses", "--log", "both"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Info);
        assert_eq!(
            cli.log_destination(),
            LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE))
        );
    }

    #[test]
    fn missing_token_is_reported() {
        let settings = Settings {
            base_url: Some("school.instructure.com".to_string()),
            ..Settings::default()
        };
        let err = connect(&settings).err().unwrap();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn archive_is_written_next_to_given_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out").join("decks.zip");
        write_archive(&path, b"PK").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"PK");
    }
}
