// UI layer: prompts for missing credentials, drives the import behind an
// `indicatif` progress bar and turns import events into log lines. Per
// recipe details only go to the log file so the terminal stays readable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::api::{Credentials, MealieClient};
use crate::archive::PaprikaArchive;
use crate::error::{FatalError, ImageError, RecordError};
use crate::importer::{ImportEvent, ImportReport, Importer};

/// Everything the CLI collected for one run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub archive: PathBuf,
    pub server_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub logfile: PathBuf,
}

/// Route `tracing` output into `logfile`, appending to it. The returned
/// guard flushes pending lines when dropped, so keep it alive until exit.
pub fn init_logging(logfile: &Path) -> Result<WorkerGuard> {
    let (dir, file_name) = log_file_location(logfile)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .with_context(|| format!("Failed to open log file {}", logfile.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {e}"))?;
    Ok(guard)
}

fn log_file_location(logfile: &Path) -> Result<(PathBuf, String)> {
    let file_name = logfile
        .file_name()
        .with_context(|| format!("Log file path {} has no file name", logfile.display()))?
        .to_string_lossy()
        .into_owned();
    let dir = match logfile.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

/// Run a full import and print the summary.
pub fn run(opts: ImportOptions) -> Result<()> {
    let mut archive = PaprikaArchive::open(&opts.archive).map_err(FatalError::from)?;
    let credentials = prompt_credentials(opts.username.clone(), opts.password.clone())?;
    let api = login(&opts.server_url, &credentials)?;

    let total = archive.count();
    info!(archive = %opts.archive.display(), server = %api.base_url(), total, "Starting import");

    let bar = ProgressBar::new(total as u64);
    bar.set_style(ProgressStyle::with_template(
        "{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )?);
    bar.set_message("Importing recipes");

    let report = Importer::new(&api).run(archive.entries(), |event| {
        if let ImportEvent::Processed { .. } = event {
            bar.inc(1);
        } else {
            log_event(&event);
        }
    });
    bar.finish();

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed(),
        "Import finished"
    );
    println!("{}", summary(&report, &opts.logfile));
    Ok(())
}

/// Use the credentials given on the command line, asking for the rest.
fn prompt_credentials(username: Option<String>, password: Option<String>) -> Result<Credentials> {
    let username = match username {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };
    // `Password` hides input in the terminal.
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };
    Ok(Credentials { username, password })
}

/// Log in once for the whole run. Failure ends the run before any recipe is
/// touched.
fn login(server_url: &str, credentials: &Credentials) -> Result<MealieClient, FatalError> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Logging in...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let api = MealieClient::login(server_url, credentials);
    spinner.finish_and_clear();

    api.map_err(|e| {
        error!(server = %server_url, username = %credentials.username, "Login failed: {e}");
        e.into()
    })
}

fn log_event(event: &ImportEvent) {
    let Some((level, line)) = log_line(event) else {
        return;
    };
    if level == Level::ERROR {
        error!("{line}");
    } else if level == Level::WARN {
        warn!("{line}");
    } else if level == Level::INFO {
        info!("{line}");
    } else {
        debug!("{line}");
    }
}

/// What an import event looks like in the log file, if it shows up at all.
fn log_line(event: &ImportEvent) -> Option<(Level, String)> {
    let line = match event {
        ImportEvent::Imported { name, slug, .. } => (
            Level::INFO,
            format!("Successfully imported recipe '{name}' as '{slug}'"),
        ),
        ImportEvent::Failed {
            recipe,
            error: RecordError::Rejected { status, body },
            ..
        } => (
            Level::ERROR,
            format!("Error while importing recipe '{recipe}': code {status}: {body}"),
        ),
        ImportEvent::Failed { recipe, error, .. } => (
            Level::ERROR,
            format!("Error while importing recipe '{recipe}': {error}"),
        ),
        ImportEvent::ImageAttached { slug, step } => (
            Level::INFO,
            format!("Successful {step} for recipe '{slug}'"),
        ),
        ImportEvent::ImageWarning {
            slug,
            error: error @ ImageError::EmbeddedImage(_),
        } => (
            Level::DEBUG,
            format!("Ignoring embedded photo of recipe '{slug}': {error}"),
        ),
        ImportEvent::ImageWarning { slug, error } => (
            Level::WARN,
            format!("Error while importing image for recipe '{slug}': {error}"),
        ),
        ImportEvent::Processed { .. } => return None,
    };
    Some(line)
}

fn summary(report: &ImportReport, logfile: &Path) -> String {
    format!(
        "Imported: {}\nErrors: {}\nSee {} for details.",
        report.succeeded,
        report.failed(),
        logfile.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageStep;

    #[test]
    fn summary_lists_counts_and_log_file() {
        let report = ImportReport {
            attempted: 12,
            succeeded: 9,
        };
        assert_eq!(
            summary(&report, Path::new("pap2mealie.log")),
            "Imported: 9\nErrors: 3\nSee pap2mealie.log for details."
        );
    }

    #[test]
    fn bare_log_file_lives_in_current_dir() {
        let (dir, name) = log_file_location(Path::new("pap2mealie.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "pap2mealie.log");
    }

    #[test]
    fn nested_log_file_keeps_its_dir() {
        let (dir, name) = log_file_location(Path::new("/tmp/imports/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/imports"));
        assert_eq!(name, "run.log");
    }

    #[test]
    fn log_file_needs_a_name() {
        assert!(log_file_location(Path::new("/")).is_err());
    }

    #[test]
    fn given_credentials_skip_prompts() {
        let credentials =
            prompt_credentials(Some("chef".into()), Some("s3cret".into())).unwrap();
        assert_eq!(credentials.username, "chef");
        assert_eq!(credentials.password, "s3cret");
    }

    #[test]
    fn missing_archive_fails_before_prompting() {
        // No credentials given: reaching the prompt would block on stdin.
        let opts = ImportOptions {
            archive: PathBuf::from("/nonexistent/export.paprikarecipes"),
            server_url: "http://127.0.0.1:1".into(),
            username: None,
            password: None,
            logfile: PathBuf::from("pap2mealie.log"),
        };
        let err = run(opts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FatalError>(),
            Some(FatalError::Archive(_))
        ));
    }

    #[test]
    fn rejected_recipe_is_logged_with_status_and_body() {
        let event = ImportEvent::Failed {
            index: 0,
            recipe: "Buttermilk Pancakes".into(),
            error: RecordError::Rejected {
                status: 500,
                body: "Internal Server Error".into(),
            },
        };
        let (level, line) = log_line(&event).unwrap();
        assert_eq!(level, Level::ERROR);
        assert!(line.contains("Buttermilk Pancakes"));
        assert!(line.contains("500"));
        assert!(line.contains("Internal Server Error"));
    }

    #[test]
    fn image_rejection_is_a_warning() {
        let event = ImportEvent::ImageWarning {
            slug: "buttermilk-pancakes".into(),
            error: ImageError::Rejected {
                step: ImageStep::Upload,
                status: 413,
                body: "Payload Too Large".into(),
            },
        };
        let (level, line) = log_line(&event).unwrap();
        assert_eq!(level, Level::WARN);
        assert!(line.contains("image upload rejected (status 413): Payload Too Large"));
    }

    #[test]
    fn progress_events_are_not_logged() {
        assert!(log_line(&ImportEvent::Processed { index: 3 }).is_none());
    }
}
