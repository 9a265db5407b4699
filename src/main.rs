//! CLI entry point for the grade tracker.
//!
//! Provides subcommands for listing the subject catalog, recording a score,
//! computing weighted averages, and running an interactive form session
//! against the configured spreadsheet.

use anyhow::Result;
use clap::{Parser, Subcommand};
use grade_tracker::{
    command::FormCommand,
    config::{Config, Overrides},
    error::AppError,
    model::{Score, Semester, TestType},
    output::{self, OutputFormat},
    session::{Outcome, Session},
    sheets::SheetsClient,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade-tracker")]
#[command(about = "Record scores in a Google Sheet and compute weighted averages", long_about = None)]
struct Cli {
    /// Service account key file (overrides GOOGLE_CREDENTIALS and GOOGLE_CREDENTIALS_FILE)
    #[arg(long, global = true, value_name = "FILE")]
    credentials_file: Option<PathBuf>,

    /// Spreadsheet id or sharing URL (overrides SPREADSHEET_ID and SPREADSHEET_URL)
    #[arg(long, global = true, value_name = "ID_OR_URL")]
    spreadsheet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the subject catalog
    Subjects,
    /// Record one score; omitted selections use the session defaults
    Record {
        /// Subject from the catalog (defaults to the first entry)
        #[arg(long)]
        subject: Option<String>,

        /// Regular, Midterm, Final or "Term Exam" (defaults to Regular)
        #[arg(short, long)]
        test_type: Option<TestType>,

        /// "Term I" or "Term II" (defaults to Term I)
        #[arg(long)]
        semester: Option<Semester>,

        /// Score between 0 and 10
        #[arg(long)]
        score: Score,
    },
    /// Compute the weighted average per semester and subject
    Averages {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also write the averages to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the interactive form
    Session,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing()?;

    let cli = Cli::parse();

    let overrides = Overrides {
        credentials_file: cli.credentials_file,
        spreadsheet: cli.spreadsheet,
    };

    let client = match connect(&overrides).await {
        Ok(client) => client,
        Err(e) => {
            error!(kind = ?e.kind(), error = %e, "Startup failed");
            println!("{}", output::render(&Outcome::Failed(e), OutputFormat::Table));
            return Ok(ExitCode::FAILURE);
        }
    };

    let (mut session, warning) = Session::start(client).await;
    if let Some(e) = warning {
        println!("{}", output::render(&Outcome::Failed(e), OutputFormat::Table));
    }

    let (outcome, format) = match cli.command {
        Commands::Subjects => (
            session.handle(FormCommand::Subjects).await,
            OutputFormat::Table,
        ),
        Commands::Record {
            subject,
            test_type,
            semester,
            score,
        } => {
            let mut selections = Vec::new();
            selections.extend(subject.map(FormCommand::Subject));
            selections.extend(test_type.map(FormCommand::TestType));
            selections.extend(semester.map(FormCommand::Semester));
            selections.push(FormCommand::Score(score));

            let outcome = run_steps(&mut session, selections, FormCommand::Record).await;
            (outcome, OutputFormat::Table)
        }
        Commands::Averages {
            format,
            output: export_path,
        } => {
            let outcome = session.handle(FormCommand::Averages).await;

            // no data still exports a header-only file
            let exported = match &outcome {
                Outcome::Averages(rows) => Some(rows.as_slice()),
                Outcome::NoData => Some(&[][..]),
                _ => None,
            };
            if let (Some(path), Some(rows)) = (&export_path, exported) {
                if let Err(e) = output::export_csv(path, rows) {
                    error!(path = %path.display(), error = %e, "CSV export failed");
                    println!("error: cannot write {}: {e:#}", path.display());
                    return Ok(ExitCode::FAILURE);
                }
                info!(path = %path.display(), rows = rows.len(), "Averages exported");
            }

            (outcome, format)
        }
        Commands::Session => {
            run_session(&mut session).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    println!("{}", output::render(&outcome, format));

    Ok(match outcome {
        Outcome::Failed(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

/// Logging setup: colored stderr + JSON rolling log file
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

/// Resolves the configuration and opens the spreadsheet. Any error here is
/// fatal for the run.
async fn connect(overrides: &Overrides) -> Result<SheetsClient, AppError> {
    let config = Config::from_env(overrides)?;
    SheetsClient::connect(&config).await
}

/// Applies `selections` in order, then runs `action`. The first failed
/// selection is returned instead and the action is skipped.
async fn run_steps(
    session: &mut Session<SheetsClient>,
    selections: Vec<FormCommand>,
    action: FormCommand,
) -> Outcome {
    for step in selections {
        if let failed @ Outcome::Failed(_) = session.handle(step).await {
            return failed;
        }
    }
    session.handle(action).await
}

/// Reads line commands from stdin until `quit` or end of input.
#[tracing::instrument(skip(session))]
async fn run_session(session: &mut Session<SheetsClient>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let intro = output::render(
        &Outcome::Selection(session.state().clone()),
        OutputFormat::Table,
    );
    stdout
        .write_all(format!("{intro}\nType 'help' for commands.\n").as_bytes())
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match line.parse::<FormCommand>() {
            Ok(command) => session.handle(command).await,
            Err(e) => Outcome::Failed(e),
        };

        let text = output::render(&outcome, OutputFormat::Table);
        stdout.write_all(format!("{text}\n").as_bytes()).await?;

        if matches!(outcome, Outcome::Quit) {
            break;
        }
    }

    info!("Session ended");
    Ok(())
}
