pub mod output;
pub mod prompt;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use output::print_outcome;
use prompt::StdinInput;
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    timers::{
        engine::{Operation, TimerEngine},
        error::TimerError,
        input::InputProvider,
        record_file::TimerFile,
        report::TracingReporter,
        view::{ViewFormat, DEFAULT_DURATION_FORMAT, DEFAULT_TIME_FORMAT},
    },
    utils::{
        clock::DefaultClock,
        dir::{create_log_default_path, DEFAULT_TIMERS_FILE},
        logging::enable_logging,
    },
};

#[derive(Parser, Debug)]
#[command(name = "labeltime", version, long_about = None)]
#[command(about = "Start, finish and resume timers grouped by label", long_about = None)]
struct Args {
    #[command(flatten)]
    operation: OperationArgs,
    #[arg(
        short,
        long,
        num_args = 1..,
        value_name = "LABEL",
        help = "View timers of given labels. Shown after any other operation"
    )]
    view: Vec<String>,
    #[arg(long, default_value = DEFAULT_TIMERS_FILE, help = "File where timers are kept")]
    file: PathBuf,
    #[arg(
        long,
        default_value = DEFAULT_TIME_FORMAT,
        help = "strftime format for start and end times"
    )]
    format: String,
    #[arg(
        long = "duration-format",
        default_value = DEFAULT_DURATION_FORMAT,
        help = "Format for elapsed time. Supports %D, %H, %M, %S and %f"
    )]
    duration_format: String,
    #[arg(short, long, help = "Don't print log messages to the console")]
    quiet: bool,
    #[arg(long = "log-filter", help = "Log level. Falls back to RUST_LOG, then info")]
    log: Option<LevelFilter>,
    #[arg(
        long = "log-dir",
        help = "Directory for log files. \
                By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    log_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Default)]
#[group(multiple = false)]
struct OperationArgs {
    #[arg(short, long, value_name = "LABEL", help = "Creates new timer of given label")]
    create: Option<String>,
    #[arg(short, long, value_name = "LABEL", help = "Delete timer of given label")]
    delete: Option<String>,
    #[arg(short, long, value_name = "LABEL", help = "Start timer of given label")]
    start: Option<String>,
    #[arg(short, long, value_name = "LABEL", help = "Stops timer of given label")]
    finish: Option<String>,
    #[arg(short, long, value_name = "LABEL", help = "Resumes timer of given label")]
    resume: Option<String>,
}

impl OperationArgs {
    fn into_operation(self) -> Option<Operation> {
        let OperationArgs {
            create,
            delete,
            start,
            finish,
            resume,
        } = self;
        create
            .map(Operation::Create)
            .or(delete.map(Operation::Delete))
            .or(start.map(Operation::Start))
            .or(finish.map(Operation::End))
            .or(resume.map(Operation::Resume))
    }
}

impl Args {
    /// At most one change to the timers, followed by viewing.
    fn operations(&mut self) -> Vec<Operation> {
        let operation = std::mem::take(&mut self.operation).into_operation();
        let view = std::mem::take(&mut self.view);
        operation
            .into_iter()
            .chain((!view.is_empty()).then_some(Operation::View(view)))
            .collect()
    }
}

pub fn run_cli() -> Result<()> {
    let mut args = Args::parse();

    let log_dir = args.log_dir.take().map_or_else(create_log_default_path, Ok)?;
    enable_logging(&log_dir, args.log, !args.quiet)?;

    run(args, &mut StdinInput)
}

/// Loads the timers file, applies requested operations and saves the result. Nothing is written
/// if any operation fails.
fn run(mut args: Args, input: &mut impl InputProvider) -> Result<()> {
    let operations = args.operations();
    if operations.is_empty() {
        Args::command().print_help()?;
        return Ok(());
    }

    let format = ViewFormat::new(&args.format, &args.duration_format).map_err(|e| {
        Args::command().error(clap::error::ErrorKind::ValueValidation, e.to_string())
    })?;

    let file = TimerFile::open(&args.file)
        .with_context(|| format!("Failed to open timers file {:?}", args.file))?;
    let mut store = file
        .load(&TracingReporter)
        .with_context(|| format!("Failed to load timers from {:?}", file.path()))?;

    let engine = TimerEngine::new(DefaultClock, TracingReporter).with_format(format);
    for operation in operations {
        debug!("Applying {operation:?}");
        let outcome = engine.apply(&mut store, operation, input)?;
        print_outcome(&outcome);
    }

    file.save(&store)
        .with_context(|| format!("Failed to save timers into {:?}", file.path()))?;
    Ok(())
}

/// Text logged when the cli fails. Rejected operations get their message only, anything else is
/// shown with its full cause chain.
pub fn describe_failure(error: &anyhow::Error) -> String {
    match error.downcast_ref::<TimerError>() {
        Some(e) if e.is_precondition() => e.to_string(),
        _ => format!("{error:?}"),
    }
}
