//! The command line interface for the planning tool.
use crate::formulation::assemble;
use crate::input::load_model;
use crate::log;
use crate::model::Model;
use crate::output::metadata::write_metadata;
use crate::output::{DataWriter, create_output_directory, get_output_dir};
use crate::settings::Settings;
use crate::solution::Solution;
use crate::solver::{SolveOptions, TerminationStatus, solve};
use ::log::{info, warn};
use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Constraint violations larger than this are reported after solving
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the planning tool.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write additional information to CSV files
    #[arg(long)]
    pub debug_model: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Build and solve a planning model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Manage example models.
    Example {
        /// The available subcommands for managing example models.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ imes --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help in markdown format
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let mut settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // These settings can be overridden by command-line arguments
    if opts.debug_model {
        settings.debug_model = true;
    }
    if opts.overwrite {
        settings.overwrite = true;
    }

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    let overwrite =
        create_output_directory(output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the model to run
    let model = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    run_model(&model, output_path, settings.debug_model)?;
    info!("Run complete!");

    Ok(())
}

/// Assemble and solve the model, writing results to `output_path`.
///
/// The summary is always written. A run which ends without a usable solution is an error.
fn run_model(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    let assembled = assemble(model).context("Failed to assemble model.")?;

    let mut writer = DataWriter::create(output_path, debug_model)?;
    writer.write_debug_info(&assembled.coefficients)?;
    write_metadata(output_path, &model.model_path, assembled.storage_mode)?;

    let solver = &model.parameters.solver;
    let options = SolveOptions {
        solver_name: &solver.name,
        time_limit: solver.time_limit,
        mip_gap: solver.mip_gap.value(),
    };
    let outcome = solve(&assembled.problem, &options)?;
    let status = outcome.status;
    let mip_gap = outcome.mip_gap;
    info!("Solver finished with status: {status}");
    writer.write_summary(&outcome)?;

    let solution = Solution::new(&assembled, outcome);
    if let Some(solution) = &solution {
        info!("Total discounted investment cost: {}", solution.objective_value);
        if let Some(row) = assembled
            .problem
            .first_violated_constraint(solution.values(), FEASIBILITY_TOLERANCE)
        {
            let description = assembled
                .constraint_keys
                .describe_row(row)
                .unwrap_or_else(|| format!("row {row}"));
            warn!("Solution violates constraint: {description}");
        }
        writer.write_solution(solution)?;
    }
    writer.flush()?;

    match (status, solution) {
        (TerminationStatus::Optimal, Some(_)) => Ok(()),
        (TerminationStatus::TimeLimit, Some(_)) => {
            match mip_gap {
                Some(gap) => warn!(
                    "Time limit reached: the solution may not be optimal (MIP gap: {:.2}%)",
                    gap * 100.0
                ),
                None => warn!("Time limit reached: the solution may not be optimal"),
            }
            Ok(())
        }
        (TerminationStatus::TimeLimit, None) => {
            bail!("Time limit reached before a feasible solution was found")
        }
        (status, _) => bail!("Could not solve model: {status}"),
    }
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load the model and check that it has all the coefficients it needs
    let model = load_model(model_path).context("Failed to validate model.")?;
    assemble(&model).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}
