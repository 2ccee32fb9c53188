use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bl_app::{
    AppError, AppResult, HeadlessRun, MountSource, RunSummary, ScheduledEdit, SessionOptions,
    lab_service,
};
use bl_rigid::DefaultWorldFactory;
use bl_scenarios::ScenarioKind;
use bl_view::{Frame, Viewport};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bl-cli")]
#[command(about = "Bongo Lab CLI - headless physics lab scenarios", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate lab file syntax and structure
    Validate {
        /// Path to the lab file (YAML, or JSON by extension)
        lab_path: PathBuf,
    },
    /// List scenario presets in a lab file
    Scenarios {
        /// Path to the lab file
        lab_path: PathBuf,
    },
    /// Run a preset from a lab file, printing frames as JSON lines
    Run {
        /// Path to the lab file
        lab_path: PathBuf,
        /// Scenario preset ID
        scenario_id: String,
        #[command(flatten)]
        drive: DriveArgs,
    },
    /// Run a scenario kind with default parameters
    RunDefault {
        /// pendulum, inclined_plane, circuit, lever or optics
        kind: ScenarioKind,
        #[command(flatten)]
        drive: DriveArgs,
    },
}

#[derive(Args)]
struct DriveArgs {
    /// Display frames to tick
    #[arg(long, default_value_t = 120)]
    frames: u64,
    /// Display refresh rate in Hz
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
    /// Viewport width in pixels
    #[arg(long)]
    width: Option<f64>,
    /// Viewport height in pixels
    #[arg(long)]
    height: Option<f64>,
    /// Edit applied before a frame, as field=value@frame (repeatable)
    #[arg(long = "edit")]
    edits: Vec<ScheduledEdit>,
    /// Leave the scenario stopped after an edit instead of restarting it
    #[arg(long)]
    no_restart: bool,
}

impl DriveArgs {
    fn headless_run(&self) -> HeadlessRun {
        HeadlessRun {
            frames: self.frames,
            fps: self.fps,
            edits: self.edits.clone(),
            restart_after_edit: !self.no_restart,
        }
    }

    fn apply_viewport(&self, options: &mut SessionOptions) -> AppResult<()> {
        let width = self.width.unwrap_or(options.viewport.width);
        let height = self.height.unwrap_or(options.viewport.height);
        options.viewport = Viewport::new(width, height)?;
        Ok(())
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { lab_path } => cmd_validate(&lab_path),
        Commands::Scenarios { lab_path } => cmd_scenarios(&lab_path),
        Commands::Run {
            lab_path,
            scenario_id,
            drive,
        } => cmd_run(&lab_path, &scenario_id, &drive),
        Commands::RunDefault { kind, drive } => cmd_run_default(kind, &drive),
    }
}

fn cmd_validate(lab_path: &Path) -> AppResult<()> {
    println!("Validating lab: {}", lab_path.display());
    let lab = lab_service::load_lab(lab_path)?;
    lab_service::validate_lab(&lab)?;
    println!("✓ Lab is valid ({} scenarios)", lab.scenarios.len());
    Ok(())
}

fn cmd_scenarios(lab_path: &Path) -> AppResult<()> {
    let lab = lab_service::load_lab(lab_path)?;
    let scenarios = lab_service::list_scenarios(&lab);

    if scenarios.is_empty() {
        println!("No scenarios found in lab");
        return Ok(());
    }

    println!("Scenarios in '{}':", lab.name);
    for s in scenarios {
        println!("  {} - {} [{}]", s.id, s.name, s.kind);
        println!("    Params: {}, Edits: {}", s.param_count, s.edit_count);
    }
    Ok(())
}

fn cmd_run(lab_path: &Path, scenario_id: &str, drive: &DriveArgs) -> AppResult<()> {
    let lab = lab_service::load_lab(lab_path)?;
    let preset = lab_service::get_scenario(&lab, scenario_id)?.clone();
    let mut options = lab_service::session_options(&lab)?;
    drive.apply_viewport(&mut options)?;
    run_and_print(MountSource::Preset(preset), options, drive)
}

fn cmd_run_default(kind: ScenarioKind, drive: &DriveArgs) -> AppResult<()> {
    let mut options = SessionOptions::default();
    drive.apply_viewport(&mut options)?;
    run_and_print(MountSource::Kind(kind), options, drive)
}

fn run_and_print(source: MountSource, options: SessionOptions, drive: &DriveArgs) -> AppResult<()> {
    let summary = bl_app::run_headless(
        source,
        DefaultWorldFactory,
        options,
        &drive.headless_run(),
        print_frame,
    )?;
    print_summary(&summary)
}

fn print_frame(frame: &Frame) {
    let line = match serde_json::to_string(frame) {
        Ok(line) => line,
        Err(e) => {
            warn!(seq = frame.seq, error = %e, "frame not serializable");
            return;
        }
    };
    let mut out = io::stdout().lock();
    if let Err(e) = writeln!(out, "{line}") {
        warn!(error = %e, "failed to write frame");
    }
}

fn print_summary(summary: &RunSummary) -> AppResult<()> {
    let json = serde_json::to_string(summary)
        .map_err(|e| AppError::InvalidInput(format!("summary not serializable: {e}")))?;
    eprintln!("{json}");
    Ok(())
}
