use clap::{Parser, Subcommand, ValueEnum};
use lg_project::{ProjectResult, load};
use lg_sim::{Diagnostic, SimRecord};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "lg-cli")]
#[command(about = "Lagrange CLI - planar mechanism simulation tool", long_about = None)]
struct Cli {
    /// Print a timing summary of every pipeline stage
    #[arg(long, global = true)]
    timing: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate mechanism file syntax and structure
    Validate {
        /// Path to the mechanism YAML or JSON file
        project_path: PathBuf,
    },
    /// Derive and print the solved accelerations
    Equations {
        /// Path to the mechanism YAML or JSON file
        project_path: PathBuf,
    },
    /// Simulate a number of frames
    Run {
        /// Path to the mechanism YAML or JSON file
        project_path: PathBuf,
        /// Frames to advance
        #[arg(long, default_value_t = 300)]
        frames: usize,
        /// What to print
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,
        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Frame count, final time and energy drift
    Summary,
    /// One row per frame: time, every coordinate and velocity, energy
    Csv,
}

fn main() -> ProjectResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if cli.timing {
        lg_core::timing::enable_timing();
    }

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Equations { project_path } => cmd_equations(&project_path),
        Commands::Run {
            project_path,
            frames,
            output,
            file,
        } => cmd_run(&project_path, frames, output, file.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> ProjectResult<()> {
    println!("Validating mechanism: {}", project_path.display());
    let project = load(project_path)?;
    let mech = lg_project::build_mechanism(&project)?;
    println!("✓ Mechanism is valid ({} components)", mech.len());
    for def in &project.components {
        match &def.parent {
            Some(parent) => println!("  {} ({}) on {}", def.id, def.kind.type_name(), parent),
            None => println!("  {} ({})", def.id, def.kind.type_name()),
        }
    }
    Ok(())
}

fn cmd_equations(project_path: &Path) -> ProjectResult<()> {
    let project = load(project_path)?;
    let sim = lg_project::simulation(&project)?.assemble()?.compile()?;

    println!("Equations of motion for '{}':", project.name);
    for (label, expr) in sim.acceleration_table() {
        println!("  {}'' = {}", label, expr);
    }
    for &i in &sim.accelerations().unsolvable {
        println!(
            "  ({} is not determined by the dynamics)",
            sim.setup().label(sim.mechanism(), i)
        );
    }
    sim.stats().print_summary();
    Ok(())
}

fn cmd_run(
    project_path: &Path,
    frames: usize,
    output: OutputFormat,
    file: Option<&Path>,
) -> ProjectResult<()> {
    let project = load(project_path)?;
    let compiled = lg_project::simulation(&project)?.assemble()?.compile()?;
    let labels: Vec<String> = (0..compiled.setup().coordinate_count())
        .map(|i| compiled.setup().label(compiled.mechanism(), i))
        .collect();

    let mut sim = compiled.start()?;
    let conserved = sim.energy_is_conserved();
    let record = sim.run_frames(frames)?;
    info!(frames, t = sim.time(), "run complete");

    let text = match output {
        OutputFormat::Csv => render_csv(&labels, &record),
        OutputFormat::Summary => {
            render_summary(&project.name, conserved, &record, sim.diagnostics())
        }
    };

    match file {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("✓ Wrote {} frames to {}", record.len(), path.display());
        }
        None => print!("{}", text),
    }

    sim.stats().print_summary();
    Ok(())
}

fn render_csv(labels: &[String], record: &SimRecord) -> String {
    let mut csv = String::from("time_s");
    for label in labels {
        let _ = write!(csv, ",{},{}_dot", label, label);
    }
    csv.push_str(",energy_j\n");

    for ((t, x), e) in record.t.iter().zip(&record.x).zip(&record.energy) {
        let _ = write!(csv, "{}", t);
        for v in x {
            let _ = write!(csv, ",{}", v);
        }
        let _ = writeln!(csv, ",{}", e);
    }
    csv
}

fn render_summary(
    name: &str,
    conserved: bool,
    record: &SimRecord,
    diagnostics: &[Diagnostic],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Simulated '{}'", name);
    let _ = writeln!(out, "  Frames: {}", record.len().saturating_sub(1));
    if let Some(t) = record.t.last() {
        let _ = writeln!(out, "  Final time: {:.4} s", t);
    }
    if let (Some(e0), Some(e1)) = (record.energy.first(), record.energy.last()) {
        let _ = writeln!(out, "  Energy: {:.6} J -> {:.6} J", e0, e1);
    }
    if conserved {
        let _ = writeln!(out, "  Max energy drift: {:.3e} J", record.max_energy_drift());
    } else {
        let _ = writeln!(out, "  Energy is not conserved (damped or driven mechanism)");
    }
    if !diagnostics.is_empty() {
        let _ = writeln!(out, "  Diagnostics:");
        for d in diagnostics {
            let _ = writeln!(out, "    {}", d);
        }
    }
    out
}
