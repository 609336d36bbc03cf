use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use contour_area::command::parse_script;
use contour_area::{
    AreaProgress, DetectorConfig, EstimatorConfig, Outcome, SampleMode, Session, SessionConfig,
};

#[derive(Parser)]
#[command(
    name = "contour-area",
    about = "Replay a tracing session and estimate the enclosed area"
)]
struct Cli {
    /// Command script (one command per line). Reads stdin if omitted.
    script: Option<PathBuf>,

    /// Total Monte Carlo samples
    #[arg(short = 'n', long, default_value = "10000000")]
    samples: u64,

    /// Number of progress batches the samples are split into
    #[arg(short, long, default_value = "100")]
    batches: u32,

    /// Base seed; batch b uses seed + b
    #[arg(long, default_value = "24301")]
    seed: u64,

    /// Sample real coordinates instead of integer pixels
    #[arg(long)]
    continuous: bool,

    /// Classify samples on one thread
    #[arg(long)]
    sequential: bool,

    /// Skip consecutive segments of the same trace during closure detection
    #[arg(long)]
    skip_adjacent: bool,

    /// Real-world unit name for labels and output
    #[arg(short, long, default_value = "km")]
    unit: String,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let config = SessionConfig {
        estimator: EstimatorConfig {
            total_samples: cli.samples,
            batch_count: cli.batches,
            seed: cli.seed,
            sampling: if cli.continuous {
                SampleMode::Continuous
            } else {
                SampleMode::Integer
            },
            parallel: !cli.sequential,
        },
        detector: DetectorConfig {
            skip_adjacent: cli.skip_adjacent,
        },
        unit: cli.unit.clone(),
    };

    let text = match &cli.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let commands = parse_script(&text).map_err(|(line, e)| format!("line {}: {}", line, e))?;

    eprintln!();
    eprintln!("  contour-area \u{00b7} {} commands", commands.len());
    eprintln!();

    let mut session = Session::new(config);
    let unit = cli.unit.as_str();
    let mut final_area = None;

    for (line, command) in commands {
        let report = |p: &AreaProgress| {
            eprintln!(
                "  Estimate    {:>3.0}%  {:.2} {}\u{00b2}  (\u{00b1} {:.2})",
                p.fraction_done() * 100.0,
                p.area(),
                unit,
                p.estimate.standard_error(),
            );
        };
        match session.apply(command, report) {
            Ok(Outcome::Committed(false)) => eprintln!("  Trace       discarded"),
            Ok(Outcome::Closed(true)) => {
                let n = session.store().traces().len();
                eprintln!("  Closed      {} traces \u{2192} calibrate", n);
            }
            Ok(Outcome::Closed(false)) => eprintln!("  Open        no crossing yet"),
            Ok(Outcome::Measured(len)) => eprintln!("  Measure     {:.2} px", len),
            Ok(Outcome::Calibrated(ratio)) => eprintln!("  Scale       {} {}/px", ratio, unit),
            Ok(Outcome::Area(area)) => final_area = Some(area),
            Ok(Outcome::Removed(trace)) => {
                final_area = None;
                eprintln!("  Undo        removed trace ({} points)", trace.points().len());
            }
            Ok(Outcome::Cleared) => {
                final_area = None;
                eprintln!("  Clear");
            }
            Ok(_) => {}
            Err(e) => eprintln!("  Error       line {}: {}", line, e),
        }
    }

    eprintln!();
    eprintln!("  State       {}", session.state());
    for label in session.scale_labels() {
        eprintln!("  Label       {}", label);
    }

    match final_area {
        Some(area) => {
            eprintln!("  \u{2713} estimated area");
            println!("{:.2} {}\u{00b2}", area, unit);
        }
        None => eprintln!("  no area estimated"),
    }
    eprintln!();

    Ok(())
}
