//! procwatch entrypoint: generate synthetic data, train, batch-score a CSV, or monitor
//! live processes (single cycle or daemon loop until Ctrl+C).

use clap::{Parser, Subcommand, ValueEnum};
use procwatch::{
    collectors::{HeuristicMapper, LiveCollector, SysinfoSource},
    config::AppConfig,
    generator::{DatasetGenerator, ProfileName},
    features::{Label, LabeledDataset, ObservationTable},
    logging::StructuredLogger,
    model::ArtifactPair,
    monitor::run_one_cycle,
    risk::RiskEngine,
    scoring::Scorer,
    training::Trainer,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "procwatch")]
#[command(about = "Classify host processes as normal or suspicious from behavioral features")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (JSON); defaults to $PROCWATCH_CONFIG or ./procwatch.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a synthetic labeled dataset
    Generate {
        /// Output CSV (default: <data_dir>/generated_behavior.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,

        /// Rows per class, borderline rows excluded
        #[arg(long)]
        samples: Option<usize>,

        /// Borderline rows per class
        #[arg(long)]
        borderline: Option<usize>,

        /// Fixed seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Train the scaler + classifier pair and report held-out metrics
    Train {
        /// Labeled CSV (default: <data_dir>/generated_behavior.csv)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact directory (default: <artifacts_dir>)
        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Score a CSV of observations
    Predict {
        /// Input CSV with the 7 feature columns; other columns pass through
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV (default: <data_dir>/predicted_logs.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },

    /// Score live processes
    Monitor {
        /// Poll interval in seconds (0 = single cycle)
        #[arg(long)]
        interval: Option<u64>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Directory for per-cycle CSV snapshots
        #[arg(long)]
        export: Option<PathBuf>,

        #[arg(short, long)]
        artifacts: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Wide class overlap
    Realistic,
    /// Tighter class ranges
    Compact,
}

impl From<ProfileArg> for ProfileName {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Realistic => ProfileName::Realistic,
            ProfileArg::Compact => ProfileName::Compact,
        }
    }
}

fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&config_path);
    StructuredLogger::init(&config.log, args.verbose)?;
    info!(config = %config_path.display(), "procwatch starting");

    match args.command {
        Command::Generate {
            out,
            profile,
            samples,
            borderline,
            seed,
        } => {
            if let Some(p) = profile {
                config.generator.profile = p.into();
            }
            if let Some(n) = samples {
                config.generator.samples_per_class = n;
            }
            if let Some(n) = borderline {
                config.generator.borderline_per_class = n;
            }
            if seed.is_some() {
                config.generator.seed = seed;
            }
            let out = out.unwrap_or_else(|| config.dataset_path());
            generate(&config, &out)
        }
        Command::Train { data, artifacts } => {
            let data = data.unwrap_or_else(|| config.dataset_path());
            let artifacts = artifacts.unwrap_or_else(|| config.artifacts_dir.clone());
            train(&config, &data, &artifacts)
        }
        Command::Predict {
            input,
            output,
            artifacts,
        } => {
            let output = output.unwrap_or_else(|| config.predictions_path());
            let artifacts = artifacts.unwrap_or_else(|| config.artifacts_dir.clone());
            predict(&input, &output, &artifacts)
        }
        Command::Monitor {
            interval,
            once,
            export,
            artifacts,
        } => {
            if let Some(secs) = interval {
                config.monitor.interval_secs = secs;
            }
            if once {
                config.monitor.interval_secs = 0;
            }
            let export = export.or_else(|| {
                config
                    .monitor
                    .export_snapshots
                    .then(|| config.data_dir.clone())
            });
            let artifacts = artifacts.unwrap_or_else(|| config.artifacts_dir.clone());
            monitor(&config, &artifacts, export)
        }
    }
}

fn generate(config: &AppConfig, out: &std::path::Path) -> Result<(), BoxError> {
    let generator = DatasetGenerator::from_config(&config.generator);
    let dataset = generator.generate()?;
    dataset.write_csv(out)?;
    info!(
        path = %out.display(),
        profile = ?config.generator.profile,
        total = dataset.len(),
        normal = dataset.count(Label::Normal),
        suspicious = dataset.count(Label::Suspicious),
        "dataset generated"
    );
    Ok(())
}

fn train(config: &AppConfig, data: &std::path::Path, artifacts: &std::path::Path) -> Result<(), BoxError> {
    let dataset = LabeledDataset::read_csv(data)?;
    info!(path = %data.display(), rows = dataset.len(), "training data loaded");
    let outcome = Trainer::new(config.trainer.clone()).train(&dataset)?;
    outcome.artifacts.save(artifacts)?;
    StructuredLogger::emit_json(&outcome.report, std::io::stdout().lock())?;
    Ok(())
}

fn predict(
    input: &std::path::Path,
    output: &std::path::Path,
    artifacts: &std::path::Path,
) -> Result<(), BoxError> {
    let pair = ArtifactPair::load(artifacts)?;
    let table = ObservationTable::read_csv(input)?;
    let scored = Scorer::new(&pair).score_table(table)?;
    scored.write_csv(output)?;
    info!(
        path = %output.display(),
        suspicious = scored.suspicious_count(),
        total = scored.len(),
        "predictions saved"
    );
    Ok(())
}

fn monitor(
    config: &AppConfig,
    artifacts: &std::path::Path,
    export: Option<PathBuf>,
) -> Result<(), BoxError> {
    let pair = ArtifactPair::load(artifacts)?;
    let scorer = Scorer::new(&pair);
    let risk = RiskEngine::new(config.risk.clone());
    let source = SysinfoSource::new(Duration::from_millis(config.monitor.prime_pause_ms));
    let mut collector = LiveCollector::new(source, HeuristicMapper::new());

    let interval_secs = config.monitor.interval_secs;
    if interval_secs == 0 {
        run_one_cycle(&mut collector, &scorer, &risk, export.as_deref())?;
        info!("monitor cycle complete");
        return Ok(());
    }

    info!(interval_secs, "daemon mode (Ctrl+C to stop)");
    static STOP: AtomicBool = AtomicBool::new(false);
    let _ = ctrlc::set_handler(|| {
        STOP.store(true, Ordering::Relaxed);
    });
    let mut cycle: u64 = 0;
    while !STOP.load(Ordering::Relaxed) {
        cycle += 1;
        if let Err(e) = run_one_cycle(&mut collector, &scorer, &risk, export.as_deref()) {
            tracing::warn!(cycle, error = %e, "cycle failed");
        }
        for _ in 0..interval_secs {
            if STOP.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    info!("procwatch monitor stopping");
    Ok(())
}
