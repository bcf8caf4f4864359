mod app;

use anyhow::{Context, Result, bail};
use app::App;
use clap::Parser;
use memspan_core::StimulusKind;
use memspan_experiment::{
    ExperimentConfig, Instructions, ParticipantInfo, ResultLog, Session, Sex,
};
use memspan_render::SkiaRenderer;
use memspan_timing::HighPrecisionTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "memspan")]
#[command(version)]
#[command(about = "Matrix span visual working-memory experiment")]
struct Cli {
    /// Experiment configuration (YAML)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Participant identifier
    #[arg(long)]
    id: Option<String>,

    /// Participant sex (M or F)
    #[arg(long)]
    sex: Option<Sex>,

    /// Participant age in years
    #[arg(long)]
    age: Option<u32>,

    /// Seed for trial generation; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose logging; repeat for per-frame render timings
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// All three values are required unless the procedure runs in test mode,
/// where missing ones fall back to the test participant's.
fn participant_info(
    id: Option<String>,
    sex: Option<Sex>,
    age: Option<u32>,
    procedure_test: bool,
) -> Result<ParticipantInfo> {
    if procedure_test {
        let fallback = ParticipantInfo::test_participant();
        return Ok(ParticipantInfo {
            identifier: id.unwrap_or(fallback.identifier),
            sex: sex.unwrap_or(fallback.sex),
            age: age.unwrap_or(fallback.age),
            test: true,
        });
    }
    match (id, sex, age) {
        (Some(identifier), Some(sex), Some(age)) => Ok(ParticipantInfo {
            identifier,
            sex,
            age,
            test: false,
        }),
        _ => bail!("--id, --sex and --age are required unless procedure_test is set"),
    }
}

/// Every image the session can ask the renderer for
fn image_assets(config: &ExperimentConfig) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = match config.stimulus_type {
        StimulusKind::Image => config
            .stimulus_pool()
            .identities
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        StimulusKind::Text => Vec::new(),
    };
    images.extend(config.mask_image.iter().cloned());
    images.extend(config.clock_image.iter().cloned());
    images
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let config = ExperimentConfig::load(&cli.config)
        .with_context(|| format!("loading configuration {}", cli.config.display()))?;
    let participant = participant_info(cli.id, cli.sex, cli.age, config.procedure_test)?;
    let instructions = Instructions::load(&config).context("loading instruction texts")?;
    let font = SkiaRenderer::load_font(&config.font_path).context("loading font")?;
    let images = image_assets(&config);

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let results = ResultLog::new(&config.results_dir, &participant.participant_id(), &mut rng);
    info!(
        participant = %participant.participant_id(),
        results = %results.path().display(),
        test = participant.test,
        "starting"
    );

    let session = Session::new(
        config,
        participant,
        instructions,
        HighPrecisionTimer::new(),
        rng,
        results,
    );
    App::new(session, font, images).run()
}
