mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use vpm_client::{fetch_session, HttpReporter, LocalScorer};
use vpm_core::{SessionManifest, Submodality, TrialReporter};
use vpm_render::{font::load_font, Hud, SceneRenderer, SymbolRenderer, VariantRenderer};
use vpm_session::SessionConfig;

use app::{App, ScoreSource};

const DEMO_SYMBOLS: &str = include_str!("../assets/demo_symbols.json");
const DEMO_SCENE: &str = include_str!("../assets/demo_scene.json");

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Symbol sequence flash
    Code,
    /// Scene change detection
    Scene,
}

impl Mode {
    fn submodality(self) -> Submodality {
        match self {
            Mode::Code => Submodality::Symbols,
            Mode::Scene => Submodality::Scene,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "vpm", version, about = "Timed visual perceptual-memory test runner")]
struct Cli {
    /// Test variant to run
    #[arg(value_enum)]
    mode: Mode,

    /// Scoring backend base URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Read the item manifest from a file instead of provisioning one
    #[arg(long)]
    items: Option<PathBuf>,

    /// Run the bundled demo items offline, scored locally
    #[arg(long)]
    demo: bool,

    /// Participant identifier forwarded to the backend
    #[arg(long)]
    user: Option<String>,

    /// Font file to use instead of searching the system
    #[arg(long)]
    font: Option<PathBuf>,

    /// Open a window instead of going fullscreen
    #[arg(long)]
    windowed: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let submodality = cli.mode.submodality();

    let font = load_font(cli.font.as_deref())?;
    let manifest = load_manifest(&cli, submodality)?;
    let config = SessionConfig::for_submodality(submodality);

    let (reporter, score_source): (Box<dyn TrialReporter>, ScoreSource) = if cli.demo {
        let scorer = LocalScorer::new(&manifest.items);
        (Box::new(scorer.clone()), ScoreSource::Local(scorer))
    } else {
        let reporter = HttpReporter::new(&cli.server);
        let score_source = ScoreSource::Backend {
            base_url: cli.server.clone(),
        };
        (Box::new(reporter), score_source)
    };

    let renderer: Box<dyn VariantRenderer> = match submodality {
        Submodality::Symbols => Box::new(SymbolRenderer::new(font.clone())),
        Submodality::Scene => Box::new(SceneRenderer::new(font.clone())),
    };
    let hud = Hud::new(font);

    info!(
        session_id = %manifest.session_id,
        items = manifest.items.len(),
        submodality = %submodality,
        "starting session"
    );

    let app = App::new(
        manifest,
        config,
        reporter,
        score_source,
        renderer,
        hud,
        cli.windowed,
    );
    app.run()
}

fn load_manifest(cli: &Cli, submodality: Submodality) -> Result<SessionManifest> {
    if let Some(path) = &cli.items {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return SessionManifest::from_json(&text)
            .with_context(|| format!("{} is not a valid item manifest", path.display()));
    }
    if cli.demo {
        let text = match submodality {
            Submodality::Symbols => DEMO_SYMBOLS,
            Submodality::Scene => DEMO_SCENE,
        };
        return SessionManifest::from_json(text).context("bundled demo manifest is invalid");
    }
    Ok(fetch_session(&cli.server, submodality, cli.user.as_deref())?)
}
