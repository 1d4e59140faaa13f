mod cli;
mod play;

use crate::cli::{Cli, Command, TrackArgs};
use crate::play::SimulatedClock;
use clap::Parser;
use islandlyrics_core::{
    Config, CoreError, EngineContext, FetchOutcome, LyricsEngine, LyricsProvider, LyricsQuery,
};
use islandlyrics_lyrics_kugou::{KugouProvider, KugouProviderConfig, KUGOU_CONFIG_TEMPLATE};
use islandlyrics_lyrics_lrcapi::{LrcApiProvider, LrcApiProviderConfig, LRCAPI_CONFIG_TEMPLATE};
use islandlyrics_lyrics_netease::{
    NeteaseProvider, NeteaseProviderConfig, NETEASE_CONFIG_TEMPLATE,
};
use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code when no provider returned usable lyrics
const EXIT_NOT_FOUND: u8 = 2;
/// Exit code after Ctrl+C
const EXIT_INTERRUPTED: u8 = 130;

type ProviderConstructor = fn(&Config) -> Result<Option<Arc<dyn LyricsProvider>>, CoreError>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    // Pass provider templates to include in the generated config file
    let provider_templates: &[&str] = &[
        KUGOU_CONFIG_TEMPLATE,
        NETEASE_CONFIG_TEMPLATE,
        LRCAPI_CONFIG_TEMPLATE,
    ];
    let config = match Config::load_or_create(provider_templates) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created a config template at {}; continuing with the defaults",
                path.display()
            );
            Config::default()
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let providers = create_providers(&config, cli.command.track());
    if providers.is_empty() {
        error!("No lyrics provider is enabled");
        return ExitCode::FAILURE;
    }
    let provider_names: Vec<_> = providers.iter().map(|p| p.name()).collect();
    info!(
        "Initialized {} lyrics provider(s): {:?}",
        providers.len(),
        provider_names
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let engine = LyricsEngine::new(EngineContext::new(&config, providers));
    runtime.block_on(run(&engine, &cli.command, cancel_token))
}

async fn run(engine: &LyricsEngine, command: &Command, cancel: CancellationToken) -> ExitCode {
    let query = command.track().query();

    let outcome = tokio::select! {
        () = cancel.cancelled() => FetchOutcome::Cancelled,
        outcome = engine.fetch(query.clone()) => outcome,
    };

    let result = match outcome {
        FetchOutcome::Ready(result) => *result,
        FetchOutcome::Instrumental(result) => {
            info!("{} reports an instrumental track", result.provider);
            play::print_instrumental(&result);
            return ExitCode::SUCCESS;
        }
        FetchOutcome::NotFound => {
            warn!("No lyrics found for {}", describe(&query));
            return ExitCode::from(EXIT_NOT_FOUND);
        }
        FetchOutcome::Cancelled | FetchOutcome::Stale => {
            info!("Lyrics fetch was cancelled");
            return ExitCode::from(EXIT_INTERRUPTED);
        }
    };

    match command {
        Command::Fetch(_) => {
            play::print_result(&result);
            ExitCode::SUCCESS
        }
        Command::Play { .. } => {
            let origin = Instant::now();
            let presenter = engine.presenter(result, origin);
            let clock = SimulatedClock::new(origin, command.start());
            if play::run(presenter, clock, cancel).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_INTERRUPTED)
            }
        }
    }
}

fn describe(query: &LyricsQuery) -> String {
    if query.artist.is_empty() {
        format!("'{}'", query.title)
    } else {
        format!("'{}' by {}", query.title, query.artist)
    }
}

fn create_providers(config: &Config, track: &TrackArgs) -> Vec<Arc<dyn LyricsProvider>> {
    let constructors: [(&str, ProviderConstructor); 3] = [
        (islandlyrics_lyrics_kugou::PROVIDER_NAME, kugou_provider),
        (islandlyrics_lyrics_netease::PROVIDER_NAME, netease_provider),
        (islandlyrics_lyrics_lrcapi::PROVIDER_NAME, lrcapi_provider),
    ];

    constructors
        .into_iter()
        .filter(|(name, _)| track.wants(name))
        .filter_map(|(name, build)| match build(config) {
            Ok(Some(provider)) => Some(provider),
            Ok(None) => {
                info!("Provider {} is disabled in the config", name);
                None
            }
            Err(e) => {
                error!("Failed to initialize {} provider: {}", name, e);
                None
            }
        })
        .collect()
}

fn kugou_provider(config: &Config) -> Result<Option<Arc<dyn LyricsProvider>>, CoreError> {
    let provider_config =
        KugouProviderConfig::from_providers(&config.providers)?.unwrap_or_default();
    if !provider_config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(KugouProvider::new(&config.http, provider_config)?)))
}

fn netease_provider(config: &Config) -> Result<Option<Arc<dyn LyricsProvider>>, CoreError> {
    let provider_config =
        NeteaseProviderConfig::from_providers(&config.providers)?.unwrap_or_default();
    if !provider_config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(NeteaseProvider::new(&config.http, provider_config)?)))
}

fn lrcapi_provider(config: &Config) -> Result<Option<Arc<dyn LyricsProvider>>, CoreError> {
    let provider_config =
        LrcApiProviderConfig::from_providers(&config.providers)?.unwrap_or_default();
    if !provider_config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(LrcApiProvider::new(&config.http, provider_config)?)))
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(Config::config_path()) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with stderr output and optional file logging.
///
/// Lyrics go to stdout, so log lines stay on stderr.
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = islandlyrics_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
