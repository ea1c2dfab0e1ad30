use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use lexipic_corpus::{Corpus, LoadMode};
use lexipic_matcher::{NormalizeOptions, PhraseMatcher};
use lexipic_types::STATIC_BASE;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use lexipic::lookup::{DEFAULT_API_BASE, DEFAULT_TIMEOUT};
use lexipic::{AppState, ArasaacClient, InFlight, Translator, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!("pictogram api at {}", config.api_base);
    if !config.leet {
        info!("leet substitution disabled");
    }
    if config.disable_cache {
        info!("cache headers disabled");
    }

    let start = Instant::now();
    let corpus = match &config.corpus_path {
        Some(path) => {
            info!(
                "using corpus at {} (mode: {:?})",
                path.display(),
                config.corpus_mode
            );
            Arc::new(Corpus::load_with_mode(path, config.corpus_mode)?)
        }
        None => {
            info!("using embedded corpus");
            Corpus::embedded()
        }
    };
    info!(
        "corpus loaded in {} ms ({} samples, {} tokens)",
        start.elapsed().as_millis(),
        corpus.len(),
        corpus.vocabulary().len()
    );

    let matcher = PhraseMatcher::with_options(corpus, NormalizeOptions { leet: config.leet });
    let client = ArasaacClient::new(&config.api_base, &config.static_base, config.lookup_timeout)
        .context("building pictogram client")?;
    let state = AppState {
        translator: Arc::new(Translator::new(matcher, client)),
        inflight: InFlight::new(),
        static_base: config.static_base.clone(),
        disable_cache: config.disable_cache,
    };

    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    corpus_path: Option<PathBuf>,
    corpus_mode: LoadMode,
    api_base: String,
    static_base: String,
    lookup_timeout: Duration,
    leet: bool,
    disable_cache: bool,
}

fn load_config() -> Config {
    let mut disable_cache = false;
    let mut cli_no_leet = false;
    let mut cli_corpus: Option<PathBuf> = None;
    let mut cli_corpus_mode: Option<LoadMode> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-cache" => disable_cache = true,
            "--no-leet" => cli_no_leet = true,
            "--corpus" => {
                if let Some(path) = args.next() {
                    cli_corpus = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--corpus=") {
                    cli_corpus = Some(PathBuf::from(path));
                } else if let Some(mode) = arg.strip_prefix("--corpus-mode=") {
                    cli_corpus_mode = parse_load_mode(mode);
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let corpus_path = cli_corpus.or_else(|| env::var("CORPUS_PATH").ok().map(PathBuf::from));
    let corpus_mode = cli_corpus_mode
        .or_else(|| {
            env::var("CORPUS_LOAD_MODE")
                .ok()
                .as_deref()
                .and_then(parse_load_mode)
        })
        .unwrap_or(LoadMode::Owned);
    let api_base = env::var("ARASAAC_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    let static_base = env::var("ARASAAC_STATIC_BASE").unwrap_or_else(|_| STATIC_BASE.to_string());
    let lookup_timeout = env::var("LOOKUP_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT);
    let env_no_leet = env::var("DISABLE_LEET")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    Config {
        host,
        port,
        corpus_path,
        corpus_mode,
        api_base,
        static_base,
        lookup_timeout,
        leet: !(cli_no_leet || env_no_leet),
        disable_cache,
    }
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Some(LoadMode::Mmap),
        "owned" => Some(LoadMode::Owned),
        _ => None,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
