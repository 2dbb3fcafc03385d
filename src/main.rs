use clap::Parser;
use mindx_api::{ChatCompletionsGenerator, ContentGenerator, GeneratorConfig, RestApi};
use mindx_storage::{BackendKind, MindmapManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Mind-map authoring service with generated imports and saved snapshots
#[derive(Parser, Debug)]
#[command(name = "mindx")]
#[command(about = "A mind-map authoring service", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// HTTP API port
    #[arg(long, default_value_t = 6340)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Snapshot backend: file, lmdb or memory
    #[arg(long, default_value = "file")]
    backend: BackendKind,

    /// Chat-completions endpoint used for generated mind maps
    #[arg(long, default_value = mindx_api::DEFAULT_ENDPOINT)]
    generator_url: String,

    /// Model requested from the generator
    #[arg(long, default_value = mindx_api::DEFAULT_MODEL)]
    generator_model: String,

    /// Generator API key
    #[arg(long, env = "MINDX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting MindX v{}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", args.data_dir);
    info!("HTTP API port: {}", args.http_port);

    let manager = Arc::new(MindmapManager::open(&args.data_dir, args.backend)?);
    info!("Storage initialized ({} saved mind maps)", manager.list()?.len());

    if args.api_key.is_none() {
        warn!("No generator API key set, topic generation will be refused");
    }
    let generator: Arc<dyn ContentGenerator> = Arc::new(ChatCompletionsGenerator::new(GeneratorConfig {
        endpoint: args.generator_url,
        model: args.generator_model,
        api_key: args.api_key,
        ..Default::default()
    }));

    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(manager, generator, http_port).await {
                eprintln!("HTTP server error: {}", e);
            }
        })
    });

    info!("MindX started successfully");
    info!("HTTP API: http://localhost:{}/", http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
