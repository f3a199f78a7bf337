use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use webcam_capture::{
    create_router, AppState, CaptureController, CloudinaryUploader, Config, DeviceSourceFactory,
    RecorderConfig, SessionRunner, StreamRecorder,
};

#[derive(Parser)]
#[command(name = "webcam-capture")]
#[command(about = "Record a short webcam clip and upload it")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/webcam-capture")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Recording limit: {}s, upload limit: {} bytes",
        cfg.capture.max_seconds, cfg.capture.max_upload_bytes
    );
    info!("Upload endpoint: {}", cfg.upload.endpoint());

    let devices = DeviceSourceFactory::create(&cfg.devices);
    let recorder = StreamRecorder::new(RecorderConfig::from(&cfg.capture));
    let uploader = CloudinaryUploader::new(cfg.upload.clone())
        .context("Failed to create upload client")?;

    let controller = CaptureController::new(
        cfg.capture.clone(),
        devices,
        Box::new(recorder),
        Box::new(uploader),
    );
    let (session, runner) = SessionRunner::spawn(controller);

    let app = create_router(AppState::new(session));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                // Keep serving without a signal handler
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    // Dropping the router released the last session handle
    runner.await.context("Session runner panicked")?;

    Ok(())
}
