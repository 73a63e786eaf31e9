use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docflow::config::Config;
use docflow::ocr::OcrProvider;
use docflow::processing::{
    BarReporter, ExtractorRegistry, LogReporter, ProcessingPipeline, ProgressReporter,
    ResultWriter,
};

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Extract every supported document under a directory into JSON records")]
struct Args {
    /// Directory to walk recursively
    input_dir: PathBuf,

    /// Records are written to <OUTPUT_DIR>/<format>/
    output_dir: PathBuf,

    /// Deadline for a single extraction, overrides EXTRACT_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log progress instead of drawing a progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(secs) = args.timeout_secs {
        config.pipeline.extract_timeout_secs = secs;
    }

    let ocr = OcrProvider::new(&config.ocr);
    if !ocr.is_available() {
        tracing::warn!(
            "OCR is not configured; image files will fail. Set OCR_API_KEY to enable it."
        );
    }

    let registry = ExtractorRegistry::with_defaults(Arc::new(ocr));
    let writer = ResultWriter::new(&args.output_dir);
    let pipeline = ProcessingPipeline::new(registry, writer, &config.pipeline);

    let reporter: Box<dyn ProgressReporter> = if args.no_progress {
        Box::new(LogReporter)
    } else {
        Box::new(BarReporter::new())
    };

    tracing::info!(
        input = %args.input_dir.display(),
        output = %args.output_dir.display(),
        timeout_secs = config.pipeline.extract_timeout_secs,
        "Starting docflow"
    );

    let summary = pipeline.run(&args.input_dir, reporter.as_ref()).await?;
    println!("{summary}");

    Ok(())
}
