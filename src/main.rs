//! CLI entry point for the review preparation pipeline.
//!
//! Loads review and business records, joins and filters them, annotates each
//! review with sentiment and keywords, writes the result as CSV and
//! optionally publishes it to S3.

use anyhow::{Context, Result};
use clap::Parser;
use review_prep::annotators::Annotators;
use review_prep::config::{AnnotationMode, ErrorPolicy, FilterSpec, PipelineConfig};
use review_prep::nlp::{ComprehendService, RetryPolicy};
use review_prep::pipeline;
use review_prep::upload::{object_key, upload_file};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "review_prep")]
#[command(about = "Prepare review data: join, filter, and annotate with sentiment and keywords", long_about = None)]
struct Cli {
    /// Path to the line-delimited review records
    #[arg(long)]
    review_file: PathBuf,

    /// Path to the line-delimited business records
    #[arg(long)]
    business_file: PathBuf,

    /// Where to write the annotated CSV
    #[arg(long)]
    output_file: PathBuf,

    /// Business name to keep (exact match)
    #[arg(long, default_value = "IHOP")]
    name: String,

    /// Earliest review year to keep (inclusive)
    #[arg(long, default_value_t = 2015)]
    min_year: i32,

    /// Comma-separated list of states to keep
    #[arg(long, value_delimiter = ',', default_value = "FL,PA,LA")]
    states: Vec<String>,

    /// Review rows held in memory per chunk
    #[arg(long, default_value_t = 100_000)]
    chunk_size: usize,

    /// Annotation backend
    #[arg(long, value_enum, default_value_t = AnnotationMode::Lexical)]
    mode: AnnotationMode,

    /// Abort on the first failure (strict) or skip and continue (lenient)
    #[arg(long, value_enum, default_value_t = ErrorPolicy::Strict)]
    policy: ErrorPolicy,

    /// Maximum annotation calls in flight
    #[arg(short, long, default_value_t = 4)]
    concurrency: usize,

    /// Attempts per hosted call, including the first
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Language code sent to the hosted service
    #[arg(long, default_value = "en")]
    language_code: String,

    /// Directory for intermediate stage files (defaults to the system temp dir)
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Optional: S3 bucket to publish the output to (e.g., "my-bucket")
    #[arg(long)]
    s3_bucket: Option<String>,

    /// Optional: key prefix inside the bucket
    #[arg(long)]
    s3_prefix: Option<String>,

    /// Optional: Gzip compress the CSV before uploading to S3
    #[arg(long, default_value_t = false)]
    gzip: bool,
}

impl Cli {
    fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            review_path: self.review_file.clone(),
            business_path: self.business_file.clone(),
            output_path: self.output_file.clone(),
            temp_dir: self.temp_dir.clone(),
            filter: FilterSpec::new(&self.name, self.min_year, self.states.iter().map(|s| s.trim())),
            chunk_size: self.chunk_size,
            mode: self.mode,
            policy: self.policy,
            concurrency: self.concurrency,
            language_code: self.language_code.clone(),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..RetryPolicy::default()
            },
            ..PipelineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/review_prep.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("review_prep.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = cli.to_config();

    let annotators = match config.mode {
        AnnotationMode::Lexical => Annotators::lexical(),
        AnnotationMode::Hosted => {
            let service = ComprehendService::from_env(config.credential_timeout)
                .await
                .inspect_err(|e| error!(error = %e, "Hosted NLP service unavailable"))
                .context("hosted mode needs a reachable, authenticated Comprehend client")?;
            Annotators::hosted(Arc::new(service), &config.language_code, config.retry.clone())
        }
    };

    let summary = pipeline::run(&config, &annotators)
        .await
        .inspect_err(|e| error!(error = %e, "Review preparation failed"))?;

    if let Some(bucket) = cli.s3_bucket.as_deref() {
        let aws = aws_config::load_from_env().await;
        let s3 = aws_sdk_s3::Client::new(&aws);
        let key = object_key(cli.s3_prefix.as_deref(), &summary.output_path, cli.gzip);

        info!(bucket, key = %key, gzip = cli.gzip, "Uploading output to S3");
        upload_file(&s3, &summary.output_path, bucket, &key, cli.gzip)
            .await
            .inspect_err(|e| {
                error!(
                    error = %e,
                    local = %summary.output_path.display(),
                    "Upload failed; local output is intact"
                )
            })?;
    }

    Ok(())
}
