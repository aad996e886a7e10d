//! Run configuration shared by the library and the CLI.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::nlp::retry::RetryPolicy;

/// Which annotation backend computes sentiment and keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AnnotationMode {
    /// Local lexicon polarity plus noun/adjective keywords.
    #[default]
    Lexical,
    /// Hosted NLP service sentiment label plus key phrases.
    Hosted,
}

/// What to do when a chunk or record cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ErrorPolicy {
    /// Abort the run on the first failure.
    #[default]
    Strict,
    /// Log, skip the failing chunk or record, and continue.
    Lenient,
}

/// Conjunctive row predicate applied after the join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: String,
    pub min_year: i32,
    pub states: HashSet<String>,
}

impl FilterSpec {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        min_year: i32,
        states: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            min_year,
            states: states.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        FilterSpec::new("IHOP", 2015, ["FL", "PA", "LA"])
    }
}

/// Everything a pipeline run needs, independent of how it was parsed.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub review_path: PathBuf,
    pub business_path: PathBuf,
    pub output_path: PathBuf,
    /// Directory for intermediate stage files. Falls back to the system temp dir.
    pub temp_dir: Option<PathBuf>,
    pub filter: FilterSpec,
    pub chunk_size: usize,
    pub mode: AnnotationMode,
    pub policy: ErrorPolicy,
    /// Maximum annotation calls in flight at once.
    pub concurrency: usize,
    pub language_code: String,
    pub retry: RetryPolicy,
    /// Upper bound on the credential probe done before a hosted run.
    pub credential_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            review_path: PathBuf::from("data/raw/yelp_academic_dataset_review.json"),
            business_path: PathBuf::from("data/raw/yelp_academic_dataset_business.json"),
            output_path: PathBuf::from("data/final/yelp_ihop_reviews.csv"),
            temp_dir: None,
            filter: FilterSpec::default(),
            chunk_size: 100_000,
            mode: AnnotationMode::Lexical,
            policy: ErrorPolicy::Strict,
            concurrency: 4,
            language_code: "en".to_string(),
            retry: RetryPolicy::default(),
            credential_timeout: Duration::from_secs(10),
        }
    }
}

impl PipelineConfig {
    /// Rejects settings that would make the run meaningless.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::PipelineError;

        if self.chunk_size == 0 {
            return Err(PipelineError::Config("chunk size must be at least 1".into()));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::Config("concurrency must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(PipelineError::Config("max attempts must be at least 1".into()));
        }
        if self.filter.states.is_empty() {
            return Err(PipelineError::Config("at least one state is required".into()));
        }
        Ok(())
    }

    /// Path of the stage-one (joined and filtered) intermediate file.
    pub fn filtered_path(&self) -> PathBuf {
        let dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        dir.join(format!("review_prep_filtered_{}.csv", std::process::id()))
    }
}
