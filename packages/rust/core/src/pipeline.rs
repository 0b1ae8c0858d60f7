//! End-to-end run: discover → classify → analyze (fan-out) → synthesize.
//!
//! Only discovery, classification and synthesis can fail a run. Each selected
//! paper is fetched and analyzed in its own task; whatever happens to that
//! task ends up as a status-tagged [`Analysis`] for its paper.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{Instrument, info, info_span, instrument, warn};

use preprint_alert_llm::LlmClient;
use preprint_alert_shared::{
    Analysis, AnalysisError, AnalysisStatus, ContentFetcher, FeedSource, Paper, PaperId,
    PipelineConfig, PipelineError, RunId,
};

use crate::stages::{InterestClassifier, PaperAnalyzer, ReportSynthesizer};
use crate::state::{Analyzed, Classified, Discovered, RunState, Synthesized};

/// Report written when there is nothing to report on.
pub const EMPTY_REPORT: &str = "# No interesting papers found today\n\nCheck back tomorrow!\n";

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a run produced the empty report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The feed had no papers.
    NoPapers,
    /// The classifier selected nothing.
    NoneSelected,
}

impl EmptyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPapers => "no papers in today's feed",
            Self::NoneSelected => "no papers matched the interests",
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Report {
        text: String,
        selected: usize,
        analyzed_ok: usize,
        fetch_failed: usize,
        analysis_failed: usize,
    },
    Empty {
        reason: EmptyReason,
    },
}

impl RunOutcome {
    /// The Markdown document to publish for this run.
    pub fn report_text(&self) -> &str {
        match self {
            Self::Report { text, .. } => text,
            Self::Empty { .. } => EMPTY_REPORT,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    fn from_state(state: RunState<Synthesized>) -> Self {
        let count = |status| {
            state
                .analyses()
                .values()
                .filter(|a| a.status == status)
                .count()
        };
        let selected = state.selected_ids().len();
        let analyzed_ok = count(AnalysisStatus::Ok);
        let fetch_failed = count(AnalysisStatus::FetchFailed);
        let analysis_failed = count(AnalysisStatus::AnalysisFailed);

        Self::Report {
            text: state.into_report(),
            selected,
            analyzed_ok,
            fetch_failed,
            analysis_failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each selected paper's analysis is collected.
    fn item_done(&self, id: &PaperId, status: AnalysisStatus, current: usize, total: usize);
    /// Called when the run completes successfully.
    fn done(&self, outcome: &RunOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_done(&self, _id: &PaperId, _status: AnalysisStatus, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &RunOutcome) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Tunables for [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Free-text interest profile shared by all model prompts.
    pub interests: String,
    /// Maximum number of papers fetched and analyzed at once.
    pub concurrency: usize,
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            interests: config.interests.clone(),
            concurrency: config.concurrency,
        }
    }
}

/// Failure of one item task, folded into an `analysis_failed` entry.
#[derive(Debug, thiserror::Error)]
enum ItemError {
    #[error("{source}")]
    Analysis {
        source: AnalysisError,
        methodology: Option<String>,
    },

    #[error("item task failed: {0}")]
    Task(String),
}

pub struct Pipeline {
    feed: Arc<dyn FeedSource>,
    fetcher: Arc<dyn ContentFetcher>,
    classifier: InterestClassifier,
    analyzer: Arc<PaperAnalyzer>,
    synthesizer: ReportSynthesizer,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        fetcher: Arc<dyn ContentFetcher>,
        llm: Arc<dyn LlmClient>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            feed,
            fetcher,
            classifier: InterestClassifier::new(Arc::clone(&llm), options.interests.clone()),
            analyzer: Arc::new(PaperAnalyzer::new(Arc::clone(&llm), options.interests.clone())),
            synthesizer: ReportSynthesizer::new(llm, options.interests),
            concurrency: options.concurrency.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    /// Run all stages once.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunOutcome, PipelineError> {
        self.run_as(RunId::new(), progress).await
    }

    #[instrument(skip_all, fields(run_id = %run_id))]
    async fn run_as(
        &self,
        run_id: RunId,
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutcome, PipelineError> {
        info!("starting run");

        progress.phase("Fetching today's papers");
        let state = self.discover(run_id).await?;
        if state.papers().is_empty() {
            info!("feed is empty, nothing to classify");
            return Ok(finish(EmptyReason::NoPapers, progress));
        }

        progress.phase("Selecting interesting papers");
        let state = self.classify(state).await?;
        if state.selected_ids().is_empty() {
            info!("no papers selected");
            return Ok(finish(EmptyReason::NoneSelected, progress));
        }

        progress.phase("Analyzing papers");
        let state = self.analyze_all(state, progress).await;

        progress.phase("Writing report");
        let state = self.synthesize(state).await?;

        let outcome = RunOutcome::from_state(state);
        if let RunOutcome::Report {
            selected,
            analyzed_ok,
            fetch_failed,
            analysis_failed,
            ..
        } = &outcome
        {
            info!(
                selected,
                analyzed_ok, fetch_failed, analysis_failed, "run complete"
            );
        }
        progress.done(&outcome);
        Ok(outcome)
    }

    /// Discovery stage: read the feed once.
    pub async fn discover(&self, run_id: RunId) -> Result<RunState<Discovered>, PipelineError> {
        let papers = self
            .feed
            .fetch_today()
            .await
            .map_err(PipelineError::Discovery)?;
        info!(papers = papers.len(), "papers discovered");
        Ok(RunState::new(run_id, papers))
    }

    /// Classification stage: one classifier call over every paper.
    pub async fn classify(
        &self,
        state: RunState<Discovered>,
    ) -> Result<RunState<Classified>, PipelineError> {
        let ids = self.classifier.classify(state.papers()).await?;
        let (state, unknown) = state.with_selection(ids);

        for id in &unknown {
            warn!(%id, "classifier returned an id not in today's feed, dropping");
        }
        info!(selected = state.selected_ids().len(), "papers selected");
        Ok(state)
    }

    /// Analysis stage: fetch and analyze every selected paper concurrently.
    /// Never fails; each paper gets an analysis.
    pub async fn analyze_all(
        &self,
        state: RunState<Classified>,
        progress: &dyn ProgressReporter,
    ) -> RunState<Analyzed> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let total = state.selected_ids().len();
        let run_id = state.run_id();
        let mut handles = Vec::with_capacity(total);

        for paper in state.selected_papers() {
            let paper = paper.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let analyzer = Arc::clone(&self.analyzer);
            let sem = Arc::clone(&semaphore);
            let span = info_span!("item", run_id = %run_id, id = %paper.id);

            let id = paper.id.clone();
            let handle = tokio::spawn(
                async move {
                    let Ok(_permit) = sem.acquire_owned().await else {
                        return Err(ItemError::Task("concurrency limiter closed".into()));
                    };
                    process_item(fetcher.as_ref(), &analyzer, &paper).await
                }
                .instrument(span),
            );
            handles.push((id, handle));
        }

        let mut analyses = HashMap::with_capacity(total);
        for (current, (id, handle)) in handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ItemError::Task(e.to_string())),
            };
            let analysis = fold_item(&id, result);
            progress.item_done(&id, analysis.status, current + 1, total);
            analyses.insert(id, analysis);
        }

        state.with_analyses(analyses)
    }

    /// Synthesis stage: one report over every selected paper, failed ones
    /// included.
    pub async fn synthesize(
        &self,
        state: RunState<Analyzed>,
    ) -> Result<RunState<Synthesized>, PipelineError> {
        let report = self
            .synthesizer
            .synthesize(&state.synthesis_input())
            .await?;
        Ok(state.with_report(report))
    }
}

fn finish(reason: EmptyReason, progress: &dyn ProgressReporter) -> RunOutcome {
    let outcome = RunOutcome::Empty { reason };
    progress.done(&outcome);
    outcome
}

/// Fetch extended content, then analyze. A failed fetch downgrades the
/// analysis to abstract-only instead of failing the item.
async fn process_item(
    fetcher: &dyn ContentFetcher,
    analyzer: &PaperAnalyzer,
    paper: &Paper,
) -> Result<Analysis, ItemError> {
    let (methodology, fetch_error) = match fetcher.fetch(&paper.id).await {
        Ok(content) => (Some(content.methodology), None),
        Err(e) => {
            warn!(error = %e, "content fetch failed, analyzing abstract only");
            (None, Some(e.to_string()))
        }
    };

    let result = analyzer.analyze(paper, methodology.as_deref()).await;
    let mut analysis = match result {
        Ok(analysis) => analysis,
        Err(source) => return Err(ItemError::Analysis { source, methodology }),
    };

    if let Some(error) = fetch_error {
        analysis.status = AnalysisStatus::FetchFailed;
        analysis.methodology = None;
        analysis.error = Some(error);
    }
    Ok(analysis)
}

fn fold_item(id: &PaperId, result: Result<Analysis, ItemError>) -> Analysis {
    match result {
        Ok(analysis) => analysis,
        Err(ItemError::Analysis {
            source,
            methodology,
        }) => {
            warn!(%id, error = %source, "analysis failed");
            Analysis::failed(methodology, source.to_string())
        }
        Err(e @ ItemError::Task(_)) => {
            warn!(%id, error = %e, "item task did not complete");
            Analysis::failed(None, e.to_string())
        }
    }
}
