//! Run state threaded through the pipeline stages.
//!
//! [`RunState`] is a typestate: each stage consumes the previous state and
//! returns the next one, and that transition is the only way to write the
//! stage's field. Papers are fixed at discovery, the selection at
//! classification, the analyses after fan-out, and the report at synthesis.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use tracing::{debug, warn};

use preprint_alert_shared::{Analysis, Paper, PaperId, RunId};

// ---------------------------------------------------------------------------
// Stage markers
// ---------------------------------------------------------------------------

mod sealed {
    pub trait Sealed {}
}

/// A pipeline stage marker.
pub trait Stage: sealed::Sealed {}

/// Stages at which the selection is known.
pub trait HasSelection: Stage {}

/// Stages at which every selected paper has an analysis.
pub trait HasAnalyses: HasSelection {}

/// Papers discovered; nothing selected yet.
#[derive(Debug)]
pub struct Discovered;

/// Selection recorded.
#[derive(Debug)]
pub struct Classified;

/// Fan-out finished.
#[derive(Debug)]
pub struct Analyzed;

/// Report written.
#[derive(Debug)]
pub struct Synthesized;

impl sealed::Sealed for Discovered {}
impl sealed::Sealed for Classified {}
impl sealed::Sealed for Analyzed {}
impl sealed::Sealed for Synthesized {}

impl Stage for Discovered {}
impl Stage for Classified {}
impl Stage for Analyzed {}
impl Stage for Synthesized {}

impl HasSelection for Classified {}
impl HasSelection for Analyzed {}
impl HasSelection for Synthesized {}

impl HasAnalyses for Analyzed {}
impl HasAnalyses for Synthesized {}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// State of one run at stage `S`.
#[derive(Debug)]
pub struct RunState<S: Stage> {
    run_id: RunId,
    papers: Vec<Paper>,
    index: HashMap<PaperId, usize>,
    selected_ids: Vec<PaperId>,
    analyses: HashMap<PaperId, Analysis>,
    report: Option<String>,
    _stage: PhantomData<S>,
}

impl<S: Stage> RunState<S> {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Every paper discovered for this run, in feed order.
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn paper(&self, id: &PaperId) -> Option<&Paper> {
        self.index.get(id).map(|&i| &self.papers[i])
    }

    fn advance<T: Stage>(self) -> RunState<T> {
        RunState {
            run_id: self.run_id,
            papers: self.papers,
            index: self.index,
            selected_ids: self.selected_ids,
            analyses: self.analyses,
            report: self.report,
            _stage: PhantomData,
        }
    }
}

impl<S: HasSelection> RunState<S> {
    /// Selected ids in classification order.
    pub fn selected_ids(&self) -> &[PaperId] {
        &self.selected_ids
    }

    /// Selected papers in classification order.
    pub fn selected_papers(&self) -> impl Iterator<Item = &Paper> {
        self.selected_ids.iter().filter_map(|id| self.paper(id))
    }
}

impl<S: HasAnalyses> RunState<S> {
    pub fn analyses(&self) -> &HashMap<PaperId, Analysis> {
        &self.analyses
    }

    pub fn analysis(&self, id: &PaperId) -> Option<&Analysis> {
        self.analyses.get(id)
    }

    /// `(Paper, Analysis)` pairs in classification order, failed items
    /// included.
    pub fn synthesis_input(&self) -> Vec<(&Paper, &Analysis)> {
        self.selected_ids
            .iter()
            .filter_map(|id| Some((self.paper(id)?, self.analyses.get(id)?)))
            .collect()
    }
}

impl RunState<Discovered> {
    /// Start a run from the discovered papers. A paper whose id was already
    /// seen earlier in the feed is dropped.
    pub fn new(run_id: RunId, papers: Vec<Paper>) -> Self {
        let mut index = HashMap::with_capacity(papers.len());
        let mut unique = Vec::with_capacity(papers.len());

        for paper in papers {
            if index.contains_key(&paper.id) {
                debug!(id = %paper.id, "duplicate paper in feed, keeping first");
                continue;
            }
            index.insert(paper.id.clone(), unique.len());
            unique.push(paper);
        }

        Self {
            run_id,
            papers: unique,
            index,
            selected_ids: Vec::new(),
            analyses: HashMap::new(),
            report: None,
            _stage: PhantomData,
        }
    }

    /// Record the classifier's selection.
    ///
    /// Ids not among the discovered papers are removed and returned so the
    /// caller can report them. Repeated ids collapse to their first
    /// occurrence.
    pub fn with_selection(
        mut self,
        ids: impl IntoIterator<Item = PaperId>,
    ) -> (RunState<Classified>, Vec<PaperId>) {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        let mut unknown = Vec::new();

        for id in ids {
            if !self.index.contains_key(&id) {
                unknown.push(id);
            } else if seen.insert(id.clone()) {
                selected.push(id);
            }
        }

        self.selected_ids = selected;
        (self.advance(), unknown)
    }
}

impl RunState<Classified> {
    /// Record the fan-out results.
    ///
    /// Afterwards the analysis keys are exactly the selected ids: results for
    /// unselected ids are discarded and any selected id without a result gets
    /// an `analysis_failed` entry.
    pub fn with_analyses(mut self, mut analyses: HashMap<PaperId, Analysis>) -> RunState<Analyzed> {
        let selected: HashSet<&PaperId> = self.selected_ids.iter().collect();
        analyses.retain(|id, _| {
            let keep = selected.contains(id);
            if !keep {
                warn!(%id, "discarding analysis for unselected paper");
            }
            keep
        });

        for id in &self.selected_ids {
            analyses.entry(id.clone()).or_insert_with(|| {
                warn!(%id, "no analysis recorded for selected paper");
                Analysis::failed(None, "no analysis was produced")
            });
        }

        self.analyses = analyses;
        self.advance()
    }
}

impl RunState<Analyzed> {
    pub fn with_report(mut self, report: String) -> RunState<Synthesized> {
        self.report = Some(report);
        self.advance()
    }
}

impl RunState<Synthesized> {
    pub fn report(&self) -> &str {
        self.report.as_deref().unwrap_or_default()
    }

    pub fn into_report(self) -> String {
        self.report.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use preprint_alert_shared::AnalysisStatus;

    use super::*;

    fn paper(id: &str) -> Paper {
        Paper {
            id: PaperId::new(id),
            title: format!("Paper {id}"),
            authors: vec!["A. Author".into()],
            abstract_text: "Abstract.".into(),
            link: format!("https://arxiv.org/abs/{id}"),
            published: None,
        }
    }

    fn ok_analysis(summary: &str) -> Analysis {
        Analysis {
            summary: summary.into(),
            relevance: "relevant".into(),
            findings: vec![],
            methodology: Some("method".into()),
            status: AnalysisStatus::Ok,
            error: None,
        }
    }

    fn discovered(ids: &[&str]) -> RunState<Discovered> {
        RunState::new(RunId::new(), ids.iter().map(|id| paper(id)).collect())
    }

    #[test]
    fn duplicate_feed_entries_collapse() {
        let state = discovered(&["1", "2", "1"]);
        assert_eq!(state.papers().len(), 2);
        assert!(state.paper(&PaperId::new("1")).is_some());
    }

    #[test]
    fn selection_drops_unknown_and_repeated_ids() {
        let state = discovered(&["1", "2", "3"]);
        let ids = ["3", "x", "1", "3", "y"].map(PaperId::new);

        let (state, unknown) = state.with_selection(ids);

        assert_eq!(state.selected_ids(), &[PaperId::new("3"), PaperId::new("1")]);
        assert_eq!(unknown, vec![PaperId::new("x"), PaperId::new("y")]);
        let titles: Vec<_> = state.selected_papers().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Paper 3", "Paper 1"]);
    }

    #[test]
    fn analyses_keys_match_selection() {
        let (state, _) = discovered(&["1", "2", "3"])
            .with_selection(["2", "1"].map(PaperId::new));

        let mut analyses = HashMap::new();
        analyses.insert(PaperId::new("2"), ok_analysis("two"));
        analyses.insert(PaperId::new("3"), ok_analysis("not selected"));

        let state = state.with_analyses(analyses);

        let mut keys: Vec<_> = state.analyses().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec![PaperId::new("1"), PaperId::new("2")]);
        assert_eq!(
            state.analysis(&PaperId::new("1")).map(|a| a.status),
            Some(AnalysisStatus::AnalysisFailed)
        );
    }

    #[test]
    fn synthesis_input_follows_classification_order() {
        let (state, _) = discovered(&["1", "2", "3"])
            .with_selection(["3", "1"].map(PaperId::new));

        let analyses = HashMap::from([
            (PaperId::new("1"), ok_analysis("one")),
            (PaperId::new("3"), ok_analysis("three")),
        ]);
        let state = state.with_analyses(analyses);

        let order: Vec<_> = state
            .synthesis_input()
            .iter()
            .map(|(p, a)| (p.id.as_str().to_string(), a.summary.clone()))
            .collect();
        assert_eq!(
            order,
            vec![("3".to_string(), "three".to_string()), ("1".to_string(), "one".to_string())]
        );
    }

    #[test]
    fn report_is_set_once_at_synthesis() {
        let (state, _) = discovered(&["1"]).with_selection([PaperId::new("1")]);
        let state = state
            .with_analyses(HashMap::from([(PaperId::new("1"), ok_analysis("one"))]))
            .with_report("# Today\n".into());
        assert_eq!(state.report(), "# Today\n");
        assert_eq!(state.into_report(), "# Today\n");
    }
}
