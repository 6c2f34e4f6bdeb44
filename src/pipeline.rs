//! Batch analysis pipeline.
//!
//! Wires the stages together for one batch:
//!
//! ```text
//! lines ──► normalize ──► RawLogInput ──► preprocess ──► propose ──► decide
//! ```
//!
//! Batches are independent; a single `Pipeline` can serve many concurrent
//! analyses since no stage keeps state between calls.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::decision::{Decision, DecisionEngine};
use crate::log_analysis::{
    normalize_lines, LogRecord, LogSummary, MetricSnapshot, Preprocessor, RawLogInput,
};
use crate::observability::time_stage;
use crate::reasoning::{CauseProposer, CauseSuggestions};

/// Everything produced for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: LogSummary,
    pub records: Vec<LogRecord>,
    pub decision: Decision,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    preprocessor: Preprocessor,
    proposer: CauseProposer,
    engine: DecisionEngine,
}

impl Pipeline {
    pub fn new(preprocessor: Preprocessor, proposer: CauseProposer, engine: DecisionEngine) -> Self {
        Self {
            preprocessor,
            proposer,
            engine,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let proposer =
            CauseProposer::from_config(&config.reasoning, config.thresholds.fallback.clone())?;
        Ok(Self::new(
            Preprocessor::new(config.preprocess.window_minutes),
            proposer,
            DecisionEngine::new(config.thresholds.clone()),
        ))
    }

    /// Rules only, never touches the network.
    pub fn offline(config: &Config) -> Self {
        Self::new(
            Preprocessor::new(config.preprocess.window_minutes),
            CauseProposer::offline(config.thresholds.fallback.clone()),
            DecisionEngine::new(config.thresholds.clone()),
        )
    }

    pub fn is_online(&self) -> bool {
        self.proposer.is_online()
    }

    pub async fn analyze_lines(&self, lines: &[String], metrics: &MetricSnapshot) -> AnalysisReport {
        self.analyze_lines_at(lines, metrics, Local::now().naive_local())
            .await
    }

    pub async fn analyze_lines_at(
        &self,
        lines: &[String],
        metrics: &MetricSnapshot,
        now: NaiveDateTime,
    ) -> AnalysisReport {
        let inputs = lines_to_inputs(lines, now);
        self.analyze_inputs_at(&inputs, metrics, now).await
    }

    pub async fn analyze_inputs(
        &self,
        inputs: &[RawLogInput],
        metrics: &MetricSnapshot,
    ) -> AnalysisReport {
        self.analyze_inputs_at(inputs, metrics, Local::now().naive_local())
            .await
    }

    pub async fn analyze_inputs_at(
        &self,
        inputs: &[RawLogInput],
        metrics: &MetricSnapshot,
        now: NaiveDateTime,
    ) -> AnalysisReport {
        let (summary, records) = self.preprocessor.process_at(inputs, now);

        let suggestions =
            time_stage("propose", || self.proposer.propose(&summary, metrics)).await;

        self.finish(summary, records, &suggestions, metrics, now)
    }

    /// Synchronous variant that always uses the fallback rules.
    pub fn analyze_offline(&self, inputs: &[RawLogInput], metrics: &MetricSnapshot) -> AnalysisReport {
        self.analyze_offline_at(inputs, metrics, Local::now().naive_local())
    }

    pub fn analyze_offline_at(
        &self,
        inputs: &[RawLogInput],
        metrics: &MetricSnapshot,
        now: NaiveDateTime,
    ) -> AnalysisReport {
        let (summary, records) = self.preprocessor.process_at(inputs, now);
        let suggestions = self.proposer.fallback(&summary, metrics);
        self.finish(summary, records, &suggestions, metrics, now)
    }

    fn finish(
        &self,
        summary: LogSummary,
        records: Vec<LogRecord>,
        suggestions: &CauseSuggestions,
        metrics: &MetricSnapshot,
        now: NaiveDateTime,
    ) -> AnalysisReport {
        let decision = self.engine.decide_at(suggestions, metrics, &summary, now);
        info!(
            total_logs = summary.total_logs,
            windows = summary.window_count,
            source = ?suggestions.source,
            "Batch analyzed"
        );
        AnalysisReport {
            summary,
            records,
            decision,
        }
    }
}

/// Normalize raw lines into preprocessor inputs, keeping the detected
/// timestamp and severity.
pub fn lines_to_inputs(lines: &[String], now: NaiveDateTime) -> Vec<RawLogInput> {
    normalize_lines(lines.iter().map(String::as_str), now)
        .iter()
        .map(RawLogInput::from)
        .collect()
}
