//! rootcause - log normalization and root-cause analysis for incidents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fmt::Write;

use crate::config::Config;
use crate::decision::rca::{ActionPriority, HealthStatus, ImpactSeverity};
use crate::errors::{InputError, RcaError};
use crate::ingest::{self, validate_metrics};
use crate::log_analysis::{diagnose, MetricSnapshot, ParseReport};
use crate::observability::{init_tracing, init_tracing_verbose, sanitize_for_log};
use crate::pipeline::{AnalysisReport, Pipeline};
use crate::reasoning::SuggestionSource;

#[derive(Parser)]
#[command(name = "rootcause")]
#[command(about = "Normalize production logs and rank the most likely root cause")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Verbose logging to stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a log file (or `-` for stdin) and report the likely root cause
    #[command(alias = "a")]
    Analyze {
        /// Log file, or `-` for stdin
        input: String,

        /// Input is a JSON batch: {"logs": [...], "metrics": {...}}
        #[arg(long)]
        json: bool,

        /// Only analyze the last N lines (or batch entries with --json)
        #[arg(long, value_name = "N")]
        tail: Option<usize>,

        /// CPU usage percent
        #[arg(long, value_name = "PERCENT")]
        cpu: Option<f64>,

        /// Memory usage percent
        #[arg(long, value_name = "PERCENT")]
        memory: Option<f64>,

        /// Database latency in milliseconds
        #[arg(long, value_name = "MS")]
        db_latency: Option<f64>,

        /// Requests per second
        #[arg(long, value_name = "N")]
        rps: Option<i64>,

        /// JSON file with a metrics object
        #[arg(long, value_name = "FILE")]
        metrics: Option<String>,

        /// Skip the external reasoning service
        #[arg(long)]
        offline: bool,

        #[arg(long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Show how each line of a log file is recognised
    Parse {
        /// Log file, or `-` for stdin
        input: String,

        /// Number of lines to check
        #[arg(long, value_name = "N", default_value_t = 20)]
        lines: usize,

        #[arg(long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },

    /// Print the effective configuration (API key redacted)
    Config,
}

/// Metric values given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricOverrides {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub db_latency: Option<f64>,
    pub rps: Option<i64>,
}

impl MetricOverrides {
    pub fn apply(&self, mut metrics: MetricSnapshot) -> MetricSnapshot {
        if let Some(v) = self.cpu {
            metrics.cpu_usage = Some(v);
        }
        if let Some(v) = self.memory {
            metrics.memory_usage = Some(v);
        }
        if let Some(v) = self.db_latency {
            metrics.db_latency = Some(v);
        }
        if let Some(v) = self.rps {
            metrics.requests_per_sec = Some(v);
        }
        metrics
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        init_tracing_verbose();
    } else {
        init_tracing();
    }

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())
        .map_err(|e| RcaError::Config(format!("{:#}", e)))?;

    match cli.command {
        Commands::Analyze {
            input,
            json,
            tail,
            cpu,
            memory,
            db_latency,
            rps,
            metrics,
            offline,
            output_format,
        } => {
            let overrides = MetricOverrides {
                cpu,
                memory,
                db_latency,
                rps,
            };
            let pipeline = if offline {
                Pipeline::offline(&config)
            } else {
                Pipeline::from_config(&config)?
            };

            let report = if json {
                let mut batch = ingest::read_batch(&input)?;
                if let Some(n) = tail {
                    batch = batch.keep_last(n);
                }
                let base = match metrics {
                    Some(path) => read_metrics_file(&path)?,
                    None => batch.metrics,
                };
                let snapshot = overrides.apply(base);
                validate_metrics(&snapshot).map_err(RcaError::from)?;
                pipeline.analyze_inputs(&batch.logs, &snapshot).await
            } else {
                let lines = ingest::read_lines(&input, tail)?;
                let base = match metrics {
                    Some(path) => read_metrics_file(&path)?,
                    None => MetricSnapshot::default(),
                };
                let snapshot = overrides.apply(base);
                validate_metrics(&snapshot).map_err(RcaError::from)?;
                pipeline.analyze_lines(&lines, &snapshot).await
            };

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print!("{}", render_report(&report)),
            }
        }

        Commands::Parse {
            input,
            lines,
            output_format,
        } => {
            let all = ingest::read_lines(&input, None)?;
            let report = diagnose(all.iter().map(String::as_str), lines);
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print!("{}", render_parse_report(&report)),
            }
        }

        Commands::Config => {
            print!("{}", config.to_redacted_toml()?);
        }
    }

    Ok(())
}

fn read_metrics_file(path: &str) -> Result<MetricSnapshot> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| RcaError::Io {
            path: path.into(),
            source,
        })
        .with_context(|| format!("Failed to read metrics file {}", path))?;
    let metrics: MetricSnapshot = serde_json::from_str(&text)
        .map_err(|e| RcaError::from(InputError::InvalidJson(e.to_string())))?;
    Ok(metrics)
}

fn severity_label(severity: ImpactSeverity) -> colored::ColoredString {
    match severity {
        ImpactSeverity::Critical => severity.as_str().red().bold(),
        ImpactSeverity::High => severity.as_str().red(),
        ImpactSeverity::Medium => severity.as_str().yellow(),
        ImpactSeverity::Low => severity.as_str().green(),
    }
}

fn health_label(status: HealthStatus) -> colored::ColoredString {
    match status {
        HealthStatus::Healthy => status.as_str().green(),
        HealthStatus::Warning => status.as_str().yellow(),
        HealthStatus::Critical => status.as_str().red(),
    }
}

fn bullet_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", title.bold());
    for item in items {
        let _ = writeln!(out, "  - {}", sanitize_for_log(item));
    }
}

/// Human-readable rendering of an analysis.
pub fn render_report(report: &AnalysisReport) -> String {
    let decision = &report.decision;
    let rca = &decision.rca;
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{}", decision.summary_line().bold());
    let source = match decision.ai_suggestions.source {
        SuggestionSource::External => "external reasoning",
        SuggestionSource::Fallback => "rule-based fallback",
    };
    let _ = writeln!(out, "{}", format!("Source: {}", source).dimmed());

    let _ = writeln!(out, "\n{}", "Summary".bold());
    let b = &summary.severity_breakdown;
    let _ = writeln!(
        out,
        "  {} logs: {} critical, {} error, {} warning, {} info",
        summary.total_logs, b.critical, b.error, b.warning, b.info
    );
    let _ = writeln!(
        out,
        "  {} unique messages across {} time window(s)",
        summary.unique_messages.len(),
        summary.window_count
    );

    let _ = writeln!(out, "\n{}", "Likely cause".bold());
    let _ = writeln!(
        out,
        "  {} ({:.0}%)",
        sanitize_for_log(&decision.likely_cause).cyan(),
        decision.confidence * 100.0
    );
    if !decision.reasoning.is_empty() {
        let _ = writeln!(out, "  {}", sanitize_for_log(&decision.reasoning));
    }

    if decision.all_causes.len() > 1 {
        let _ = writeln!(out, "\n{}", "Other candidates".bold());
        for cause in decision.all_causes.iter().skip(1) {
            let _ = writeln!(
                out,
                "  - {} ({:.0}%)",
                sanitize_for_log(&cause.cause),
                cause.confidence * 100.0
            );
        }
    }

    let impact = &rca.impact;
    let _ = writeln!(out, "\n{}", "Impact".bold());
    let _ = writeln!(
        out,
        "  Severity: {}  {}",
        severity_label(impact.severity),
        impact.business_impact
    );
    let _ = writeln!(
        out,
        "  Errors: {} ({} critical), error rate {}%, ~{} requests affected",
        impact.total_errors,
        impact.critical_errors,
        impact.error_rate_percentage,
        impact.estimated_affected_requests
    );
    let health = &impact.system_health;
    let _ = writeln!(
        out,
        "  Health: cpu {}, memory {}, db {}",
        health_label(health.cpu),
        health_label(health.memory),
        health_label(health.db)
    );
    let _ = writeln!(
        out,
        "  Timeline: started ~{}, {} min across {} window(s)",
        rca.timeline.estimated_start.format("%Y-%m-%d %H:%M:%S"),
        rca.timeline.duration_minutes,
        rca.timeline.time_windows_affected
    );

    if !decision.correlated_signals.is_empty() {
        let _ = writeln!(out, "\n{}", "Correlated signals".bold());
        for signal in &decision.correlated_signals {
            let _ = writeln!(out, "  - {} [{:?}]", signal.signal, signal.strength);
        }
    }

    let _ = writeln!(out, "\n{}", "Five whys".bold());
    for (i, step) in rca.five_whys.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step.why);
        let _ = writeln!(out, "     {}", step.answer.dimmed());
    }

    if !rca.immediate_actions.is_empty() {
        let _ = writeln!(out, "\n{}", "Immediate actions".bold());
        for action in &rca.immediate_actions {
            let line = action.to_string();
            let line = if action.priority == ActionPriority::Urgent {
                line.red().to_string()
            } else {
                line
            };
            let _ = writeln!(out, "  - {}", line);
        }
    }

    bullet_list(&mut out, "Next steps", &decision.next_steps);
    bullet_list(&mut out, "Contributing factors", &rca.contributing_factors);
    bullet_list(&mut out, "Prevention", &rca.prevention_steps);
    bullet_list(&mut out, "Lessons learned", &rca.lessons_learned);
    out
}

/// Human-readable rendering of a diagnostic parse.
pub fn render_parse_report(report: &ParseReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Parse report".bold());
    let _ = writeln!(
        out,
        "  {} lines checked, {} structured ({}%), {} generic",
        report.lines_checked,
        report.structured,
        report.structured_rate(),
        report.generic
    );
    for (format, count) in &report.by_format {
        let _ = writeln!(out, "  {:<32} {}", format.label(), count);
    }

    for sample in &report.samples {
        let _ = writeln!(
            out,
            "\n{} {}",
            format!("#{}", sample.line_number).bold(),
            sample.format.label().dimmed()
        );
        let _ = writeln!(out, "  original:  {}", sanitize_for_log(&sample.original));
        let _ = writeln!(
            out,
            "  timestamp: {}",
            sample.timestamp.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "  severity:  {}", sample.severity);
        let _ = writeln!(out, "  message:   {}", sanitize_for_log(&sample.message));
    }
    out
}
