//! Markdown and JSON report generation.
//!
//! This module renders the statistics report into a readable Markdown
//! document or pretty-printed JSON.

use crate::models::{ConditionSummary, GroupedStats, Metric, Report, ReportMetadata};
use anyhow::Result;

/// Format a statistic, showing `n/a` for the empty-group sentinel.
fn fmt_stat(value: f64) -> String {
    if value.is_finite() {
        format!("{:.3}", value)
    } else {
        "n/a".to_string()
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Reading Time Summary\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_conditions_section(&report.conditions));
    output.push_str(&generate_grouped_section(
        "By Word Length",
        &report.by_word_length,
    ));
    output.push_str(&generate_grouped_section(
        "By Participant",
        &report.by_participant,
    ));
    output.push_str(&generate_grouped_section("By Adverb", &report.by_adverb));
    output.push_str(&generate_figures_section(&report.figures));

    // Footer
    output.push_str("---\n\n");
    output.push_str(&format!(
        "*Report generated by rt-analyzer v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Results File:** `{}`\n", metadata.data_path));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Trials:** {}\n", metadata.trials));
    section.push_str(&format!("- **Participants:** {}\n", metadata.participants));
    section.push_str(&format!("- **Adverbs:** {}\n", metadata.adverbs));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the per-condition overview.
fn generate_conditions_section(conditions: &[ConditionSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Conditions\n\n");
    section.push_str(
        "| Condition | Trials | adv_RT mean | adv_RT median | sent_RT mean | sent_RT median | Mean of adverb means (adv) | Mean of adverb means (sent) |\n",
    );
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for summary in conditions {
        let overall = &summary.overall;
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            summary.condition,
            overall.count,
            fmt_stat(overall.adv_rt_mean),
            fmt_stat(overall.adv_rt_median),
            fmt_stat(overall.sent_rt_mean),
            fmt_stat(overall.sent_rt_median),
            fmt_stat(summary.adverb_rt_grand_mean),
            fmt_stat(summary.sentence_rt_grand_mean),
        ));
    }
    section.push('\n');

    section
}

/// Generate one section with a summary table per condition.
fn generate_grouped_section(title: &str, grouped: &[GroupedStats]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));

    for stats in grouped {
        section.push_str(&format!("### {}\n\n", stats.condition));

        if stats.summary.is_empty() {
            section.push_str("No trials in this condition.\n\n");
            continue;
        }

        let header = stats.summary.header();
        section.push_str(&format!("| {} | n |\n", header.join(" | ")));
        section.push_str(&format!("|{}:---:|\n", ":---|".repeat(header.len())));

        for row in &stats.summary.rows {
            let stats: Vec<String> = Metric::ALL
                .iter()
                .map(|m| fmt_stat(row.metric(*m)))
                .collect();
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                row.key,
                stats.join(" | "),
                row.count
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the list of rendered figures.
fn generate_figures_section(figures: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Figures\n\n");
    if figures.is_empty() {
        section.push_str("No figures were rendered.\n\n");
        return section;
    }

    for figure in figures {
        section.push_str(&format!("- `{}`\n", figure));
    }
    section.push('\n');

    section
}

/// Generate a JSON report.
///
/// Empty-group statistics (`NaN`) are written as `null`.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, SummaryRow, SummaryTable, Value};
    use chrono::Utc;

    fn summary_row(key: Value, count: usize, base: f64) -> SummaryRow {
        SummaryRow {
            key,
            count,
            adv_rt_mean: base,
            adv_rt_median: base,
            sent_rt_mean: base * 4.0,
            sent_rt_median: base * 4.0,
        }
    }

    fn create_test_report() -> Report {
        let metadata = ReportMetadata {
            data_path: "project/data/dataMM.txt".to_string(),
            analysis_date: Utc::now(),
            trials: 4,
            participants: 2,
            adverbs: 2,
            duration_seconds: 1.5,
        };

        Report {
            metadata,
            conditions: vec![
                ConditionSummary {
                    condition: Condition::Common,
                    overall: summary_row("common".into(), 2, 0.75),
                    adverb_rt_grand_mean: 0.75,
                    sentence_rt_grand_mean: 3.0,
                },
                ConditionSummary {
                    condition: Condition::Rare,
                    overall: SummaryRow::empty("rare".into()),
                    adverb_rt_grand_mean: f64::NAN,
                    sentence_rt_grand_mean: f64::NAN,
                },
            ],
            by_word_length: vec![GroupedStats {
                condition: Condition::Common,
                summary: SummaryTable {
                    column: "word_length".to_string(),
                    rows: vec![summary_row(Value::Int(5), 2, 0.75)],
                },
            }],
            by_participant: vec![],
            by_adverb: vec![GroupedStats {
                condition: Condition::Rare,
                summary: SummaryTable {
                    column: "adv".to_string(),
                    rows: vec![],
                },
            }],
            figures: vec!["mean_RT_word_len.png".to_string()],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Reading Time Summary"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Conditions"));
        assert!(markdown.contains("## By Word Length"));
        assert!(markdown.contains("| word_length | adv_RT_mean | adv_RT_median | sent_RT_mean | sent_RT_median | n |"));
        assert!(markdown.contains("| 5 | 0.750 | 0.750 | 3.000 | 3.000 | 2 |"));
        assert!(markdown.contains("No trials in this condition."));
        assert!(markdown.contains("`mean_RT_word_len.png`"));
    }

    #[test]
    fn test_empty_condition_renders_na() {
        let section = generate_conditions_section(&create_test_report().conditions);
        assert!(section.contains("| Rare | 0 | n/a | n/a | n/a | n/a | n/a | n/a |"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let section = generate_metadata_section(&create_test_report().metadata);

        assert!(section.contains("project/data/dataMM.txt"));
        assert!(section.contains("- **Trials:** 4"));
        assert!(section.contains("- **Participants:** 2"));
    }

    #[test]
    fn test_figures_section_without_figures() {
        assert!(generate_figures_section(&[]).contains("No figures were rendered."));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"by_word_length\""));
        assert!(json.contains("\"condition\": \"common\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["conditions"][1]["overall"]["adv_rt_mean"].is_null());
        assert_eq!(value["by_word_length"][0]["summary"]["rows"][0]["key"], 5);
    }
}
