//! Assembling the statistics report from the condition tables.

use crate::analysis::{
    aggregate_by_category, distinct_values, ConditionTables, ADVERB, PARTICIPANT, WORD_LENGTH,
};
use crate::models::{
    AdverbPair, Condition, GroupedStats, Report, ReportMetadata, SummaryTable, TableError,
};
use chrono::Utc;
use std::path::{Path, PathBuf};

fn per_condition<F>(mut stats: F) -> Result<Vec<GroupedStats>, TableError>
where
    F: FnMut(Condition) -> Result<SummaryTable, TableError>,
{
    Condition::ALL
        .iter()
        .map(|&condition| {
            Ok(GroupedStats {
                condition,
                summary: stats(condition)?,
            })
        })
        .collect()
}

/// Build the report for one analysis run.
pub fn build_report(
    conditions: &ConditionTables,
    pairs: &[AdverbPair],
    data_path: &Path,
    figures: &[PathBuf],
    duration_seconds: f64,
) -> Result<Report, TableError> {
    let metadata = ReportMetadata {
        data_path: data_path.display().to_string(),
        analysis_date: Utc::now(),
        trials: conditions.all.len(),
        participants: distinct_values(&conditions.all, PARTICIPANT)?.len(),
        adverbs: distinct_values(&conditions.all, ADVERB)?.len(),
        duration_seconds,
    };

    let summaries = Condition::ALL
        .iter()
        .map(|&condition| conditions.summarize(condition, pairs))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Report {
        metadata,
        conditions: summaries,
        by_word_length: per_condition(|c| {
            aggregate_by_category(conditions.get(c), WORD_LENGTH)
        })?,
        by_participant: per_condition(|c| {
            aggregate_by_category(conditions.get(c), PARTICIPANT)
        })?,
        by_adverb: per_condition(|c| conditions.adverb_summary(c, pairs))?,
        figures: figures
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ConditionSettings;
    use crate::data::load_table;

    fn fixture_conditions() -> ConditionTables {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/dataMM.txt");
        let table = load_table(&path, b'\t').unwrap();
        ConditionTables::split(table, ConditionSettings::default()).unwrap()
    }

    #[test]
    fn test_build_report() {
        let conditions = fixture_conditions();
        let figures = vec![PathBuf::from("figs/mean_RT_word_len.png")];
        let report =
            build_report(&conditions, &[], Path::new("dataMM.txt"), &figures, 0.5).unwrap();

        assert_eq!(report.metadata.trials, 24);
        assert_eq!(report.metadata.participants, 3);
        assert_eq!(report.metadata.adverbs, 8);
        assert_eq!(report.conditions.len(), 2);
        assert_eq!(report.conditions[0].condition, Condition::Common);
        assert_eq!(report.conditions[0].overall.count, 12);
        assert_eq!(report.by_adverb[1].summary.len(), 4);
        assert_eq!(report.by_participant[0].summary.len(), 3);
        assert_eq!(report.figures, vec!["mean_RT_word_len.png"]);
    }

    #[test]
    fn test_word_length_groups_partition_condition() {
        let conditions = fixture_conditions();
        let report = build_report(&conditions, &[], Path::new("x"), &[], 0.0).unwrap();

        for grouped in &report.by_word_length {
            let total: usize = grouped.summary.rows.iter().map(|r| r.count).sum();
            assert_eq!(total, conditions.get(grouped.condition).len());
        }
    }
}
