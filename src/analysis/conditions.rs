//! Splitting trials into experimental conditions.

use super::aggregator::{aggregate_by_category, group_summary, mean, reorder, subset};
use crate::models::{
    AdverbPair, Condition, ConditionSummary, Metric, SummaryTable, Table, TableError, Value,
};
use tracing::{debug, warn};

/// Column holding the adverb itself.
pub const ADVERB: &str = "adv";

/// Column holding the participant id.
pub const PARTICIPANT: &str = "id";

/// Column holding the adverb length in characters.
pub const WORD_LENGTH: &str = "word_length";

/// Column holding the adverb surprisal in bits.
pub const SURPRISAL: &str = "surprisal";

/// Where conditions are recorded and how they are labelled.
#[derive(Debug, Clone)]
pub struct ConditionSettings {
    pub column: String,
    pub common: String,
    pub rare: String,
}

impl Default for ConditionSettings {
    fn default() -> Self {
        Self {
            column: "category".to_string(),
            common: "common".to_string(),
            rare: "rare".to_string(),
        }
    }
}

impl From<&crate::config::ConditionsConfig> for ConditionSettings {
    fn from(config: &crate::config::ConditionsConfig) -> Self {
        Self {
            column: config.column.clone(),
            common: config.common.clone(),
            rare: config.rare.clone(),
        }
    }
}

impl ConditionSettings {
    fn label(&self, condition: Condition) -> &str {
        match condition {
            Condition::Common => &self.common,
            Condition::Rare => &self.rare,
        }
    }
}

/// The full trial table and its per-condition subsets.
#[derive(Debug, Clone)]
pub struct ConditionTables {
    pub all: Table,
    pub common: Table,
    pub rare: Table,
    pub settings: ConditionSettings,
}

impl ConditionTables {
    /// Split `table` by the condition column.
    pub fn split(table: Table, settings: ConditionSettings) -> Result<Self, TableError> {
        let common = subset(&table, &settings.column, &Value::from(settings.common.as_str()))?;
        let rare = subset(&table, &settings.column, &Value::from(settings.rare.as_str()))?;

        let unassigned = table.len() - common.len() - rare.len();
        if unassigned > 0 {
            warn!(
                "{} trials are neither '{}' nor '{}' and are ignored in condition plots",
                unassigned, settings.common, settings.rare
            );
        }
        debug!(
            "Split {} trials: {} common, {} rare",
            table.len(),
            common.len(),
            rare.len()
        );

        Ok(Self {
            all: table,
            common,
            rare,
            settings,
        })
    }

    pub fn get(&self, condition: Condition) -> &Table {
        match condition {
            Condition::Common => &self.common,
            Condition::Rare => &self.rare,
        }
    }

    /// Per-adverb statistics of one condition, ordered by the adverb pairs.
    ///
    /// Adverbs missing from `pairs` follow the listed ones in sorted order.
    pub fn adverb_summary(
        &self,
        condition: Condition,
        pairs: &[AdverbPair],
    ) -> Result<SummaryTable, TableError> {
        let summary = aggregate_by_category(self.get(condition), ADVERB)?;
        let order: Vec<Value> = pairs
            .iter()
            .map(|pair| Value::from(condition.adverb(pair)))
            .collect();
        Ok(reorder(summary, &order))
    }

    /// Overall and per-adverb grand means of one condition.
    pub fn summarize(
        &self,
        condition: Condition,
        pairs: &[AdverbPair],
    ) -> Result<ConditionSummary, TableError> {
        let label = Value::from(self.settings.label(condition));
        let overall = group_summary(&self.all, &self.settings.column, &label)?;
        let by_adverb = self.adverb_summary(condition, pairs)?;

        Ok(ConditionSummary {
            condition,
            overall,
            adverb_rt_grand_mean: mean(&by_adverb.metric_values(Metric::AdvRtMean))
                .unwrap_or(f64::NAN),
            sentence_rt_grand_mean: mean(&by_adverb.metric_values(Metric::SentRtMean))
                .unwrap_or(f64::NAN),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ADV_RT, SENTENCE_RT};

    fn trial(category: &str, adv: &str, adv_rt: f64, sent_rt: f64) -> Vec<Value> {
        vec![
            category.into(),
            adv.into(),
            Value::Float(adv_rt),
            Value::Float(sent_rt),
        ]
    }

    fn create_conditions() -> ConditionTables {
        let table = Table::with_rows(
            ["category", ADVERB, ADV_RT, SENTENCE_RT],
            vec![
                trial("common", "often", 1.0, 5.0),
                trial("rare", "oft", 2.0, 7.0),
                trial("common", "usually", 3.0, 9.0),
                trial("rare", "ordinarily", 4.0, 11.0),
                trial("common", "often", 2.0, 6.0),
                trial("filler", "never", 9.0, 9.0),
            ],
        )
        .unwrap();
        ConditionTables::split(table, ConditionSettings::default()).unwrap()
    }

    fn pairs() -> Vec<AdverbPair> {
        vec![
            AdverbPair("usually".to_string(), "ordinarily".to_string()),
            AdverbPair("often".to_string(), "oft".to_string()),
        ]
    }

    #[test]
    fn test_split() {
        let conditions = create_conditions();
        assert_eq!(conditions.all.len(), 6);
        assert_eq!(conditions.common.len(), 3);
        assert_eq!(conditions.rare.len(), 2);
    }

    #[test]
    fn test_split_missing_condition_column() {
        let table = Table::with_rows([ADV_RT], vec![vec![Value::Float(1.0)]]).unwrap();
        let err = ConditionTables::split(table, ConditionSettings::default()).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { .. }));
    }

    #[test]
    fn test_adverb_summary_follows_pairs() {
        let conditions = create_conditions();

        let common = conditions
            .adverb_summary(Condition::Common, &pairs())
            .unwrap();
        assert_eq!(
            common.keys(),
            vec![Value::from("usually"), Value::from("often")]
        );

        let rare = conditions.adverb_summary(Condition::Rare, &pairs()).unwrap();
        assert_eq!(
            rare.keys(),
            vec![Value::from("ordinarily"), Value::from("oft")]
        );
    }

    #[test]
    fn test_adverb_summary_without_pairs_is_sorted() {
        let conditions = create_conditions();
        let common = conditions.adverb_summary(Condition::Common, &[]).unwrap();
        assert_eq!(
            common.keys(),
            vec![Value::from("often"), Value::from("usually")]
        );
    }

    #[test]
    fn test_summarize() {
        let conditions = create_conditions();
        let summary = conditions.summarize(Condition::Common, &pairs()).unwrap();

        assert_eq!(summary.overall.count, 3);
        assert_eq!(summary.overall.adv_rt_mean, 2.0);
        // often = 1.5, usually = 3.0
        assert_eq!(summary.adverb_rt_grand_mean, 2.25);
        // often = 5.5, usually = 9.0
        assert_eq!(summary.sentence_rt_grand_mean, 7.25);
    }

    #[test]
    fn test_summarize_empty_condition() {
        let table = Table::with_rows(
            ["category", ADVERB, ADV_RT, SENTENCE_RT],
            vec![trial("common", "often", 1.0, 5.0)],
        )
        .unwrap();
        let conditions = ConditionTables::split(table, ConditionSettings::default()).unwrap();
        let summary = conditions.summarize(Condition::Rare, &[]).unwrap();

        assert!(summary.overall.is_empty());
        assert!(summary.adverb_rt_grand_mean.is_nan());
    }
}
