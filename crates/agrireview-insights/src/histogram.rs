//! Histogram of the negative-feedback value.

use agrireview_core::{Field, RecordSet};

use crate::tally::{Ranked, Tally};

/// Count every distinct `feedback_neg` value, treating missing as `0`.
/// Not truncated.
pub fn feedback_histogram(set: &RecordSet) -> Ranked<i64> {
    if !set.has_field(Field::FeedbackNeg) {
        return Ranked::empty();
    }

    let tally: Tally<i64> = set
        .records
        .iter()
        .map(|r| r.feedback_neg.unwrap_or(0))
        .collect();
    tally.into_ranked(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrireview_core::{ConversationRecord, FieldSet};

    fn with_feedback(values: &[Option<i64>]) -> RecordSet {
        RecordSet::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| ConversationRecord {
                    feedback_neg: *v,
                    ..ConversationRecord::new(i as i64)
                })
                .collect(),
        )
    }

    #[test]
    fn test_missing_coalesced_to_zero() {
        let ranked = feedback_histogram(&with_feedback(&[Some(1), Some(1), Some(0), None]));
        assert_eq!(ranked.get(&1), Some(2));
        assert_eq!(ranked.get(&0), Some(2));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_keeps_every_distinct_value() {
        let values: Vec<Option<i64>> = (0..30).map(Some).collect();
        assert_eq!(feedback_histogram(&with_feedback(&values)).len(), 30);
    }

    #[test]
    fn test_absent_field_is_empty() {
        let set = RecordSet::with_fields(
            vec![ConversationRecord::new(1)],
            FieldSet::all().without(Field::FeedbackNeg),
        );
        assert!(feedback_histogram(&set).is_empty());
    }
}
