//! AgriReview Insights: aggregate views over the flagged conversation set.
//!
//! Every call reads the full record set once and recomputes all views from
//! it. Aggregators are plain functions over a [`RecordSet`]; a field missing
//! from the schema yields an empty view rather than an error. Only a failed
//! read of the record set is reported to the caller.

pub mod categorical;
pub mod histogram;
pub mod monthly;
pub mod tally;
pub mod words;

use std::collections::BTreeMap;
use std::time::Instant;

use agrireview_core::{Error, Field, RecordSet, RecordSource, Result};
use serde::Serialize;
use tracing::{debug, warn};

pub use categorical::{top_categories, TOP_CATEGORY_LIMIT, UNKNOWN_CATEGORY};
pub use histogram::feedback_histogram;
pub use monthly::{month_key, monthly_counts, parse_sent_date};
pub use tally::{Ranked, Tally};
pub use words::{tokenize, top_words, STOPWORDS, TOP_WORD_LIMIT};

/// One fully recomputed insights result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsSnapshot {
    pub top_bots: Ranked<String>,
    pub top_subjects: Ranked<String>,
    pub top_crops: Ranked<String>,
    pub feedback_stats: Ranked<i64>,
    pub monthly_counts: BTreeMap<String, u64>,
    pub top_words: Vec<(String, u64)>,
    pub total_conversations: usize,
}

/// Read every record from `source` and compute the snapshot.
///
/// Any failure to read is reported as [`Error::DataUnavailable`].
pub fn compute_insights(source: &dyn RecordSource) -> Result<InsightsSnapshot> {
    let started = Instant::now();
    let set = source.fetch_all_records().map_err(|e| match e {
        Error::DataUnavailable(_) => e,
        other => Error::DataUnavailable(other.to_string()),
    });
    let set = match set {
        Ok(set) => set,
        Err(e) => {
            warn!("Insights unavailable: {}", e);
            return Err(e);
        }
    };

    let snapshot = summarize(&set);
    debug!(
        "Computed insights over {} records in {:?}",
        snapshot.total_conversations,
        started.elapsed()
    );
    Ok(snapshot)
}

/// Compute the snapshot for an already-fetched record set.
pub fn summarize(set: &RecordSet) -> InsightsSnapshot {
    InsightsSnapshot {
        top_bots: top_categories(set, Field::Bot, TOP_CATEGORY_LIMIT),
        top_subjects: top_categories(set, Field::Subject, TOP_CATEGORY_LIMIT),
        top_crops: top_categories(set, Field::Crop, TOP_CATEGORY_LIMIT),
        feedback_stats: feedback_histogram(set),
        monthly_counts: monthly_counts(set),
        top_words: top_words(set, TOP_WORD_LIMIT),
        total_conversations: set.len(),
    }
}
