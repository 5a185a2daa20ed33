//! Top-N counts over a categorical field (`bot`, `subject`, `crop`).

use agrireview_core::{Field, RecordSet};
use tracing::debug;

use crate::tally::{Ranked, Tally};

/// Category used for records with no value.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Number of categories kept per field. The tail is dropped, with no "other" bucket.
pub const TOP_CATEGORY_LIMIT: usize = 20;

/// Count each distinct value of `field` and keep the `limit` most common.
///
/// Absent values count as [`UNKNOWN_CATEGORY`]. Returns an empty ranking when
/// the field does not exist in the record set's schema.
pub fn top_categories(set: &RecordSet, field: Field, limit: usize) -> Ranked<String> {
    if !set.has_field(field) {
        debug!("Field {} absent from schema, skipping category counts", field);
        return Ranked::empty();
    }

    let tally: Tally<String> = set
        .records
        .iter()
        .map(|r| r.category(field).unwrap_or(UNKNOWN_CATEGORY).to_string())
        .collect();
    tally.into_ranked(Some(limit))
}
