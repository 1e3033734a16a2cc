use crate::domain::HistoryRecord;

/// Concatenate adapter outputs and order them newest first.
///
/// The sort is stable, so records sharing a timestamp keep adapter order
/// and then their order within the adapter's output.
pub fn merge(streams: Vec<Vec<HistoryRecord>>) -> Vec<HistoryRecord> {
    let mut merged: Vec<HistoryRecord> = streams.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.revision_timestamp.cmp(&a.revision_timestamp));
    merged
}
