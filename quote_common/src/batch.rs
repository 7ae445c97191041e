//! Partitioning of tracked symbols into quote-service batches.
//!
//! The batch endpoint accepts at most [`MAX_BATCH_SIZE`] pair symbols per call,
//! encoded as a JSON array of strings (`["BTCUSDT","ETHUSDT"]`).

use crate::symbol::Symbol;

/// Largest number of symbols sent in one quote-service call.
pub const MAX_BATCH_SIZE: usize = 20;

/// Splits `symbols` into contiguous, in-order batches of at most `size` entries.
///
/// Every symbol appears in exactly one batch; only the last batch may be short.
/// An empty input yields no batches. A `size` of zero is treated as one.
pub fn partition(symbols: &[Symbol], size: usize) -> Vec<&[Symbol]> {
    symbols.chunks(size.max(1)).collect()
}

/// Encodes a batch as the service's `symbols` query value.
pub fn encode_batch_query(batch: &[Symbol], quote: &str) -> String {
    let pairs: Vec<String> = batch.iter().map(|s| s.pair_with(quote)).collect();
    // A Vec<String> always serializes.
    serde_json::to_string(&pairs).unwrap_or_else(|_| String::from("[]"))
}
