pub mod classify_reads;
pub mod classify_sequence;

pub use classify_reads::{aggregate, aggregate_parallel, CategoryCollections};
pub use classify_sequence::{classify, is_ambiguous, AMBIGUITY_CODES, KMER_MAX_LENGTH};
