// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod fastq;
pub mod classify;
pub mod unique_kmers;
pub mod export;
pub mod sink;

use std::path::Path;

use crate::classify::{aggregate, aggregate_parallel, CategoryCollections};
use crate::config::{ErrorPolicy, ParserConfig};
use crate::error::Result;
use crate::export::{write_bulk_insert, write_category_csv, write_combined_csv};
use crate::fastq::{parse_sequences, read_fastq_sequences};
use crate::sink::{load_records, LoadReport, RecordSink};
use crate::types::{Classification, ClassifiedSequence};

pub use crate::classify::classify;
pub use crate::error::GeneratorError;
pub use crate::unique_kmers::sample_unique_kmers;

/// Result of parsing and classifying one or more read files.
/// Export text is generated on demand from the collections.
pub struct GenerationResults {
    pub collections: CategoryCollections,
    /// Sequences captured by the parser, dropped ones included.
    pub reads_parsed: usize,
}

impl GenerationResults {
    fn from_sequences<I: IntoIterator<Item = String>>(sequences: I) -> Self {
        let mut reads_parsed = 0;
        let collections = aggregate(sequences.into_iter().inspect(|_| reads_parsed += 1));
        GenerationResults {
            collections,
            reads_parsed,
        }
    }

    /// One category as single-column CSV text.
    pub fn get_category_csv(&self, tag: Classification) -> Result<String> {
        let mut buf = Vec::new();
        write_category_csv(&mut buf, self.collections.list(tag))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// `SEQUENCE,TYPE` CSV text of the unique-key view.
    pub fn get_combined_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        write_combined_csv(&mut buf, &self.collections.records())?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Bulk-insert script for one category.
    pub fn get_bulk_inserts(&self, tag: Classification) -> Result<String> {
        let mut buf = Vec::new();
        write_bulk_insert(&mut buf, tag, self.collections.unique_of(tag))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Insert every category row (duplicates included, DNA then KMER then
    /// QKMER) into `sink` one record at a time.
    pub fn load_into<S>(&self, sink: &mut S, policy: ErrorPolicy) -> Result<LoadReport>
    where
        S: RecordSink + ?Sized,
    {
        let rows: Vec<ClassifiedSequence> = Classification::ALL
            .iter()
            .flat_map(|&tag| {
                self.collections
                    .list(tag)
                    .iter()
                    .map(move |sequence| ClassifiedSequence {
                        sequence: sequence.clone(),
                        tag,
                    })
            })
            .collect();
        load_records(sink, &rows, policy)
    }
}

/// Classify the sequences found in an in-memory record stream.
pub fn generate_from_lines<I>(lines: I, config: &ParserConfig) -> GenerationResults
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    GenerationResults::from_sequences(parse_sequences(lines, config))
}

/// Classify the sequences of several FASTQ files, read in the given order.
pub fn generate_from_files<P: AsRef<Path>>(
    paths: &[P],
    config: &ParserConfig,
) -> Result<GenerationResults> {
    let sequences = read_fastq_sequences(paths, config).collect::<Result<Vec<String>>>()?;
    let reads_parsed = sequences.len();
    log::info!("Parsed {} sequences from {} file(s)", reads_parsed, paths.len());
    Ok(GenerationResults {
        collections: aggregate_parallel(sequences),
        reads_parsed,
    })
}
