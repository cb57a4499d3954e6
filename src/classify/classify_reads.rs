use indexmap::IndexMap;
use rayon::prelude::*;

use super::classify_sequence::classify;
use crate::types::{Classification, ClassifiedSequence};

/// Per-category groupings of a classification run.
///
/// Two views are kept side by side:
/// - the category lists, where every encounter is appended (duplicates
///   included) in encounter order;
/// - the combined map, keyed by sequence. A repeated sequence overwrites
///   its entry in place and keeps the position of its first occurrence.
///   The lists are never retracted.
#[derive(Debug, Default, Clone)]
pub struct CategoryCollections {
    pub dna: Vec<String>,
    pub kmer: Vec<String>,
    pub qkmer: Vec<String>,
    pub combined: IndexMap<String, Classification>,
    /// Ambiguous sequences too long to be a query k-mer.
    pub dropped: u64,
}

impl CategoryCollections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `seq` and file it. Returns the tag, or `None` if dropped.
    pub fn push(&mut self, seq: String) -> Option<Classification> {
        let tag = classify(&seq);
        self.insert(seq, tag);
        tag
    }

    fn insert(&mut self, seq: String, tag: Option<Classification>) {
        let Some(tag) = tag else {
            self.dropped += 1;
            log::debug!("Dropped ambiguous sequence of length {}", seq.len());
            return;
        };
        self.combined.insert(seq.clone(), tag);
        self.list_mut(tag).push(seq);
    }

    pub fn list(&self, tag: Classification) -> &[String] {
        match tag {
            Classification::Dna => &self.dna,
            Classification::Kmer => &self.kmer,
            Classification::Qkmer => &self.qkmer,
        }
    }

    fn list_mut(&mut self, tag: Classification) -> &mut Vec<String> {
        match tag {
            Classification::Dna => &mut self.dna,
            Classification::Kmer => &mut self.kmer,
            Classification::Qkmer => &mut self.qkmer,
        }
    }

    pub fn len_of(&self, tag: Classification) -> usize {
        self.list(tag).len()
    }

    /// Sequences of the combined view carrying `tag`, in key order.
    pub fn unique_of(&self, tag: Classification) -> impl Iterator<Item = &str> + '_ {
        self.combined
            .iter()
            .filter(move |(_, t)| **t == tag)
            .map(|(seq, _)| seq.as_str())
    }

    /// The combined view as structured records.
    pub fn records(&self) -> Vec<ClassifiedSequence> {
        self.combined
            .iter()
            .map(|(sequence, &tag)| ClassifiedSequence {
                sequence: sequence.clone(),
                tag,
            })
            .collect()
    }
}

impl Extend<String> for CategoryCollections {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        for seq in iter {
            self.push(seq);
        }
    }
}

/// Sequential classification of a stream of raw sequences.
pub fn aggregate<I>(sequences: I) -> CategoryCollections
where
    I: IntoIterator<Item = String>,
{
    let mut collections = CategoryCollections::new();
    collections.extend(sequences);
    log_summary(&collections);
    collections
}

/// Classify on the rayon pool, then file the results sequentially.
///
/// Produces the same collections as [`aggregate`]: the parallel step only
/// computes tags, and `collect` keeps input order.
pub fn aggregate_parallel(sequences: Vec<String>) -> CategoryCollections {
    let tags: Vec<Option<Classification>> = sequences
        .par_iter()
        .map(|seq| classify(seq))
        .collect();

    let mut collections = CategoryCollections::new();
    for (seq, tag) in sequences.into_iter().zip(tags) {
        collections.insert(seq, tag);
    }
    log_summary(&collections);
    collections
}

fn log_summary(collections: &CategoryCollections) {
    log::info!(
        "Classified sequences: {} dna, {} kmer, {} qkmer, {} unique, {} dropped",
        collections.dna.len(),
        collections.kmer.len(),
        collections.qkmer.len(),
        collections.combined.len(),
        collections.dropped
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_categories_in_encounter_order() {
        let long_dna = "A".repeat(33);
        let long_ambiguous = format!("{}N", "A".repeat(39));
        let input = vec![
            "ACGT".to_string(),
            long_dna.clone(),
            "ACNT".to_string(),
            long_ambiguous.clone(),
            "TTTT".to_string(),
        ];
        let c = aggregate(input);

        assert_eq!(c.kmer, strings(&["ACGT", "TTTT"]));
        assert_eq!(c.dna, vec![long_dna]);
        assert_eq!(c.qkmer, strings(&["ACNT"]));
        assert_eq!(c.dropped, 1);
        assert!(!c.combined.contains_key(&long_ambiguous));
        assert_eq!(c.combined.len(), 4);
    }

    #[test]
    fn test_duplicates_appended_to_list_but_unique_in_map() {
        let c = aggregate(strings(&["ACGT", "GGRC", "ACGT", "CCCC"]));
        assert_eq!(c.kmer, strings(&["ACGT", "ACGT", "CCCC"]));
        let keys: Vec<&str> = c.combined.keys().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["ACGT", "GGRC", "CCCC"]);
        let unique: Vec<&str> = c.unique_of(Classification::Kmer).collect();
        assert_eq!(unique, vec!["ACGT", "CCCC"]);
    }

    #[test]
    fn test_records_follow_combined_view() {
        let c = aggregate(strings(&["GGRC", "ACGT"]));
        assert_eq!(
            c.records(),
            vec![
                ClassifiedSequence {
                    sequence: "GGRC".to_string(),
                    tag: Classification::Qkmer
                },
                ClassifiedSequence {
                    sequence: "ACGT".to_string(),
                    tag: Classification::Kmer
                },
            ]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let input: Vec<String> = (0..500)
            .map(|i| match i % 4 {
                0 => "ACGT".repeat(i % 12 + 1),
                1 => format!("{}R", "C".repeat(i % 40)),
                2 => "T".repeat(i % 50),
                _ => format!("G{i}"),
            })
            .collect();

        let seq = aggregate(input.clone());
        let par = aggregate_parallel(input);
        assert_eq!(seq.dna, par.dna);
        assert_eq!(seq.kmer, par.kmer);
        assert_eq!(seq.qkmer, par.qkmer);
        assert_eq!(seq.combined, par.combined);
        assert_eq!(seq.dropped, par.dropped);
    }
}
