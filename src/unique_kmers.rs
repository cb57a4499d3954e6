//src/unique_kmers.rs

use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SamplingParameters;
use crate::error::Result;

/// Every contiguous window of `k` characters of `seq`, left to right.
///
/// Yields `len - k + 1` windows, or none if `k == 0` or `k > len`.
pub fn sliding_window(seq: &str, k: usize) -> impl Iterator<Item = &str> + '_ {
    let bounds = char_bounds(seq);
    let count = if k == 0 || k >= bounds.len() {
        0
    } else {
        bounds.len() - k
    };
    (0..count).map(move |i| &seq[bounds[i]..bounds[i + k]])
}

/// Byte offset of every char, plus the end of the string.
fn char_bounds(seq: &str) -> Vec<usize> {
    seq.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(seq.len()))
        .collect()
}

/// Windows of the corpus entry currently being sampled.
struct EntryWindows {
    entry: String,
    bounds: Vec<usize>,
    k: usize,
    pos: usize,
}

impl EntryWindows {
    fn new(entry: String, k: usize) -> Self {
        let bounds = char_bounds(&entry);
        EntryWindows {
            entry,
            bounds,
            k,
            pos: 0,
        }
    }

    fn next_kmer(&mut self) -> Option<&str> {
        if self.pos + self.k >= self.bounds.len() {
            return None;
        }
        let kmer = &self.entry[self.bounds[self.pos]..self.bounds[self.pos + self.k]];
        self.pos += 1;
        Some(kmer)
    }
}

/// Lazy sampler of globally unique k-mers over a DNA corpus.
///
/// For each accepted entry a single `k` is drawn from
/// `[1, min(max_k, len)]`; its windows are emitted unless already seen
/// anywhere earlier in the run. Iteration ends for good once `max_rows`
/// k-mers have been emitted.
pub struct UniqueKmerSampler<I, R> {
    corpus: I,
    rng: R,
    params: SamplingParameters,
    seen: AHashSet<String>,
    current: Option<EntryWindows>,
    emitted: usize,
    skipped_entries: u64,
    duplicates_skipped: u64,
}

impl<I, R> UniqueKmerSampler<I, R> {
    /// Fails if `params` does not pass [`SamplingParameters::validate`].
    pub fn new<C>(corpus: C, params: SamplingParameters, rng: R) -> Result<Self>
    where
        C: IntoIterator<IntoIter = I>,
    {
        params.validate()?;
        Ok(UniqueKmerSampler {
            corpus: corpus.into_iter(),
            rng,
            params,
            seen: AHashSet::new(),
            current: None,
            emitted: 0,
            skipped_entries: 0,
            duplicates_skipped: 0,
        })
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Corpus entries skipped for falling outside the length window.
    pub fn skipped_entries(&self) -> u64 {
        self.skipped_entries
    }

    pub fn duplicates_skipped(&self) -> u64 {
        self.duplicates_skipped
    }
}

impl<I, S, R> Iterator for UniqueKmerSampler<I, R>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
    R: Rng,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.emitted >= self.params.max_rows {
            return None;
        }

        loop {
            if let Some(windows) = self.current.as_mut() {
                while let Some(kmer) = windows.next_kmer() {
                    if self.seen.contains(kmer) {
                        self.duplicates_skipped += 1;
                        continue;
                    }
                    let kmer = kmer.to_string();
                    self.seen.insert(kmer.clone());
                    self.emitted += 1;
                    return Some(kmer);
                }
                self.current = None;
            }

            let entry = self.corpus.next()?;
            let entry = entry.as_ref();
            let len = entry.chars().count();
            if !self.params.accepts_length(len) {
                self.skipped_entries += 1;
                log::warn!("Skipping invalid DNA sequence: {entry}");
                continue;
            }

            let k = self.rng.gen_range(1..=self.params.max_k.min(len));
            self.current = Some(EntryWindows::new(entry.to_string(), k));
        }
    }
}

/// Sampler seeded from `params.seed`.
pub fn sample_unique_kmers<C>(
    corpus: C,
    params: &SamplingParameters,
) -> Result<UniqueKmerSampler<C::IntoIter, StdRng>>
where
    C: IntoIterator,
{
    let rng = StdRng::seed_from_u64(params.seed);
    UniqueKmerSampler::new(corpus, params.clone(), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(max_rows: usize, seed: u64) -> SamplingParameters {
        SamplingParameters {
            max_rows,
            seed,
            ..SamplingParameters::default()
        }
    }

    #[test]
    fn test_sliding_window() {
        let windows: Vec<&str> = sliding_window("ACGTA", 3).collect();
        assert_eq!(windows, vec!["ACG", "CGT", "GTA"]);
        assert_eq!(sliding_window("ACGT", 4).count(), 1);
        assert_eq!(sliding_window("ACGT", 5).count(), 0);
        assert_eq!(sliding_window("ACGT", 0).count(), 0);
    }

    #[test]
    fn test_small_corpus_with_cap() {
        for seed in 0..20 {
            let kmers: Vec<String> = sample_unique_kmers(["ACGTACGT"], &params(3, seed))
                .unwrap()
                .collect();
            assert!(!kmers.is_empty() && kmers.len() <= 3);

            let k = kmers[0].len();
            assert!((1..=8).contains(&k));
            assert!(kmers.iter().all(|s| s.len() == k));

            // First distinct windows, in order.
            let mut expected: Vec<&str> = Vec::new();
            for w in sliding_window("ACGTACGT", k) {
                if !expected.contains(&w) {
                    expected.push(w);
                }
            }
            expected.truncate(3);
            assert_eq!(kmers, expected);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let corpus = vec!["ACGTTGCAAGT", "TTGACCATGCATGCAA", "GGGCCCAAATTT"];
        let a: Vec<String> = sample_unique_kmers(&corpus, &params(100, 42)).unwrap().collect();
        let b: Vec<String> = sample_unique_kmers(&corpus, &params(100, 42)).unwrap().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_entries_are_skipped() {
        let long = "A".repeat(101);
        let corpus = vec![String::new(), long, "C".to_string()];
        let mut sampler = sample_unique_kmers(corpus, &params(10, 1)).unwrap();
        let kmers: Vec<String> = sampler.by_ref().collect();
        assert_eq!(kmers, vec!["C"]);
        assert_eq!(sampler.skipped_entries(), 2);
    }

    #[test]
    fn test_uniqueness_is_global_across_entries() {
        // k is always 1 here, so the second entry adds nothing new.
        let corpus = vec!["A", "A", "C"];
        let mut sampler = sample_unique_kmers(&corpus, &params(10, 3)).unwrap();
        let kmers: Vec<String> = sampler.by_ref().collect();
        assert_eq!(kmers, vec!["A", "C"]);
        assert_eq!(sampler.duplicates_skipped(), 1);
    }

    #[test]
    fn test_cap_stops_the_whole_run() {
        let corpus = vec!["A", "C", "G", "T"];
        let mut sampler = sample_unique_kmers(&corpus, &params(2, 0)).unwrap();
        assert_eq!(sampler.next().as_deref(), Some("A"));
        assert_eq!(sampler.next().as_deref(), Some("C"));
        assert_eq!(sampler.next(), None);
        assert_eq!(sampler.next(), None);
        assert_eq!(sampler.emitted(), 2);

        assert_eq!(sample_unique_kmers(&corpus, &params(0, 0)).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_parameters_are_rejected_before_sampling() {
        let zero_k = SamplingParameters {
            max_k: 0,
            ..SamplingParameters::default()
        };
        assert!(sample_unique_kmers(["ACGT"], &zero_k).is_err());

        let zero_min = SamplingParameters {
            min_sequence_length: 0,
            ..SamplingParameters::default()
        };
        assert!(sample_unique_kmers([""], &zero_min).is_err());

        let inverted = SamplingParameters {
            min_sequence_length: 10,
            max_sequence_length: 5,
            ..SamplingParameters::default()
        };
        let rng = StdRng::seed_from_u64(0);
        assert!(UniqueKmerSampler::new(["ACGTACGTACGT"], inverted, rng).is_err());
    }

    proptest! {
        #[test]
        fn prop_sampler_output_is_capped_unique_and_drawn_from_corpus(
            corpus in prop::collection::vec("[ACGT]{0,120}", 0..12),
            max_rows in 0usize..200,
            seed in any::<u64>(),
        ) {
            let kmers: Vec<String> = sample_unique_kmers(&corpus, &params(max_rows, seed))
                .unwrap()
                .collect();
            prop_assert!(kmers.len() <= max_rows);

            let unique: AHashSet<&String> = kmers.iter().collect();
            prop_assert_eq!(unique.len(), kmers.len());

            for kmer in &kmers {
                let from_valid_entry = corpus.iter().any(|entry| {
                    (1..=100).contains(&entry.len())
                        && kmer.len() <= entry.len().min(32)
                        && entry.contains(kmer.as_str())
                });
                prop_assert!(from_valid_entry, "{} not drawn from an accepted entry", kmer);
            }
        }
    }
}
