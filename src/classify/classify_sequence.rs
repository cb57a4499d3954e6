use crate::types::Classification;

/// Longest sequence that still counts as a k-mer (or query k-mer).
pub const KMER_MAX_LENGTH: usize = 32;

/// Ambiguity codes that turn a short sequence into a query k-mer.
pub const AMBIGUITY_CODES: [char; 3] = ['R', 'N', 'Y'];

/// Returns `true` if any of `R`, `N` or `Y` appears in `seq`.
///
/// Case-sensitive and purely textual: other IUPAC codes and unexpected
/// characters are not looked at.
#[inline]
pub fn is_ambiguous(seq: &str) -> bool {
    seq.contains(&AMBIGUITY_CODES[..])
}

/// Assign a category to one raw sequence.
///
/// `None` means the sequence has no destination: it is ambiguous and
/// longer than [`KMER_MAX_LENGTH`].
pub fn classify(seq: &str) -> Option<Classification> {
    let len = seq.chars().count();
    let short = len <= KMER_MAX_LENGTH;

    match (is_ambiguous(seq), short) {
        (true, true) => Some(Classification::Qkmer),
        (true, false) => None,
        (false, true) => Some(Classification::Kmer),
        (false, false) => Some(Classification::Dna),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_length_boundary() {
        assert_eq!(
            classify("ACGTACGTACGTACGTACGTACGTACGTACGT"),
            Some(Classification::Kmer)
        );
        assert_eq!(
            classify("ACGTACGTACGTACGTACGTACGTACGTACGTA"),
            Some(Classification::Dna)
        );
    }

    #[test]
    fn test_ambiguity_codes() {
        assert_eq!(classify("ACGTRCGT"), Some(Classification::Qkmer));
        assert_eq!(classify("NNNN"), Some(Classification::Qkmer));
        assert_eq!(classify("ACGY"), Some(Classification::Qkmer));
        // Position of the code does not matter.
        assert_eq!(classify("RACG"), Some(Classification::Qkmer));

        let long_n = format!("{}N{}", "A".repeat(20), "C".repeat(19));
        assert_eq!(long_n.len(), 40);
        assert_eq!(classify(&long_n), None);
    }

    #[test]
    fn test_lowercase_and_other_codes_are_not_ambiguous() {
        assert_eq!(classify("acgtn"), Some(Classification::Kmer));
        assert_eq!(classify("ACGTW"), Some(Classification::Kmer));
    }

    #[test]
    fn test_empty_sequence_is_a_kmer() {
        assert_eq!(classify(""), Some(Classification::Kmer));
    }

    proptest! {
        #[test]
        fn prop_unambiguous(seq in "[ACGT]{0,80}") {
            let expected = if seq.len() <= 32 { Classification::Kmer } else { Classification::Dna };
            prop_assert_eq!(classify(&seq), Some(expected));
        }

        #[test]
        fn prop_ambiguous(prefix in "[ACGT]{0,40}", code in "[RNY]", suffix in "[ACGTRNY]{0,40}") {
            let seq = format!("{prefix}{code}{suffix}");
            let expected = if seq.len() <= 32 { Some(Classification::Qkmer) } else { None };
            prop_assert_eq!(classify(&seq), expected);
        }

        #[test]
        fn prop_classify_is_deterministic(seq in "[ACGTRNY]{0,64}") {
            prop_assert_eq!(classify(&seq), classify(&seq));
        }
    }
}
