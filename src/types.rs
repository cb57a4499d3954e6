//src/types.rs

use std::fmt;
use std::str::FromStr;

/// The destination category of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Classification {
    /// Full-length sequence, longer than 32 bases, no ambiguity codes.
    Dna,
    /// Short sequence (<= 32), no ambiguity codes.
    Kmer,
    /// Short sequence (<= 32) carrying at least one ambiguity code.
    Qkmer,
}

impl Classification {
    /// Export order used by every multi-category output.
    pub const ALL: [Classification; 3] =
        [Classification::Dna, Classification::Kmer, Classification::Qkmer];

    /// Value of the `TYPE` column in the combined export.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Dna => "dna",
            Classification::Kmer => "kmer",
            Classification::Qkmer => "qkmer",
        }
    }

    /// Database domain type, also used as the column name.
    pub fn domain_type(&self) -> &'static str {
        match self {
            Classification::Dna => "DNA_SEQUENCE",
            Classification::Kmer => "KMER",
            Classification::Qkmer => "QKMER",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            Classification::Dna => "DNAS",
            Classification::Kmer => "KMERS",
            Classification::Qkmer => "QKMERS",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dna" => Ok(Classification::Dna),
            "kmer" => Ok(Classification::Kmer),
            "qkmer" => Ok(Classification::Qkmer),
            other => Err(format!("unknown sequence type '{other}'")),
        }
    }
}

/// A sequence paired with the tag computed from its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedSequence {
    pub sequence: String,
    pub tag: Classification,
}
