use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::config::ParserConfig;
use crate::error::{GeneratorError, Result};

const HEADER_MARKER: char = '@';
const LENGTH_KEY: &str = "length=";

/// Where the parser stands between two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Discard lines until an accepted header shows up.
    AwaitingHeader,
    /// The next line, whatever it contains, is the record's sequence.
    AwaitingSequence,
}

/// Returns `true` for lines that open a record: `@...length=...`.
///
/// Note that a quality line starting with `@` and containing `length=`
/// also matches. Records are not counted as four-line blocks, so such a
/// line is taken as the next header.
pub fn is_record_header(line: &str) -> bool {
    line.starts_with(HEADER_MARKER) && line.contains(LENGTH_KEY)
}

/// The integer following the first `length=` of a header.
///
/// Only the run of ASCII digits right after the key is read. An empty
/// run or a value that overflows `usize` yields `None`.
pub fn declared_length(line: &str) -> Option<usize> {
    let start = line.find(LENGTH_KEY)? + LENGTH_KEY.len();
    let rest = &line[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Line-at-a-time state machine that pulls raw sequences out of
/// FASTQ-like text.
#[derive(Debug, Clone)]
pub struct RecordStreamParser {
    state: ParserState,
    config: ParserConfig,
    headers_seen: u64,
    headers_rejected: u64,
}

impl RecordStreamParser {
    pub fn new(config: ParserConfig) -> Self {
        RecordStreamParser {
            state: ParserState::AwaitingHeader,
            config,
            headers_seen: 0,
            headers_rejected: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn headers_seen(&self) -> u64 {
        self.headers_seen
    }

    /// Headers that matched the pattern but failed the declared-length check.
    pub fn headers_rejected(&self) -> u64 {
        self.headers_rejected
    }

    /// Consume one line; returns the captured sequence if this line was one.
    pub fn feed(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match self.state {
            ParserState::AwaitingSequence => {
                self.state = ParserState::AwaitingHeader;
                Some(line.to_string())
            }
            ParserState::AwaitingHeader => {
                if is_record_header(line) {
                    self.headers_seen += 1;
                    if self.accepts_header(line) {
                        self.state = ParserState::AwaitingSequence;
                    } else {
                        self.headers_rejected += 1;
                        log::debug!("Rejected header by declared length: {line}");
                    }
                }
                None
            }
        }
    }

    fn accepts_header(&self, line: &str) -> bool {
        match self.config.max_declared_length {
            None => true,
            Some(max) => matches!(declared_length(line), Some(len) if len <= max),
        }
    }
}

/// Lazy adapter from text lines to raw sequences.
pub struct SequenceStream<I> {
    lines: I,
    parser: RecordStreamParser,
}

impl<I> SequenceStream<I> {
    pub fn parser(&self) -> &RecordStreamParser {
        &self.parser
    }
}

impl<I, S> Iterator for SequenceStream<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        for line in self.lines.by_ref() {
            if let Some(seq) = self.parser.feed(line.as_ref()) {
                return Some(seq);
            }
        }
        None
    }
}

/// Parse an in-memory sequence of lines.
pub fn parse_sequences<I>(lines: I, config: &ParserConfig) -> SequenceStream<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    SequenceStream {
        lines: lines.into_iter(),
        parser: RecordStreamParser::new(config.clone()),
    }
}

/// Open a FASTQ file for line reading, decompressing `.gz` on the fly.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| GeneratorError::io(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

/// Raw sequences of several files, read lazily and concatenated in order.
///
/// Parser state carries over file boundaries, exactly as if the files had
/// been joined into one stream.
pub struct FileSequences {
    paths: std::vec::IntoIter<PathBuf>,
    current: Option<(PathBuf, Lines<Box<dyn BufRead>>)>,
    parser: RecordStreamParser,
}

impl FileSequences {
    pub fn parser(&self) -> &RecordStreamParser {
        &self.parser
    }
}

impl Iterator for FileSequences {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let path = self.paths.next()?;
                log::info!("Reading {}", path.display());
                match open_reader(&path) {
                    Ok(reader) => self.current = Some((path, reader.lines())),
                    Err(e) => return Some(Err(e)),
                }
            }

            let (path, lines) = self.current.as_mut()?;
            match lines.next() {
                Some(Ok(line)) => {
                    if let Some(seq) = self.parser.feed(&line) {
                        return Some(Ok(seq));
                    }
                }
                Some(Err(e)) => {
                    let err = GeneratorError::io(path.clone(), e);
                    self.current = None;
                    return Some(Err(err));
                }
                None => self.current = None,
            }
        }
    }
}

pub fn read_fastq_sequences<P: AsRef<Path>>(paths: &[P], config: &ParserConfig) -> FileSequences {
    FileSequences {
        paths: paths
            .iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect::<Vec<_>>()
            .into_iter(),
        current: None,
        parser: RecordStreamParser::new(config.clone()),
    }
}

/// FASTQ files (`.fastq`, `.fq`, optionally gzipped) directly under `dir`,
/// sorted by file name.
pub fn fastq_files_in<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| GeneratorError::io(dir, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let filename = path.file_name()?.to_string_lossy().to_lowercase();
            let is_fastq = [".fastq", ".fastq.gz", ".fq", ".fq.gz"]
                .iter()
                .any(|ext| filename.ends_with(ext));
            if is_fastq && path.is_file() {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    files.sort();
    Ok(files)
}
