//src/export.rs

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::classify::CategoryCollections;
use crate::error::{GeneratorError, Result};
use crate::types::{Classification, ClassifiedSequence};

/// Single-column CSV, no header: one sequence per row.
pub fn write_category_csv<W, I, S>(writer: W, sequences: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for seq in sequences {
        wtr.write_record([seq.as_ref()])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Two-column CSV with a `SEQUENCE,TYPE` header.
pub fn write_combined_csv<'a, W, I>(writer: W, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ClassifiedSequence>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["SEQUENCE", "TYPE"])?;
    for rec in records {
        wtr.write_record([rec.sequence.as_str(), rec.tag.as_str()])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Unique k-mers, one per row, no header, in emission order.
pub fn write_unique_kmers_csv<W, I>(writer: W, kmers: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    let mut rows = 0;
    for kmer in kmers {
        wtr.write_record([kmer.as_str()])?;
        rows += 1;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows)
}

/// First column of every row of a CSV, trimmed. Rows with no fields are skipped.
pub fn read_sequence_column<R: Read>(reader: R, has_header: bool) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_reader(reader);

    let mut sequences = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(field) = record.get(0) {
            sequences.push(field.trim().to_string());
        }
    }
    Ok(sequences)
}

/// Quote `value` as an SQL string literal. Embedded single quotes are doubled.
pub fn sql_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' {
            quoted.push('\'');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Write the drop / create / multi-row insert script for one category.
///
/// ```text
/// DROP TABLE IF EXISTS KMERS;
/// CREATE TABLE KMERS (KMER KMER);
/// INSERT INTO KMERS (KMER) VALUES
/// ('ACGT')
/// ,('TTGA')
/// ;
/// ```
///
/// With no sequences, only the drop and create statements are written.
pub fn write_bulk_insert<W, I, S>(mut writer: W, tag: Classification, sequences: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let table = tag.table_name();
    let column = tag.domain_type();
    writeln!(writer, "DROP TABLE IF EXISTS {table};")?;
    writeln!(writer, "CREATE TABLE {table} ({column} {column});")?;

    let mut rows = 0;
    for seq in sequences {
        if rows == 0 {
            writeln!(writer, "INSERT INTO {table} ({column}) VALUES")?;
            writeln!(writer, "({})", sql_quote(seq.as_ref()))?;
        } else {
            writeln!(writer, ",({})", sql_quote(seq.as_ref()))?;
        }
        rows += 1;
    }
    if rows > 0 {
        writeln!(writer, ";")?;
    }
    writer.flush()?;
    Ok(rows)
}

/// File names written by [`write_outputs`].
pub fn category_csv_name(tag: Classification) -> String {
    format!("{}.csv", tag.as_str())
}

pub fn bulk_insert_name(tag: Classification) -> String {
    format!("{}_inserts.sql", tag.as_str())
}

pub const COMBINED_CSV_NAME: &str = "sequences.csv";

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).map_err(|e| GeneratorError::io(path, e))?;
    Ok(BufWriter::new(f))
}

/// Write every export of a classification run into `dir`.
///
/// Category CSVs follow the lists (every encounter); the combined CSV and
/// the insert scripts follow the unique-key view.
pub fn write_outputs<P: AsRef<Path>>(dir: P, collections: &CategoryCollections) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| GeneratorError::io(dir, e))?;
    let mut written = Vec::new();

    for tag in Classification::ALL {
        let path = dir.join(category_csv_name(tag));
        write_category_csv(create_file(&path)?, collections.list(tag))?;
        written.push(path);
    }

    let path = dir.join(COMBINED_CSV_NAME);
    write_combined_csv(create_file(&path)?, &collections.records())?;
    written.push(path);

    for tag in Classification::ALL {
        let path = dir.join(bulk_insert_name(tag));
        let rows = write_bulk_insert(create_file(&path)?, tag, collections.unique_of(tag))
            .map_err(|e| GeneratorError::io(&path, e))?;
        log::info!("Wrote {} {} rows to {}", rows, tag, path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_category_csv_has_no_header() {
        let mut buf = Vec::new();
        write_category_csv(&mut buf, ["ACGT", "TTGA"]).unwrap();
        assert_eq!(to_string(buf), "ACGT\nTTGA\n");
    }

    #[test]
    fn test_combined_csv() {
        let records = vec![
            ClassifiedSequence {
                sequence: "ACGT".to_string(),
                tag: Classification::Kmer,
            },
            ClassifiedSequence {
                sequence: "ACNT".to_string(),
                tag: Classification::Qkmer,
            },
        ];
        let mut buf = Vec::new();
        write_combined_csv(&mut buf, &records).unwrap();
        assert_eq!(to_string(buf), "SEQUENCE,TYPE\nACGT,kmer\nACNT,qkmer\n");
    }

    #[test]
    fn test_read_sequence_column() {
        let data = "SEQUENCE\n ACGT \nTTGA,extra\n";
        let seqs = read_sequence_column(data.as_bytes(), true).unwrap();
        assert_eq!(seqs, vec!["ACGT", "TTGA"]);

        let seqs = read_sequence_column("ACGT\nCC\n".as_bytes(), false).unwrap();
        assert_eq!(seqs, vec!["ACGT", "CC"]);
    }

    #[test]
    fn test_sql_quote_escapes_single_quotes() {
        assert_eq!(sql_quote("ACGT"), "'ACGT'");
        assert_eq!(sql_quote("AC'GT"), "'AC''GT'");
        assert_eq!(sql_quote("'); DROP TABLE DNAS; --"), "'''); DROP TABLE DNAS; --'");
    }

    #[test]
    fn test_bulk_insert_layout() {
        let mut buf = Vec::new();
        let rows = write_bulk_insert(&mut buf, Classification::Kmer, ["ACGT", "TTGA"]).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            to_string(buf),
            "DROP TABLE IF EXISTS KMERS;\n\
             CREATE TABLE KMERS (KMER KMER);\n\
             INSERT INTO KMERS (KMER) VALUES\n\
             ('ACGT')\n\
             ,('TTGA')\n\
             ;\n"
        );
    }

    #[test]
    fn test_bulk_insert_without_rows() {
        let mut buf = Vec::new();
        let rows = write_bulk_insert(&mut buf, Classification::Dna, Vec::<String>::new()).unwrap();
        assert_eq!(rows, 0);
        assert_eq!(
            to_string(buf),
            "DROP TABLE IF EXISTS DNAS;\nCREATE TABLE DNAS (DNA_SEQUENCE DNA_SEQUENCE);\n"
        );
    }
}
