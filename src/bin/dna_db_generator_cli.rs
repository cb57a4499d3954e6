use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use dna_db_generator::config::GeneratorConfig;
use dna_db_generator::export::{read_sequence_column, write_outputs, write_unique_kmers_csv};
use dna_db_generator::fastq::fastq_files_in;
use dna_db_generator::sink::MemorySink;
use dna_db_generator::types::Classification;
use dna_db_generator::{generate_from_files, sample_unique_kmers, GeneratorError};

#[derive(Parser)]
#[command(name = "dna-db-generator", version, about = "Generate DNA / k-mer / qkmer load files from FASTQ reads")]
struct Cli {
    /// TOML configuration file; command-line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify FASTQ reads and write CSV and SQL insert files
    Classify {
        /// FASTQ files, or directories scanned for *.fastq / *.fq (optionally .gz)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "files/output")]
        output: PathBuf,

        /// Ignore records whose header declares a longer length
        #[arg(long)]
        max_declared_length: Option<usize>,

        /// Also load every category row into an in-memory table with a
        /// unique sequence key, applying the configured error_policy
        #[arg(long)]
        dry_run_load: bool,
    },

    /// Sample unique k-mers from a single-column CSV of DNA sequences
    UniqueKmers {
        /// Input CSV (first column holds the sequences)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV, one k-mer per row
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum number of k-mers to write
        #[arg(long)]
        max_rows: Option<usize>,

        /// Seed for the k-length draws
        #[arg(long)]
        seed: Option<u64>,

        /// The input has no header row
        #[arg(long)]
        no_header: bool,
    },
}

fn spinner(color: &str, msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = format!("{{spinner:.{color}}} {{msg}}");
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&template)
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner
}

fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, GeneratorError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(fastq_files_in(input)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn run_classify(
    config: &GeneratorConfig,
    input: &[PathBuf],
    output: &Path,
    dry_run_load: bool,
) -> Result<(), GeneratorError> {
    let sp = spinner("blue", "Gathering FASTQ files...");
    let files = collect_inputs(input)?;
    sp.finish_with_message(format!("Found {} FASTQ file(s).", files.len()));

    let sp = spinner("green", "Classifying reads...");
    let results = generate_from_files(&files, &config.parser)?;
    let collections = &results.collections;
    sp.finish_with_message(format!(
        "Classified {} reads: {} dna, {} kmer, {} qkmer ({} dropped).",
        results.reads_parsed,
        collections.len_of(Classification::Dna),
        collections.len_of(Classification::Kmer),
        collections.len_of(Classification::Qkmer),
        collections.dropped
    ));

    let sp = spinner("yellow", "Writing output files...");
    let written = write_outputs(output, collections)?;
    sp.finish_with_message(format!(
        "Wrote {} files to {}.",
        written.len(),
        output.display()
    ));

    if dry_run_load {
        let sp = spinner("magenta", "Loading rows into a unique-key table...");
        let mut sink = MemorySink::with_unique_keys();
        let report = results.load_into(&mut sink, config.error_policy)?;
        sp.finish_with_message(format!(
            "Dry-run load: {} inserted, {} rejected ({:?}).",
            report.inserted, report.failed, config.error_policy
        ));
    }
    Ok(())
}

fn run_unique_kmers(
    config: &GeneratorConfig,
    input: &Path,
    output: &Path,
    has_header: bool,
) -> Result<(), GeneratorError> {
    let sp = spinner("blue", "Reading DNA sequences...");
    let reader = File::open(input).map_err(|e| GeneratorError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;
    let corpus = read_sequence_column(reader, has_header)?;
    sp.finish_with_message(format!("Read {} DNA sequences.", corpus.len()));

    let mut sampler = sample_unique_kmers(&corpus, &config.sampling)?;
    let sp = spinner("green", "Sampling unique k-mers...");
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let writer = File::create(output).map_err(|e| GeneratorError::Io {
        path: output.to_path_buf(),
        source: e,
    })?;
    let rows = write_unique_kmers_csv(BufWriter::new(writer), sampler.by_ref())?;
    log::info!(
        "Sampling finished: {} emitted, {} entries skipped, {} duplicate windows",
        rows,
        sampler.skipped_entries(),
        sampler.duplicates_skipped()
    );
    sp.finish_with_message(format!(
        "Unique k-mers saved to {}, {} rows (max {}).",
        output.display(),
        rows,
        config.sampling.max_rows
    ));
    Ok(())
}

fn run(cli: Cli) -> Result<(), GeneratorError> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_toml_file(path)?,
        None => GeneratorConfig::default(),
    };

    match cli.command {
        Command::Classify {
            input,
            output,
            max_declared_length,
            dry_run_load,
        } => {
            if max_declared_length.is_some() {
                config.parser.max_declared_length = max_declared_length;
            }
            run_classify(&config, &input, &output, dry_run_load)
        }
        Command::UniqueKmers {
            input,
            output,
            max_rows,
            seed,
            no_header,
        } => {
            if let Some(max_rows) = max_rows {
                config.sampling.max_rows = max_rows;
            }
            if let Some(seed) = seed {
                config.sampling.seed = seed;
            }
            run_unique_kmers(&config, &input, &output, !no_header)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => {
            let sp = spinner("cyan", "All done!");
            sp.finish_with_message("All done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
