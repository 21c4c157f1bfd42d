use crate::{
    args::abort_clap,
    io::{FromFilename, ReadFileZip, WriteFileZip, check_distinct_files},
    trim::{
        baseline::{BaselineSource, Baselines},
        catalog::AdapterCatalog,
        cds::CdsIndex,
        hits::{AdapterNaming, AlignmentClassifier, DEFAULT_ADAPTER_MARKER, TargetNaming},
        ledger::{LedgerFormat, parse_ledger_format, read_ledger},
        rewrite::{RunMode, TranscriptRewriter},
    },
};
use clap::{Args, error::ErrorKind};
use log::{info, warn};
use std::{
    io::BufReader,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};
use zoe::data::err::ResultWithErrorContext;

#[derive(Args, Debug)]
pub struct TrimAdaptersArgs {
    #[arg(short = 't', long)]
    /// Path to the two-line FASTA of assembled transcripts (.gz accepted).
    /// Each header must carry a 'len=<integer>' marker unless --ledger-in is
    /// given
    pub transcripts: PathBuf,

    #[arg(short = 'a', long)]
    /// Path to the tabular alignments of the transcripts against the adapter
    /// database (.gz accepted)
    pub alignments: PathBuf,

    #[arg(short = 'o', long)]
    /// Output path for the trimmed transcripts. Gzip compressed if it ends in
    /// .gz
    pub output: PathBuf,

    #[arg(short = 'A', long, required = true, num_args = 1..)]
    /// Adapters to trim as 'identifier:length' tokens. Several tokens may be
    /// given in one value, separated by whitespace
    pub adapters: Vec<String>,

    #[arg(short = 'p', long, conflicts_with_all = ["ledger_in", "ledger_out"])]
    /// Path to the peptide FASTA of an ORF caller. Trims that would remove a
    /// whole coding region are vetoed by dropping the transcript
    pub peptides: Option<PathBuf>,

    #[arg(short = 'n', long, default_value = "1")]
    /// Minimum transcript length required after trimming. Shorter transcripts
    /// are filtered from output
    pub min_length: NonZeroUsize,

    #[arg(long, requires = "peptides")]
    /// Also drop transcripts without any predicted coding region
    pub require_protein: bool,

    #[arg(long, requires = "ledger_out")]
    /// Path to the coordinate ledger of a previous round. Transcript
    /// coordinates are inherited from it instead of the headers
    pub ledger_in: Option<PathBuf>,

    #[arg(long)]
    /// Output path for a coordinate ledger. Headers are then written
    /// unchanged and each surviving transcript's coordinates in its original
    /// assembly are recorded here
    pub ledger_out: Option<PathBuf>,

    #[arg(long, value_parser = parse_ledger_format, requires = "ledger_out")]
    /// Template for output ledger records. '{}' takes the next of name,
    /// start, stop, original length, and remainder; '{1}' to '{5}' address
    /// them directly. Defaults to tab-separated fields
    pub ledger_format: Option<LedgerFormat>,

    #[arg(short = 'r', long)]
    /// Extrapolate alignments reaching within 10 bp of the adapter's end to
    /// the full adapter
    pub relaxed: bool,

    #[arg(long, value_enum, default_value = "univec")]
    /// Naming convention of the alignment targets: 'univec' (for example
    /// 'gnl|uv|NGB00360.1:1-61') or 'plain' (the adapter identifier itself)
    pub target_naming: TargetNaming,

    #[arg(long, default_value = DEFAULT_ADAPTER_MARKER)]
    /// Token preceding the adapter identifier in 'univec' target names
    pub adapter_marker: String,

    #[arg(long)]
    /// Output path for a tab-separated table of every transcript's trim
    /// window and fate
    pub trim_table: Option<PathBuf>,
}

/// Ensures no output would overwrite an input or another output.
///
/// ## Errors
///
/// The message names the two options sharing a path.
fn check_trim_adapters_paths(args: &TrimAdaptersArgs) -> Result<(), String> {
    let paths = [
        ("--transcripts", Some(&args.transcripts)),
        ("--alignments", Some(&args.alignments)),
        ("--peptides", args.peptides.as_ref()),
        ("--ledger-in", args.ledger_in.as_ref()),
        ("--output", Some(&args.output)),
        ("--ledger-out", args.ledger_out.as_ref()),
        ("--trim-table", args.trim_table.as_ref()),
    ];

    check_distinct_files(&paths)
}

/// Opens a possibly gzipped input for line-based reading.
fn open_buffered(path: &Path) -> std::io::Result<BufReader<ReadFileZip>> {
    ReadFileZip::from_filename(path).map(BufReader::new)
}

/// Trims adapters from assembled transcripts in three passes: baselines and
/// coding regions are loaded, alignments are folded into trim windows, and the
/// transcripts are rewritten.
///
/// ## Errors
///
/// Any IO error or structural violation in the inputs is propagated with the
/// offending file as context.
pub fn trim_adapters_process(args: TrimAdaptersArgs) -> std::io::Result<()> {
    if let Err(message) = check_trim_adapters_paths(&args) {
        abort_clap(ErrorKind::ArgumentConflict, message, Some("trim"));
    }

    let catalog = AdapterCatalog::from_specs(&args.adapters);
    if catalog.is_empty() {
        warn!("No valid 'identifier:length' adapter tokens were given, so no transcript will be trimmed");
    } else {
        info!("Adapter catalog holds {} adapters", catalog.len());
    }

    let baselines = match &args.ledger_in {
        Some(path) => {
            let ledger = read_ledger(open_buffered(path)?).with_file_context("Failed to read the ledger", path)?;
            Baselines::from_ledger(ledger).with_file_context("Invalid ledger", path)?
        }
        None => Baselines::from_transcripts(open_buffered(&args.transcripts)?)
            .with_file_context("Failed to establish transcript lengths from", &args.transcripts)?,
    };
    info!(
        "Loaded baselines for {n} transcripts from {source}",
        n = baselines.len(),
        source = match baselines.source() {
            BaselineSource::Headers => "transcript headers",
            BaselineSource::Ledger => "the input ledger",
        }
    );

    let mode = if let Some(path) = &args.peptides {
        let index = CdsIndex::from_readable(ReadFileZip::from_filename(path)?)
            .with_file_context("Failed to read the peptide FASTA", path)?;
        info!(
            "Loaded {intervals} coding regions on {transcripts} transcripts ({multi} with competing ORF calls)",
            intervals = index.total_intervals(),
            transcripts = index.transcripts(),
            multi = index.multi_orf_transcripts()
        );
        RunMode::Cds {
            index,
            require_protein: args.require_protein,
        }
    } else if let Some(path) = &args.ledger_out {
        RunMode::Ledger {
            output: WriteFileZip::from_filename(path)?,
            format: args.ledger_format.clone().unwrap_or_default(),
        }
    } else {
        RunMode::Fresh
    };

    let naming = AdapterNaming::new(args.target_naming, &args.adapter_marker);
    let mut classifier = AlignmentClassifier::new(&catalog, &baselines, naming, args.relaxed);
    classifier
        .classify_reader(open_buffered(&args.alignments)?)
        .with_file_context("Failed to classify alignments from", &args.alignments)?;
    let (windows, hit_tallies) = classifier.finish();
    info!("Classified alignments into trim windows for {} transcripts", windows.len());
    hit_tallies.log_summary();

    let table = args.trim_table.as_ref().map(WriteFileZip::from_filename).transpose()?;
    let mut output = WriteFileZip::from_filename(&args.output)?;

    let mut rewriter = TranscriptRewriter::new(&baselines, &windows, args.min_length, mode, table);
    rewriter
        .rewrite(open_buffered(&args.transcripts)?, &mut output)
        .with_file_context("Failed to rewrite transcripts from", &args.transcripts)?;
    let tallies = rewriter.finish()?;
    output.close().with_file_context("Failed to finish writing", &args.output)?;

    tallies.log_summary();
    Ok(())
}
