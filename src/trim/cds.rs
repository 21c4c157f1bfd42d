use crate::{trim::window::TrimWindow, utils::get_hasher};
use foldhash::fast::RandomState;
use log::warn;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read},
};
use zoe::prelude::FastaReader;

/// A predicted coding region: 1-based inclusive bounds in the coordinates of
/// the transcript as read in this round.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CdsInterval {
    pub lo: usize,
    pub hi: usize,
}

/// How a trim window treats a transcript's coding regions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CdsVerdict {
    /// Every coding region survives untouched.
    Intact,
    /// At least one coding region is shortened, but none is lost.
    Cut,
    /// A coding region lies entirely outside the window.
    Destroyed,
}

impl CdsInterval {
    #[inline]
    fn lies_outside(&self, window: TrimWindow) -> bool {
        self.hi < window.keep_lo || self.lo > window.keep_hi
    }

    #[inline]
    fn is_cut_by(&self, window: TrimWindow) -> bool {
        self.lo < window.keep_lo || self.hi > window.keep_hi
    }
}

/// Coding regions per transcript, parsed from the headers of a peptide/CDS
/// FASTA file produced by an ORF caller.
#[derive(Debug, Default)]
pub struct CdsIndex {
    intervals: HashMap<String, Vec<CdsInterval>, RandomState>,
}

impl CdsIndex {
    /// Parses every header of a peptide FASTA file.
    ///
    /// Headers look like `>TranscriptName.OrfNumber ... TranscriptName:lo-hi(strand)`.
    /// The transcript is the first token with its final `.`-suffix removed,
    /// and the interval is the last `lo-hi` found before a parenthesized strand
    /// marker. Headers naming the same transcript add further intervals.
    /// Headers without an interval are skipped with a warning. Sequence lines
    /// are ignored. An empty file yields an empty index.
    ///
    /// ## Errors
    ///
    /// IO errors and malformed FASTA records are propagated.
    pub fn from_readable<R: Read>(inner: R) -> std::io::Result<Self> {
        let mut buffered = BufReader::new(inner);
        loop {
            let buffer = buffered.fill_buf()?;
            if buffer.is_empty() {
                return Ok(Self::default());
            }
            let available = buffer.len();
            let blank = buffer.iter().take_while(|b| b.is_ascii_whitespace()).count();
            buffered.consume(blank);
            if blank < available {
                break;
            }
        }

        let reader = FastaReader::from_bufreader(buffered)?;
        let mut intervals: HashMap<String, Vec<CdsInterval>, RandomState> = HashMap::with_hasher(get_hasher());

        for record in reader {
            let header = record?.name;
            match parse_cds_header(&header) {
                Some((transcript, interval)) => intervals.entry(transcript.to_string()).or_default().push(interval),
                None => warn!("Skipping peptide header without a 'lo-hi(strand)' interval: {header}"),
            }
        }

        for list in intervals.values_mut() {
            list.sort_unstable();
        }

        Ok(Self { intervals })
    }

    /// The coding regions of `transcript`, or an empty slice if it is
    /// presumed proteinless.
    #[inline]
    pub fn intervals(&self, transcript: &str) -> &[CdsInterval] {
        self.intervals.get(transcript).map(Vec::as_slice).unwrap_or_default()
    }

    /// Judges a trim window against the coding regions of `transcript`.
    ///
    /// Returns [`None`] if the transcript has no coding region.
    pub fn verdict(&self, transcript: &str, window: TrimWindow) -> Option<CdsVerdict> {
        let intervals = self.intervals(transcript);
        if intervals.is_empty() {
            None
        } else if intervals.iter().any(|cds| cds.lies_outside(window)) {
            Some(CdsVerdict::Destroyed)
        } else if intervals.iter().any(|cds| cds.is_cut_by(window)) {
            Some(CdsVerdict::Cut)
        } else {
            Some(CdsVerdict::Intact)
        }
    }

    /// The number of transcripts with at least one coding region.
    #[inline]
    pub fn transcripts(&self) -> usize {
        self.intervals.len()
    }

    /// The total number of coding regions.
    #[inline]
    pub fn total_intervals(&self) -> usize {
        self.intervals.values().map(Vec::len).sum()
    }

    /// The number of transcripts with competing ORF calls.
    #[inline]
    pub fn multi_orf_transcripts(&self) -> usize {
        self.intervals.values().filter(|list| list.len() > 1).count()
    }
}

/// Extracts the transcript name and coding interval from a peptide header
/// (without the leading `>`).
fn parse_cds_header(header: &str) -> Option<(&str, CdsInterval)> {
    let mut tokens = header.split_whitespace();
    let id = tokens.next()?;
    let transcript = id.rsplit_once('.').map_or(id, |(name, _)| name);

    let interval = header.split_whitespace().rev().find_map(parse_interval_token)?;
    Some((transcript, interval))
}

/// Parses the `lo-hi` from a token such as `name:101-463(+)`, normalizing
/// reversed bounds from the minus strand.
fn parse_interval_token(token: &str) -> Option<CdsInterval> {
    let (coords, strand) = token.split_once('(')?;
    if !strand.starts_with(['+', '-', '.']) {
        return None;
    }
    let range = coords.rsplit_once(':').map_or(coords, |(_, range)| range);
    let (a, b) = range.split_once('-')?;
    let (a, b) = (a.parse::<usize>().ok()?, b.parse::<usize>().ok()?);

    Some(CdsInterval {
        lo: a.min(b),
        hi: a.max(b),
    })
}
