use crate::{
    trim::{
        ledger::{Ledger, LedgerRecord},
        transcripts::TranscriptReader,
        window::TrimWindow,
    },
    utils::get_hasher,
};
use foldhash::fast::RandomState;
use std::{
    collections::{HashMap, hash_map::Entry},
    io::{BufRead, Error as IOError, ErrorKind},
};

/// Where a transcript stands going into this round, in the coordinates of its
/// originally assembled sequence.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TranscriptBaseline {
    /// The length as first assembled. This never changes across rounds.
    pub original_length: usize,
    pub current_start:   usize,
    pub current_stop:    usize,
    /// Trailing annotation inherited from a previous ledger.
    pub remainder:       String,
}

impl TranscriptBaseline {
    /// The baseline of a transcript that has never been trimmed.
    #[inline]
    pub fn fresh(original_length: usize) -> Self {
        Self {
            original_length,
            current_start: 1,
            current_stop: original_length,
            remainder: String::new(),
        }
    }

    /// The length of the transcript as read in this round.
    #[inline]
    pub fn current_length(&self) -> usize {
        self.current_stop + 1 - self.current_start
    }

    /// Composes a window relative to the current sequence with the current
    /// absolute window, giving the new bounds in original coordinates.
    ///
    /// The window should be non-empty.
    #[inline]
    pub fn compose(&self, window: TrimWindow) -> (usize, usize) {
        (
            self.current_start + window.keep_lo - 1,
            self.current_start + window.keep_hi - 1,
        )
    }

    /// The ledger record describing transcript `name` after `window` is
    /// applied.
    pub fn ledger_record(&self, name: &str, window: TrimWindow) -> LedgerRecord {
        let (start, stop) = self.compose(window);
        LedgerRecord {
            name: name.to_string(),
            start,
            stop,
            original_length: self.original_length,
            remainder: self.remainder.clone(),
        }
    }
}

impl From<LedgerRecord> for TranscriptBaseline {
    #[inline]
    fn from(record: LedgerRecord) -> Self {
        Self {
            original_length: record.original_length,
            current_start:   record.start,
            current_stop:    record.stop,
            remainder:       record.remainder,
        }
    }
}

/// How the baselines were established, which decides how the sequence file
/// is validated when it is rewritten.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BaselineSource {
    /// Lengths were declared by the `len=` marker of each header.
    Headers,
    /// Coordinates were inherited from a previous round's ledger.
    Ledger,
}

/// The baseline of every transcript in this round, keyed by name.
#[derive(Debug)]
pub struct Baselines {
    entries:  HashMap<String, TranscriptBaseline, RandomState>,
    comments: Vec<String>,
    source:   BaselineSource,
}

impl Baselines {
    /// Establishes fresh baselines from a two-line FASTA file, checking each
    /// declared length against the sequence line that follows it.
    ///
    /// ## Errors
    ///
    /// IO errors and malformed records are propagated. A header without a
    /// length marker, a declared length that differs from the sequence, or a
    /// repeated transcript name is an error.
    pub fn from_transcripts<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut entries = HashMap::with_hasher(get_hasher());

        for record in TranscriptReader::new(reader) {
            let record = record?;
            let declared = record.declared_length()?;
            record.check_length(declared)?;

            if declared == 0 {
                return Err(IOError::new(
                    ErrorKind::InvalidData,
                    format!("Transcript '{}' (line {}) is empty", record.name(), record.line),
                ));
            }

            insert_unique(&mut entries, record.name(), TranscriptBaseline::fresh(declared))?;
        }

        Ok(Self {
            entries,
            comments: Vec::new(),
            source: BaselineSource::Headers,
        })
    }

    /// Inherits baselines from a previous round's ledger, keeping its comment
    /// lines for the next ledger.
    ///
    /// ## Errors
    ///
    /// A transcript named by more than one record is an error.
    pub fn from_ledger(ledger: Ledger) -> std::io::Result<Self> {
        let Ledger { comments, records } = ledger;
        let mut entries = HashMap::with_capacity_and_hasher(records.len(), get_hasher());

        for mut record in records {
            let name = std::mem::take(&mut record.name);
            insert_unique(&mut entries, &name, record.into())?;
        }

        Ok(Self {
            entries,
            comments,
            source: BaselineSource::Ledger,
        })
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&TranscriptBaseline> {
        self.entries.get(name)
    }

    /// Comment lines inherited from the input ledger, if any.
    #[inline]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    #[inline]
    pub fn source(&self) -> BaselineSource {
        self.source
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn insert_unique(
    entries: &mut HashMap<String, TranscriptBaseline, RandomState>, name: &str, baseline: TranscriptBaseline,
) -> std::io::Result<()> {
    match entries.entry(name.to_string()) {
        Entry::Occupied(_) => Err(IOError::new(
            ErrorKind::InvalidData,
            format!("Transcript '{name}' is listed more than once"),
        )),
        Entry::Vacant(slot) => {
            slot.insert(baseline);
            Ok(())
        }
    }
}
