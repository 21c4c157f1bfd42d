use crate::trim::{
    baseline::Baselines,
    cds::{CdsIndex, CdsVerdict},
    ledger::LedgerFormat,
    report::{DropCause, RewriteTallies},
    transcripts::{TranscriptReader, TranscriptRecord, with_declared_length},
    window::{TrimWindow, TrimWindows},
};
use std::{
    io::{BufRead, Error as IOError, ErrorKind, Write},
    num::NonZeroUsize,
};

/// The mutually exclusive ways a round can treat its transcripts, fixed once
/// at startup.
pub enum RunMode<L> {
    /// Headers carry the coordinate truth, so their `len=` value is rewritten.
    Fresh,
    /// As [`RunMode::Fresh`], but trims that would lose an annotated coding
    /// region are vetoed.
    Cds {
        index:           CdsIndex,
        /// Also drop transcripts without any coding region.
        require_protein: bool,
    },
    /// Headers pass through untouched and a ledger records each surviving
    /// transcript's coordinates in its original assembly.
    Ledger { output: L, format: LedgerFormat },
}

/// The fate of one transcript.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TrimStatus {
    Untrimmed,
    Trimmed,
    Dropped(DropCause),
}

impl TrimStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TrimStatus::Untrimmed => "untrimmed",
            TrimStatus::Trimmed => "trimmed",
            TrimStatus::Dropped(DropCause::TooShort) => "too_short",
            TrimStatus::Dropped(DropCause::CdsViolated) => "cds_violated",
            TrimStatus::Dropped(DropCause::Proteinless) => "proteinless",
        }
    }
}

/// The header row of the per-transcript decision table.
pub const TRIM_TABLE_HEADER: &str = "name\tcurrent_length\tkeep_lo\tkeep_hi\tnew_length\tstatus";

/// Streams the transcript file a second time, applying each transcript's
/// final trim window.
///
/// `L` receives the ledger in [`RunMode::Ledger`], and `T` the optional
/// decision table.
pub struct TranscriptRewriter<'r, L, T> {
    baselines:  &'r Baselines,
    windows:    &'r TrimWindows,
    min_length: NonZeroUsize,
    mode:       RunMode<L>,
    table:      Option<T>,
    tallies:    RewriteTallies,
}

impl<'r, L: Write, T: Write> TranscriptRewriter<'r, L, T> {
    pub fn new(
        baselines: &'r Baselines, windows: &'r TrimWindows, min_length: NonZeroUsize, mode: RunMode<L>, table: Option<T>,
    ) -> Self {
        Self {
            baselines,
            windows,
            min_length,
            mode,
            table,
            tallies: RewriteTallies::default(),
        }
    }

    /// Writes every surviving transcript of `reader` to `writer`, trimmed to
    /// its window. In ledger mode, the inherited comment lines are written to
    /// the ledger before any record.
    ///
    /// ## Errors
    ///
    /// IO errors and malformed records are propagated. A transcript without a
    /// baseline, or whose sequence line does not match its current length, is
    /// an error.
    pub fn rewrite<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> std::io::Result<()> {
        if let RunMode::Ledger { output, .. } = &mut self.mode {
            for comment in self.baselines.comments() {
                writeln!(output, "{comment}")?;
            }
        }
        if let Some(table) = &mut self.table {
            writeln!(table, "{TRIM_TABLE_HEADER}")?;
        }

        for record in TranscriptReader::new(reader) {
            self.rewrite_record(&record?, writer)?;
        }
        Ok(())
    }

    fn rewrite_record<W: Write>(&mut self, record: &TranscriptRecord, writer: &mut W) -> std::io::Result<()> {
        let name = record.name();
        let baselines = self.baselines;
        let Some(baseline) = baselines.get(name) else {
            return Err(IOError::new(
                ErrorKind::InvalidData,
                format!(
                    "Transcript '{name}' (line {line}) has no coordinate baseline. Does the ledger belong to this transcript file?",
                    line = record.line
                ),
            ));
        };
        let current_length = baseline.current_length();
        record.check_length(current_length)?;
        self.tallies.read += 1;

        let window = self.windows.window(name, current_length);
        let status = self.judge(name, window, current_length);
        self.write_table_row(name, window, current_length, status)?;

        if let TrimStatus::Dropped(cause) = status {
            self.tallies.count_drop(cause);
            return Ok(());
        }

        match &mut self.mode {
            RunMode::Ledger { output, format } => {
                writeln!(writer, "{}", record.header)?;
                format.write_record(output, &baseline.ledger_record(name, window))?;
            }
            RunMode::Fresh | RunMode::Cds { .. } => {
                writeln!(writer, "{}", with_declared_length(&record.header, window.len()))?;
            }
        }
        writer.write_all(&record.sequence.as_bytes()[window.keep_lo - 1..window.keep_hi])?;
        writeln!(writer)?;

        self.tallies.count_written(window, current_length);
        Ok(())
    }

    /// Applies the length and coding-region policies to a window. A kept
    /// window is always non-empty and within `1..=current_length`.
    fn judge(&mut self, name: &str, window: TrimWindow, current_length: usize) -> TrimStatus {
        if window.len() < self.min_length.get() {
            return TrimStatus::Dropped(DropCause::TooShort);
        }

        if let RunMode::Cds { index, require_protein } = &self.mode {
            match index.verdict(name, window) {
                Some(CdsVerdict::Destroyed) => return TrimStatus::Dropped(DropCause::CdsViolated),
                Some(CdsVerdict::Cut) => self.tallies.cds_cut += 1,
                Some(CdsVerdict::Intact) => {}
                None if *require_protein => return TrimStatus::Dropped(DropCause::Proteinless),
                None => {}
            }
        }

        if window == TrimWindow::full(current_length) {
            TrimStatus::Untrimmed
        } else {
            TrimStatus::Trimmed
        }
    }

    fn write_table_row(
        &mut self, name: &str, window: TrimWindow, current_length: usize, status: TrimStatus,
    ) -> std::io::Result<()> {
        if let Some(table) = &mut self.table {
            writeln!(
                table,
                "{name}\t{current_length}\t{lo}\t{hi}\t{new_length}\t{status}",
                lo = window.keep_lo,
                hi = window.keep_hi,
                new_length = window.len(),
                status = status.as_str()
            )?;
        }
        Ok(())
    }

    /// Flushes the ledger and decision table, returning the counters.
    ///
    /// ## Errors
    ///
    /// Flush failures are propagated.
    pub fn finish(mut self) -> std::io::Result<RewriteTallies> {
        if let RunMode::Ledger { output, .. } = &mut self.mode {
            output.flush()?;
        }
        if let Some(table) = &mut self.table {
            table.flush()?;
        }
        Ok(self.tallies)
    }
}
