use crate::trim::{hits::HitClass, window::TrimWindow};
use log::{info, warn};

/// Trimmed transcripts shorter than this are tallied as short.
pub const SHORT_TRANSCRIPT: usize = 200;
/// Trims removing more than this many bases are tallied as large.
pub const LARGE_TRIM: usize = 100;

/// Counters from folding the alignment file into trim windows.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct HitTallies {
    pub records:            usize,
    pub unknown_adapter:    usize,
    pub unknown_transcript: usize,
    pub five_prime:         usize,
    pub three_prime:        usize,
    pub internal:           usize,
    pub ignored:            usize,
    pub extrapolated:       usize,
}

impl HitTallies {
    #[inline]
    pub fn count(&mut self, class: HitClass) {
        match class {
            HitClass::FivePrime => self.five_prime += 1,
            HitClass::ThreePrime => self.three_prime += 1,
            HitClass::Internal { .. } => self.internal += 1,
            HitClass::Ignored => self.ignored += 1,
        }
    }

    /// Logs the counters at `info`, warning if any hit named a transcript that
    /// was never loaded.
    pub fn log_summary(&self) {
        info!(
            "Alignment records: {records} ({unknown} against uncataloged adapters)",
            records = self.records,
            unknown = self.unknown_adapter
        );
        info!(
            "Hit classes: {five} 5', {three} 3', {internal} internal, {ignored} ignored; {extrapolated} extrapolated",
            five = self.five_prime,
            three = self.three_prime,
            internal = self.internal,
            ignored = self.ignored,
            extrapolated = self.extrapolated
        );
        if self.unknown_transcript > 0 {
            warn!(
                "{n} alignment records named transcripts absent from the transcript set and were skipped",
                n = self.unknown_transcript
            );
        }
    }
}

/// Why a transcript was left out of the output.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DropCause {
    TooShort,
    CdsViolated,
    Proteinless,
}

/// Counters from rewriting the transcript file.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct RewriteTallies {
    pub read:             usize,
    pub written:          usize,
    pub too_short:        usize,
    pub cds_violated:     usize,
    pub proteinless:      usize,
    pub trimmed:          usize,
    pub five_prime_only:  usize,
    pub three_prime_only: usize,
    pub both_ends:        usize,
    pub cds_cut:          usize,
    pub short:            usize,
    pub large_trim:       usize,
}

impl RewriteTallies {
    #[inline]
    pub fn dropped(&self) -> usize {
        self.too_short + self.cds_violated + self.proteinless
    }

    #[inline]
    pub fn count_drop(&mut self, cause: DropCause) {
        match cause {
            DropCause::TooShort => self.too_short += 1,
            DropCause::CdsViolated => self.cds_violated += 1,
            DropCause::Proteinless => self.proteinless += 1,
        }
    }

    /// Tallies a transcript of `current_length` bases written through
    /// `window`.
    pub fn count_written(&mut self, window: TrimWindow, current_length: usize) {
        self.written += 1;

        let new_length = window.len();
        match (window.trims_5prime(), window.trims_3prime(current_length)) {
            (true, true) => self.both_ends += 1,
            (true, false) => self.five_prime_only += 1,
            (false, true) => self.three_prime_only += 1,
            (false, false) => return,
        }

        self.trimmed += 1;
        if new_length < SHORT_TRANSCRIPT {
            self.short += 1;
        }
        if current_length.saturating_sub(new_length) > LARGE_TRIM {
            self.large_trim += 1;
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Transcripts read: {read}, written: {written}, dropped: {dropped} ({short} too short, {cds} CDS violated, {proteinless} proteinless)",
            read = self.read,
            written = self.written,
            dropped = self.dropped(),
            short = self.too_short,
            cds = self.cds_violated,
            proteinless = self.proteinless
        );
        info!(
            "Transcripts trimmed: {trimmed} ({five} 5' only, {three} 3' only, {both} both ends)",
            trimmed = self.trimmed,
            five = self.five_prime_only,
            three = self.three_prime_only,
            both = self.both_ends
        );
        info!(
            "Trimmed below {SHORT_TRANSCRIPT} bp: {short}; trimmed by more than {LARGE_TRIM} bp: {large}; CDS cut: {cut}",
            short = self.short,
            large = self.large_trim,
            cut = self.cds_cut
        );
    }
}
