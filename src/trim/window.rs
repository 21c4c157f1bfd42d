use crate::utils::get_hasher;
use foldhash::fast::RandomState;
use std::collections::HashMap;

/// The region of a transcript that survives trimming, as 1-based inclusive
/// coordinates relative to the transcript as read in this round.
///
/// `keep_lo` only ever grows and `keep_hi` only ever shrinks, so folding hits
/// in any order yields the same window. Nothing prevents `keep_lo` from
/// passing `keep_hi`; such a window has a length of zero.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct TrimWindow {
    pub keep_lo: usize,
    pub keep_hi: usize,
}

impl TrimWindow {
    /// The untrimmed window covering a transcript of `current_length` bases.
    #[inline]
    pub fn full(current_length: usize) -> Self {
        Self {
            keep_lo: 1,
            keep_hi: current_length,
        }
    }

    /// Raises `keep_lo` to `candidate` if that is more conservative.
    #[inline]
    pub fn raise_lo(&mut self, candidate: usize) {
        self.keep_lo = self.keep_lo.max(candidate);
    }

    /// Lowers `keep_hi` to `candidate` if that is more conservative.
    #[inline]
    pub fn lower_hi(&mut self, candidate: usize) {
        self.keep_hi = self.keep_hi.min(candidate);
    }

    /// The number of bases kept, or zero for an inverted window.
    #[inline]
    pub fn len(&self) -> usize {
        (self.keep_hi + 1).saturating_sub(self.keep_lo)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any bases were removed from the 5' end.
    #[inline]
    pub fn trims_5prime(&self) -> bool {
        self.keep_lo > 1
    }

    /// Whether any bases were removed from the 3' end of a transcript of
    /// `current_length` bases.
    #[inline]
    pub fn trims_3prime(&self, current_length: usize) -> bool {
        self.keep_hi < current_length
    }
}

/// A single trim implied by one classified hit.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TrimEdit {
    /// Keep nothing before this 1-based position.
    KeepFrom(usize),
    /// Keep nothing after this 1-based position.
    KeepTo(usize),
}

/// Accumulated trim windows for every transcript that received at least one
/// actionable hit.
#[derive(Debug)]
pub struct TrimWindows {
    windows: HashMap<String, TrimWindow, RandomState>,
}

impl TrimWindows {
    pub fn new() -> Self {
        Self {
            windows: HashMap::with_hasher(get_hasher()),
        }
    }

    /// Folds `edit` into the window for `name`, creating the full window for a
    /// transcript of `current_length` bases on first use.
    pub fn apply(&mut self, name: &str, current_length: usize, edit: TrimEdit) {
        let window = self
            .windows
            .entry(name.to_string())
            .or_insert_with(|| TrimWindow::full(current_length));

        match edit {
            TrimEdit::KeepFrom(lo) => window.raise_lo(lo),
            TrimEdit::KeepTo(hi) => window.lower_hi(hi),
        }
    }

    /// The final window for `name`, defaulting to the full transcript.
    #[inline]
    pub fn window(&self, name: &str, current_length: usize) -> TrimWindow {
        self.windows
            .get(name)
            .copied()
            .unwrap_or_else(|| TrimWindow::full(current_length))
    }

    /// The number of transcripts with at least one actionable hit.
    #[inline]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for TrimWindows {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
