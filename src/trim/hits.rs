use crate::trim::{
    baseline::Baselines,
    catalog::AdapterCatalog,
    report::HitTallies,
    window::{TrimEdit, TrimWindows},
};
use clap::{ValueEnum, builder::PossibleValue};
use std::io::{BufRead, Error as IOError, ErrorKind};

/// How close (in bases) an alignment must come to either transcript end to be
/// trimmed as a terminal adapter.
pub const END_TOLERANCE: usize = 15;
/// How close an alignment must come to the adapter's far end to count as a
/// complete match when it sits away from both transcript ends.
pub const INTERNAL_TOLERANCE: usize = 2;
/// How close an alignment must come to the adapter's far end for relaxed mode
/// to extrapolate the rest of the adapter.
pub const RELAXED_TOLERANCE: usize = 10;

/// The fields of a tabular alignment record that are required: transcript,
/// target, identity, length, mismatches, gaps, and four coordinates.
const REQUIRED_FIELDS: usize = 10;
/// The default token preceding adapter identifiers in UniVec target names.
pub const DEFAULT_ADAPTER_MARKER: &str = "uv";

/// Extracts an adapter identifier from the composite target name reported by
/// the alignment tool.
pub trait ParseAdapterId {
    /// Returns the adapter identifier embedded in `target`.
    ///
    /// ## Errors
    ///
    /// An error means the target name does not follow the expected convention
    /// at all, so the alignment file cannot be interpreted.
    fn adapter_id<'a>(&self, target: &'a str) -> std::io::Result<&'a str>;
}

/// Target names of the form `gnl|uv|NGB00360.1:1-61`: `|`-separated tokens,
/// with the identifier in the token after the marker, up to its first `.`.
#[derive(Debug, Clone)]
pub struct MarkedTarget {
    pub marker:    String,
    pub separator: char,
}

impl MarkedTarget {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker:    marker.into(),
            separator: '|',
        }
    }
}

impl ParseAdapterId for MarkedTarget {
    fn adapter_id<'a>(&self, target: &'a str) -> std::io::Result<&'a str> {
        let mut tokens = target.split(self.separator);
        if tokens.any(|token| token == self.marker)
            && let Some(id) = tokens.next()
        {
            Ok(strip_version(id))
        } else {
            Err(IOError::new(
                ErrorKind::InvalidData,
                format!(
                    "The alignment target '{target}' has no adapter identifier after the marker '{marker}{sep}'. Is this alignment file from a search against the adapter database?",
                    marker = self.marker,
                    sep = self.separator
                ),
            ))
        }
    }
}

/// Target names that are the adapter identifier itself, possibly with a
/// `.`-suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTarget;

impl ParseAdapterId for PlainTarget {
    #[inline]
    fn adapter_id<'a>(&self, target: &'a str) -> std::io::Result<&'a str> {
        Ok(strip_version(target))
    }
}

#[inline]
fn strip_version(id: &str) -> &str {
    id.split_once('.').map_or(id, |(id, _)| id)
}

/// The naming conventions for alignment targets selectable from the command
/// line.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TargetNaming {
    UniVec,
    Plain,
}

impl ValueEnum for TargetNaming {
    #[inline]
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::UniVec, Self::Plain]
    }

    #[inline]
    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            TargetNaming::UniVec => Some(PossibleValue::new("univec").alias("UniVec")),
            TargetNaming::Plain => Some(PossibleValue::new("plain").alias("Plain")),
        }
    }
}

/// The adapter naming convention chosen for a run.
#[derive(Debug, Clone)]
pub enum AdapterNaming {
    Marked(MarkedTarget),
    Plain(PlainTarget),
}

impl AdapterNaming {
    pub fn new(naming: TargetNaming, marker: &str) -> Self {
        match naming {
            TargetNaming::UniVec => AdapterNaming::Marked(MarkedTarget::new(marker)),
            TargetNaming::Plain => AdapterNaming::Plain(PlainTarget),
        }
    }
}

impl ParseAdapterId for AdapterNaming {
    #[inline]
    fn adapter_id<'a>(&self, target: &'a str) -> std::io::Result<&'a str> {
        match self {
            AdapterNaming::Marked(naming) => naming.adapter_id(target),
            AdapterNaming::Plain(naming) => naming.adapter_id(target),
        }
    }
}

/// One alignment between a transcript and an adapter. Coordinates are 1-based
/// and each pair may run in either direction.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AlignmentHit<'a> {
    pub transcript: &'a str,
    pub target:     &'a str,
    pub t_start:    usize,
    pub t_end:      usize,
    pub a_start:    usize,
    pub a_end:      usize,
}

impl<'a> AlignmentHit<'a> {
    /// Parses a whitespace-delimited tabular record. Fields beyond the
    /// adapter coordinates are ignored.
    ///
    /// ## Errors
    ///
    /// The record must have at least ten fields, and the seventh through tenth
    /// must be non-negative integers.
    pub fn parse(line: &'a str, line_number: usize) -> std::io::Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().take(REQUIRED_FIELDS).collect();
        if fields.len() < REQUIRED_FIELDS {
            return Err(IOError::new(
                ErrorKind::InvalidData,
                format!(
                    "Alignment record on line {line_number} has {found} fields, but at least {REQUIRED_FIELDS} are required:\n{line}",
                    found = fields.len()
                ),
            ));
        }

        let coordinate = |i: usize| {
            fields[i].parse::<usize>().map_err(|_| {
                IOError::new(
                    ErrorKind::InvalidData,
                    format!(
                        "Alignment record on line {line_number} has a non-integer coordinate '{field}' in column {column}:\n{line}",
                        field = fields[i],
                        column = i + 1
                    ),
                )
            })
        };

        Ok(Self {
            transcript: fields[0],
            target:     fields[1],
            t_start:    coordinate(6)?,
            t_end:      coordinate(7)?,
            a_start:    coordinate(8)?,
            a_end:      coordinate(9)?,
        })
    }

    /// Whether the adapter aligns to the transcript's reverse strand, which
    /// places it toward the transcript's 3' end.
    #[inline]
    pub fn is_reversed(&self) -> bool {
        (self.t_end < self.t_start) != (self.a_end < self.a_start)
    }

    #[inline]
    fn transcript_bounds(&self) -> (usize, usize) {
        (self.t_start.min(self.t_end), self.t_start.max(self.t_end))
    }

    #[inline]
    fn adapter_bounds(&self) -> (usize, usize) {
        (self.a_start.min(self.a_end), self.a_start.max(self.a_end))
    }

    /// Treats an alignment reaching close to the adapter's far end as if it had
    /// run to the end of the adapter. The transcript coordinate paired with
    /// the adapter's high end moves outward by the uncovered adapter bases,
    /// clamped to `1..=current_length`, and that adapter coordinate becomes
    /// the adapter length. The other end of the hit is left as aligned.
    ///
    /// Returns whether the hit qualified.
    pub fn extrapolate(&mut self, adapter_length: usize, current_length: usize) -> bool {
        let (_, a_hi) = self.adapter_bounds();
        if a_hi + RELAXED_TOLERANCE < adapter_length {
            return false;
        }

        let tail = adapter_length.saturating_sub(a_hi);
        let ascending = self.t_start <= self.t_end;
        if self.a_start <= self.a_end {
            self.t_end = push_outward(self.t_end, tail, ascending, current_length);
            self.a_end = adapter_length;
        } else {
            self.t_start = push_outward(self.t_start, tail, !ascending, current_length);
            self.a_start = adapter_length;
        }
        true
    }
}

/// Moves `position` by `by` bases, upward or downward, without leaving
/// `1..=current_length`.
#[inline]
fn push_outward(position: usize, by: usize, upward: bool, current_length: usize) -> usize {
    if upward {
        (position + by).min(current_length.max(position))
    } else {
        position.saturating_sub(by).max(1)
    }
}

/// How a hit is interpreted for trimming.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HitClass {
    /// The adapter sits at the 5' end.
    FivePrime,
    /// The adapter sits at the 3' end.
    ThreePrime,
    /// A nearly complete adapter away from both ends, trimmed toward the end
    /// its orientation points to.
    Internal { reversed: bool },
    /// A weak or partial hit away from both ends.
    Ignored,
}

impl HitClass {
    /// The trim implied by a hit of this class at transcript bounds `t_lo..=t_hi`.
    #[inline]
    fn edit(self, t_lo: usize, t_hi: usize) -> Option<TrimEdit> {
        match self {
            HitClass::FivePrime | HitClass::Internal { reversed: false } => Some(TrimEdit::KeepFrom(t_hi + 1)),
            HitClass::ThreePrime | HitClass::Internal { reversed: true } => {
                Some(TrimEdit::KeepTo(t_lo.saturating_sub(1)))
            }
            HitClass::Ignored => None,
        }
    }
}

/// Classifies a hit against an adapter of `adapter_length` bases on a
/// transcript currently `current_length` bases long, returning the class and
/// the trim it implies.
pub fn classify(hit: &AlignmentHit, adapter_length: usize, current_length: usize) -> (HitClass, Option<TrimEdit>) {
    let (t_lo, t_hi) = hit.transcript_bounds();
    let (_, a_hi) = hit.adapter_bounds();

    let class = if t_lo <= END_TOLERANCE {
        HitClass::FivePrime
    } else if t_hi + END_TOLERANCE >= current_length {
        HitClass::ThreePrime
    } else if a_hi + INTERNAL_TOLERANCE >= adapter_length {
        HitClass::Internal {
            reversed: hit.is_reversed(),
        }
    } else {
        HitClass::Ignored
    };

    (class, class.edit(t_lo, t_hi))
}

/// Folds alignment hits into per-transcript trim windows.
///
/// The catalog and baselines must be complete before any hit is folded, since
/// end proximity is judged against each transcript's current length.
pub struct AlignmentClassifier<'c, N> {
    catalog:   &'c AdapterCatalog,
    baselines: &'c Baselines,
    naming:    N,
    relaxed:   bool,
    windows:   TrimWindows,
    tallies:   HitTallies,
}

impl<'c, N: ParseAdapterId> AlignmentClassifier<'c, N> {
    pub fn new(catalog: &'c AdapterCatalog, baselines: &'c Baselines, naming: N, relaxed: bool) -> Self {
        Self {
            catalog,
            baselines,
            naming,
            relaxed,
            windows: TrimWindows::new(),
            tallies: HitTallies::default(),
        }
    }

    /// Classifies every record of a tabular alignment file. Blank lines and
    /// lines starting with `#` are skipped.
    ///
    /// ## Errors
    ///
    /// IO errors, malformed records, and target names that do not follow the
    /// naming convention are propagated.
    pub fn classify_reader<R: BufRead>(&mut self, reader: R) -> std::io::Result<()> {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.fold_hit(AlignmentHit::parse(&line, i + 1)?)?;
        }
        Ok(())
    }

    /// Resolves, classifies, and folds a single hit.
    ///
    /// ## Errors
    ///
    /// The hit's target name must follow the naming convention.
    pub fn fold_hit(&mut self, mut hit: AlignmentHit) -> std::io::Result<()> {
        self.tallies.records += 1;

        let adapter_id = self.naming.adapter_id(hit.target)?;
        let Some(adapter_length) = self.catalog.length(adapter_id) else {
            self.tallies.unknown_adapter += 1;
            return Ok(());
        };
        let Some(baseline) = self.baselines.get(hit.transcript) else {
            self.tallies.unknown_transcript += 1;
            return Ok(());
        };
        let current_length = baseline.current_length();

        if self.relaxed && hit.extrapolate(adapter_length, current_length) {
            self.tallies.extrapolated += 1;
        }

        let (class, edit) = classify(&hit, adapter_length, current_length);
        self.tallies.count(class);

        if let Some(edit) = edit {
            self.windows.apply(hit.transcript, current_length, edit);
        }
        Ok(())
    }

    /// Consumes the classifier, returning the final windows and tallies.
    #[inline]
    pub fn finish(self) -> (TrimWindows, HitTallies) {
        (self.windows, self.tallies)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trim::{ledger::read_ledger, window::TrimWindow};
    use std::io::Cursor;

    fn hit(t_start: usize, t_end: usize, a_start: usize, a_end: usize) -> AlignmentHit<'static> {
        AlignmentHit {
            transcript: "tx",
            target: "gnl|uv|NGB00735.1:1-58",
            t_start,
            t_end,
            a_start,
            a_end,
        }
    }

    #[test]
    fn test_marked_target_names() {
        let naming = MarkedTarget::new(DEFAULT_ADAPTER_MARKER);
        let names = [
            ("gnl|uv|NGB00735.1:1-58", "NGB00735"),
            ("gnl|uv|NGB00360.1:1-61", "NGB00360"),
            ("lcl|db|gnl|uv|NGB01088", "NGB01088"),
            ("uv|EMVEC.1", "EMVEC"),
        ];
        for (target, id) in names {
            assert_eq!(naming.adapter_id(target).unwrap(), id, "'{target}'");
        }

        for target in ["gnl|NGB00735.1:1-58", "gnl|uv", "NGB00735", "gnl|uvx|NGB00735.1"] {
            let err = naming.adapter_id(target).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData, "'{target}'");
        }
    }

    #[test]
    fn test_plain_target_names() {
        let naming = AdapterNaming::new(TargetNaming::Plain, DEFAULT_ADAPTER_MARKER);
        assert_eq!(naming.adapter_id("TruSeq_Adapter.2").unwrap(), "TruSeq_Adapter");
        assert_eq!(naming.adapter_id("Nextera").unwrap(), "Nextera");
    }

    #[test]
    fn test_parse_alignment_record() {
        let line = "TRINITY_DN1_c0_g1_i1\tgnl|uv|NGB00735.1:1-58\t96.55\t58\t2\t0\t3\t40\t1\t38\t2e-20\t97.1";
        let parsed = AlignmentHit::parse(line, 1).unwrap();

        assert_eq!(parsed.transcript, "TRINITY_DN1_c0_g1_i1");
        assert_eq!(parsed.target, "gnl|uv|NGB00735.1:1-58");
        assert_eq!((parsed.t_start, parsed.t_end, parsed.a_start, parsed.a_end), (3, 40, 1, 38));

        let err = AlignmentHit::parse("tx gnl|uv|NGB00735 90 58 2 0 3 40", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));
        let err = AlignmentHit::parse("tx gnl|uv|NGB00735 90 58 2 0 3 4x0 1 38", 2).unwrap_err();
        assert!(err.to_string().contains("column 8"));
    }

    #[test]
    fn test_five_prime_hit() {
        let (class, edit) = classify(&hit(3, 40, 1, 38), 58, 500);
        assert_eq!(class, HitClass::FivePrime);
        assert_eq!(edit, Some(TrimEdit::KeepFrom(41)));
    }

    #[test]
    fn test_three_prime_hit() {
        let (class, edit) = classify(&hit(480, 498, 40, 58), 58, 500);
        assert_eq!(class, HitClass::ThreePrime);
        assert_eq!(edit, Some(TrimEdit::KeepTo(479)));
    }

    #[test]
    fn test_five_prime_takes_priority() {
        // Spans the whole transcript, so both ends qualify
        let (class, edit) = classify(&hit(10, 60, 1, 51), 58, 70);
        assert_eq!(class, HitClass::FivePrime);
        assert_eq!(edit, Some(TrimEdit::KeepFrom(61)));
    }

    #[test]
    fn test_internal_hit_follows_orientation() {
        let reversed = hit(200, 257, 58, 2);
        assert!(reversed.is_reversed());
        let (class, edit) = classify(&reversed, 58, 500);
        assert_eq!(class, HitClass::Internal { reversed: true });
        assert_eq!(edit, Some(TrimEdit::KeepTo(199)));

        let reversed = hit(257, 200, 2, 58);
        assert!(reversed.is_reversed());
        assert_eq!(classify(&reversed, 58, 500).1, Some(TrimEdit::KeepTo(199)));

        let forward = hit(200, 257, 2, 58);
        assert!(!forward.is_reversed());
        let (class, edit) = classify(&forward, 58, 500);
        assert_eq!(class, HitClass::Internal { reversed: false });
        assert_eq!(edit, Some(TrimEdit::KeepFrom(258)));
    }

    #[test]
    fn test_weak_internal_hit_is_ignored() {
        let (class, edit) = classify(&hit(200, 240, 1, 41), 58, 500);
        assert_eq!(class, HitClass::Ignored);
        assert_eq!(edit, None);

        // Three bases short of the adapter end
        assert_eq!(classify(&hit(200, 254, 1, 55), 58, 500).0, HitClass::Ignored);
        assert_eq!(classify(&hit(200, 255, 1, 56), 58, 500).0, HitClass::Internal { reversed: false });
    }

    #[test]
    fn test_extrapolation_extends_adapter_end() {
        let mut partial = hit(100, 145, 5, 50);
        assert!(partial.extrapolate(58, 500));
        assert_eq!((partial.t_start, partial.t_end), (100, 153));
        assert_eq!((partial.a_start, partial.a_end), (5, 58));

        let mut complete = hit(100, 153, 5, 58);
        assert!(complete.extrapolate(58, 500));
        assert_eq!((complete.t_start, complete.t_end), (100, 153));
    }

    #[test]
    fn test_extrapolation_follows_orientation() {
        // The adapter's far end pairs with the transcript start
        let mut reversed = hit(300, 345, 50, 5);
        assert!(reversed.extrapolate(58, 500));
        assert_eq!((reversed.t_start, reversed.t_end), (292, 345));
        assert_eq!((reversed.a_start, reversed.a_end), (58, 5));
    }

    #[test]
    fn test_extrapolation_is_clamped() {
        let mut near_start = hit(3, 48, 5, 50);
        assert!(near_start.extrapolate(58, 500));
        assert_eq!((near_start.t_start, near_start.t_end), (3, 56));

        let mut reversed_near_start = hit(8, 40, 50, 1);
        assert!(reversed_near_start.extrapolate(58, 500));
        assert_eq!((reversed_near_start.t_start, reversed_near_start.t_end), (1, 40));

        let mut near_end = hit(455, 495, 1, 50);
        assert!(near_end.extrapolate(58, 500));
        assert_eq!((near_end.t_start, near_end.t_end), (455, 500));
    }

    #[test]
    fn test_extrapolation_keeps_complete_hits() {
        let mut three_prime = hit(470, 490, 5, 58);
        assert!(three_prime.extrapolate(58, 500));
        assert_eq!(classify(&three_prime, 58, 500), (HitClass::ThreePrime, Some(TrimEdit::KeepTo(469))));

        let mut internal = hit(18, 60, 5, 58);
        assert!(internal.extrapolate(58, 500));
        assert_eq!(
            classify(&internal, 58, 500),
            (HitClass::Internal { reversed: false }, Some(TrimEdit::KeepFrom(61)))
        );
    }

    #[test]
    fn test_extrapolation_requires_far_end() {
        let mut short = hit(100, 140, 1, 47);
        assert!(!short.extrapolate(58, 500));
        assert_eq!((short.t_start, short.t_end), (100, 140));
    }

    #[test]
    fn test_extrapolation_rescues_internal_hit() {
        let mut partial = hit(200, 245, 1, 50);
        assert_eq!(classify(&partial, 58, 500).0, HitClass::Ignored);

        partial.extrapolate(58, 500);
        assert_eq!(classify(&partial, 58, 500), (HitClass::Internal { reversed: false }, Some(TrimEdit::KeepFrom(254))));
    }

    static ALIGNMENTS: &str = "# BLASTN 2.15.0+\n\
                               tx_a\tgnl|uv|NGB00735.1:1-58\t100.0\t38\t0\t0\t3\t40\t1\t38\t1e-15\t70\n\
                               tx_a\tgnl|uv|NGB00735.1:1-58\t100.0\t19\t0\t0\t480\t498\t58\t40\t1e-05\t35\n\
                               tx_a\tgnl|uv|NGB00999.1:1-20\t100.0\t19\t0\t0\t20\t30\t1\t11\t1e-05\t35\n\
                               tx_b\tgnl|uv|NGB00735.1:1-58\t98.0\t50\t1\t0\t200\t249\t1\t50\t1e-10\t60\n\
                               \n\
                               tx_missing\tgnl|uv|NGB00735.1:1-58\t100.0\t38\t0\t0\t3\t40\t1\t38\t1e-15\t70\n";

    fn baselines() -> Baselines {
        let ledger = read_ledger(Cursor::new("tx_a 1 500 500\ntx_b 1 500 500\n")).unwrap();
        Baselines::from_ledger(ledger).unwrap()
    }

    #[test]
    fn test_classifier_folds_records() {
        let catalog = AdapterCatalog::from_specs(["NGB00735:58"]);
        let baselines = baselines();
        let mut classifier = AlignmentClassifier::new(&catalog, &baselines, MarkedTarget::new("uv"), false);
        classifier.classify_reader(Cursor::new(ALIGNMENTS)).unwrap();
        let (windows, tallies) = classifier.finish();

        assert_eq!(windows.window("tx_a", 500), TrimWindow { keep_lo: 41, keep_hi: 479 });
        assert_eq!(windows.window("tx_b", 500), TrimWindow::full(500));
        assert_eq!(tallies.records, 5);
        assert_eq!(tallies.unknown_adapter, 1);
        assert_eq!(tallies.unknown_transcript, 1);
        assert_eq!(tallies.five_prime, 1);
        assert_eq!(tallies.three_prime, 1);
        assert_eq!(tallies.ignored, 1);
        assert_eq!(tallies.extrapolated, 0);
    }

    #[test]
    fn test_classifier_relaxed_mode() {
        let catalog = AdapterCatalog::from_specs(["NGB00735:58"]);
        let baselines = baselines();
        let mut classifier = AlignmentClassifier::new(&catalog, &baselines, MarkedTarget::new("uv"), true);
        classifier.classify_reader(Cursor::new(ALIGNMENTS)).unwrap();
        let (windows, tallies) = classifier.finish();

        assert_eq!(windows.window("tx_b", 500), TrimWindow { keep_lo: 258, keep_hi: 500 });
        assert_eq!(tallies.internal, 1);
        assert_eq!(tallies.ignored, 0);
        assert_eq!(tallies.extrapolated, 2);
    }

    #[test]
    fn test_classifier_rejects_foreign_targets() {
        let catalog = AdapterCatalog::from_specs(["NGB00735:58"]);
        let baselines = baselines();
        let mut classifier = AlignmentClassifier::new(&catalog, &baselines, MarkedTarget::new("uv"), false);

        let err = classifier
            .classify_reader(Cursor::new("tx_a\tchr1\t100.0\t38\t0\t0\t3\t40\t1\t38\n"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
