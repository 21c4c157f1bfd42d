//! The adapter-trim engine: coordinate baselines, alignment classification
//! into trim windows, and the rewrite pass that applies them.

pub mod baseline;
pub mod catalog;
pub mod cds;
pub mod hits;
pub mod ledger;
pub mod report;
pub mod rewrite;
pub mod transcripts;
pub mod window;

#[cfg(test)]
mod test {
    use crate::trim::{
        baseline::Baselines,
        catalog::AdapterCatalog,
        hits::{AdapterNaming, AlignmentClassifier, TargetNaming},
        ledger::{LedgerFormat, read_ledger},
        rewrite::{RunMode, TranscriptRewriter},
    };
    use std::{io::Cursor, num::NonZeroUsize};

    fn sequence(length: usize) -> String {
        "ACGT".chars().cycle().take(length).collect()
    }

    /// Runs the classification and rewrite passes in ledger mode, returning
    /// the trimmed transcripts and the output ledger.
    fn ledger_round(transcripts: &str, baselines: &Baselines, alignments: &str) -> (String, String) {
        let catalog = AdapterCatalog::from_specs(["NGB00735:58 NGB00360:61"]);
        let naming = AdapterNaming::new(TargetNaming::UniVec, "uv");
        let mut classifier = AlignmentClassifier::new(&catalog, baselines, naming, false);
        classifier.classify_reader(Cursor::new(alignments)).unwrap();
        let (windows, _) = classifier.finish();

        let mut output = Vec::new();
        let mut ledger = Vec::new();
        let mode = RunMode::Ledger {
            output: &mut ledger,
            format: LedgerFormat::default(),
        };
        let mut rewriter = TranscriptRewriter::<_, Vec<u8>>::new(baselines, &windows, NonZeroUsize::MIN, mode, None);
        rewriter.rewrite(Cursor::new(transcripts), &mut output).unwrap();
        rewriter.finish().unwrap();

        (String::from_utf8(output).unwrap(), String::from_utf8(ledger).unwrap())
    }

    #[test]
    fn test_chained_rounds() {
        let transcripts = format!(
            ">tx_a len=500\n{}\n>tx_b len=300\n{}\n>tx_c len=250\n{}\n",
            sequence(500),
            sequence(300),
            sequence(250)
        );
        let round1_hits = "tx_a\tgnl|uv|NGB00735.1:1-58\t100.0\t38\t0\t0\t3\t40\t1\t38\t1e-15\t70\n\
                           tx_b\tgnl|uv|NGB00360.1:1-61\t100.0\t19\t0\t0\t298\t280\t1\t19\t1e-05\t35\n";

        let baselines = Baselines::from_transcripts(Cursor::new(&transcripts)).unwrap();
        let (round1, ledger1) = ledger_round(&transcripts, &baselines, round1_hits);

        assert_eq!(ledger1, "tx_a\t41\t500\t500\t\ntx_b\t1\t279\t300\t\ntx_c\t1\t250\t250\t\n");
        let mut lines = round1.lines();
        assert_eq!(lines.next(), Some(">tx_a len=500"));
        assert_eq!(lines.next(), Some(&sequence(500)[40..]));
        assert_eq!(lines.next(), Some(">tx_b len=300"));
        assert_eq!(lines.next().map(str::len), Some(279));

        let round2_hits = "# BLASTN 2.15.0+\n\
                           tx_a\tgnl|uv|NGB00735.1:1-58\t97.0\t21\t0\t0\t440\t460\t1\t21\t1e-05\t35\n";
        let ledger = read_ledger(Cursor::new(format!("# round 1\n{ledger1}"))).unwrap();
        let baselines = Baselines::from_ledger(ledger).unwrap();
        let (round2, ledger2) = ledger_round(&round1, &baselines, round2_hits);

        assert_eq!(
            ledger2,
            "# round 1\ntx_a\t41\t479\t500\t\ntx_b\t1\t279\t300\t\ntx_c\t1\t250\t250\t\n"
        );
        assert_eq!(round2.lines().nth(1), Some(&sequence(500)[40..479]));
    }
}
