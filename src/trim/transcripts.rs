use std::io::{BufRead, Error as IOError, ErrorKind, Lines};

/// The marker preceding a transcript's declared length in its header.
const LENGTH_MARKER: &str = "len=";

/// One transcript as stored in the two-line FASTA file: a header line and a
/// single sequence line.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TranscriptRecord {
    /// The header line, including the leading `>`.
    pub header:   String,
    pub sequence: String,
    /// The 1-based line number of the header, for error messages.
    pub line:     usize,
}

impl TranscriptRecord {
    /// The transcript name: the first whitespace-delimited token of the
    /// header, without the `>`.
    #[inline]
    pub fn name(&self) -> &str {
        transcript_name(&self.header)
    }

    /// The length declared in the header by the `len=` marker.
    ///
    /// ## Errors
    ///
    /// The header must carry the marker followed by an integer.
    pub fn declared_length(&self) -> std::io::Result<usize> {
        match find_length_marker(&self.header) {
            Some((start, end)) => self.header[start..end].parse::<usize>().map_err(|e| {
                IOError::new(
                    ErrorKind::InvalidData,
                    format!("Invalid declared length on line {}: {e}\n{}", self.line, self.header),
                )
            }),
            None => Err(IOError::new(
                ErrorKind::InvalidData,
                format!(
                    "The header on line {} has no '{LENGTH_MARKER}<integer>' length marker:\n{}",
                    self.line, self.header
                ),
            )),
        }
    }

    /// Ensures the sequence line holds exactly `expected` bases.
    ///
    /// ## Errors
    ///
    /// A mismatch signals corrupted input or a sequence wrapped over several
    /// lines, neither of which can be trimmed safely.
    pub fn check_length(&self, expected: usize) -> std::io::Result<()> {
        let actual = self.sequence.len();
        if actual == expected {
            Ok(())
        } else {
            Err(IOError::new(
                ErrorKind::InvalidData,
                format!(
                    "Transcript '{name}' (line {line}) should be {expected} bases long, but its sequence line holds {actual}",
                    name = self.name(),
                    line = self.line
                ),
            ))
        }
    }
}

/// Returns the first whitespace-delimited token after the `>` of a header.
pub fn transcript_name(header: &str) -> &str {
    let header = header.strip_prefix('>').unwrap_or(header);
    header.split_whitespace().next().unwrap_or_default()
}

/// Returns a copy of `header` with the value of its length marker replaced
/// by `length`. Headers without a marker are returned unchanged.
pub fn with_declared_length(header: &str, length: usize) -> String {
    match find_length_marker(header) {
        Some((start, end)) => format!("{}{length}{}", &header[..start], &header[end..]),
        None => header.to_string(),
    }
}

/// Locates the digits of the length marker, as a byte range of `header`.
///
/// The marker must begin a token (or follow punctuation) and lie after the
/// transcript name, so names such as `seqlen=3` are never mistaken for it.
fn find_length_marker(header: &str) -> Option<(usize, usize)> {
    let body = header.strip_prefix('>').unwrap_or(header);
    let offset = header.len() - body.len();
    let name_end = offset + body.len() - body.trim_start().len() + transcript_name(header).len();

    header.match_indices(LENGTH_MARKER).find_map(|(i, _)| {
        if i < name_end {
            return None;
        }
        let preceding = header[..i].chars().next_back();
        if preceding.is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        let start = i + LENGTH_MARKER.len();
        let digits = header[start..].bytes().take_while(u8::is_ascii_digit).count();
        (digits > 0).then_some((start, start + digits))
    })
}

enum ReaderState {
    AwaitingHeader,
    AwaitingSequence { header: String, line: usize },
}

/// Iterates over a two-line FASTA file, yielding one [`TranscriptRecord`] per
/// header/sequence pair.
///
/// Blank lines between records are skipped. A sequence line appearing where a
/// header is expected (such as a wrapped sequence) or a header without a
/// sequence line is an error.
pub struct TranscriptReader<R> {
    lines:       Lines<R>,
    line_number: usize,
    state:       ReaderState,
}

impl<R: BufRead> TranscriptReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines:       reader.lines(),
            line_number: 0,
            state:       ReaderState::AwaitingHeader,
        }
    }
}

impl<R: BufRead> Iterator for TranscriptReader<R> {
    type Item = std::io::Result<TranscriptRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(next_line) = self.lines.next() else {
                return match std::mem::replace(&mut self.state, ReaderState::AwaitingHeader) {
                    ReaderState::AwaitingHeader => None,
                    ReaderState::AwaitingSequence { header, line } => Some(Err(missing_sequence(&header, line))),
                };
            };

            let text = match next_line {
                Ok(text) => text,
                Err(e) => return Some(Err(e)),
            };
            self.line_number += 1;

            match std::mem::replace(&mut self.state, ReaderState::AwaitingHeader) {
                ReaderState::AwaitingHeader => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    if !text.starts_with('>') {
                        return Some(Err(IOError::new(
                            ErrorKind::InvalidData,
                            format!(
                                "Expected a FASTA header on line {}, but found sequence data. Each record must be exactly one header line and one sequence line.",
                                self.line_number
                            ),
                        )));
                    }
                    self.state = ReaderState::AwaitingSequence {
                        header: text,
                        line:   self.line_number,
                    };
                }
                ReaderState::AwaitingSequence { header, line } => {
                    if text.starts_with('>') {
                        return Some(Err(missing_sequence(&header, line)));
                    }
                    return Some(Ok(TranscriptRecord {
                        header,
                        sequence: text,
                        line,
                    }));
                }
            }
        }
    }
}

fn missing_sequence(header: &str, line: usize) -> IOError {
    IOError::new(
        ErrorKind::InvalidData,
        format!("The header on line {line} is not followed by a sequence line:\n{header}"),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    static HEADERS: [&str; 6] = [
        ">TRINITY_DN1000_c0_g1_i1 len=310 path=[288:0-309]",
        ">TRINITY_DN1000_c0_g1_i2 len=7",
        ">seqlen=3 len=12",
        ">tx_1 cov=3.0;len=45;tpm=1",
        ">tx_2 path=[1:0-10]",
        ">tx_3 maxlen=5",
    ];

    #[test]
    fn test_transcript_name() {
        let names = [
            "TRINITY_DN1000_c0_g1_i1",
            "TRINITY_DN1000_c0_g1_i2",
            "seqlen=3",
            "tx_1",
            "tx_2",
            "tx_3",
        ];
        for (header, name) in HEADERS.iter().zip(names) {
            assert_eq!(transcript_name(header), name, "'{header}'");
        }
    }

    #[test]
    fn test_declared_length() {
        let lengths = [Some(310), Some(7), Some(12), Some(45), None, None];
        for (header, length) in HEADERS.iter().zip(lengths) {
            let record = TranscriptRecord {
                header:   header.to_string(),
                sequence: String::new(),
                line:     1,
            };
            assert_eq!(record.declared_length().ok(), length, "'{header}'");
        }
    }

    #[test]
    fn test_with_declared_length() {
        assert_eq!(
            with_declared_length(HEADERS[0], 250),
            ">TRINITY_DN1000_c0_g1_i1 len=250 path=[288:0-309]"
        );
        assert_eq!(with_declared_length(HEADERS[2], 9), ">seqlen=3 len=9");
        assert_eq!(with_declared_length(HEADERS[3], 40), ">tx_1 cov=3.0;len=40;tpm=1");
        assert_eq!(with_declared_length(HEADERS[4], 40), HEADERS[4]);
        assert_eq!(with_declared_length(HEADERS[1], 7), HEADERS[1]);
    }

    #[test]
    fn test_reader_yields_pairs() {
        let data = ">a len=4\nACGT\n\n>b len=2\r\nGG\r\n";
        let records = TranscriptReader::new(Cursor::new(data))
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), "a");
        assert_eq!(records[0].sequence, "ACGT");
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].name(), "b");
        assert_eq!(records[1].sequence, "GG");
        assert_eq!(records[1].line, 4);
        records[1].check_length(2).unwrap();
        assert!(records[0].check_length(5).is_err());
    }

    #[test]
    fn test_reader_rejects_wrapped_sequences() {
        let data = ">a len=8\nACGT\nACGT\n";
        let mut reader = TranscriptReader::new(Cursor::new(data));

        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_reader_rejects_missing_sequence() {
        let mut reader = TranscriptReader::new(Cursor::new(">a len=4\n>b len=4\nACGT\n"));
        assert!(reader.next().unwrap().is_err());

        let mut reader = TranscriptReader::new(Cursor::new(">a len=4\nACGT\n>b len=4\n"));
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }
}
