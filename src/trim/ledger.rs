use std::{
    io::{BufRead, Error as IOError, ErrorKind, Write},
    str::FromStr,
};

/// Lines of a ledger beginning with this character are comments. They are
/// carried verbatim to the top of the next ledger.
pub const COMMENT_MARKER: char = '#';

/// The layout used for output ledger records when none is requested: the five
/// fields separated by tabs.
pub const DEFAULT_LEDGER_FORMAT: &str = r"{}\t{}\t{}\t{}\t{}";

/// One transcript's coordinates relative to its originally assembled
/// sequence.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LedgerRecord {
    pub name:            String,
    /// 1-based start of the current sequence in original coordinates.
    pub start:           usize,
    /// 1-based inclusive end of the current sequence in original coordinates.
    pub stop:            usize,
    pub original_length: usize,
    /// Anything after the fourth field, passed along untouched.
    pub remainder:       String,
}

/// The parsed contents of a coordinate ledger.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Comment lines, in file order, including the marker.
    pub comments: Vec<String>,
    pub records:  Vec<LedgerRecord>,
}

/// Reads a whitespace-delimited ledger of `name start stop original_length
/// remainder...` records.
///
/// ## Errors
///
/// IO errors are propagated. A record with fewer than four fields, a
/// non-integer coordinate, or coordinates violating `1 <= start <= stop <=
/// original_length` is an error.
pub fn read_ledger<R: BufRead>(reader: R) -> std::io::Result<Ledger> {
    let mut ledger = Ledger::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with(COMMENT_MARKER) {
            ledger.comments.push(line);
        } else if !line.trim().is_empty() {
            ledger.records.push(parse_ledger_line(&line, i + 1)?);
        }
    }

    Ok(ledger)
}

/// Splits off the first whitespace-delimited field of `s`.
fn next_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_at(s.find(char::is_whitespace).unwrap_or(s.len())))
}

fn parse_ledger_line(line: &str, line_number: usize) -> std::io::Result<LedgerRecord> {
    let invalid = |reason: &str| {
        IOError::new(
            ErrorKind::InvalidData,
            format!("Invalid ledger record on line {line_number} ({reason}):\n{line}"),
        )
    };
    let coordinate = |field: &str, what: &str| {
        field
            .parse::<usize>()
            .map_err(|_| invalid(&format!("{what} '{field}' is not a non-negative integer")))
    };

    let fields = next_field(line).and_then(|(name, rest)| {
        let (start, rest) = next_field(rest)?;
        let (stop, rest) = next_field(rest)?;
        let (original_length, rest) = next_field(rest)?;
        Some((name, start, stop, original_length, rest))
    });
    let Some((name, start, stop, original_length, rest)) = fields else {
        return Err(invalid("expected at least four fields"));
    };

    let record = LedgerRecord {
        name:            name.to_string(),
        start:           coordinate(start, "start")?,
        stop:            coordinate(stop, "stop")?,
        original_length: coordinate(original_length, "original length")?,
        remainder:       rest.trim().to_string(),
    };

    if 1 <= record.start && record.start <= record.stop && record.stop <= record.original_length {
        Ok(record)
    } else {
        Err(invalid("coordinates must satisfy 1 <= start <= stop <= original length"))
    }
}

/// A field of a [`LedgerRecord`] addressable from a [`LedgerFormat`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LedgerField {
    Name,
    Start,
    Stop,
    OriginalLength,
    Remainder,
}

impl LedgerField {
    const POSITIONAL: [LedgerField; 5] = [
        LedgerField::Name,
        LedgerField::Start,
        LedgerField::Stop,
        LedgerField::OriginalLength,
        LedgerField::Remainder,
    ];

    /// The field at 1-based position `n`.
    #[inline]
    fn nth(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::POSITIONAL.get(i)).copied()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Literal(String),
    Field(LedgerField),
}

/// A template for output ledger records.
///
/// `{}` takes the next field in the order name, start, stop, original length,
/// remainder; `{1}` through `{5}` address a field directly. `{{` and `}}` are
/// literal braces, and the escapes `\t`, `\n`, and `\\` are recognized so that
/// templates can be typed on a command line. Each record is the rendered
/// template followed by a newline.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LedgerFormat {
    segments: Vec<Segment>,
}

impl FromStr for LedgerFormat {
    type Err = String;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut next_positional = 1;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('t') => literal.push('\t'),
                    Some('n') => literal.push('\n'),
                    Some('\\') => literal.push('\\'),
                    Some(other) => {
                        literal.push('\\');
                        literal.push(other);
                    }
                    None => literal.push('\\'),
                },
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(format!("Unmatched '}}' in ledger format `{template}`")),
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => placeholder.push(c),
                            None => return Err(format!("Unclosed '{{' in ledger format `{template}`")),
                        }
                    }

                    let position = if placeholder.is_empty() {
                        let position = next_positional;
                        next_positional += 1;
                        position
                    } else {
                        placeholder
                            .trim()
                            .parse::<usize>()
                            .map_err(|_| format!("`{{{placeholder}}}` is not a valid ledger field placeholder"))?
                    };

                    let field = LedgerField::nth(position).ok_or_else(|| {
                        format!("Ledger format `{template}` refers to field {position}, but only fields 1 to 5 exist")
                    })?;

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }
}

impl Default for LedgerFormat {
    /// The layout described by [`DEFAULT_LEDGER_FORMAT`].
    fn default() -> Self {
        let mut segments = Vec::with_capacity(9);
        for (i, field) in LedgerField::POSITIONAL.into_iter().enumerate() {
            if i > 0 {
                segments.push(Segment::Literal("\t".to_string()));
            }
            segments.push(Segment::Field(field));
        }
        Self { segments }
    }
}

impl LedgerFormat {
    /// Writes `record` rendered through this template, followed by a newline.
    pub fn write_record<W: Write>(&self, writer: &mut W, record: &LedgerRecord) -> std::io::Result<()> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => writer.write_all(text.as_bytes())?,
                Segment::Field(LedgerField::Name) => writer.write_all(record.name.as_bytes())?,
                Segment::Field(LedgerField::Start) => write!(writer, "{}", record.start)?,
                Segment::Field(LedgerField::Stop) => write!(writer, "{}", record.stop)?,
                Segment::Field(LedgerField::OriginalLength) => write!(writer, "{}", record.original_length)?,
                Segment::Field(LedgerField::Remainder) => writer.write_all(record.remainder.as_bytes())?,
            }
        }
        writeln!(writer)
    }
}

/// Validates a ledger format template given on the command line.
pub fn parse_ledger_format(value: &str) -> Result<LedgerFormat, String> {
    value.parse()
}
