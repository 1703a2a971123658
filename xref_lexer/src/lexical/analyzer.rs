//! Separator/identifier scanner
//!
//! Splits raw source bytes into alternating runs of separators and
//! identifiers. A separator run is one or more of, tried in this order at
//! every position:
//!
//! 1. a block comment `/* ... */`, closed by the first `*/`
//! 2. a line comment `// ...` through the first line end
//! 3. a `"`-quoted literal, where `\` escapes the following byte
//! 4. an include directive `# *include *< ... >`
//! 5. any single non-word byte
//!
//! An item that cannot be closed does not open; its first byte is taken as a
//! plain non-word byte instead. Word bytes are ASCII letters, digits and `_`.
//!
//! Every scan state consumes at least one byte per step and "cannot close"
//! is answered from landmarks computed up front, so the whole scan is linear
//! in the input length.

use super::{TokenStream, TokenUnit};
use crate::config::constants::compile_time::lexical::*;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};

/// Tokenizer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizerError {
    #[error("Source too large: {size} bytes (max {MAX_SOURCE_SIZE})")]
    InputTooLarge { size: usize },
}

impl TokenizerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            TokenizerError::InputTooLarge { .. } => codes::lexical::INPUT_TOO_LARGE,
        }
    }
}

/// Scanner states while building one separator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Normal,
    InBlockComment,
    InLineComment,
    InString,
    InInclude,
}

/// Per-invocation counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenizerMetrics {
    pub units: usize,
    pub identifiers: usize,
    pub block_comments: usize,
    pub line_comments: usize,
    pub string_literals: usize,
    pub includes: usize,
    pub source_bytes: usize,
}

/// Last positions of each closing delimiter in the source
#[derive(Debug, Default)]
struct Landmarks {
    last_quote: Option<usize>,
    last_line_end: Option<usize>,
    /// Index of the `*` of the last `*/`
    last_block_close: Option<usize>,
    last_angle_close: Option<usize>,
}

impl Landmarks {
    fn scan(source: &[u8]) -> Self {
        let mut marks = Self::default();
        for (i, &byte) in source.iter().enumerate() {
            match byte {
                b'"' => marks.last_quote = Some(i),
                b'>' => marks.last_angle_close = Some(i),
                b'/' if i > 0 && source[i - 1] == b'*' => marks.last_block_close = Some(i - 1),
                b if is_line_end(b) => marks.last_line_end = Some(i),
                _ => {}
            }
        }
        marks
    }

    fn has_at_or_after(mark: Option<usize>, position: usize) -> bool {
        mark.map_or(false, |m| m >= position)
    }
}

#[inline]
pub fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[inline]
fn is_line_end(byte: u8) -> bool {
    byte == b'\n' || byte == LINE_SENTINEL
}

fn word_end(source: &[u8], start: usize) -> usize {
    source[start..]
        .iter()
        .position(|&b| !is_word_byte(b))
        .map_or(source.len(), |offset| start + offset)
}

pub struct SourceTokenizer {
    metrics: TokenizerMetrics,
}

impl SourceTokenizer {
    pub fn new() -> Self {
        Self {
            metrics: TokenizerMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &TokenizerMetrics {
        &self.metrics
    }

    /// Tokenize raw source bytes
    pub fn tokenize(&mut self, source: &[u8]) -> Result<TokenStream, TokenizerError> {
        if source.len() > MAX_SOURCE_SIZE {
            let error = TokenizerError::InputTooLarge { size: source.len() };
            log_error!(error.error_code(), "Source exceeds tokenizer limit",
                "size" => source.len(),
                "limit" => MAX_SOURCE_SIZE
            );
            return Err(error);
        }

        self.metrics = TokenizerMetrics {
            source_bytes: source.len(),
            ..TokenizerMetrics::default()
        };

        // Word bytes before the first separator are not part of any unit;
        // they are carried verbatim ahead of the first separator.
        let lead_end = word_end(source, 0);
        if lead_end == source.len() {
            log_debug!("Source has no separators", "bytes" => source.len());
            return Ok(TokenStream::unseparated(source.to_vec()));
        }

        let marks = Landmarks::scan(source);
        let mut units = Vec::new();
        let mut position = lead_end;
        let mut run_start = 0;

        while position < source.len() {
            let separator_end = self.scan_separator_run(source, position, &marks);
            let identifier_end = word_end(source, separator_end);

            let identifier = String::from_utf8_lossy(&source[separator_end..identifier_end])
                .into_owned();
            if !identifier.is_empty() {
                self.metrics.identifiers += 1;
            }

            units.push(TokenUnit {
                separator: source[run_start..separator_end].to_vec(),
                identifier,
            });

            position = identifier_end;
            run_start = identifier_end;
        }

        self.metrics.units = units.len();

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
            "units" => self.metrics.units,
            "identifiers" => self.metrics.identifiers,
            "bytes" => self.metrics.source_bytes
        );

        Ok(TokenStream::from_units(units))
    }

    /// Consume one maximal separator run starting at a non-word byte and
    /// return the index just past it.
    fn scan_separator_run(&mut self, source: &[u8], start: usize, marks: &Landmarks) -> usize {
        let len = source.len();
        let mut state = ScanState::Normal;
        let mut i = start;

        while i < len {
            match state {
                ScanState::Normal => {
                    if is_word_byte(source[i]) {
                        break;
                    }
                    let (next_state, next_i) = self.open_item(source, i, marks);
                    state = next_state;
                    i = next_i;
                }
                ScanState::InBlockComment => {
                    if source[i] == b'*' && i + 1 < len && source[i + 1] == b'/' {
                        i += 2;
                        state = ScanState::Normal;
                    } else {
                        i += 1;
                    }
                }
                ScanState::InLineComment => {
                    if is_line_end(source[i]) {
                        state = ScanState::Normal;
                    }
                    i += 1;
                }
                ScanState::InString => match source[i] {
                    b'"' => {
                        i += 1;
                        state = ScanState::Normal;
                    }
                    // An escape only applies when a closing quote remains
                    // beyond the escaped byte.
                    b'\\' if Landmarks::has_at_or_after(marks.last_quote, i + 2) => i += 2,
                    _ => i += 1,
                },
                ScanState::InInclude => {
                    if source[i] == b'>' {
                        state = ScanState::Normal;
                    }
                    i += 1;
                }
            }
        }

        i.min(len)
    }

    /// Decide which item opens at `i` and where scanning continues
    fn open_item(&mut self, source: &[u8], i: usize, marks: &Landmarks) -> (ScanState, usize) {
        let next = source.get(i + 1).copied();

        match source[i] {
            b'/' if next == Some(b'*')
                && Landmarks::has_at_or_after(marks.last_block_close, i + 2) =>
            {
                self.metrics.block_comments += 1;
                (ScanState::InBlockComment, i + 2)
            }
            b'/' if next == Some(b'/')
                && Landmarks::has_at_or_after(marks.last_line_end, i + 2) =>
            {
                self.metrics.line_comments += 1;
                (ScanState::InLineComment, i + 2)
            }
            b'"' if Landmarks::has_at_or_after(marks.last_quote, i + 1) => {
                self.metrics.string_literals += 1;
                (ScanState::InString, i + 1)
            }
            b'#' => match include_body_start(source, i) {
                Some(body) if Landmarks::has_at_or_after(marks.last_angle_close, body) => {
                    self.metrics.includes += 1;
                    (ScanState::InInclude, body)
                }
                _ => (ScanState::Normal, i + 1),
            },
            _ => (ScanState::Normal, i + 1),
        }
    }
}

impl Default for SourceTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// For `# *include *<` at `hash`, the index just past `<`
fn include_body_start(source: &[u8], hash: usize) -> Option<usize> {
    let skip_spaces = |mut j: usize| {
        while source.get(j) == Some(&b' ') {
            j += 1;
        }
        j
    };

    let keyword = skip_spaces(hash + 1);
    let after_keyword = keyword + b"include".len();
    if source.get(keyword..after_keyword) != Some(b"include".as_slice()) {
        return None;
    }

    let angle = skip_spaces(after_keyword);
    (source.get(angle) == Some(&b'<')).then_some(angle + 1)
}
