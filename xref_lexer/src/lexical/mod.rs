//! Lexical layer for hyperlinked source rendering
//!
//! The tokenizer does not parse C; it only separates the bytes that may be
//! cross-referenced (identifiers) from everything else (separators), keeping
//! comments, quoted literals and `#include <...>` directives whole.

pub mod analyzer;

use crate::config::constants::compile_time::lexical::LINE_SENTINEL;

pub use analyzer::{ScanState, SourceTokenizer, TokenizerError, TokenizerMetrics};

/// One separator run followed by an optional identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUnit {
    /// Raw separator bytes, line feeds included
    pub separator: Vec<u8>,
    /// ASCII word run; empty when the run ends the input
    pub identifier: String,
}

/// Result of tokenizing one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    units: Vec<TokenUnit>,
    /// Source that contained no separator at all
    unseparated: Vec<u8>,
}

impl TokenStream {
    pub(crate) fn from_units(units: Vec<TokenUnit>) -> Self {
        Self {
            units,
            unseparated: Vec::new(),
        }
    }

    pub(crate) fn unseparated(source: Vec<u8>) -> Self {
        Self {
            units: Vec::new(),
            unseparated: source,
        }
    }

    pub fn units(&self) -> &[TokenUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.unseparated.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .map(|unit| unit.identifier.as_str())
            .filter(|identifier| !identifier.is_empty())
    }

    /// Line-oriented wire form: `separator\nidentifier\n` per unit with the
    /// final line feed dropped. Line feeds inside separators are written as
    /// the sentinel byte so every unit occupies exactly two lines.
    pub fn encode(&self) -> Vec<u8> {
        if self.units.is_empty() {
            return self.unseparated.clone();
        }

        let capacity = self
            .units
            .iter()
            .map(|unit| unit.separator.len() + unit.identifier.len() + 2)
            .sum();
        let mut out = Vec::with_capacity(capacity);

        for unit in &self.units {
            out.extend(
                unit.separator
                    .iter()
                    .map(|&b| if b == b'\n' { LINE_SENTINEL } else { b }),
            );
            out.push(b'\n');
            out.extend_from_slice(unit.identifier.as_bytes());
            out.push(b'\n');
        }

        out.pop();
        out
    }
}

/// Tokenize raw source bytes with a fresh tokenizer
pub fn tokenize(source: &[u8]) -> Result<TokenStream, TokenizerError> {
    SourceTokenizer::new().tokenize(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_alternates_lines() {
        let stream = tokenize(b"a = b;").unwrap();
        assert_eq!(stream.encode(), b"a = \nb\n;\n".to_vec());
    }

    #[test]
    fn test_encode_replaces_newlines_in_separators() {
        let stream = tokenize(b"/* x\ny */\nint").unwrap();
        assert_eq!(stream.encode(), b"/* x\x01y */\x01\nint".to_vec());
    }

    #[test]
    fn test_sentinel_in_source_ends_line_comment() {
        let stream = tokenize(b"// c\x01x").unwrap();
        assert_eq!(stream.units().len(), 1);
        assert_eq!(stream.units()[0].identifier, "x");
    }

    #[test]
    fn test_identifiers() {
        let stream = tokenize(b"foo(bar, \"baz\") /* qux */").unwrap();
        let identifiers: Vec<&str> = stream.identifiers().collect();
        assert_eq!(identifiers, vec!["bar"]);
    }

    #[test]
    fn test_empty_stream() {
        let stream = tokenize(b"").unwrap();
        assert!(stream.is_empty());
        assert_eq!(stream.encode(), Vec::<u8>::new());
    }
}
