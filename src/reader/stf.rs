//! Tokenizer for the legacy STF block format.
//!
//! The format is a tree of `keyword ( ... )` blocks holding bare words,
//! numbers and quoted strings. Keywords are matched case-insensitively.
//! Anything a reader does not recognise is skipped together with its block.

use crate::error::{ConsistError, Result};
use crate::units::{canonical_speed_unit, to_meters_per_second};

/// Physical quantity a float literal is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    /// Plain number, any unit suffix is ignored.
    None,
    /// Speed, converted to m/s.
    Speed,
}

/// One lexical item of an STF file.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub text: String,
    pub quoted: bool,
    pub line: usize,
}

impl Item {
    fn bare(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            quoted: false,
            line,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.quoted && self.text == "("
    }

    pub fn is_close(&self) -> bool {
        !self.quoted && self.text == ")"
    }
}

pub struct StfReader {
    text: String,
    pos: usize,
    line: usize,
    peeked: Option<Item>,
}

/// Decodes raw file bytes, honouring UTF-16 and UTF-8 byte order marks.
/// Malformed text fails rather than being patched with replacement characters.
pub fn decode(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => decode_utf8(rest),
        _ => decode_utf8(bytes),
    }
}

pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| ConsistError::InvalidEncoding { encoding: "UTF-8" })
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let invalid = || ConsistError::InvalidEncoding { encoding: "UTF-16" };
    if bytes.len() % 2 != 0 {
        return Err(invalid());
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| invalid())
}

impl StfReader {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
            line: 1,
            peeked: None,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(decode(bytes)?))
    }

    pub fn line(&self) -> usize {
        self.peeked.as_ref().map_or(self.line, |item| item.line)
    }

    pub fn next_item(&mut self) -> Option<Item> {
        self.peeked.take().or_else(|| self.lex())
    }

    pub fn peek_item(&mut self) -> Option<&Item> {
        if self.peeked.is_none() {
            self.peeked = self.lex();
        }
        self.peeked.as_ref()
    }

    /// Consumes the next item, failing unless it is the bare word `expected`.
    pub fn must_match(&mut self, expected: &str) -> Result<()> {
        match self.next_item() {
            Some(item) if !item.quoted && item.text.eq_ignore_ascii_case(expected) => Ok(()),
            Some(item) => Err(ConsistError::UnexpectedToken {
                expected: expected.to_string(),
                found: item.text,
                line: item.line,
            }),
            None => Err(ConsistError::UnexpectedEof {
                expected: expected.to_string(),
            }),
        }
    }

    /// Reads the next item verbatim, delimiters included.
    pub fn read_string(&mut self) -> Result<String> {
        self.next_item()
            .map(|item| item.text)
            .ok_or_else(|| ConsistError::UnexpectedEof {
                expected: "string".to_string(),
            })
    }

    pub fn read_int(&mut self) -> Result<i32> {
        let item = self.expect_item("integer")?;
        item.text
            .parse::<i32>()
            .map_err(|_| ConsistError::InvalidLiteral {
                kind: "integer",
                value: item.text.clone(),
                line: item.line,
            })
    }

    /// Reads a float with an optional attached unit suffix such as `160km/h`.
    pub fn read_float(&mut self, units: Units) -> Result<f32> {
        let item = self.expect_item("float")?;
        let (number, suffix) = split_unit(&item.text);
        let value = number
            .parse::<f32>()
            .map_err(|_| ConsistError::InvalidLiteral {
                kind: "float",
                value: item.text.clone(),
                line: item.line,
            })?;

        match units {
            Units::Speed => Ok(to_meters_per_second(value, canonical_speed_unit(suffix))),
            Units::None => {
                if !suffix.is_empty() {
                    log::debug!("Ignoring unit '{}' on line {}", suffix, item.line);
                }
                Ok(value)
            }
        }
    }

    /// Reads `( "value" ... )`, ignoring anything after the first value.
    pub fn read_string_block(&mut self) -> Result<String> {
        self.must_match("(")?;
        let item = self.expect_item(")")?;
        if item.is_close() {
            return Ok(String::new());
        }
        self.skip_rest_of_block()?;
        Ok(item.text)
    }

    pub fn read_int_block(&mut self) -> Result<i32> {
        self.must_match("(")?;
        let value = self.read_int()?;
        self.skip_rest_of_block()?;
        Ok(value)
    }

    pub fn read_float_block(&mut self, units: Units) -> Result<f32> {
        self.must_match("(")?;
        let value = self.read_float(units)?;
        self.skip_rest_of_block()?;
        Ok(value)
    }

    /// Consumes items up to and including the close delimiter of the block
    /// whose opening delimiter has already been read.
    pub fn skip_rest_of_block(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let item = self.expect_item(")")?;
            if item.is_open() {
                depth += 1;
            } else if item.is_close() {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Skips the body of an unrecognised keyword, if it has one.
    pub fn skip_unknown(&mut self, keyword: &str) -> Result<()> {
        log::debug!("Skipping unknown token '{}' on line {}", keyword, self.line());
        if self.peek_item().is_some_and(Item::is_open) {
            self.next_item();
            self.skip_rest_of_block()?;
        }
        Ok(())
    }

    /// Returns the next keyword inside the current block in lower case, or
    /// `None` once the block's close delimiter has been consumed.
    pub fn next_keyword(&mut self) -> Result<Option<String>> {
        loop {
            let item = self.expect_item(")")?;
            if item.is_close() {
                return Ok(None);
            }
            if item.is_open() {
                self.skip_rest_of_block()?;
                continue;
            }
            if item.quoted {
                continue;
            }
            return Ok(Some(item.text.to_ascii_lowercase()));
        }
    }

    /// Like [`StfReader::next_keyword`] but at file level, where the end of
    /// input rather than a delimiter ends the sequence.
    pub fn next_file_keyword(&mut self) -> Result<Option<String>> {
        while let Some(item) = self.next_item() {
            if item.is_close() {
                return Err(ConsistError::UnexpectedToken {
                    expected: "keyword".to_string(),
                    found: item.text,
                    line: item.line,
                });
            }
            if item.is_open() {
                self.skip_rest_of_block()?;
                continue;
            }
            if item.quoted {
                continue;
            }
            return Ok(Some(item.text.to_ascii_lowercase()));
        }
        Ok(None)
    }

    fn expect_item(&mut self, expected: &str) -> Result<Item> {
        self.next_item().ok_or_else(|| ConsistError::UnexpectedEof {
            expected: expected.to_string(),
        })
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn lex(&mut self) -> Option<Item> {
        self.skip_whitespace();
        let line = self.line;

        match self.peek_char()? {
            c @ ('(' | ')') => {
                self.bump();
                Some(Item::bare(c.to_string(), line))
            }
            '"' => {
                let mut text = self.lex_quoted();
                // "a" + "b" concatenates
                loop {
                    let (pos, line) = (self.pos, self.line);
                    self.skip_whitespace();
                    if self.peek_char() == Some('+') {
                        self.bump();
                        self.skip_whitespace();
                        if self.peek_char() == Some('"') {
                            text.push_str(&self.lex_quoted());
                            continue;
                        }
                    }
                    self.pos = pos;
                    self.line = line;
                    break;
                }
                Some(Item {
                    text,
                    quoted: true,
                    line,
                })
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek_char() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        break;
                    }
                    self.bump();
                }
                Some(Item::bare(&self.text[start..self.pos], line))
            }
        }
    }

    fn lex_quoted(&mut self) -> String {
        let mut text = String::new();
        self.bump();
        while let Some(c) = self.bump() {
            match c {
                '"' => break,
                '\\' => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => break,
                },
                _ => text.push(c),
            }
        }
        text
    }
}

/// Splits `160km/h` into `("160", "km/h")`.
fn split_unit(text: &str) -> (&str, &str) {
    let bytes = text.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let accept = match bytes[end] {
            b'0'..=b'9' | b'.' => true,
            b'-' | b'+' => end == 0 || matches!(bytes[end - 1], b'e' | b'E'),
            b'e' | b'E' => {
                end > 0
                    && bytes
                        .get(end + 1)
                        .is_some_and(|next| next.is_ascii_digit() || matches!(next, b'-' | b'+'))
            }
            _ => false,
        };
        if !accept {
            break;
        }
        end += 1;
    }
    (&text[..end], &text[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn items(source: &str) -> Vec<String> {
        let mut stf = StfReader::new(source);
        std::iter::from_fn(|| stf.next_item().map(|item| item.text)).collect()
    }

    #[test]
    fn lexes_delimiters_words_and_strings() {
        assert_eq!(
            items("Name(\"Two words\" ) Serial ( 3 )"),
            vec!["Name", "(", "Two words", ")", "Serial", "(", "3", ")"]
        );
    }

    #[test]
    fn quoted_strings_unescape_and_concatenate() {
        assert_eq!(items(r#""a\"b" + "c\n" x"#), vec!["a\"bc\n", "x"]);
        assert_eq!(items(r#""a" + b"#), vec!["a", "+", "b"]);
    }

    #[test]
    fn quoted_delimiter_is_not_a_delimiter() {
        let mut stf = StfReader::new("\")\" )");
        let quoted = stf.next_item().unwrap();
        assert!(!quoted.is_close());
        assert!(stf.next_item().unwrap().is_close());
    }

    #[test]
    fn tracks_lines() {
        let mut stf = StfReader::new("a\n\nb");
        assert_eq!(stf.next_item().unwrap().line, 1);
        assert_eq!(stf.next_item().unwrap().line, 3);
    }

    #[test]
    fn must_match_reports_mismatch() {
        let mut stf = StfReader::new("Serial ( 1 )");
        match stf.must_match("(") {
            Err(ConsistError::UnexpectedToken { expected, found, line }) => {
                assert_eq!(expected, "(");
                assert_eq!(found, "Serial");
                assert_eq!(line, 1);
            }
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
        assert!(matches!(
            StfReader::new("").must_match(")"),
            Err(ConsistError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn reads_speed_with_units() {
        let mut stf = StfReader::new("44.704 160km/h 100mph 36kph 1.5e1");
        assert_relative_eq!(stf.read_float(Units::Speed).unwrap(), 44.704);
        assert_relative_eq!(stf.read_float(Units::Speed).unwrap(), 44.444_443, epsilon = 1e-4);
        assert_relative_eq!(stf.read_float(Units::Speed).unwrap(), 44.704, epsilon = 1e-3);
        assert_relative_eq!(stf.read_float(Units::Speed).unwrap(), 10.0, epsilon = 1e-5);
        assert_relative_eq!(stf.read_float(Units::None).unwrap(), 15.0);
    }

    #[test]
    fn invalid_literals_are_errors() {
        assert!(matches!(
            StfReader::new("abc").read_int(),
            Err(ConsistError::InvalidLiteral { kind: "integer", .. })
        ));
        assert!(matches!(
            StfReader::new("km/h").read_float(Units::Speed),
            Err(ConsistError::InvalidLiteral { kind: "float", .. })
        ));
    }

    #[test]
    fn block_reads_skip_trailing_content() -> Result<()> {
        let mut stf = StfReader::new("( 12 extra ( nested ) ) ( \"x\" ) next");
        assert_eq!(stf.read_int_block()?, 12);
        assert_eq!(stf.read_string_block()?, "x");
        assert_eq!(stf.read_string()?, "next");

        let mut empty = StfReader::new("( ) after");
        assert_eq!(empty.read_string_block()?, "");
        assert_eq!(empty.read_string()?, "after");
        Ok(())
    }

    #[test]
    fn keywords_skip_unknown_blocks() -> Result<()> {
        let mut stf = StfReader::new("Comment ( ( a ) b ) \"q\" UiD ( 4 ) ) tail");
        assert_eq!(stf.next_keyword()?.as_deref(), Some("comment"));
        stf.skip_unknown("comment")?;
        assert_eq!(stf.next_keyword()?.as_deref(), Some("uid"));
        assert_eq!(stf.read_int_block()?, 4);
        assert_eq!(stf.next_keyword()?, None);
        assert_eq!(stf.read_string()?, "tail");
        Ok(())
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let mut stf = StfReader::new("Wagon ( UiD ( 1 )");
        assert!(matches!(
            stf.next_file_keyword(),
            Ok(Some(ref keyword)) if keyword == "wagon"
        ));
        stf.must_match("(").unwrap();
        assert_eq!(stf.next_keyword().unwrap().as_deref(), Some("uid"));
        stf.read_int_block().unwrap();
        assert!(matches!(
            stf.next_keyword(),
            Err(ConsistError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn decodes_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Train ( )".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode(&bytes).unwrap(), "Train ( )");
        assert_eq!(decode(&[0xEF, 0xBB, 0xBF, b'a']).unwrap(), "a");
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(matches!(
            decode(b"Train ( \xFF )"),
            Err(ConsistError::InvalidEncoding { encoding: "UTF-8" })
        ));
        // Odd byte count and an unpaired surrogate
        assert!(matches!(
            decode(&[0xFF, 0xFE, b'a']),
            Err(ConsistError::InvalidEncoding { encoding: "UTF-16" })
        ));
        assert!(matches!(
            decode(&[0xFF, 0xFE, 0x00, 0xD8, b'a', 0x00]),
            Err(ConsistError::InvalidEncoding { encoding: "UTF-16" })
        ));
    }
}
