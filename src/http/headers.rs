//! Header collection.
//!
//! Field names are case-insensitive. Parsed names are stored lower-cased,
//! names added with [`Headers::add_header`] keep the casing they were given
//! so outgoing messages read naturally. Entries keep insertion order, which
//! is also the order they are serialized in.

use crate::http::error::{Error, Result};

pub const CRLF: &[u8] = b"\r\n";

pub const CONTENT_TYPE_TEXT_PLAIN: &str = "text/plain";
pub const CONTENT_TYPE_TEXT_HTML: &str = "text/html";

/// Token characters allowed in a field name besides ASCII letters and digits.
const TOKEN_SYMBOLS: &[u8] = b"!#$%&'*+-.^_`|~";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses at most one field line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// ends the header block was reached. `(0, false)` means `data` does not
    /// hold a complete line yet and the caller must supply more bytes.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool)> {
        let Some(index) = find_crlf(data) else {
            return Ok((0, false));
        };
        if index == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = &data[..index];
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Err(Error::MalformedHeaderLine(
                String::from_utf8_lossy(line).into_owned(),
            ));
        };
        let (raw_name, raw_value) = (&line[..colon], &line[colon + 1..]);

        if raw_name.last().is_some_and(|&b| is_field_whitespace(b)) {
            return Err(Error::TrailingWhitespaceInName(
                String::from_utf8_lossy(raw_name).into_owned(),
            ));
        }
        let name = trim_field_whitespace(raw_name);
        if !is_valid_field_name(name) {
            return Err(Error::InvalidFieldName(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }

        // Validated as ASCII above.
        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        let value = String::from_utf8_lossy(trim_field_whitespace(raw_value)).into_owned();
        self.merge(name, value);

        Ok((index + CRLF.len(), false))
    }

    /// Looks up a field value, ignoring the case of `name`.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.position(name)
            .map(|i| self.entries[i].1.as_str())
            .ok_or_else(|| Error::FieldNotPresent(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Inserts a field without validation, replacing any existing entry of
    /// the same name in place.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.position(&name) {
            Some(i) => self.entries[i] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Declares the trailer fields that will follow a chunked body.
    pub fn add_trailers<S: AsRef<str>>(&mut self, names: &[S]) {
        let joined = names
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ");
        self.add_header("Trailer", joined);
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.add_header("Content-Type", content_type);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes every entry as a field line followed by the blank line
    /// that ends the block.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (name, value) in self.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        buf.extend_from_slice(CRLF);
        buf
    }

    fn merge(&mut self, name: String, value: String) {
        match self.position(&name) {
            Some(i) => {
                let existing = &mut self.entries[i].1;
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => self.entries.push((name, value)),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}

fn is_valid_field_name(name: &[u8]) -> bool {
    !name.is_empty()
        && name
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || TOKEN_SYMBOLS.contains(b))
}

/// ASCII whitespace including vertical tab, which `u8::is_ascii_whitespace`
/// leaves out.
fn is_field_whitespace(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

fn trim_field_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&b| !is_field_whitespace(b))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&b| !is_field_whitespace(b))
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_line_needs_more_bytes() {
        let mut headers = Headers::new();
        assert_eq!(headers.parse(b"Host: loc").unwrap(), (0, false));
        assert!(headers.is_empty());
    }

    #[test]
    fn token_symbols_are_accepted() {
        let mut headers = Headers::new();
        headers.parse(b"X-A!#$%&'*+.^_`|~9: v\r\n").unwrap();
        assert_eq!(headers.get("x-a!#$%&'*+.^_`|~9").unwrap(), "v");
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b": value\r\n").unwrap_err();
        assert!(matches!(err, Error::InvalidFieldName(_)));
    }
}
