//! Minimal bencode reader for torrent metadata
//!
//! The engine needs exactly one thing out of a fetched torrent file: the
//! `name` field of its `info` dictionary. Per the BitTorrent specification
//! that field carries the suggested file name (single-file torrents) or the
//! directory containing all data files (multi-file torrents), which makes it
//! the natural content identifier for on-disk duplicate checks.
//!
//! This is a complete bencode value parser (integers, byte strings, lists,
//! dictionaries) with a recursion depth cap, but it deliberately exposes
//! only [`extract_name`].

use crate::{Error, Result};

/// Maximum nesting depth accepted before a payload is rejected as malformed
const MAX_DEPTH: usize = 32;

/// A decoded bencode value
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    /// Integer (`i...e`)
    Int(i64),
    /// Byte string (`<len>:<bytes>`)
    Bytes(Vec<u8>),
    /// List (`l...e`)
    List(Vec<Value>),
    /// Dictionary (`d...e`), keys kept in wire order
    Dict(Vec<(Vec<u8>, Value)>),
}

impl Value {
    /// Look up a dictionary key
    fn get(&self, key: &[u8]) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Extract the content identifier (`info.name`) from a torrent payload
///
/// Returns [`Error::InvalidTorrent`] if the payload is not valid bencode,
/// is missing the `info` dictionary or `name` field, or if the name is not
/// valid UTF-8. All of these are fetch-level errors from the engine's point
/// of view: the URL stays claimed-but-unfinished.
pub fn extract_name(payload: &[u8]) -> Result<String> {
    let mut parser = Parser::new(payload);
    let root = parser.parse_value(0)?;

    let info = root
        .get(b"info")
        .ok_or_else(|| Error::InvalidTorrent("missing info dictionary".to_string()))?;

    let name = match info.get(b"name") {
        Some(Value::Bytes(bytes)) => bytes,
        Some(_) => {
            return Err(Error::InvalidTorrent(
                "info.name is not a byte string".to_string(),
            ));
        }
        None => {
            return Err(Error::InvalidTorrent(
                "missing info.name field".to_string(),
            ));
        }
    };

    String::from_utf8(name.clone())
        .map_err(|_| Error::InvalidTorrent("info.name is not valid UTF-8".to_string()))
}

/// Cursor over a bencoded byte slice
struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Peek at the next byte without consuming it
    fn peek(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::InvalidTorrent("unexpected end of data".to_string()))
    }

    /// Consume and return the next byte
    fn bump(&mut self) -> Result<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Parse any bencode value at the current position
    fn parse_value(&mut self, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(Error::InvalidTorrent(format!(
                "nesting deeper than {} levels",
                MAX_DEPTH
            )));
        }

        match self.peek()? {
            b'i' => self.parse_int(),
            b'l' => self.parse_list(depth),
            b'd' => self.parse_dict(depth),
            b'0'..=b'9' => Ok(Value::Bytes(self.parse_bytes()?)),
            other => Err(Error::InvalidTorrent(format!(
                "unexpected byte 0x{:02x} at offset {}",
                other, self.pos
            ))),
        }
    }

    /// Parse `i<digits>e`
    fn parse_int(&mut self) -> Result<Value> {
        self.bump()?; // consume 'i'

        let start = self.pos;
        while self.peek()? != b'e' {
            self.pos += 1;
        }

        let digits = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| Error::InvalidTorrent("non-ASCII integer".to_string()))?;
        let value = digits
            .parse::<i64>()
            .map_err(|_| Error::InvalidTorrent(format!("invalid integer '{}'", digits)))?;

        self.bump()?; // consume 'e'
        Ok(Value::Int(value))
    }

    /// Parse `<len>:<bytes>`
    fn parse_bytes(&mut self) -> Result<Vec<u8>> {
        let start = self.pos;
        while self.peek()? != b':' {
            if !self.peek()?.is_ascii_digit() {
                return Err(Error::InvalidTorrent(format!(
                    "invalid length prefix at offset {}",
                    self.pos
                )));
            }
            self.pos += 1;
        }

        let digits = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| Error::InvalidTorrent("non-ASCII length prefix".to_string()))?;
        let len = digits
            .parse::<usize>()
            .map_err(|_| Error::InvalidTorrent(format!("invalid length '{}'", digits)))?;

        self.bump()?; // consume ':'

        let end = self.pos.checked_add(len).filter(|&e| e <= self.data.len());
        let end = end.ok_or_else(|| {
            Error::InvalidTorrent(format!("byte string of length {} overruns data", len))
        })?;

        let bytes = self.data[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    /// Parse `l<values>e`
    fn parse_list(&mut self, depth: usize) -> Result<Value> {
        self.bump()?; // consume 'l'

        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.parse_value(depth + 1)?);
        }

        self.bump()?; // consume 'e'
        Ok(Value::List(items))
    }

    /// Parse `d<key-value pairs>e`
    fn parse_dict(&mut self, depth: usize) -> Result<Value> {
        self.bump()?; // consume 'd'

        let mut entries = Vec::new();
        while self.peek()? != b'e' {
            let key = self.parse_bytes()?;
            let value = self.parse_value(depth + 1)?;
            entries.push((key, value));
        }

        self.bump()?; // consume 'e'
        Ok(Value::Dict(entries))
    }
}
