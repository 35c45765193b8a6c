//! Page address parsing and formatting
//!
//! Address format: <scheme>://<host>[:port][/path][?query][#fragment]

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Parsed page address with decoded query pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAddress {
    origin: String,
    path: String,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl PageAddress {
    /// Parse from an absolute address string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        // Split scheme from the rest
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| Error::Malformed(format!("missing scheme in '{}'", s)))?;

        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(Error::Malformed(format!("bad scheme '{}'", scheme)));
        }

        // Host (and port) runs until the path, query or fragment
        let authority_end = rest.find(|c| matches!(c, '/' | '?' | '#')).unwrap_or(rest.len());
        let (authority, rest) = rest.split_at(authority_end);
        if authority.is_empty() {
            return Err(Error::Malformed(format!("missing host in '{}'", s)));
        }

        let (rest, fragment) = match rest.split_once('#') {
            Some((before, fragment)) => (before, Some(fragment.to_string())),
            None => (rest, None),
        };

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (rest, Vec::new()),
        };

        Ok(Self {
            origin: format!("{}://{}", scheme, authority),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            fragment,
        })
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter, decoded
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set a parameter, replacing every existing occurrence in place
    pub fn set_query_param(&mut self, name: &str, value: &str) {
        match self.query.iter().position(|(key, _)| key == name) {
            Some(index) => {
                self.query[index].1 = value.to_string();
                let mut seen = false;
                self.query.retain(|(key, _)| {
                    if key != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.query.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_query_param(&mut self, name: &str) {
        self.query.retain(|(key, _)| key != name);
    }

    /// Another page on the same origin, without query or fragment
    pub fn with_path(&self, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        Self {
            origin: self.origin.clone(),
            path,
            query: Vec::new(),
            fragment: None,
        }
    }

    /// Format as address string
    pub fn to_url(&self) -> String {
        let mut url = format!("{}{}", self.origin, self.path);

        if !self.query.is_empty() {
            let pairs: Vec<String> = self
                .query
                .iter()
                .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }

        if let Some(fragment) = &self.fragment {
            url.push('#');
            url.push_str(fragment);
        }

        url
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for PageAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (percent_decode(key), percent_decode(value)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

/// Escape everything outside the unreserved set
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// Form-style decoding: `%XX` escapes and `+` as space. Broken escapes
/// are kept verbatim.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => match (bytes.get(i + 1), bytes.get(i + 2)) {
                (Some(&hi), Some(&lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                    out.push(hex_value(hi) << 4 | hex_value(lo));
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
