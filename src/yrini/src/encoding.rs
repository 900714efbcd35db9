// yrini/src/encoding.rs

//! Encoding detection for INI files.
//!
//! Mod INIs come in whatever the author's editor saved: UTF-8 with or without
//! BOM, GBK, the occasional Windows-1252. Detection order is BOM, caller
//! preference, strict UTF-8, a confident `chardetng` guess, then UTF-8. A
//! failed decode gets one retry as GBK before it becomes fatal.

use crate::error::{IniError, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GBK, UTF_8};
use std::path::Path;

/// Decoded text and the encoding it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Picks a decoder for raw file bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingSniffer {
    preferred: Option<&'static Encoding>,
}

impl EncodingSniffer {
    /// Create a sniffer with no preferred encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `encoding` before autodetection.
    pub fn with_preferred(mut self, encoding: Option<&'static Encoding>) -> Self {
        self.preferred = encoding;
        self
    }

    /// Preferred encoding, if any.
    pub fn preferred(&self) -> Option<&'static Encoding> {
        self.preferred
    }

    /// Decode file bytes. `path` only labels the error.
    pub fn decode(&self, bytes: &[u8], path: &Path) -> Result<Decoded> {
        if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
            return self.decode_with(&bytes[bom_length..], encoding, path);
        }

        if let Some(preferred) = self.preferred {
            if let Some(decoded) = strict(bytes, preferred) {
                return Ok(decoded);
            }
            log::debug!(
                "{} is not valid {}, detecting encoding",
                path.display(),
                preferred.name()
            );
        }

        if let Some(decoded) = strict(bytes, UTF_8) {
            return Ok(decoded);
        }

        self.decode_with(bytes, detect(bytes), path)
    }

    /// Decode with `primary`, falling back to GBK.
    pub fn decode_with(
        &self,
        bytes: &[u8],
        primary: &'static Encoding,
        path: &Path,
    ) -> Result<Decoded> {
        if let Some(decoded) = strict(bytes, primary) {
            return Ok(decoded);
        }
        if primary != GBK {
            if let Some(decoded) = strict(bytes, GBK) {
                log::debug!(
                    "{} is not valid {}, decoded as GBK",
                    path.display(),
                    primary.name()
                );
                return Ok(decoded);
            }
        }
        Err(IniError::decode(path, primary))
    }
}

fn strict(bytes: &[u8], encoding: &'static Encoding) -> Option<Decoded> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| Decoded {
            text: text.into_owned(),
            encoding,
        })
}

/// Confident `chardetng` guess, otherwise UTF-8.
fn detect(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    match detector.guess_assess(None, true) {
        (encoding, true) => encoding,
        _ => UTF_8,
    }
}

/// Encode text for writing. Fails on characters `encoding` cannot represent.
pub fn encode(text: &str, encoding: &'static Encoding, path: &Path) -> Result<Vec<u8>> {
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(IniError::Encode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_string(),
        });
    }
    Ok(bytes.into_owned())
}
