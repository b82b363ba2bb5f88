//! Company name normalization and on-disk naming

use sha2::{Digest, Sha256};
use std::fmt;

/// Extension of every cached logo file
pub const LOGO_EXTENSION: &str = "png";

/// Longest file stem written to disk. Keeps `<stem>.png` and the
/// `.<stem>.<uuid>.tmp` temp names well under the usual 255-byte limit.
pub const MAX_FILE_STEM_LEN: usize = 150;

/// Readable part kept in front of the digest for over-long keys
const HASHED_PREFIX_LEN: usize = 80;

/// Separates the prefix from the digest in hashed stems. Percent-encoding
/// always escapes `=`, so hashed stems never clash with plain ones.
const HASH_SEPARATOR: char = '=';

/// Normalized company key: trimmed, Unicode case-folded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

/// What a cached file name tells us about the key it was written for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredKey {
    /// Short keys are stored whole
    Exact(CacheKey),
    /// Long keys keep only a prefix in front of their digest
    Hashed { prefix: String },
}

impl CacheKey {
    /// Normalize a company name. Blank names have no key.
    pub fn new(company_name: &str) -> Option<Self> {
        let normalized = caseless::default_case_fold_str(company_name.trim());
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// Interpret a cached file name, if it is one the cache could have written
    pub fn parse_file_name(file_name: &str) -> Option<StoredKey> {
        let stem = file_name.strip_suffix(&format!(".{LOGO_EXTENSION}"))?;
        if stem.is_empty() {
            return None;
        }

        if let Some((prefix, digest)) = stem.rsplit_once(HASH_SEPARATOR) {
            let is_digest = digest.len() == 64
                && digest
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
            if !is_digest || prefix.len() > HASHED_PREFIX_LEN {
                return None;
            }
            let prefix = urlencoding::decode(prefix).ok()?;
            return Some(StoredKey::Hashed {
                prefix: prefix.into_owned(),
            });
        }

        let decoded = urlencoding::decode(stem).ok()?;
        // Only accept names we would have produced ourselves
        let key = Self::new(&decoded)?;
        (key.file_stem() == stem).then_some(StoredKey::Exact(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is too long to be stored under its own name
    pub fn is_hashed(&self) -> bool {
        urlencoding::encode(&self.0).len() > MAX_FILE_STEM_LEN
    }

    /// Percent-encoded key; injective and free of path separators.
    ///
    /// Keys whose encoding exceeds [`MAX_FILE_STEM_LEN`] become an encoded
    /// prefix followed by `=` and the SHA-256 of the full key.
    pub fn file_stem(&self) -> String {
        let encoded = urlencoding::encode(&self.0);
        if encoded.len() <= MAX_FILE_STEM_LEN {
            return encoded.into_owned();
        }

        let mut stem = String::with_capacity(HASHED_PREFIX_LEN + 65);
        let mut buf = [0u8; 4];
        for ch in self.0.chars() {
            let piece = urlencoding::encode(ch.encode_utf8(&mut buf));
            if stem.len() + piece.len() > HASHED_PREFIX_LEN {
                break;
            }
            stem.push_str(&piece);
        }

        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let hash = hasher.finalize();

        stem.push(HASH_SEPARATOR);
        stem.push_str(&format!("{hash:x}"));
        stem
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), LOGO_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
