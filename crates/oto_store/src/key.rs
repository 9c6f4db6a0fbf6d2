//! Composite-key parsing.
//!
//! Two key shapes address the store:
//! - `tts_files/<id>.mp3` selects the synthesized-speech cache;
//! - `<source>_files/<file>` selects a provider's audio collection, where
//!   `<source>` is the non-empty text before the first `_files/` and
//!   `<file>` is the non-empty remainder after it.
//!
//! Anything else resolves to no key at all, and the store answers such
//! requests with absence before touching the disk.

/// Separator between a provider name and its collection directory.
const SOURCE_SEP: &str = "_files/";

/// Prefix selecting the synthesized-speech cache.
const TTS_PREFIX: &str = "tts_files/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKey {
    /// Synthesized-speech cache entry. The identifier is the key remainder
    /// with the first `.mp3` removed; the cache re-appends the extension
    /// when it builds the path.
    Tts { identifier: String },
    /// Source-audio entry addressed by provider and file name.
    Source { source: String, file: String },
}

impl ObjectKey {
    /// Parse a composite key, or `None` when the shape is unrecognized.
    /// The cache prefix wins over the generic source shape, so
    /// `tts_files/...` never parses as a source named `tts`.
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(rest) = key.strip_prefix(TTS_PREFIX) {
            return Some(Self::Tts {
                identifier: rest.replacen(".mp3", "", 1),
            });
        }

        let (idx, _) = key.match_indices(SOURCE_SEP).find(|(idx, _)| *idx > 0)?;
        let source = &key[..idx];
        let file = &key[idx + SOURCE_SEP.len()..];
        if file.is_empty() {
            return None;
        }
        Some(Self::Source {
            source: source.to_owned(),
            file: file.to_owned(),
        })
    }
}
