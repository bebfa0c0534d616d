use std::fmt;

use crate::types::Document;

/// Content hash of a loaded corpus. Two loads of an unchanged directory give
/// the same fingerprint; any added, removed, renamed or edited file changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorpusFingerprint([u8; 32]);

impl CorpusFingerprint {
    pub fn of(docs: &[Document]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(docs.len() as u64).to_le_bytes());
        for doc in docs {
            // Length prefixes keep ("ab","c") and ("a","bc") apart.
            hasher.update(&(doc.source.len() as u64).to_le_bytes());
            hasher.update(doc.source.as_bytes());
            hasher.update(&(doc.content.len() as u64).to_le_bytes());
            hasher.update(doc.content.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(12);
        s
    }
}

impl fmt::Display for CorpusFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(blake3::Hash::from(self.0).to_hex().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_for_identical_input() {
        let docs = vec![Document::new("a.txt", "alpha"), Document::new("b.txt", "bravo")];
        assert_eq!(CorpusFingerprint::of(&docs), CorpusFingerprint::of(&docs.clone()));
    }

    #[test]
    fn changes_with_content_or_source() {
        let base = CorpusFingerprint::of(&[Document::new("a.txt", "alpha")]);
        assert_ne!(base, CorpusFingerprint::of(&[Document::new("a.txt", "alpha!")]));
        assert_ne!(base, CorpusFingerprint::of(&[Document::new("b.txt", "alpha")]));
        assert_ne!(base, CorpusFingerprint::of(&[]));
    }

    #[test]
    fn short_form_is_prefix() {
        let fp = CorpusFingerprint::of(&[]);
        assert_eq!(fp.short().len(), 12);
        assert!(fp.to_string().starts_with(&fp.short()));
    }
}
