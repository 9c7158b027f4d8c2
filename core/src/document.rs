use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use unicode_normalization::UnicodeNormalization;

use crate::normalize;

pub type DocId = u64;

/// How a document id is derived from its URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// Sum of the UTF-16 code units of the tokenized URL. Different URLs can
    /// collide; collisions are caught by the document registry.
    #[default]
    CharSum,
    /// First 8 bytes of SHA-1 over the URL, masked to 63 bits.
    Sha1,
}

impl IdScheme {
    pub fn doc_id(self, url: &str) -> DocId {
        match self {
            IdScheme::CharSum => char_sum_id(url),
            IdScheme::Sha1 => sha1_id(url),
        }
    }
}

/// Each token counts with one trailing space, matching the `"tok tok "` stream
/// the id was historically computed over.
fn char_sum_id(url: &str) -> DocId {
    normalize::tokens(url)
        .map(|tok| tok.encode_utf16().map(DocId::from).sum::<DocId>() + DocId::from(b' '))
        .sum()
}

fn sha1_id(url: &str) -> DocId {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) & (u64::MAX >> 1)
}

/// Visible text pulled out of a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub title: String,
    pub body_text: String,
    pub meta_contents: Vec<String>,
}

impl PageText {
    /// Title, body and meta contents joined by spaces, NFKC-normalized and lowercased.
    pub fn assemble(&self) -> String {
        let mut raw = String::with_capacity(self.title.len() + self.body_text.len() + 2);
        raw.push_str(&self.title);
        raw.push(' ');
        raw.push_str(&self.body_text);
        raw.push(' ');
        raw.push_str(&self.meta_contents.join(" "));
        raw.nfkc().collect::<String>().to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub raw_text: String,
}

impl Document {
    pub fn new(url: impl Into<String>, raw_text: impl Into<String>, scheme: IdScheme) -> Self {
        let url = url.into();
        Self { id: scheme.doc_id(&url), url, raw_text: raw_text.into() }
    }

    pub fn from_page(url: impl Into<String>, page: &PageText, scheme: IdScheme) -> Self {
        Self::new(url, page.assemble(), scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_sum_counts_tokens_and_separators() {
        // "ab" -> 97 + 98 + 32
        assert_eq!(IdScheme::CharSum.doc_id("ab"), 227);
        // "a" "b"(dropped) -> 97 + 32
        assert_eq!(IdScheme::CharSum.doc_id("a/b"), 129);
        assert_eq!(IdScheme::CharSum.doc_id(""), 0);
    }

    #[test]
    fn char_sum_is_weak() {
        assert_eq!(IdScheme::CharSum.doc_id("http://ab.com"), IdScheme::CharSum.doc_id("http://ba.com"));
        assert_ne!(IdScheme::Sha1.doc_id("http://ab.com"), IdScheme::Sha1.doc_id("http://ba.com"));
    }

    #[test]
    fn ids_are_deterministic() {
        let url = "https://example.com/a/page.html";
        assert_eq!(IdScheme::CharSum.doc_id(url), IdScheme::CharSum.doc_id(url));
        assert_eq!(IdScheme::Sha1.doc_id(url), IdScheme::Sha1.doc_id(url));
        assert!(IdScheme::Sha1.doc_id(url) <= i64::MAX as u64);
    }

    #[test]
    fn page_text_is_lowercased() {
        let page = PageText {
            title: "Rust".into(),
            body_text: "Systems ﬁles".into(),
            meta_contents: vec!["Fast".into(), "Safe".into()],
        };
        assert_eq!(page.assemble(), "rust systems files fast safe");
    }
}
