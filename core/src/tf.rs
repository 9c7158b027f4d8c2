use std::collections::BTreeMap;
use std::fmt::Write;

use crate::document::DocId;

/// Term frequencies of one document, sorted ascending by term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TfRecord {
    entries: Vec<(String, u32)>,
}

impl TfRecord {
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for term in terms {
            let term = term.into();
            if term.is_empty() { continue; }
            *counts.entry(term).or_insert(0) += 1;
        }
        Self { entries: counts.into_iter().collect() }
    }

    pub fn entries(&self) -> &[(String, u32)] { &self.entries }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn count(&self, term: &str) -> Option<u32> {
        self.entries
            .binary_search_by(|(t, _)| t.as_str().cmp(term))
            .ok()
            .map(|i| self.entries[i].1)
    }

    /// Fixed-width rendering: term in 15 columns, count in 5, document id in 15.
    pub fn to_lines(&self, doc_id: DocId) -> String {
        let mut out = String::new();
        for (term, count) in &self.entries {
            let _ = writeln!(out, "{term:>15}{count:>5}{doc_id:>15}");
        }
        out
    }
}
