use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::Write;

use crate::document::DocId;
use crate::merge::{DuplicatePolicy, MergeStats, SortedMerge};
use crate::tf::TfRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub count: u32, // occurrences in this document
}

/// One term of the index. `first_count` belongs to `owner`, the document that
/// introduced the term, and is never updated; later documents go to `postings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub term: String,
    pub first_count: u32,
    pub owner: DocId,
    pub postings: Vec<Posting>,
}

impl IndexEntry {
    pub fn new(term: impl Into<String>, first_count: u32, owner: DocId) -> Self {
        Self { term: term.into(), first_count, owner, postings: Vec::new() }
    }

    pub fn posting_ids(&self) -> impl Iterator<Item = DocId> + '_ { self.postings.iter().map(|p| p.doc_id) }

    /// Owner first, then postings in merge order.
    pub fn documents(&self) -> impl Iterator<Item = DocId> + '_ { std::iter::once(self.owner).chain(self.posting_ids()) }

    pub fn contains_doc(&self, doc_id: DocId) -> bool { self.documents().any(|d| d == doc_id) }

    /// `<term:>15> <first_count:>5> <owner:>20>` followed by ` doc:count` per posting.
    pub fn to_line(&self) -> String {
        let mut line = format!("{:>15} {:>5} {:>20}", self.term, self.first_count, self.owner);
        for p in &self.postings {
            let _ = write!(line, " {}:{}", p.doc_id, p.count);
        }
        line
    }

    pub fn parse_line(line: &str) -> Result<Self, String> {
        let mut fields = line.split(' ').filter(|f| !f.is_empty());
        let term = fields.next().ok_or("empty line")?;
        let first_count = parse_count(fields.next().ok_or("missing first count")?)?;
        let owner = fields
            .next()
            .ok_or("missing owner")?
            .parse::<DocId>()
            .map_err(|e| format!("bad owner id: {e}"))?;
        let mut entry = IndexEntry::new(term, first_count, owner);
        for field in fields {
            let (doc, count) = field.split_once(':').ok_or_else(|| format!("bad posting `{field}`"))?;
            let doc_id = doc.parse::<DocId>().map_err(|e| format!("bad posting id `{field}`: {e}"))?;
            if doc_id == owner {
                return Err(format!("owner {owner} listed in postings of `{term}`"));
            }
            entry.postings.push(Posting { doc_id, count: parse_count(count)? });
        }
        Ok(entry)
    }
}

fn parse_count(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("count must be positive".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("bad count `{s}`: {e}")),
    }
}

/// In-memory index, unique by term and sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    /// Index holding a single document: every term owned by it, no postings.
    pub fn bootstrap(doc_id: DocId, tf: &TfRecord) -> Self {
        let entries = tf.iter().map(|(term, count)| IndexEntry::new(term, count, doc_id)).collect();
        Self { entries }
    }

    /// Accepts entries only when terms are strictly ascending.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Result<Self, String> {
        if let Some(w) = entries.windows(2).find(|w| w[0].term >= w[1].term) {
            return Err(format!("term `{}` is not after `{}`", w[1].term, w[0].term));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[IndexEntry] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, term: &str) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by(|e| e.term.as_str().cmp(term))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn contains_document(&self, doc_id: DocId) -> bool { self.entries.iter().any(|e| e.contains_doc(doc_id)) }

    /// Fold one document into the index with a single pass over both sides.
    pub fn merge(&mut self, doc_id: DocId, tf: &TfRecord, policy: DuplicatePolicy) -> MergeStats {
        let current = std::mem::take(&mut self.entries);
        let mut merge = SortedMerge::new(current.into_iter().map(Ok::<_, Infallible>), tf, doc_id, policy);
        self.entries = merge.by_ref().map(|r| match r {
            Ok(entry) => entry,
            Err(never) => match never {},
        }).collect();
        merge.stats()
    }
}
