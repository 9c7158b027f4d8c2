//! Streaming two-way merge of a sorted index with one document's TF record.
//!
//! Both inputs are ascending by term, so a single forward pass is enough:
//! index entries before the current TF term are carried unchanged, equal terms
//! gain a posting, and TF terms missing from the index become new entries at
//! their sorted position. Leftovers on either side are drained.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::iter::Peekable;
use std::slice;

use crate::document::DocId;
use crate::index::{IndexEntry, Posting};
use crate::tf::TfRecord;

/// What to do when a document is merged into an entry that already lists it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Leave the entry untouched.
    #[default]
    Skip,
    /// Append the posting again. The owner is still never added to its own postings.
    Append,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Existing entries that gained a posting.
    pub matched: usize,
    /// New entries created for terms not yet indexed.
    pub inserted: usize,
    /// Existing entries passed through unchanged.
    pub carried: usize,
    /// Matches ignored because the document was already listed.
    pub skipped_duplicates: usize,
}

impl MergeStats {
    pub fn terms(&self) -> usize { self.matched + self.inserted + self.carried + self.skipped_duplicates }
}

enum Step {
    Done,
    Failed,
    Carry,
    Match,
    Insert,
}

/// Iterator over the merged index. Errors from the index side are passed
/// through as they are met.
pub struct SortedMerge<'a, I: Iterator> {
    index: Peekable<I>,
    record: Peekable<slice::Iter<'a, (String, u32)>>,
    doc_id: DocId,
    policy: DuplicatePolicy,
    stats: MergeStats,
}

impl<'a, I, E> SortedMerge<'a, I>
where
    I: Iterator<Item = Result<IndexEntry, E>>,
{
    pub fn new(index: I, tf: &'a TfRecord, doc_id: DocId, policy: DuplicatePolicy) -> Self {
        Self {
            index: index.peekable(),
            record: tf.entries().iter().peekable(),
            doc_id,
            policy,
            stats: MergeStats::default(),
        }
    }

    pub fn stats(&self) -> MergeStats { self.stats }

    fn step(&mut self) -> Step {
        match (self.index.peek(), self.record.peek()) {
            (None, None) => Step::Done,
            (Some(Err(_)), _) => Step::Failed,
            (Some(Ok(_)), None) => Step::Carry,
            (None, Some(_)) => Step::Insert,
            (Some(Ok(entry)), Some((term, _))) => match entry.term.as_str().cmp(term.as_str()) {
                Ordering::Less => Step::Carry,
                Ordering::Equal => Step::Match,
                Ordering::Greater => Step::Insert,
            },
        }
    }

    fn add_posting(&mut self, entry: &mut IndexEntry, count: u32) {
        let listed = match self.policy {
            DuplicatePolicy::Skip => entry.contains_doc(self.doc_id),
            DuplicatePolicy::Append => entry.owner == self.doc_id,
        };
        if listed {
            self.stats.skipped_duplicates += 1;
        } else {
            entry.postings.push(Posting { doc_id: self.doc_id, count });
            self.stats.matched += 1;
        }
    }
}

impl<'a, I, E> Iterator for SortedMerge<'a, I>
where
    I: Iterator<Item = Result<IndexEntry, E>>,
{
    type Item = Result<IndexEntry, E>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Step::Done => None,
            Step::Failed => self.index.next(),
            Step::Carry => {
                self.stats.carried += 1;
                self.index.next()
            }
            Step::Match => {
                let mut entry = match self.index.next()? {
                    Ok(entry) => entry,
                    Err(e) => return Some(Err(e)),
                };
                let (_, count) = self.record.next()?;
                self.add_posting(&mut entry, *count);
                Some(Ok(entry))
            }
            Step::Insert => {
                let (term, count) = self.record.next()?;
                self.stats.inserted += 1;
                Some(Ok(IndexEntry::new(term.clone(), *count, self.doc_id)))
            }
        }
    }
}
