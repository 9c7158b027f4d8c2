use std::io;
use std::path::PathBuf;

use crate::document::DocId;
use crate::tagger::TaggerError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("tagging failed for document {doc_id}: {source}")]
    Tagging {
        doc_id: DocId,
        #[source]
        source: TaggerError,
    },

    #[error("malformed index {path:?} at line {line}: {reason}")]
    MalformedIndex { path: PathBuf, line: usize, reason: String },

    #[error("merge of document {doc_id} failed while {step}: {source}")]
    MergeIo {
        doc_id: DocId,
        step: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("document id {doc_id} for {url} is already taken by {existing}")]
    IdCollision { doc_id: DocId, existing: String, url: String },

    #[error("failed to read stopword list {path:?}: {source}")]
    Stopwords {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported stemmer language `{language}`")]
    UnsupportedLanguage { language: String },

    #[error("invalid config {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::Io { context: context.into(), source }
    }

    pub(crate) fn merge_io(doc_id: DocId, step: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::MergeIo { doc_id, step, source }
    }
}
