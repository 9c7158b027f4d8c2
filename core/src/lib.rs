pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod merge;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod select;
pub mod stage_log;
pub mod stem;
pub mod stopwords;
pub mod tagger;
pub mod tf;

pub use document::{DocId, Document, IdScheme, PageText};
pub use error::{Error, Result};
pub use index::{Index, IndexEntry, Posting};
pub use merge::{DuplicatePolicy, MergeStats};
pub use persist::{IndexPaths, IndexStore, MergeReport};
pub use pipeline::Pipeline;
pub use tf::TfRecord;
