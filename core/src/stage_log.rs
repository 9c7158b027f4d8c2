use std::fs;
use std::io;
use std::path::PathBuf;

use crate::document::DocId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokenized,
    Tagged,
    Selected,
    StopwordRemoval,
    Stemmed,
    Tf,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Tokenized => "tokenized",
            Stage::Tagged => "tagged",
            Stage::Selected => "selected",
            Stage::StopwordRemoval => "stopwordremoval",
            Stage::Stemmed => "stemmed",
            Stage::Tf => "TF",
        }
    }
}

/// Receives the text each stage produced for a document.
pub trait StageSink {
    fn record(&self, doc_id: DocId, stage: Stage, text: &str) -> io::Result<()>;
}

/// Emits stage text as debug events.
pub struct TracingSink;

impl StageSink for TracingSink {
    fn record(&self, doc_id: DocId, stage: Stage, text: &str) -> io::Result<()> {
        tracing::debug!(doc_id, stage = stage.name(), bytes = text.len(), text, "stage output");
        Ok(())
    }
}

/// Writes `<doc_id><stage>.txt` files into a directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn path_for(&self, doc_id: DocId, stage: Stage) -> PathBuf { self.dir.join(format!("{doc_id}{}.txt", stage.name())) }
}

impl StageSink for DirectorySink {
    fn record(&self, doc_id: DocId, stage: Stage, text: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(doc_id, stage), text)
    }
}
