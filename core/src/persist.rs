use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

use crate::document::{DocId, Document};
use crate::error::{Error, Result};
use crate::index::{Index, IndexEntry};
use crate::merge::{DuplicatePolicy, MergeStats, SortedMerge};
use crate::tf::TfRecord;

pub const FORMAT_VERSION: u32 = 1;

/// Maps each merged document id to the URL it was derived from.
pub type DocumentRegistry = BTreeMap<DocId, String>;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub updated_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.txt") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn corrupt(&self) -> PathBuf { self.root.join("index.txt.corrupt") }
    fn index_tmp(&self) -> PathBuf { self.root.join("index.txt.tmp") }
    fn lock(&self) -> PathBuf { self.root.join("index.lock") }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub doc_id: DocId,
    pub stats: MergeStats,
    pub num_terms: usize,
    /// No usable index existed; this document started a new one.
    pub bootstrapped: bool,
    /// A malformed index was moved aside before bootstrapping.
    pub recovered: bool,
}

/// Reads `index.txt` one entry at a time, checking that terms ascend.
pub struct IndexReader<R> {
    lines: Lines<R>,
    path: PathBuf,
    line_no: usize,
    prev: Option<String>,
}

impl IndexReader<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> { Ok(Self::new(BufReader::new(File::open(path)?), path)) }
}

impl<R: BufRead> IndexReader<R> {
    pub fn new(reader: R, path: &Path) -> Self {
        Self { lines: reader.lines(), path: path.to_path_buf(), line_no: 0, prev: None }
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedIndex { path: self.path.clone(), line: self.line_no, reason: reason.into() }
    }
}

impl<R: BufRead> Iterator for IndexReader<R> {
    type Item = Result<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_no += 1;
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => return Some(Err(self.malformed(e.to_string()))),
                Err(e) => return Some(Err(Error::io(format!("reading {}", self.path.display()), e))),
            };
            if line.trim().is_empty() { continue; }
            let entry = match IndexEntry::parse_line(&line) {
                Ok(entry) => entry,
                Err(reason) => return Some(Err(self.malformed(reason))),
            };
            if let Some(prev) = &self.prev {
                if *prev >= entry.term {
                    return Some(Err(self.malformed(format!("term `{}` is not after `{prev}`", entry.term))));
                }
            }
            self.prev = Some(entry.term.clone());
            return Some(Ok(entry));
        }
    }
}

/// The persisted index. Every merge streams the current `index.txt` into a
/// temp file and renames it into place, holding exclusive access throughout.
pub struct IndexStore {
    paths: IndexPaths,
    policy: DuplicatePolicy,
    guard: Mutex<()>,
}

impl IndexStore {
    pub fn open<P: AsRef<Path>>(root: P, policy: DuplicatePolicy) -> Result<Self> {
        let paths = IndexPaths::new(root);
        fs::create_dir_all(&paths.root).map_err(|e| Error::io(format!("creating {}", paths.root.display()), e))?;
        Ok(Self { paths, policy, guard: Mutex::new(()) })
    }

    pub fn paths(&self) -> &IndexPaths { &self.paths }

    /// Read the whole index. A missing file is an empty index; a malformed one is an error.
    pub fn load(&self) -> Result<Index> {
        let _guard = self.guard.lock();
        let path = self.paths.index();
        let reader = match IndexReader::open(&path) {
            Ok(reader) => reader,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Index::new()),
            Err(e) => return Err(Error::io(format!("opening {}", path.display()), e)),
        };
        let entries = reader.collect::<Result<Vec<_>>>()?;
        Index::from_entries(entries).map_err(|reason| Error::MalformedIndex { path, line: 0, reason })
    }

    pub fn documents(&self) -> Result<DocumentRegistry> { load_registry(&self.paths) }

    pub fn meta(&self) -> Result<Option<MetaFile>> { load_meta(&self.paths) }

    /// Merge one document's TF record into the persisted index.
    pub fn merge_document(&self, doc: &Document, tf: &TfRecord) -> Result<MergeReport> {
        let _guard = self.guard.lock();
        let lock = self.lock_exclusive(doc.id)?;

        let mut registry = match load_registry(&self.paths) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable document registry, starting a new one");
                DocumentRegistry::new()
            }
        };
        if let Some(existing) = registry.get(&doc.id) {
            if *existing != doc.url {
                return Err(Error::IdCollision { doc_id: doc.id, existing: existing.clone(), url: doc.url.clone() });
            }
        }

        let mut report = MergeReport { doc_id: doc.id, stats: MergeStats::default(), num_terms: 0, bootstrapped: false, recovered: false };
        let index_path = self.paths.index();
        let merged = match IndexReader::open(&index_path) {
            Ok(reader) => {
                let mut merge = SortedMerge::new(reader, tf, doc.id, self.policy);
                match self.write_tmp(doc.id, merge.by_ref()) {
                    Ok(n) => Some((n, merge.stats())),
                    Err(Error::MalformedIndex { path, line, reason }) => {
                        tracing::warn!(doc_id = doc.id, ?path, line, %reason, "malformed index, rebuilding from current document");
                        fs::rename(&index_path, self.paths.corrupt()).map_err(Error::merge_io(doc.id, "moving malformed index aside"))?;
                        report.recovered = true;
                        registry.clear();
                        None
                    }
                    Err(Error::Io { source, .. }) => return Err(Error::MergeIo { doc_id: doc.id, step: "reading index", source }),
                    Err(e) => return Err(e),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(doc_id = doc.id, "no index yet, bootstrapping");
                None
            }
            Err(e) => return Err(Error::MergeIo { doc_id: doc.id, step: "opening index", source: e }),
        };
        let (num_terms, stats) = match merged {
            Some(done) => done,
            None => {
                report.bootstrapped = true;
                let mut merge = SortedMerge::new(std::iter::empty::<Result<IndexEntry>>(), tf, doc.id, self.policy);
                let n = self.write_tmp(doc.id, merge.by_ref())?;
                (n, merge.stats())
            }
        };

        report.stats = stats;
        report.num_terms = num_terms;

        // Sidecars are staged before the index is replaced, so a failure up to
        // the rename leaves every file as it was.
        registry.insert(doc.id, doc.url.clone());
        let meta = MetaFile {
            num_docs: registry.len() as u32,
            num_terms: num_terms as u32,
            updated_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "".into()),
            version: FORMAT_VERSION,
        };
        let docs_tmp = match stage_registry(&self.paths, &registry) {
            Ok(tmp) => tmp,
            Err(e) => {
                self.discard_tmp();
                return Err(Error::MergeIo { doc_id: doc.id, step: "staging document registry", source: e });
            }
        };
        let meta_tmp = match stage_meta(&self.paths, &meta) {
            Ok(tmp) => tmp,
            Err(e) => {
                self.discard_tmp();
                discard(&docs_tmp);
                return Err(Error::MergeIo { doc_id: doc.id, step: "staging meta", source: e });
            }
        };
        if let Err(e) = fs::rename(self.paths.index_tmp(), &index_path) {
            self.discard_tmp();
            discard(&docs_tmp);
            discard(&meta_tmp);
            return Err(Error::MergeIo { doc_id: doc.id, step: "replacing index", source: e });
        }
        // The merge is committed; a sidecar that cannot be swapped in is only stale.
        for (tmp, dest) in [(docs_tmp, self.paths.docs()), (meta_tmp, self.paths.meta())] {
            if let Err(e) = fs::rename(&tmp, &dest) {
                tracing::warn!(doc_id = doc.id, ?dest, error = %e, "failed to replace sidecar file");
                discard(&tmp);
            }
        }
        drop(lock);

        tracing::info!(
            doc_id = doc.id,
            matched = stats.matched,
            inserted = stats.inserted,
            skipped = stats.skipped_duplicates,
            num_terms,
            bootstrapped = report.bootstrapped,
            "merged document into index"
        );
        Ok(report)
    }

    fn lock_exclusive(&self, doc_id: DocId) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.paths.lock())
            .map_err(Error::merge_io(doc_id, "opening lock file"))?;
        file.lock_exclusive().map_err(Error::merge_io(doc_id, "locking index"))?;
        Ok(file)
    }

    /// Stream entries into the temp file. The temp file is removed on any error;
    /// read errors from `entries` are returned as they are.
    fn write_tmp<I>(&self, doc_id: DocId, entries: I) -> Result<usize>
    where
        I: Iterator<Item = Result<IndexEntry>>,
    {
        let result = write_entries(&self.paths.index_tmp(), doc_id, entries);
        if result.is_err() {
            self.discard_tmp();
        }
        result
    }

    fn discard_tmp(&self) { discard(&self.paths.index_tmp()) }
}

fn write_entries<I>(tmp: &Path, doc_id: DocId, entries: I) -> Result<usize>
where
    I: Iterator<Item = Result<IndexEntry>>,
{
    let file = File::create(tmp).map_err(Error::merge_io(doc_id, "creating temp index"))?;
    let mut out = BufWriter::new(file);
    let mut written = 0;
    for entry in entries {
        writeln!(out, "{}", entry?.to_line()).map_err(Error::merge_io(doc_id, "writing temp index"))?;
        written += 1;
    }
    let file = out
        .into_inner()
        .map_err(|e| Error::MergeIo { doc_id, step: "flushing temp index", source: e.into_error() })?;
    file.sync_all().map_err(Error::merge_io(doc_id, "syncing temp index"))?;
    Ok(written)
}

fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(?tmp, error = %e, "failed to remove temp file");
        }
    }
}

/// Write `<path>.tmp` and sync it; the caller renames it into place.
fn stage(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let written = File::create(&tmp).and_then(|mut f| {
        f.write_all(bytes)?;
        f.sync_all()
    });
    match written {
        Ok(()) => Ok(tmp),
        Err(e) => {
            discard(&tmp);
            Err(e)
        }
    }
}

fn stage_registry(paths: &IndexPaths, registry: &DocumentRegistry) -> io::Result<PathBuf> {
    let json = serde_json::to_vec_pretty(registry)?;
    stage(&paths.docs(), &json)
}

pub fn load_registry(paths: &IndexPaths) -> Result<DocumentRegistry> {
    let path = paths.docs();
    match fs::read(&path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| Error::MalformedIndex { path, line: e.line(), reason: e.to_string() }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DocumentRegistry::new()),
        Err(e) => Err(Error::io(format!("reading {}", path.display()), e)),
    }
}

fn stage_meta(paths: &IndexPaths, meta: &MetaFile) -> io::Result<PathBuf> {
    let json = serde_json::to_string_pretty(meta)?;
    stage(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<Option<MetaFile>> {
    let path = paths.meta();
    match fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::MalformedIndex { path, line: e.line(), reason: e.to_string() }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(format!("reading {}", path.display()), e)),
    }
}
