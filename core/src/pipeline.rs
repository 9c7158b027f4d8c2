use crate::config::PipelineConfig;
use crate::document::{Document, IdScheme, PageText};
use crate::error::{Error, Result};
use crate::normalize::normalize;
use crate::persist::{IndexStore, MergeReport};
use crate::select::select_keywords;
use crate::stage_log::{DirectorySink, Stage, StageSink, TracingSink};
use crate::stem::{stem_all, SnowballStemmer, Stemmer};
use crate::stopwords::StopwordFilter;
use crate::tagger::{CommandTagger, HeuristicTagger, Tagger};
use crate::tf::TfRecord;

/// Turns one document into a TF record and merges it into an index store.
pub struct Pipeline {
    tagger: Box<dyn Tagger>,
    stemmer: Box<dyn Stemmer>,
    stopwords: StopwordFilter,
    sinks: Vec<Box<dyn StageSink>>,
    id_scheme: IdScheme,
}

impl Pipeline {
    pub fn new(tagger: Box<dyn Tagger>, stemmer: Box<dyn Stemmer>, stopwords: StopwordFilter) -> Self {
        Self { tagger, stemmer, stopwords, sinks: Vec::new(), id_scheme: IdScheme::default() }
    }

    pub fn with_sink(mut self, sink: Box<dyn StageSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_id_scheme(mut self, id_scheme: IdScheme) -> Self {
        self.id_scheme = id_scheme;
        self
    }

    pub fn from_config(cfg: &PipelineConfig) -> Result<Self> {
        let tagger: Box<dyn Tagger> = match (CommandTagger::from_argv(&cfg.tagger.command), &cfg.tagger.lexicon) {
            (Some(command), _) => Box::new(command),
            (None, Some(path)) => Box::new(
                HeuristicTagger::load_lexicon(path)
                    .map_err(|e| Error::Config { path: path.clone(), message: e.to_string() })?,
            ),
            (None, None) => Box::new(HeuristicTagger::new()),
        };
        let stemmer = SnowballStemmer::for_language(&cfg.stemmer_language)
            .ok_or_else(|| Error::UnsupportedLanguage { language: cfg.stemmer_language.clone() })?;
        let stopwords = match &cfg.stopwords {
            Some(path) => StopwordFilter::load(path)?,
            None => StopwordFilter::default(),
        };
        let mut pipeline = Self::new(tagger, Box::new(stemmer), stopwords)
            .with_id_scheme(cfg.id_scheme)
            .with_sink(Box::new(TracingSink));
        if let Some(dir) = &cfg.stage_dir {
            pipeline = pipeline.with_sink(Box::new(DirectorySink::new(dir)));
        }
        Ok(pipeline)
    }

    pub fn document(&self, url: &str, page: &PageText) -> Document { Document::from_page(url, page, self.id_scheme) }

    /// Run every stage up to the TF record.
    pub fn analyze(&self, doc: &Document) -> Result<TfRecord> {
        let tokenized = normalize(&doc.raw_text);
        self.record(doc, Stage::Tokenized, &tokenized);

        let tagged = if tokenized.is_empty() {
            String::new()
        } else {
            self.tagger.tag(&tokenized).map_err(|source| Error::Tagging { doc_id: doc.id, source })?
        };
        self.record(doc, Stage::Tagged, &tagged);

        let selected = select_keywords(&tagged);
        self.record(doc, Stage::Selected, &selected.join(" "));

        let filtered = self.stopwords.filter(selected);
        self.record(doc, Stage::StopwordRemoval, &filtered.join(" "));

        let stemmed = stem_all(self.stemmer.as_ref(), filtered);
        self.record(doc, Stage::Stemmed, &stemmed.join(" "));

        let tf = TfRecord::from_terms(stemmed);
        self.record(doc, Stage::Tf, &tf.to_lines(doc.id));
        tracing::debug!(doc_id = doc.id, url = %doc.url, terms = tf.len(), "analyzed document");
        Ok(tf)
    }

    /// Analyze a document and merge it into the store.
    pub fn index(&self, store: &IndexStore, doc: &Document) -> Result<MergeReport> {
        let tf = self.analyze(doc)?;
        if tf.is_empty() {
            tracing::warn!(doc_id = doc.id, url = %doc.url, "document produced no terms");
        }
        store.merge_document(doc, &tf)
    }

    fn record(&self, doc: &Document, stage: Stage, text: &str) {
        for sink in &self.sinks {
            if let Err(e) = sink.record(doc.id, stage, text) {
                tracing::warn!(doc_id = doc.id, stage = stage.name(), error = %e, "failed to record stage output");
            }
        }
    }
}
