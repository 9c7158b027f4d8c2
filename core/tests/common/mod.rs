#![allow(dead_code)]

use webidx_core::stem::SnowballStemmer;
use webidx_core::stopwords::StopwordFilter;
use webidx_core::tagger::{Tagger, TaggerError};
use webidx_core::{Document, IdScheme, Pipeline, TfRecord};

/// Tags every token as a singular noun.
pub struct AllNouns;

impl Tagger for AllNouns {
    fn tag(&self, text: &str) -> Result<String, TaggerError> {
        Ok(text.split(' ').map(|w| format!("{w}_NN")).collect::<Vec<_>>().join(" "))
    }
}

pub struct Broken;

impl Tagger for Broken {
    fn tag(&self, _text: &str) -> Result<String, TaggerError> { Err(TaggerError::Utf8 { program: "broken".into() }) }
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(Box::new(AllNouns), Box::new(SnowballStemmer::english()), StopwordFilter::from_words(Vec::<String>::new()))
}

pub fn doc(url: &str, text: &str) -> Document { Document::new(url, text, IdScheme::Sha1) }

pub fn tf(terms: &[&str]) -> TfRecord { TfRecord::from_terms(terms.iter().copied()) }
