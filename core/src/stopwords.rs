use lazy_static::lazy_static;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

lazy_static! {
    static ref DEFAULT_STOPWORDS: Vec<&'static str> = vec![
        "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
        "be","because","been","before","being","below","between","both","but","by",
        "can","can't","cannot","could","couldn't",
        "did","didn't","do","does","doesn't","doing","don't","down","during",
        "each","few","for","from","further",
        "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
        "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
        "let's","me","more","most","mustn't","my","myself",
        "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
        "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
        "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
        "under","until","up","very",
        "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
        "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
    ];
}

/// Case-sensitive stopword list, loaded once per run.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    words: HashSet<String>,
}

impl Default for StopwordFilter {
    fn default() -> Self { Self::from_words(DEFAULT_STOPWORDS.iter().copied()) }
}

impl StopwordFilter {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { words: words.into_iter().map(Into::into).collect() }
    }

    /// One word per line; blank lines are ignored.
    pub fn parse(list: &str) -> Self {
        Self::from_words(list.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let list = fs::read_to_string(path).map_err(|source| Error::Stopwords { path: path.to_path_buf(), source })?;
        let filter = Self::parse(&list);
        tracing::debug!(?path, words = filter.len(), "loaded stopword list");
        Ok(filter)
    }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    pub fn is_stopword(&self, token: &str) -> bool { self.words.contains(token) }

    pub fn filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens.into_iter().filter(|t| !t.is_empty() && !self.is_stopword(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> { s.split(' ').map(String::from).collect() }

    #[test]
    fn removes_every_occurrence() {
        let filter = StopwordFilter::parse("the\nand\n\n  of  \n");
        assert_eq!(filter.len(), 3);
        assert_eq!(filter.filter(words("the cat and the hat of")), words("cat hat"));
    }

    #[test]
    fn match_is_case_sensitive() {
        let filter = StopwordFilter::parse("the");
        assert_eq!(filter.filter(words("The the")), words("The"));
    }

    #[test]
    fn default_list() {
        let filter = StopwordFilter::default();
        assert!(filter.is_stopword("the"));
        assert!(!filter.is_stopword("rust"));
    }
}
