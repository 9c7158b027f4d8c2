use rust_stemmers::Algorithm;

/// Reduces a single word to its stem. Implementations keep no state between calls.
pub trait Stemmer {
    fn stem(&self, word: &str) -> String;
}

impl<F> Stemmer for F
where
    F: Fn(&str) -> String,
{
    fn stem(&self, word: &str) -> String { self(word) }
}

/// Snowball stemmer from `rust-stemmers`.
pub struct SnowballStemmer {
    inner: rust_stemmers::Stemmer,
}

impl SnowballStemmer {
    pub fn new(algorithm: Algorithm) -> Self { Self { inner: rust_stemmers::Stemmer::create(algorithm) } }

    pub fn english() -> Self { Self::new(Algorithm::English) }

    /// Build a stemmer from a language name such as `"english"` or `"german"`.
    pub fn for_language(name: &str) -> Option<Self> { algorithm_for(name).map(Self::new) }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, word: &str) -> String { self.inner.stem(word).into_owned() }
}

fn algorithm_for(name: &str) -> Option<Algorithm> {
    let algorithm = match name.to_ascii_lowercase().as_str() {
        "arabic" => Algorithm::Arabic,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "english" => Algorithm::English,
        "finnish" => Algorithm::Finnish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "tamil" => Algorithm::Tamil,
        "turkish" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}

/// Stem every token in order. Tokens that stem to nothing are dropped.
pub fn stem_all(stemmer: &dyn Stemmer, tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().map(|t| stemmer.stem(&t)).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_snowball() {
        let stemmer = SnowballStemmer::english();
        let words = ["cats", "eat", "fish", "sleep"].map(String::from).to_vec();
        assert_eq!(stem_all(&stemmer, words), vec!["cat", "eat", "fish", "sleep"]);
    }

    #[test]
    fn closures_are_stemmers() {
        let upper = |w: &str| w.to_uppercase();
        assert_eq!(stem_all(&upper, vec!["a".into(), "b".into()]), vec!["A", "B"]);
    }

    #[test]
    fn language_lookup() {
        assert!(SnowballStemmer::for_language("English").is_some());
        assert!(SnowballStemmer::for_language("klingon").is_none());
    }
}
