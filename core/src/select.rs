/// POS tags worth indexing: singular nouns, adjectives, cardinal numbers,
/// adverbs and third-person-singular present verbs.
pub const KEYWORD_TAGS: [&str; 5] = ["NN", "JJ", "CD", "RB", "VBZ"];

/// Split `word_TAG` at its final underscore. Tokens without one carry no tag.
pub fn split_tag(token: &str) -> Option<(&str, &str)> { token.rsplit_once('_') }

/// Keep tagged tokens whose tag is a keyword tag and return their plain words.
pub fn select_keywords(tagged: &str) -> Vec<String> {
    tagged
        .split(' ')
        .filter_map(split_tag)
        .filter(|(word, tag)| !word.is_empty() && KEYWORD_TAGS.contains(tag))
        .map(|(word, _)| word.to_string())
        .collect()
}
