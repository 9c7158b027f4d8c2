use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // space, \t, \n, \r, \f and the punctuation set `",.:;?![]'/`
    static ref DELIMITERS: Regex = Regex::new(r#"[ \t\n\r\x0C",.:;?!\[\]'/]+"#).expect("valid regex");
}

/// Split text into index-worthy tokens, in order.
///
/// Parentheses are stripped from inside tokens. Tokens of exactly one
/// character survive only when they are `a`, `i` or an ASCII digit.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    DELIMITERS
        .split(text)
        .map(|tok| tok.replace(['(', ')'], ""))
        .filter(|tok| keep_token(tok))
}

/// Length is counted in UTF-16 units, so a lone astral character such as an
/// emoji is two units long and survives.
fn keep_token(tok: &str) -> bool {
    match tok.encode_utf16().count() {
        0 => false,
        1 => tok.chars().next().is_some_and(is_word_char),
        _ => true,
    }
}

fn is_word_char(c: char) -> bool { c == 'a' || c == 'i' || c.is_ascii_digit() }

/// Normalize raw page text into a single-space separated token stream.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    tokens(&lowered).collect::<Vec<_>>().join(" ")
}
