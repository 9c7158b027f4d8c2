use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// Part-of-speech tagger: turns a space separated token stream into
/// space separated `word_TAG` tokens.
pub trait Tagger {
    fn tag(&self, text: &str) -> Result<String, TaggerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    #[error("failed to run tagger `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("tagger `{program}` exited with {status}: {stderr}")]
    Exit { program: String, status: std::process::ExitStatus, stderr: String },
    #[error("tagger `{program}` produced invalid UTF-8")]
    Utf8 { program: String },
    #[error("failed to read lexicon {path}: {source}")]
    Lexicon {
        path: String,
        #[source]
        source: io::Error,
    },
}

lazy_static! {
    static ref CLOSED_CLASS: HashMap<&'static str, &'static str> = {
        let groups: &[(&str, &[&str])] = &[
            ("DT", &["a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no", "all", "both"]),
            ("IN", &["of", "in", "on", "at", "by", "for", "with", "from", "into", "about", "over", "under", "after", "before", "between", "through", "during", "without", "against", "if", "because", "while", "than"]),
            ("CC", &["and", "or", "but", "nor", "yet", "so"]),
            ("PRP", &["i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them"]),
            ("PRP$", &["my", "your", "his", "its", "our", "their"]),
            ("MD", &["can", "could", "may", "might", "must", "shall", "should", "will", "would"]),
            ("VBZ", &["is", "has", "does"]),
            ("VBP", &["are", "am", "have", "do"]),
            ("VBD", &["was", "were", "had", "did"]),
            ("VB", &["be"]),
            ("VBN", &["been"]),
            ("WDT", &["which", "what", "whatever"]),
            ("WRB", &["when", "where", "why", "how"]),
            ("TO", &["to"]),
            ("RB", &["not", "very", "too", "also", "often", "never", "always", "here", "there", "now", "then"]),
        ];
        groups.iter().flat_map(|(tag, words)| words.iter().map(move |w| (*w, *tag))).collect()
    };
    static ref ADJECTIVE_SUFFIXES: HashSet<&'static str> =
        ["able", "ible", "ous", "ful", "ive", "less", "ical", "ish", "ary"].into_iter().collect();
}

/// Rule based stand-in for a statistical tagger: closed-class word lists,
/// suffix rules and an optional `word TAG` lexicon that overrides both.
/// Anything unrecognised is tagged `NN`.
#[derive(Debug, Default, Clone)]
pub struct HeuristicTagger {
    lexicon: HashMap<String, String>,
}

impl HeuristicTagger {
    pub fn new() -> Self { Self::default() }

    pub fn with_lexicon(lexicon: HashMap<String, String>) -> Self { Self { lexicon } }

    /// Lexicon file: one `word TAG` pair per line, `#` starts a comment.
    pub fn load_lexicon(path: &Path) -> Result<Self, TaggerError> {
        let text = fs::read_to_string(path)
            .map_err(|source| TaggerError::Lexicon { path: path.display().to_string(), source })?;
        let lexicon = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split_once(char::is_whitespace))
            .map(|(w, t)| (w.to_string(), t.trim().to_string()))
            .collect();
        Ok(Self { lexicon })
    }

    fn tag_word<'a>(&'a self, word: &str) -> &'a str {
        if let Some(tag) = self.lexicon.get(word) {
            return tag;
        }
        if let Some(tag) = CLOSED_CLASS.get(word) {
            return *tag;
        }
        if word.chars().all(|c| c.is_ascii_digit() || c == '-') && word.chars().any(|c| c.is_ascii_digit()) {
            return "CD";
        }
        if word.len() > 4 && word.ends_with("ly") {
            return "RB";
        }
        if word.len() > 5 && word.ends_with("ing") {
            return "VBG";
        }
        if word.len() > 4 && word.ends_with("ed") {
            return "VBD";
        }
        if ADJECTIVE_SUFFIXES.iter().any(|s| word.len() > s.len() + 2 && word.ends_with(s)) {
            return "JJ";
        }
        "NN"
    }
}

impl Tagger for HeuristicTagger {
    fn tag(&self, text: &str) -> Result<String, TaggerError> {
        let tagged: Vec<String> = text
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(|w| format!("{w}_{}", self.tag_word(w)))
            .collect();
        Ok(tagged.join(" "))
    }
}

/// Runs an external tagger: the token stream is written to its stdin and
/// `word_TAG` tokens are read back from stdout.
#[derive(Debug, Clone)]
pub struct CommandTagger {
    program: String,
    args: Vec<String>,
}

impl CommandTagger {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self { Self { program: program.into(), args } }

    /// `argv[0]` is the program. Returns `None` for an empty command line.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl Tagger for CommandTagger {
    fn tag(&self, text: &str) -> Result<String, TaggerError> {
        let spawn_err = |source: io::Error| TaggerError::Spawn { program: self.program.clone(), source };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        // Fed from a separate thread so a chatty tagger cannot fill its stdout pipe and stall.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_string();
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });
        let output = child.wait_with_output();
        let fed = writer.map(|w| w.join());
        let output = output.map_err(spawn_err)?;
        if !output.status.success() {
            return Err(TaggerError::Exit {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Some(fed) = fed {
            match fed {
                Ok(result) => result.map_err(spawn_err)?,
                Err(_) => return Err(spawn_err(io::Error::other("stdin writer panicked"))),
            }
        }
        let stdout = String::from_utf8(output.stdout).map_err(|_| TaggerError::Utf8 { program: self.program.clone() })?;
        Ok(stdout.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_tags() {
        let tagger = HeuristicTagger::new();
        let tagged = tagger.tag("the cat quickly ran 42 running useful cats").unwrap();
        assert_eq!(tagged, "the_DT cat_NN quickly_RB ran_NN 42_CD running_VBG useful_JJ cats_NN");
    }

    #[test]
    fn lexicon_overrides_rules() {
        let mut lexicon = HashMap::new();
        lexicon.insert("ran".to_string(), "VBD".to_string());
        lexicon.insert("the".to_string(), "NN".to_string());
        let tagger = HeuristicTagger::with_lexicon(lexicon);
        assert_eq!(tagger.tag("the ran").unwrap(), "the_NN ran_VBD");
    }

    #[test]
    fn empty_text() {
        assert_eq!(HeuristicTagger::new().tag("").unwrap(), "");
    }

    #[test]
    fn missing_program_is_an_error() {
        let tagger = CommandTagger::new("definitely-not-a-real-tagger-binary", vec![]);
        assert!(matches!(tagger.tag("cat"), Err(TaggerError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_rejoined() {
        let tagger = CommandTagger::new("sed", vec![r"s/\([^ ]*\)/\1_NN/g".into()]);
        assert_eq!(tagger.tag("cat fish").unwrap(), "cat_NN fish_NN");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_an_error() {
        let tagger = CommandTagger::from_argv(&["sh".into(), "-c".into(), "echo bad model >&2; exit 3".into()]).unwrap();
        match tagger.tag("cat") {
            Err(TaggerError::Exit { status, stderr, .. }) => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "bad model");
            }
            other => panic!("expected exit error, got {other:?}"),
        }
    }
}
