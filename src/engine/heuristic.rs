//! Rule-based [`LinguisticEngine`]: no model download, no server.
//!
//! Sentence boundaries are terminal punctuation followed by whitespace, or a
//! blank line. A boundary right after a known abbreviation ("Dr.", "e.g.")
//! or before a lowercase letter is not a boundary. Tokens are words
//! (with internal apostrophes) and single punctuation marks.
//!
//! Passive voice is tagged on a form of *be* followed, optionally through
//! adverbs, by a past participle (regular `-ed` or a known irregular form).

use super::{DependencyRole, LinguisticEngine, Sentence, Token};
use crate::config::AbbreviationSet;
use crate::error::CollaboratorError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]").unwrap());

static BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["'”’)\]]*\s+|\n[ \t]*\n\s*"#).unwrap());

const BE_FORMS: &[&str] = &["am", "is", "are", "was", "were", "be", "been", "being"];

const AUXILIARIES: &[&str] = &[
    "has", "have", "had", "do", "does", "did", "will", "would", "shall", "should", "can",
    "could", "may", "might", "must",
];

const INTERVENING: &[&str] = &["not", "never", "also", "often", "always", "still", "just", "already", "then"];

const IRREGULAR_PARTICIPLES: &[&str] = &[
    "arisen", "beaten", "become", "begun", "bitten", "blown", "born", "borne", "bought",
    "broken", "brought", "built", "caught", "chosen", "cut", "dealt", "done", "drawn", "driven",
    "eaten", "fallen", "felt", "found", "forgotten", "forgiven", "frozen", "given", "gone",
    "gotten", "grown", "heard", "held", "hidden", "hit", "hung", "hurt", "kept", "known", "laid",
    "led", "left", "lent", "let", "lost", "made", "meant", "met", "paid", "proven", "put", "read",
    "ridden", "risen", "run", "said", "seen", "sent", "set", "shaken", "shown", "shut", "sold",
    "sought", "spent", "spoken", "spread", "stolen", "struck", "sung", "sworn", "taken", "taught",
    "thought", "thrown", "told", "torn", "understood", "won", "worn", "woven", "written",
];

/// Heuristic sentence splitter and passive-voice tagger.
#[derive(Debug, Clone)]
pub struct HeuristicAnalyzer {
    abbreviations: AbbreviationSet,
}

impl Default for HeuristicAnalyzer {
    fn default() -> Self {
        Self::new(AbbreviationSet::default())
    }
}

impl HeuristicAnalyzer {
    /// Analyzer that will not split after any active entry of `abbreviations`.
    pub fn new(abbreviations: AbbreviationSet) -> Self {
        Self { abbreviations }
    }

    /// Split `text` into whitespace-normalised sentences.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in BOUNDARY_RE.find_iter(text) {
            let candidate = &text[start..boundary.end()];
            let is_paragraph_break = !boundary.as_str().starts_with(['.', '!', '?']);
            if !is_paragraph_break {
                let last_word = candidate.split_whitespace().last().unwrap_or("");
                let last_word = last_word.trim_end_matches(['"', '\'', '”', '’', ')', ']']);
                if self.abbreviations.is_active(last_word) {
                    continue;
                }
                let next = text[boundary.end()..].chars().next();
                if next.is_some_and(char::is_lowercase) {
                    continue;
                }
            }
            push_normalised(&mut sentences, candidate);
            start = boundary.end();
        }
        push_normalised(&mut sentences, &text[start..]);
        sentences
    }

    /// Tokenise one sentence and tag dependency roles.
    pub fn tag(&self, sentence: &str) -> Vec<Token> {
        let words: Vec<&str> = TOKEN_RE.find_iter(sentence).map(|m| m.as_str()).collect();
        words
            .iter()
            .enumerate()
            .map(|(i, word)| Token {
                text: (*word).to_string(),
                role: role_of(&words, i),
            })
            .collect()
    }
}

#[async_trait]
impl LinguisticEngine for HeuristicAnalyzer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Sentence>, CollaboratorError> {
        Ok(self
            .split_sentences(text)
            .into_iter()
            .map(|s| {
                let tokens = self.tag(&s);
                Sentence { text: s, tokens }
            })
            .collect())
    }
}

fn push_normalised(out: &mut Vec<String>, raw: &str) {
    let normalised = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalised.is_empty() {
        out.push(normalised);
    }
}

fn role_of(words: &[&str], i: usize) -> DependencyRole {
    let word = words[i];
    if !word.chars().any(char::is_alphanumeric) {
        return DependencyRole::Punctuation;
    }
    let lower = word.to_lowercase();
    if BE_FORMS.contains(&lower.as_str()) {
        let participle = words[i + 1..]
            .iter()
            .map(|w| w.to_lowercase())
            .find(|w| !is_intervening(w));
        return match participle {
            Some(p) if is_past_participle(&p) => DependencyRole::PassiveAuxiliary,
            _ => DependencyRole::Auxiliary,
        };
    }
    if AUXILIARIES.contains(&lower.as_str()) {
        return DependencyRole::Auxiliary;
    }
    DependencyRole::Other
}

fn is_intervening(word: &str) -> bool {
    INTERVENING.contains(&word) || (word.len() > 4 && word.ends_with("ly"))
}

fn is_past_participle(word: &str) -> bool {
    (word.len() > 3 && word.ends_with("ed")) || IRREGULAR_PARTICIPLES.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> HeuristicAnalyzer {
        HeuristicAnalyzer::default()
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let s = analyzer().split_sentences("Hello world. How are you?  Fine!");
        assert_eq!(s, vec!["Hello world.", "How are you?", "Fine!"]);
    }

    #[test]
    fn abbreviations_do_not_split() {
        let s = analyzer().split_sentences("Dr. Smith arrived. He spoke of apples, e.g. Fuji.");
        assert_eq!(s, vec!["Dr. Smith arrived.", "He spoke of apples, e.g. Fuji."]);
    }

    #[test]
    fn blank_lines_split_and_newlines_normalise() {
        let s = analyzer().split_sentences("Introduction\n\nThe text\nwraps here.");
        assert_eq!(s, vec!["Introduction", "The text wraps here."]);
    }

    #[test]
    fn tokens_and_punctuation() {
        let tokens = analyzer().tag("They're here, now.");
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["They're", "here", ",", "now", "."]);
        assert_eq!(tokens[2].role, DependencyRole::Punctuation);
    }

    #[test]
    fn passive_voice_is_tagged() {
        let a = analyzer();
        let has_passive = |s: &str| a.tag(s).iter().any(|t| t.role == DependencyRole::PassiveAuxiliary);
        assert!(has_passive("The report was written by the committee."));
        assert!(has_passive("The data were carefully collected."));
        assert!(has_passive("It has been done."));
        assert!(!has_passive("The committee wrote the report."));
        assert!(!has_passive("She is happy."));
        assert!(!has_passive("Their going to the store."));
    }

    #[tokio::test]
    async fn analyze_returns_tagged_sentences() {
        let sentences = analyzer()
            .analyze("The cat sat. The report was written by the committee.")
            .await
            .unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].token_count(), 4);
        assert!(sentences[1].has_role(DependencyRole::PassiveAuxiliary));
    }
}
