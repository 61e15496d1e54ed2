//! Czech text normalization for frequency analysis.
//!
//! [`Normalizer::normalize`] turns raw article text into a sorted bag of
//! lowercase base forms:
//!
//! 1. strip digits and lowercase
//! 2. remove ASCII punctuation and the Czech quotes `„` `“`
//! 3. collapse whitespace
//! 4. drop stopwords
//! 5. sort
//! 6. lemmatize (and optionally stem) tokens longer than one character
//! 7. drop anything of length one or less, and reduced forms that are
//!    stopwords themselves
//!
//! Word order is intentionally lost. The output is re-sorted after reduction
//! so it is always ascending.

pub mod lemma;
pub mod stem;
pub mod stopwords;

use crate::config::TextConfig;
use crate::error::Result;
use lemma::Lemmatizer;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stopwords::{CZECH_STOPWORDS, parse_stopword_list};
use tokio::fs;
use tracing::{info, instrument};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

const CZECH_QUOTES: [char; 2] = ['„', '“'];

/// How far tokens are reduced after stopword removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    /// Dictionary lemmatization only.
    #[default]
    Lemmatize,
    /// Lemmatization followed by the light stemmer, for inflections the
    /// dictionary misses.
    LemmatizeAndStem,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    stopwords: HashSet<String>,
    lemmatizer: Lemmatizer,
    mode: ReductionMode,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(ReductionMode::default())
    }
}

impl Normalizer {
    pub fn new(mode: ReductionMode) -> Self {
        let lemmatizer = Lemmatizer::default();
        debug_assert!(!lemmatizer.is_empty(), "built-in lemma dictionary is empty");
        Self {
            stopwords: CZECH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            lemmatizer,
            mode,
        }
    }

    /// Build a normalizer from config, reading the optional dictionary and
    /// stopword files.
    #[instrument(level = "info", skip_all)]
    pub async fn load(config: &TextConfig) -> Result<Self> {
        let mut normalizer = Self::new(config.reduction);

        if let Some(path) = &config.lemma_dictionary {
            let contents = fs::read_to_string(path).await?;
            let added = normalizer.lemmatizer.extend_from_tsv(&contents);
            info!(
                path = %path.display(),
                added,
                entries = normalizer.lemmatizer.len(),
                "Loaded lemma dictionary"
            );
        }
        if let Some(path) = &config.extra_stopwords {
            let contents = fs::read_to_string(path).await?;
            let extra = parse_stopword_list(&contents);
            info!(path = %path.display(), count = extra.len(), "Loaded extra stopwords");
            normalizer.stopwords.extend(extra);
        }

        Ok(normalizer)
    }

    pub fn mode(&self) -> ReductionMode {
        self.mode
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let no_digits = DIGITS.replace_all(text, "").to_lowercase();
        let no_punct: String = no_digits
            .chars()
            .filter(|c| !c.is_ascii_punctuation() && !CZECH_QUOTES.contains(c))
            .collect();

        let mut tokens: Vec<&str> = no_punct
            .split_whitespace()
            .filter(|word| !self.stopwords.contains(*word))
            .collect();
        tokens.sort_unstable();

        let mut reduced: Vec<String> = tokens
            .into_iter()
            .filter(|t| t.chars().count() > 1)
            .map(|t| self.reduce(t))
            .filter(|t| t.chars().count() > 1 && !self.stopwords.contains(t))
            .collect();
        reduced.sort();
        reduced
    }

    fn reduce(&self, token: &str) -> String {
        let lemma = self.lemmatizer.lemmatize(token);
        match self.mode {
            ReductionMode::Lemmatize => lemma,
            ReductionMode::LemmatizeAndStem => stem::stem(&lemma),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> Vec<String> {
        Normalizer::default().normalize(text)
    }

    #[test]
    fn test_strips_digits_and_lowercases() {
        assert_eq!(normalize("Praha 2020 VLÁDA"), vec!["praha", "vláda"]);
        assert_eq!(normalize("covid19"), vec!["covid"]);
    }

    #[test]
    fn test_removes_punctuation_and_czech_quotes() {
        let tokens = normalize("„Nemocnice“ hlásí: (rekord)!");
        assert_eq!(tokens, vec!["hlásit", "nemocnice", "rekord"]);
    }

    #[test]
    fn test_drops_stopwords_and_short_tokens() {
        let tokens = normalize("Vláda a parlament se x shodli, že ano");
        assert_eq!(tokens, vec!["parlament", "shodli", "vláda"]);
    }

    #[test]
    fn test_empty_and_stopword_only_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t ").is_empty());
        assert!(normalize("a že by se to").is_empty());
        assert!(normalize("123 456 !!").is_empty());
    }

    #[test]
    fn test_lemmatizes_topic_vocabulary() {
        let tokens = normalize("Boj s koronavirem a covidem");
        assert_eq!(tokens, vec!["boj", "covid", "koronavirus"]);
    }

    #[test]
    fn test_default_mode_collapses_inflections() {
        let tokens = normalize("vláda vládou vládě vlády nemocnice nemocnicích nemocnici");
        assert_eq!(
            tokens,
            vec!["nemocnice", "nemocnice", "nemocnice", "vláda", "vláda", "vláda", "vláda"]
        );
        assert_eq!(
            normalize("Nakažených: vláda vyhlásila karanténu"),
            vec!["karanténa", "nakažený", "vláda", "vyhlásit"]
        );
    }

    #[test]
    fn test_reduced_stopwords_are_dropped() {
        let mut normalizer = Normalizer::default();
        normalizer.stopwords.insert("vláda".to_string());
        assert_eq!(normalizer.normalize("vládou rozhodla"), vec!["rozhodnout"]);
    }

    #[test]
    fn test_output_properties_hold() {
        let normalizer = Normalizer::default();
        let text = "Ve 12:30 oznámil ministr zdravotnictví 1 500 nových případů koronaviru, \
                    „situace je vážná“ – řekl. Opatření platí od 1. října 2020.";
        let tokens = normalizer.normalize(text);

        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| !t.chars().any(|c| c.is_ascii_digit())));
        assert!(tokens.iter().all(|t| !CZECH_STOPWORDS.contains(t.as_str())));
        assert!(tokens.iter().all(|t| t.chars().count() > 1));
        assert!(tokens.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_normalization_is_a_fixed_point() {
        let normalizer = Normalizer::default();
        let once = normalizer.normalize("Nemocnice v Brně hlásí nárůst případů koronaviru.");
        let twice = normalizer.normalize(&once.join(" "));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stemming_mode_collapses_inflections() {
        let normalizer = Normalizer::new(ReductionMode::LemmatizeAndStem);
        assert_eq!(normalizer.normalize("vládou vládě"), vec!["vlád", "vlád"]);
        assert_eq!(normalizer.normalize("koronaviry"), vec!["koronavir"]);
    }

    #[tokio::test]
    async fn test_load_reads_dictionary_and_stopwords() {
        let dir = tempfile::tempdir().unwrap();
        let dict = dir.path().join("lemmas.tsv");
        let stop = dir.path().join("stop.txt");
        std::fs::write(&dict, "šablonách\tšablona\n").unwrap();
        std::fs::write(&stop, "praha\n").unwrap();

        let config = TextConfig {
            reduction: ReductionMode::Lemmatize,
            lemma_dictionary: Some(dict),
            extra_stopwords: Some(stop),
        };
        let normalizer = Normalizer::load(&config).await.unwrap();
        assert_eq!(normalizer.normalize("Praha šablonách"), vec!["šablona"]);
    }
}
