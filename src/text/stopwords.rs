//! Czech stopword list.

use once_cell::sync::Lazy;
use std::collections::HashSet;

const CZECH: &[&str] = &[
    "a", "aby", "aj", "ale", "ani", "aniž", "ano", "asi", "až", "bez", "bude", "budem", "budeš",
    "by", "byl", "byla", "byli", "bylo", "být", "co", "což", "cz", "či", "článek", "článku",
    "články", "další", "dnes", "do", "ho", "i", "jak", "jako", "je", "jeho", "jej", "její",
    "jejich", "jen", "jenž", "ještě", "ji", "jiné", "již", "jsem", "jseš", "jsme", "jsou", "jšte",
    "k", "kam", "kde", "kdo", "když", "ke", "která", "které", "kterou", "který", "kteři", "ku",
    "ma", "máte", "me", "mě", "mezi", "mi", "mít", "mně", "mnou", "můj", "může", "my", "na", "ná",
    "nad", "nám", "napište", "náš", "naši", "ne", "nebo", "nechť", "nejsou", "není", "než", "ni",
    "nic", "nové", "nový", "o", "od", "ode", "on", "pak", "po", "pod", "podle", "pokud", "pouze",
    "práve", "pro", "proč", "proto", "protože", "první", "před", "přes", "při", "pta", "re", "s",
    "se", "si", "sice", "strana", "své", "svůj", "svých", "svým", "svými", "ta", "tak", "také",
    "takže", "tato", "te", "tě", "tedy", "těma", "ten", "tento", "teto", "tím", "tímto", "tipy",
    "to", "tohle", "toho", "tohoto", "tom", "tomto", "tomuto", "tu", "tuto", "ty", "tyto", "u",
    "už", "v", "vám", "váš", "vaše", "ve", "více", "však", "všechen", "vy", "z", "za", "zda",
    "zde", "ze", "zpět", "zprávy", "že",
];

/// Built-in Czech stopwords.
pub static CZECH_STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| CZECH.iter().copied().collect());

/// Parse a newline-separated stopword file. Blank lines and `#` comments are skipped.
pub fn parse_stopword_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_contains_common_words() {
        for word in ["a", "že", "protože", "který", "jsou"] {
            assert!(CZECH_STOPWORDS.contains(word), "missing {word}");
        }
        assert!(!CZECH_STOPWORDS.contains("vláda"));
    }

    #[test]
    fn test_parse_stopword_list() {
        let parsed = parse_stopword_list("# extra\nKoronavirus\n\n  covid  \n");
        assert_eq!(parsed, vec!["koronavirus", "covid"]);
    }
}
