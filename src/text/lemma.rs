//! Dictionary lemmatizer for Czech word forms.
//!
//! The built-in dictionary is assembled from three layers, first entry wins:
//!
//! 1. the topic table (the declension of `koronavirus` and `covid`)
//! 2. `data/cs_forms.tsv`: irregular `form<TAB>lemma` pairs
//! 3. `data/cs_lemmas.tsv`: `lemma<TAB>paradigm` pairs, expanded into every
//!    form of the named model word (`žena`, `hrad`, `mladý`, `prosit`, ...)
//!
//! Every lemma is registered as its own form before any other form, so
//! lemmatizing a lemma returns it unchanged. Forms missing from the
//! dictionary fall back to a few productive suffix rules (`-ostech` to
//! `-ost`, `-ického` to `-ický`, ...). A further `form<TAB>lemma` dictionary
//! can be layered on top with [`Lemmatizer::extend_from_tsv`].

use std::collections::HashMap;

const TOPIC_LEMMAS: &[(&str, &[&str])] = &[
    (
        "koronavirus",
        &[
            "koronavir",
            "koronaviru",
            "koronavire",
            "koronavirem",
            "koronaviry",
            "koronavirů",
            "koronavirům",
            "koronavirech",
        ],
    ),
    (
        "covid",
        &[
            "covid", "covidu", "covide", "covidem", "covidy", "covidů", "covidům", "covidech",
        ],
    ),
];

const PARADIGM_LEMMAS: &str = include_str!("data/cs_lemmas.tsv");
const IRREGULAR_FORMS: &str = include_str!("data/cs_forms.tsv");

/// A declension or conjugation pattern named after its model word.
///
/// An ending starting with `^` palatalizes the stem first (`k` to `c`,
/// `r` to `ř`, `ě` after `d`/`t`/`n`, ...).
struct Paradigm {
    name: &'static str,
    /// Ending of the lemma itself, removed to get the stem.
    lemma_ending: &'static str,
    endings: &'static [&'static str],
}

const PARADIGMS: &[Paradigm] = &[
    Paradigm {
        name: "žena",
        lemma_ending: "a",
        endings: &["a", "y", "^ě", "u", "o", "ou", "ám", "ách", "ami", ""],
    },
    Paradigm {
        name: "ulice",
        lemma_ending: "e",
        endings: &["e", "i", "í", "ím", "ích", "emi", ""],
    },
    Paradigm {
        name: "růže",
        lemma_ending: "e",
        endings: &["e", "i", "í", "ím", "ích", "emi"],
    },
    Paradigm {
        name: "kost",
        lemma_ending: "",
        endings: &["", "i", "í", "em", "ech", "mi"],
    },
    Paradigm {
        name: "hrad",
        lemma_ending: "",
        endings: &["", "u", "^ě", "em", "y", "ů", "ům", "ech"],
    },
    Paradigm {
        name: "stroj",
        lemma_ending: "",
        endings: &["", "e", "i", "em", "ů", "ům", "ích"],
    },
    Paradigm {
        name: "pán",
        lemma_ending: "",
        endings: &[
            "", "a", "ovi", "u", "em", "^i", "ové", "é", "ů", "ům", "y", "ech",
        ],
    },
    Paradigm {
        name: "muž",
        lemma_ending: "",
        endings: &["", "e", "i", "ovi", "em", "ové", "é", "ů", "ům", "ích"],
    },
    Paradigm {
        name: "město",
        lemma_ending: "o",
        endings: &["o", "a", "u", "^ě", "em", "ům", "ech", "y", ""],
    },
    Paradigm {
        name: "ohnisko",
        lemma_ending: "o",
        endings: &["o", "a", "u", "em", "ům", "y"],
    },
    Paradigm {
        name: "moře",
        lemma_ending: "e",
        endings: &["e", "i", "ím", "í", "ích"],
    },
    Paradigm {
        name: "stavení",
        lemma_ending: "í",
        endings: &["í", "ím", "ích", "ími"],
    },
    Paradigm {
        name: "mladý",
        lemma_ending: "ý",
        endings: &[
            "ý", "á", "é", "ého", "ému", "ém", "ým", "ou", "ých", "ými", "^í",
        ],
    },
    Paradigm {
        name: "jarní",
        lemma_ending: "í",
        endings: &["í", "ího", "ímu", "ím", "ích", "ími"],
    },
    Paradigm {
        name: "prosit",
        lemma_ending: "it",
        endings: &[
            "it", "ím", "íš", "í", "íme", "íte", "il", "ila", "ilo", "ili", "ily",
        ],
    },
    Paradigm {
        name: "dělat",
        lemma_ending: "at",
        endings: &[
            "at", "ám", "áš", "á", "áme", "áte", "ají", "al", "ala", "alo", "ali", "aly",
        ],
    },
    Paradigm {
        name: "kupovat",
        lemma_ending: "ovat",
        endings: &[
            "ovat", "uji", "uju", "uješ", "uje", "ujeme", "ujete", "ují", "oval", "ovala",
            "ovalo", "ovali", "ovaly",
        ],
    },
    Paradigm {
        name: "trpět",
        lemma_ending: "ět",
        endings: &[
            "ět", "ím", "íš", "í", "íme", "íte", "ěl", "ěla", "ělo", "ěli", "ěly",
        ],
    },
    Paradigm {
        name: "muset",
        lemma_ending: "et",
        endings: &[
            "et", "ím", "íš", "í", "íme", "íte", "el", "ela", "elo", "eli", "ely",
        ],
    },
];

/// Consonant alternations before a front vowel; longest first.
const ALTERNATIONS: &[(&str, &str)] = &[
    ("ck", "čt"),
    ("sk", "št"),
    ("ch", "š"),
    ("k", "c"),
    ("h", "z"),
    ("g", "z"),
    ("r", "ř"),
];

/// Consonants written with `ě` rather than `e` before a soft ending.
const SOFT_E_CONSONANTS: [char; 8] = ['d', 't', 'n', 'b', 'p', 'v', 'f', 'm'];

/// Productive endings of forms the dictionary does not know.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("ostech", "ost"),
    ("ostmi", "ost"),
    ("ostem", "ost"),
    ("ostí", "ost"),
    ("osti", "ost"),
    ("ického", "ický"),
    ("ickému", "ický"),
    ("ických", "ický"),
    ("ickými", "ický"),
    ("ickém", "ický"),
    ("ickým", "ický"),
    ("ickou", "ický"),
    ("ická", "ický"),
    ("ické", "ický"),
    ("ičtí", "ický"),
    ("ového", "ový"),
    ("ovému", "ový"),
    ("ových", "ový"),
    ("ovými", "ový"),
    ("ovém", "ový"),
    ("ovým", "ový"),
    ("ovou", "ový"),
    ("eními", "ení"),
    ("eních", "ení"),
    ("ením", "ení"),
    ("áními", "ání"),
    ("áních", "ání"),
    ("áním", "ání"),
    ("ního", "ní"),
    ("nímu", "ní"),
    ("ních", "ní"),
    ("ními", "ní"),
];

impl Paradigm {
    fn find(name: &str) -> Option<&'static Paradigm> {
        PARADIGMS.iter().find(|p| p.name == name)
    }

    /// All forms of `lemma`, or `None` if it lacks the paradigm's ending.
    fn inflect(&self, lemma: &str) -> Option<Vec<String>> {
        let stem = lemma.strip_suffix(self.lemma_ending)?;
        let forms = self
            .endings
            .iter()
            .map(|ending| match ending.strip_prefix('^') {
                Some(vowel) => palatalize(stem, vowel),
                None => format!("{stem}{ending}"),
            })
            .collect();
        Some(forms)
    }
}

fn palatalize(stem: &str, vowel: &str) -> String {
    for (hard, soft) in ALTERNATIONS {
        if let Some(base) = stem.strip_suffix(hard) {
            let vowel = if vowel == "ě" { "e" } else { vowel };
            return format!("{base}{soft}{vowel}");
        }
    }
    if vowel == "ě" && !stem.ends_with(SOFT_E_CONSONANTS) {
        return format!("{stem}e");
    }
    format!("{stem}{vowel}")
}

/// Non-comment, tab-separated pairs, trimmed and lowercased.
fn tsv_pairs(contents: &str) -> impl Iterator<Item = (String, String)> + '_ {
    contents
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| line.split_once('\t'))
        .map(|(left, right)| (left.trim().to_lowercase(), right.trim().to_lowercase()))
        .filter(|(left, right)| !left.is_empty() && !right.is_empty())
}

fn guess_lemma(token: &str) -> Option<String> {
    let len = token.chars().count();
    SUFFIX_RULES
        .iter()
        .filter(|(suffix, _)| token.ends_with(suffix) && len > suffix.chars().count() + 2)
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(suffix, lemma_suffix)| {
            format!("{}{lemma_suffix}", &token[..token.len() - suffix.len()])
        })
}

#[derive(Debug, Clone)]
pub struct Lemmatizer {
    forms: HashMap<String, String>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        let mut lemmatizer = Self {
            forms: HashMap::new(),
        };
        for (lemma, forms) in TOPIC_LEMMAS {
            lemmatizer.insert(lemma, lemma);
            for form in forms.iter() {
                lemmatizer.insert(form, lemma);
            }
        }

        let inflected: Vec<(String, Vec<String>)> = tsv_pairs(PARADIGM_LEMMAS)
            .filter_map(|(lemma, name)| {
                let forms = Paradigm::find(&name)?.inflect(&lemma)?;
                Some((lemma, forms))
            })
            .collect();
        let irregular: Vec<(String, String)> = tsv_pairs(IRREGULAR_FORMS).collect();

        let lemmas = inflected
            .iter()
            .map(|(lemma, _)| lemma)
            .chain(irregular.iter().map(|(_, lemma)| lemma));
        for lemma in lemmas {
            lemmatizer.insert(lemma, lemma);
        }
        for (form, lemma) in &irregular {
            lemmatizer.insert(form, lemma);
        }
        for (lemma, forms) in &inflected {
            for form in forms {
                lemmatizer.insert(form, lemma);
            }
        }
        lemmatizer
    }
}

impl Lemmatizer {
    fn insert(&mut self, form: &str, lemma: &str) -> bool {
        if self.forms.contains_key(form) {
            return false;
        }
        self.forms.insert(form.to_string(), lemma.to_string());
        true
    }

    /// Add entries from a tab-separated `form<TAB>lemma` dictionary.
    ///
    /// Returns the number of entries added. Lines without a tab and `#`
    /// comments are ignored; existing entries are kept so the built-in
    /// dictionary always wins.
    pub fn extend_from_tsv(&mut self, contents: &str) -> usize {
        tsv_pairs(contents)
            .filter(|(form, lemma)| self.insert(form, lemma))
            .count()
    }

    /// Base form of `token`, lowercased. Unknown forms without a productive
    /// ending are returned unchanged.
    pub fn lemmatize(&self, token: &str) -> String {
        let token = token.to_lowercase();
        if let Some(lemma) = self.forms.get(&token) {
            return lemma.clone();
        }
        match guess_lemma(&token) {
            Some(guess) => self.forms.get(&guess).cloned().unwrap_or(guess),
            None => token,
        }
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::stopwords::CZECH_STOPWORDS;

    #[test]
    fn test_topic_forms_reduce_to_lemma() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("koronavirem"), "koronavirus");
        assert_eq!(lemmatizer.lemmatize("covidům"), "covid");
        assert_eq!(lemmatizer.lemmatize("koronavirus"), "koronavirus");
    }

    #[test]
    fn test_inflected_forms_collapse_to_one_lemma() {
        let lemmatizer = Lemmatizer::default();
        for form in ["vláda", "vládou", "vládě", "vlády", "vládám"] {
            assert_eq!(lemmatizer.lemmatize(form), "vláda", "{form}");
        }
        for form in ["nemocnice", "nemocnicích", "nemocnici", "nemocnic"] {
            assert_eq!(lemmatizer.lemmatize(form), "nemocnice", "{form}");
        }
        assert_eq!(lemmatizer.lemmatize("nakažených"), "nakažený");
        assert_eq!(lemmatizer.lemmatize("vyhlásila"), "vyhlásit");
        assert_eq!(lemmatizer.lemmatize("testují"), "testovat");
        assert_eq!(lemmatizer.lemmatize("případů"), "případ");
        assert_eq!(lemmatizer.lemmatize("opatřeních"), "opatření");
        assert_eq!(lemmatizer.lemmatize("lidé"), "člověk");
    }

    #[test]
    fn test_palatalized_forms() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("praze"), "praha");
        assert_eq!(lemmatizer.lemmatize("roušce"), "rouška");
        assert_eq!(lemmatizer.lemmatize("karanténě"), "karanténa");
        assert_eq!(lemmatizer.lemmatize("roce"), "rok");
        assert_eq!(lemmatizer.lemmatize("ministři"), "ministr");
        assert_eq!(lemmatizer.lemmatize("epidemiolozi"), "epidemiolog");
        assert_eq!(lemmatizer.lemmatize("němečtí"), "německý");
        assert_eq!(lemmatizer.lemmatize("velcí"), "velký");
    }

    #[test]
    fn test_productive_suffixes_of_unknown_forms() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("připravenostech"), "připravenost");
        assert_eq!(lemmatizer.lemmatize("hygienických"), "hygienický");
        assert_eq!(lemmatizer.lemmatize("vysvětleních"), "vysvětlení");
        assert_eq!(lemmatizer.lemmatize("dopravního"), "dopravní");
        // Too short to carry the ending safely.
        assert_eq!(lemmatizer.lemmatize("novou"), "novou");
    }

    #[test]
    fn test_unknown_form_is_unchanged() {
        let lemmatizer = Lemmatizer::default();
        assert_eq!(lemmatizer.lemmatize("šablony"), "šablony");
    }

    #[test]
    fn test_builtin_lists_are_well_formed() {
        for (lemma, name) in tsv_pairs(PARADIGM_LEMMAS) {
            let paradigm = Paradigm::find(&name)
                .unwrap_or_else(|| panic!("unknown paradigm `{name}` for `{lemma}`"));
            assert!(paradigm.inflect(&lemma).is_some(), "`{lemma}` does not fit `{name}`");
        }
        assert!(tsv_pairs(IRREGULAR_FORMS).count() > 0);
    }

    #[test]
    fn test_every_lemma_is_a_fixed_point() {
        let lemmatizer = Lemmatizer::default();
        for lemma in lemmatizer.forms.values() {
            assert_eq!(&lemmatizer.lemmatize(lemma), lemma);
            assert!(!CZECH_STOPWORDS.contains(lemma.as_str()), "{lemma} is a stopword");
        }
    }

    #[test]
    fn test_len_and_is_empty() {
        let mut lemmatizer = Lemmatizer {
            forms: HashMap::new(),
        };
        assert!(lemmatizer.is_empty());
        assert_eq!(lemmatizer.extend_from_tsv("roušky\trouška\n"), 1);
        assert!(!lemmatizer.is_empty());
        assert_eq!(lemmatizer.len(), 1);
        assert!(!Lemmatizer::default().is_empty());
    }

    #[test]
    fn test_extend_from_tsv() {
        let mut lemmatizer = Lemmatizer::default();
        let before = lemmatizer.len();
        let added = lemmatizer.extend_from_tsv(
            "šablonou\tšablona\nnoise\n# komentář\tx\nkoronaviru\tjinak\nVládou\tjinak\nStránkách\tStránka\n",
        );
        assert_eq!(added, 2);
        assert_eq!(lemmatizer.len(), before + 2);
        assert!(!lemmatizer.is_empty());
        assert_eq!(lemmatizer.lemmatize("šablonou"), "šablona");
        assert_eq!(lemmatizer.lemmatize("stránkách"), "stránka");
        assert_eq!(lemmatizer.lemmatize("koronaviru"), "koronavirus");
        assert_eq!(lemmatizer.lemmatize("vládou"), "vláda");
    }
}
