//! Morphological lemmatization of page and query text.

use std::collections::HashMap;

use rust_stemmers::{Algorithm, Stemmer};

use crate::utils::html;

/// Grammatical category of a word, as far as indexing cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Conjunction,
    Preposition,
    Interjection,
    Particle,
    /// Nouns, verbs, adjectives and everything else worth indexing
    Content,
}

impl PartOfSpeech {
    /// Functional words carry no meaning of their own and are never indexed.
    pub fn is_functional(&self) -> bool {
        !matches!(self, PartOfSpeech::Content)
    }
}

/// Result of analyzing a single word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordForm {
    pub part_of_speech: PartOfSpeech,
    pub normal_form: String,
}

/// Morphological analyzer for one language.
pub trait Morphology: Send + Sync {
    /// Tag and normalize a lower-cased word. `None` when no normal form exists.
    fn analyze(&self, word: &str) -> Option<WordForm>;
}

const CONJUNCTIONS: &[&str] = &[
    "и", "а", "но", "или", "либо", "да", "что", "чтобы", "как", "если", "хотя", "зато",
    "однако", "тоже", "также", "потому", "поэтому", "когда", "пока", "будто", "словно",
    "ибо", "ни", "нежели", "чем", "причем", "притом", "едва",
];

const PREPOSITIONS: &[&str] = &[
    "в", "во", "на", "с", "со", "к", "ко", "по", "о", "об", "обо", "от", "ото", "из", "изо",
    "у", "за", "над", "надо", "под", "подо", "про", "для", "без", "безо", "до", "при",
    "через", "перед", "передо", "между", "среди", "около", "возле", "вокруг", "после",
    "ради", "вместо", "кроме", "сквозь", "вдоль", "против", "из-за", "из-под",
];

const INTERJECTIONS: &[&str] = &[
    "ах", "ох", "эх", "ой", "ай", "увы", "ура", "ага", "ого", "эй", "ну-ка", "фу", "тьфу",
    "ух", "браво", "алло", "ау",
];

const PARTICLES: &[&str] = &[
    "не", "бы", "ли", "же", "ж", "ведь", "вот", "вон", "лишь", "только", "даже", "уж",
    "уже", "разве", "неужели", "пусть", "пускай", "давай", "именно", "почти", "ну", "то",
    "нибудь", "либо", "ка", "таки", "мол", "дескать",
];

/// Russian morphology: closed word classes come from fixed lexicons,
/// everything else is normalized by the Snowball Russian stemmer.
pub struct RussianMorphology {
    stemmer: Stemmer,
}

impl RussianMorphology {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }

    fn part_of_speech(word: &str) -> PartOfSpeech {
        if CONJUNCTIONS.contains(&word) {
            PartOfSpeech::Conjunction
        } else if PREPOSITIONS.contains(&word) {
            PartOfSpeech::Preposition
        } else if INTERJECTIONS.contains(&word) {
            PartOfSpeech::Interjection
        } else if PARTICLES.contains(&word) {
            PartOfSpeech::Particle
        } else {
            PartOfSpeech::Content
        }
    }
}

impl Default for RussianMorphology {
    fn default() -> Self {
        Self::new()
    }
}

impl Morphology for RussianMorphology {
    fn analyze(&self, word: &str) -> Option<WordForm> {
        if word.is_empty() {
            return None;
        }
        let normal_form = self.stemmer.stem(word).into_owned();
        if normal_form.is_empty() {
            return None;
        }
        Some(WordForm {
            part_of_speech: Self::part_of_speech(word),
            normal_form,
        })
    }
}

/// Lower-case `text`, delete every character that is neither a Cyrillic
/// letter nor whitespace, and split on whitespace runs.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'а'..='я' | 'ё') || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Turns text into lemma counts.
pub struct Lemmatizer {
    morphology: Box<dyn Morphology>,
}

impl Lemmatizer {
    pub fn new(morphology: impl Morphology + 'static) -> Self {
        Self {
            morphology: Box::new(morphology),
        }
    }

    /// Lemmatizer for Russian text.
    pub fn russian() -> Self {
        Self::new(RussianMorphology::new())
    }

    /// Normal form of a token, or `None` for functional or unknown words.
    pub fn lemma(&self, token: &str) -> Option<String> {
        self.morphology
            .analyze(token)
            .filter(|form| !form.part_of_speech.is_functional())
            .map(|form| form.normal_form)
    }

    /// Map of lemma to occurrence count in `text`.
    pub fn collect_lemmas(&self, text: &str) -> HashMap<String, u32> {
        let mut lemmas = HashMap::new();
        for token in tokenize(text) {
            if let Some(lemma) = self.lemma(&token) {
                *lemmas.entry(lemma).or_insert(0) += 1;
            }
        }
        lemmas
    }

    /// Lemma counts of the visible text of an HTML document.
    pub fn collect_html_lemmas(&self, html_content: &str) -> HashMap<String, u32> {
        self.collect_lemmas(&html::page_text(html_content))
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::russian()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_deletes_foreign_characters() {
        assert_eq!(
            tokenize("  Кот, СОБАКА!\n\tи hello2мир  "),
            vec!["кот", "собака", "и", "мир"]
        );
        assert!(tokenize("123 abc !!!").is_empty());
    }

    #[test]
    fn test_functional_words_are_dropped() {
        let lemmatizer = Lemmatizer::russian();
        assert_eq!(lemmatizer.lemma("и"), None);
        assert_eq!(lemmatizer.lemma("на"), None);
        assert_eq!(lemmatizer.lemma("ох"), None);
        assert_eq!(lemmatizer.lemma("бы"), None);
        assert_eq!(lemmatizer.lemma("кот"), Some("кот".to_string()));
    }

    #[test]
    fn test_word_forms_share_a_lemma() {
        let lemmatizer = Lemmatizer::russian();
        let lemmas = lemmatizer.collect_lemmas("Кот и кота, коты на коте");
        assert_eq!(lemmas.len(), 1);
        assert_eq!(lemmas.get("кот"), Some(&4));
    }

    #[test]
    fn test_collect_from_html() {
        let lemmatizer = Lemmatizer::russian();
        let lemmas = lemmatizer
            .collect_html_lemmas("<html><body><p>дом</p><script>сад</script><p>дом лес</p></body></html>");
        assert_eq!(lemmas.get("дом"), Some(&2));
        assert_eq!(lemmas.get("лес"), Some(&1));
        assert!(!lemmas.contains_key("сад"));
    }

    #[test]
    fn test_blank_text_has_no_lemmas() {
        assert!(Lemmatizer::russian().collect_lemmas("   ").is_empty());
    }

    struct Identity;

    impl Morphology for Identity {
        fn analyze(&self, word: &str) -> Option<WordForm> {
            (word != "нет").then(|| WordForm {
                part_of_speech: PartOfSpeech::Content,
                normal_form: word.to_string(),
            })
        }
    }

    #[test]
    fn test_words_without_normal_form_are_dropped() {
        let lemmatizer = Lemmatizer::new(Identity);
        let lemmas = lemmatizer.collect_lemmas("нет да нет");
        assert_eq!(lemmas.len(), 1);
        assert_eq!(lemmas.get("да"), Some(&1));
    }
}
