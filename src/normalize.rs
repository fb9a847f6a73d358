//! Normalización de texto: minúsculas, tokenización, lematización y
//! eliminación de stopwords y signos de puntuación.
//!
//! La lematización es por reglas (tabla de formas irregulares + sufijos) y se
//! aplica hasta un punto fijo, de modo que normalizar un texto ya normalizado
//! devuelve los mismos tokens.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Normaliza `text` y devuelve los tokens resultantes unidos por un espacio.
pub fn clean_text(text: &str) -> String {
    normalize_tokens(text).join(" ")
}

/// Igual que [`clean_text`] pero devolviendo los tokens por separado.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    let stop = stop_words();
    tokenize(&text.to_lowercase())
        .into_iter()
        .filter(|token| !is_punct(token) && !stop.contains(token.as_str()))
        .map(|token| lemmatize(&token))
        .filter(|lemma| !lemma.is_empty() && !stop.contains(lemma.as_str()))
        .collect()
}

/// Divide el texto en palabras y signos según los límites de palabra Unicode,
/// separando además los clíticos ingleses (`n't`, `'s`, `'re`...).
pub fn tokenize(text: &str) -> Vec<String> {
    let text = text.replace(['\u{2019}', '\u{2018}'], "'");
    let mut tokens = Vec::new();
    for segment in text.split_word_bounds() {
        if segment.trim().is_empty() {
            continue;
        }
        match clitic_regex().captures(segment) {
            Some(caps) if !caps[1].is_empty() => {
                tokens.push(caps[1].to_string());
                tokens.push(caps[2].to_string());
            }
            _ => tokens.push(segment.to_string()),
        }
    }
    tokens
}

fn is_punct(token: &str) -> bool {
    !token.chars().any(char::is_alphanumeric)
}

fn clitic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)(n't|'s|'re|'ll|'ve|'d|'m)$").expect("regex válida"))
}

/// Forma base de un token en minúsculas.
pub fn lemmatize(token: &str) -> String {
    let mut current = token.to_string();
    // Cada paso acorta la palabra, así que el bucle termina.
    for _ in 0..8 {
        let next = lemmatize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn lemmatize_once(word: &str) -> String {
    if let Some(base) = irregular_forms().get(word) {
        return (*base).to_string();
    }
    if !word.chars().all(|c| c.is_alphabetic()) || word.chars().count() <= 3 {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if ["s", "x", "z", "ch", "sh"].iter().any(|end| stem.ends_with(end)) && stem.len() >= 3 {
            return stem.to_string();
        }
    }
    if word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
        && !word.ends_with("'s")
    {
        return word[..word.len() - 1].to_string();
    }
    if let Some(stem) = word.strip_suffix("ing") {
        if let Some(base) = verb_stem(stem) {
            return base;
        }
    }
    if let Some(stem) = word.strip_suffix("ed") {
        if !stem.ends_with('e') {
            if let Some(base) = verb_stem(stem) {
                return base;
            }
        }
    }
    word.to_string()
}

/// Reconstruye la raíz verbal tras quitar `-ing`/`-ed`.
fn verb_stem(stem: &str) -> Option<String> {
    if stem.len() < 3 || !stem.chars().any(is_vowel) {
        return None;
    }
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let last = chars[n - 1];

    // running -> run, stopped -> stop
    if n >= 4 && last == chars[n - 2] && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z') {
        return Some(chars[..n - 1].iter().collect());
    }
    // loving -> love, served -> serve
    if last == 'v' {
        return Some(format!("{stem}e"));
    }
    // making -> make, hoped -> hope
    if n == 3 && !is_vowel(chars[0]) && is_vowel(chars[1]) && !is_vowel(last) && !matches!(last, 'w' | 'x' | 'y') {
        return Some(format!("{stem}e"));
    }
    Some(stem.to_string())
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn irregular_forms() -> &'static HashMap<&'static str, &'static str> {
    static FORMS: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    FORMS.get_or_init(|| {
        [
            ("ate", "eat"), ("eaten", "eat"), ("went", "go"), ("gone", "go"),
            ("came", "come"), ("took", "take"), ("taken", "take"), ("gave", "give"),
            ("given", "give"), ("got", "get"), ("gotten", "get"), ("made", "make"),
            ("said", "say"), ("told", "tell"), ("found", "find"), ("thought", "think"),
            ("brought", "bring"), ("bought", "buy"), ("left", "leave"), ("felt", "feel"),
            ("kept", "keep"), ("paid", "pay"), ("sat", "sit"), ("saw", "see"),
            ("seen", "see"), ("knew", "know"), ("known", "know"), ("spent", "spend"),
            ("ran", "run"), ("drank", "drink"), ("drunk", "drink"), ("wrote", "write"),
            ("written", "write"), ("sold", "sell"), ("stood", "stand"), ("waited", "wait"),
            ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"),
            ("children", "child"), ("people", "person"), ("men", "man"), ("women", "woman"),
            ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("loved", "love"),
            ("tasted", "taste"), ("wasted", "waste"), ("excited", "excite"), ("tried", "try"),
            ("cried", "cry"), ("fries", "fry"), ("friendlier", "friendly"), ("prices", "price"),
            ("services", "service"), ("places", "place"), ("pieces", "piece"),
        ]
        .into_iter()
        .collect()
    })
}

/// Stopwords en inglés (mismas familias que las listas habituales de NLP).
pub fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| {
        [
            // Artículos y determinantes
            "a", "an", "the", "this", "that", "these", "those", "each", "every", "either",
            "neither", "some", "any", "all", "both", "few", "many", "much", "more", "most",
            "other", "another", "such", "own", "same", "several", "whole",
            // Pronombres
            "i", "me", "my", "myself", "mine", "we", "us", "our", "ours", "ourselves", "you",
            "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she",
            "her", "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs",
            "themselves", "what", "which", "who", "whom", "whose", "whoever", "whatever",
            "something", "anything", "everything", "nothing", "someone", "anyone", "everyone",
            "noone", "somehow", "somewhere", "anywhere", "everywhere", "nowhere",
            // Verbos auxiliares
            "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
            "having", "do", "does", "did", "doing", "done", "would", "should", "could", "ought",
            "might", "must", "shall", "will", "can", "may", "cannot", "make", "get", "go",
            "say", "see", "take", "give", "put", "call", "become", "seem", "show",
            // Preposiciones
            "at", "by", "for", "from", "in", "into", "of", "on", "onto", "to", "with", "about",
            "against", "between", "through", "during", "before", "after", "above", "below",
            "up", "down", "out", "off", "over", "under", "again", "further", "around", "among",
            "across", "along", "behind", "beside", "besides", "beyond", "within", "without",
            "toward", "towards", "upon", "via", "per", "throughout",
            // Conjunciones y adverbios frecuentes
            "and", "but", "or", "nor", "so", "yet", "not", "no", "only", "than", "then", "when",
            "where", "while", "if", "because", "as", "until", "although", "though", "unless",
            "whether", "once", "here", "there", "too", "very", "just", "also", "now", "how",
            "why", "well", "ever", "never", "always", "often", "already", "still", "even",
            "else", "otherwise", "perhaps", "rather", "quite", "really", "almost", "enough",
            "together", "indeed", "however", "therefore", "thus", "hence", "meanwhile",
            "first", "last", "next", "least", "less", "one", "two", "three",
            // Clíticos (won't -> wo + n't, can't -> ca + n't)
            "n't", "'s", "'re", "'ll", "'ve", "'d", "'m", "wo", "ca",
        ]
        .into_iter()
        .collect()
    })
}
