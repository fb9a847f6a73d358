//! Léxico de opiniones de restaurantes para los tests: puntúa reseñas sin red
//! ni modelos descargados, con negaciones e intensificadores. No es un motor
//! seleccionable desde la configuración.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Polarity, Prediction, SentimentBackend};
use crate::normalize;

/// Ventana (en tokens) en la que una negación invierte el término siguiente.
const NEGATION_WINDOW: usize = 3;
const NEGATION_FACTOR: f64 = -0.75;
const EXCLAMATION_BOOST: f64 = 1.1;

pub struct LexiconSentiment {
    words: HashMap<&'static str, f64>,
    negations: Vec<&'static str>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for LexiconSentiment {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconSentiment {
    pub fn new() -> Self {
        let positive_words = [
            ("good", 0.5), ("great", 0.8), ("excellent", 0.9), ("amazing", 0.9),
            ("awesome", 0.8), ("delicious", 0.8), ("tasty", 0.6), ("fantastic", 0.9),
            ("wonderful", 0.8), ("love", 0.8), ("like", 0.3), ("friendly", 0.6),
            ("perfect", 0.9), ("fresh", 0.5), ("nice", 0.5), ("recommend", 0.6),
            ("happy", 0.6), ("enjoy", 0.6), ("favorite", 0.7), ("incredible", 0.8),
            ("outstanding", 0.9), ("clean", 0.4), ("helpful", 0.5), ("attentive", 0.5),
            ("yummy", 0.7), ("superb", 0.9), ("pleasant", 0.5), ("beautiful", 0.6),
            ("cozy", 0.4), ("fast", 0.3), ("quick", 0.3), ("reasonable", 0.3),
            ("affordable", 0.4), ("worth", 0.4), ("polite", 0.4), ("glad", 0.5),
            ("impressed", 0.6), ("professional", 0.4), ("generous", 0.5), ("flavorful", 0.7),
            ("best", 0.9), ("gem", 0.7), ("thank", 0.3), ("welcoming", 0.5),
            ("satisfied", 0.5), ("solid", 0.3), ("fun", 0.5), ("lovely", 0.7),
        ];
        let negative_words = [
            ("bad", -0.6), ("terrible", -0.9), ("awful", -0.9), ("horrible", -0.9),
            ("worst", -1.0), ("disgusting", -0.9), ("rude", -0.8), ("slow", -0.4),
            ("cold", -0.3), ("dirty", -0.7), ("bland", -0.5), ("overpriced", -0.6),
            ("disappoint", -0.7), ("disappointing", -0.7), ("disappointed", -0.7),
            ("mediocre", -0.5), ("poor", -0.6), ("gross", -0.8), ("stale", -0.6),
            ("burnt", -0.5), ("hate", -0.8), ("sick", -0.7), ("expensive", -0.3),
            ("unprofessional", -0.7), ("greasy", -0.4), ("soggy", -0.5), ("avoid", -0.7),
            ("waste", -0.7), ("nasty", -0.8), ("inedible", -0.9), ("meh", -0.4),
            ("unfriendly", -0.6), ("ignored", -0.6), ("dry", -0.3), ("salty", -0.3),
            ("problem", -0.4), ("complaint", -0.4), ("refund", -0.4), ("wrong", -0.5),
            ("mess", -0.5), ("noisy", -0.3), ("never", -0.2), ("lukewarm", -0.4),
            ("undercooked", -0.6), ("overcooked", -0.5), ("filthy", -0.9), ("scam", -0.9),
        ];

        let mut words = HashMap::new();
        for (word, score) in positive_words.into_iter().chain(negative_words) {
            words.insert(word, score);
        }

        let negations = vec![
            "not", "no", "n't", "never", "without", "hardly", "barely", "none", "nobody",
            "nothing", "neither", "nor", "cannot", "lack",
        ];

        let intensifiers = [
            ("very", 1.3), ("really", 1.3), ("so", 1.2), ("extremely", 1.5),
            ("super", 1.3), ("incredibly", 1.5), ("absolutely", 1.4), ("truly", 1.3),
            ("totally", 1.3), ("pretty", 1.1), ("quite", 1.1), ("slightly", 0.6),
            ("somewhat", 0.7), ("bit", 0.7),
        ]
        .into_iter()
        .collect();

        Self {
            words,
            negations,
            intensifiers,
        }
    }

    fn word_score(&self, token: &str) -> Option<f64> {
        self.words
            .get(token)
            .or_else(|| self.words.get(normalize::lemmatize(token).as_str()))
            .copied()
    }

    /// Suma de las contribuciones de cada término del léxico.
    pub fn raw_score(&self, text: &str) -> f64 {
        let tokens = normalize::tokenize(&text.to_lowercase());
        let mut total = 0.0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(mut value) = self.word_score(token) else {
                continue;
            };

            if i > 0 {
                if let Some(factor) = self.intensifiers.get(tokens[i - 1].as_str()) {
                    value *= factor;
                }
            }

            let window_start = i.saturating_sub(NEGATION_WINDOW);
            if tokens[window_start..i]
                .iter()
                .any(|t| self.negations.iter().any(|n| *n == t.as_str()))
            {
                value *= NEGATION_FACTOR;
            }

            total += value;
        }

        if tokens.iter().any(|t| t.contains('!')) {
            total *= EXCLAMATION_BOOST;
        }
        total
    }

    pub fn score_text(&self, text: &str) -> Prediction {
        let raw = self.raw_score(text);
        let label = if raw < 0.0 {
            Polarity::Negative
        } else {
            Polarity::Positive
        };
        Prediction::new(label, 0.5 + 0.5 * raw.abs().tanh())
    }
}

#[async_trait]
impl SentimentBackend for LexiconSentiment {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    async fn predict(&self, text: &str) -> anyhow::Result<Prediction> {
        Ok(self.score_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_review_scores_above_half() {
        let lexicon = LexiconSentiment::new();
        let prediction = lexicon.score_text("Great food and service!");
        assert_eq!(prediction.label, Polarity::Positive);
        assert!(prediction.score > 0.5 && prediction.score <= 1.0);
    }

    #[test]
    fn negative_review_is_negative() {
        let lexicon = LexiconSentiment::new();
        let prediction = lexicon.score_text("The waiter was rude and the soup was cold.");
        assert_eq!(prediction.label, Polarity::Negative);
        assert!(prediction.score > 0.5);
    }

    #[test]
    fn negation_flips_polarity() {
        let lexicon = LexiconSentiment::new();
        assert!(lexicon.raw_score("good") > 0.0);
        assert!(lexicon.raw_score("not good") < 0.0);
        assert!(lexicon.raw_score("it wasn't good at all") < 0.0);
    }

    #[test]
    fn intensifiers_amplify() {
        let lexicon = LexiconSentiment::new();
        assert!(lexicon.raw_score("very good") > lexicon.raw_score("good"));
    }

    #[test]
    fn inflected_forms_hit_the_lexicon() {
        let lexicon = LexiconSentiment::new();
        assert!(lexicon.raw_score("we loved it") > 0.0);
        assert!(lexicon.raw_score("I hated every bite") < 0.0);
    }

    #[test]
    fn text_without_opinion_words_is_neutral_positive() {
        let lexicon = LexiconSentiment::new();
        let prediction = lexicon.score_text("We arrived at seven.");
        assert_eq!(prediction.label, Polarity::Positive);
        assert_eq!(prediction.score, 0.5);
    }
}
