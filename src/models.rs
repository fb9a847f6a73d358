//! Modelos de dominio (reseñas, etiquetas de sentimiento y mensajes del chat).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fila del CSV de descarga (`review, stars`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub review: String,
    pub stars: u8,
}

/// Etiqueta de sentimiento tal y como aparece en el CSV clasificado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentimiento {
    #[serde(alias = "POSITIVE", alias = "positive", alias = "positivo")]
    Positivo,
    #[serde(alias = "NEGATIVE", alias = "negative", alias = "negativo")]
    Negativo,
}

impl Sentimiento {
    pub const ALL: [Sentimiento; 2] = [Sentimiento::Positivo, Sentimiento::Negativo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentimiento::Positivo => "Positivo",
            Sentimiento::Negativo => "Negativo",
        }
    }

    /// Color fijo usado en la gráfica de distribución.
    pub fn color(&self) -> &'static str {
        match self {
            Sentimiento::Positivo => "green",
            Sentimiento::Negativo => "red",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positivo" | "positive" => Some(Sentimiento::Positivo),
            "negativo" | "negative" => Some(Sentimiento::Negativo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentimiento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reseña ya enriquecida con su sentimiento.
/// `confianza` es opcional para poder leer ficheros que no la incluyan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review: String,
    pub stars: u8,
    pub sentimiento: Sentimiento,
    #[serde(default)]
    pub confianza: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Un turno del chat del analista de sentimiento.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}
