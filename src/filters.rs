//! Filtros de la barra lateral y agregados derivados de la vista filtrada.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Dataset,
    models::{ReviewRecord, Sentimiento},
};

/// Categorías de estrellas en el orden fijo de la gráfica.
pub const STAR_CATEGORIES: [u8; 5] = [0, 1, 2, 3, 4];
/// Rampa de colores de rojo a verde para las estrellas 0..4.
pub const STAR_COLORS: [&str; 5] = ["#d73027", "#fc8d59", "#fee08b", "#91cf60", "#1a9850"];

/// Parámetros de consulta tal y como llegan del frontend.
///
/// `sentimientos` va separado por comas; ausente = todos, vacío = ninguno.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub sentimientos: Option<String>,
    pub min_stars: Option<u8>,
    pub max_stars: Option<u8>,
}

/// Selección efectiva de la barra lateral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    pub sentimientos: Vec<Sentimiento>,
    pub stars: (u8, u8),
}

impl FilterState {
    /// Sin filtros: todos los sentimientos y el rango completo del dataset.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            sentimientos: dataset.unique_sentiments(),
            stars: dataset.star_bounds(),
        }
    }

    /// Resuelve la consulta contra el dataset. Los extremos ausentes toman los
    /// límites observados; los presentes se usan tal cual, aunque caigan fuera
    /// de ellos.
    pub fn resolve(query: &FilterQuery, dataset: &Dataset) -> Result<Self> {
        let sentimientos = match &query.sentimientos {
            None => dataset.unique_sentiments(),
            Some(raw) => parse_sentiments(raw)?,
        };

        let (lo, hi) = dataset.star_bounds();
        let min = query.min_stars.unwrap_or(lo);
        let max = query.max_stars.unwrap_or(hi);
        if min > max {
            return Err(anyhow!(
                "Rango de estrellas no válido: mínimo {min} mayor que máximo {max}"
            ));
        }

        Ok(Self {
            sentimientos,
            stars: (min, max),
        })
    }

    pub fn matches(&self, review: &ReviewRecord) -> bool {
        self.sentimientos.contains(&review.sentimiento)
            && review.stars >= self.stars.0
            && review.stars <= self.stars.1
    }

    /// Vista filtrada, preservando el orden original.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> Vec<&'a ReviewRecord> {
        dataset.reviews.iter().filter(|r| self.matches(r)).collect()
    }
}

fn parse_sentiments(raw: &str) -> Result<Vec<Sentimiento>> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let sentimiento =
            Sentimiento::parse(part).ok_or_else(|| anyhow!("Sentimiento desconocido: {part}"))?;
        if !out.contains(&sentimiento) {
            out.push(sentimiento);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub total_reviews: usize,
    /// Media de estrellas redondeada a 2 decimales; `None` si la vista está vacía.
    pub average_stars: Option<f64>,
}

pub fn metrics(view: &[&ReviewRecord]) -> Metrics {
    let average_stars = if view.is_empty() {
        None
    } else {
        let sum: f64 = view.iter().map(|r| f64::from(r.stars)).sum();
        Some(round2(sum / view.len() as f64))
    };
    Metrics {
        total_reviews: view.len(),
        average_stars,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Una barra de una gráfica de distribución.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub category: String,
    pub count: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    /// "h" para barras horizontales, "v" para verticales.
    pub orientation: &'static str,
    pub bars: Vec<Bar>,
}

/// Recuento por sentimiento, de mayor a menor.
pub fn sentiment_distribution(view: &[&ReviewRecord]) -> Chart {
    let mut counts: Vec<(Sentimiento, usize)> = Sentimiento::ALL
        .iter()
        .map(|s| (*s, view.iter().filter(|r| r.sentimiento == *s).count()))
        .filter(|(_, count)| *count > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    Chart {
        title: "Distribución de Sentimientos".to_string(),
        orientation: "h",
        bars: counts
            .into_iter()
            .map(|(s, count)| Bar {
                category: s.as_str().to_string(),
                count,
                color: s.color().to_string(),
            })
            .collect(),
    }
}

/// Recuento por estrellas en el orden fijo 0..4 (sólo categorías presentes).
pub fn star_distribution(view: &[&ReviewRecord]) -> Chart {
    let bars = STAR_CATEGORIES
        .iter()
        .map(|star| (*star, view.iter().filter(|r| r.stars == *star).count()))
        .filter(|(_, count)| *count > 0)
        .map(|(star, count)| Bar {
            category: star.to_string(),
            count,
            color: STAR_COLORS[usize::from(star)].to_string(),
        })
        .collect();

    Chart {
        title: "Distribución por Estrellas".to_string(),
        orientation: "v",
        bars,
    }
}
