//! Enriquecimiento: añade a cada reseña descargada su sentimiento y la
//! confianza del modelo, generando el CSV que consume el dashboard.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::{
    dataset::{read_csv, write_csv},
    models::{RawReview, ReviewRecord, Sentimiento},
    sentiment::{SharedClassifier, MAX_CHARACTERS},
};

const PROGRESS_EVERY: usize = 1000;

/// Resumen de una ejecución de enriquecimiento.
#[derive(Debug, Default, PartialEq)]
pub struct EnrichmentSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub truncated: usize,
}

impl std::fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} reseñas clasificadas ({} positivas, {} negativas); {} recortadas a {} caracteres.",
            self.total, self.positive, self.negative, self.truncated, MAX_CHARACTERS
        )
    }
}

/// Prefijo de `text` con como mucho `max` caracteres.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Clasifica las reseñas en orden. Las de más de 512 caracteres se puntúan
/// sobre sus primeros 512.
pub async fn classify_reviews(
    rows: Vec<RawReview>,
    classifier: &SharedClassifier,
) -> Result<(Vec<ReviewRecord>, EnrichmentSummary)> {
    let mut summary = EnrichmentSummary::default();
    let mut out = Vec::with_capacity(rows.len());
    let total = rows.len();

    for (index, row) in rows.into_iter().enumerate() {
        let text = truncate_chars(&row.review, MAX_CHARACTERS);
        if text.len() < row.review.len() {
            summary.truncated += 1;
        }

        let prediction = classifier.classify(text, false).await?;
        let sentimiento = prediction.label.sentimiento();
        match sentimiento {
            Sentimiento::Positivo => summary.positive += 1,
            Sentimiento::Negativo => summary.negative += 1,
        }
        summary.total += 1;

        out.push(ReviewRecord {
            review: row.review,
            stars: row.stars,
            sentimiento,
            confianza: Some(prediction.score),
        });

        if (index + 1) % PROGRESS_EVERY == 0 {
            info!("[{}/{}] reseñas clasificadas", index + 1, total);
        }
    }

    Ok((out, summary))
}

/// Lee `input` (`review, stars`), clasifica como mucho `limit` filas y
/// escribe `output` (`review, stars, sentimiento, confianza`).
pub async fn enrich_file(
    input: &Path,
    output: &Path,
    classifier: &SharedClassifier,
    limit: Option<usize>,
) -> Result<EnrichmentSummary> {
    let mut rows: Vec<RawReview> = read_csv(input)?;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    info!("Clasificando {} reseñas de {}...", rows.len(), input.display());

    let (records, summary) = classify_reviews(rows, classifier).await?;
    write_csv(output, &records)?;
    Ok(summary)
}
