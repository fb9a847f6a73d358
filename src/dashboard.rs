//! Vistas del dashboard. Cada vista vuelve a derivar la tabla filtrada a partir
//! del estado de la barra lateral que recibe.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::{
    dataset::Dataset,
    filters::{self, Chart, FilterQuery, FilterState, Metrics},
    models::{ReviewRecord, Sentimiento},
};

pub const DEFAULT_PAGE_SIZE: usize = 1000;
const SAMPLE_ROWS: usize = 10;

/// Páginas de la navegación lateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    #[serde(rename = "Data")]
    Data,
    #[serde(rename = "Explore")]
    Explore,
    #[serde(rename = "Visualizations")]
    Visualizations,
    #[serde(rename = "Sentiment Analyst")]
    SentimentAnalyst,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Data,
        Page::Explore,
        Page::Visualizations,
        Page::SentimentAnalyst,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Data => "Data",
            Page::Explore => "Explore",
            Page::Visualizations => "Visualizations",
            Page::SentimentAnalyst => "Sentiment Analyst",
        }
    }

    pub fn from_label(label: &str) -> Result<Self> {
        Page::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(label.trim()))
            .ok_or_else(|| anyhow!("Página desconocida: {label}"))
    }
}

/// Parámetros de las vistas: filtros de la barra lateral y paginación.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewQuery {
    pub sentimientos: Option<String>,
    pub min_stars: Option<u8>,
    pub max_stars: Option<u8>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ViewQuery {
    pub fn filters(&self) -> FilterQuery {
        FilterQuery {
            sentimientos: self.sentimientos.clone(),
            min_stars: self.min_stars,
            max_stars: self.max_stars,
        }
    }
}

/// Fila de la tabla de reseñas (columnas `review, sentimiento, stars`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub review: String,
    pub sentimiento: Sentimiento,
    pub stars: u8,
}

impl From<&ReviewRecord> for ReviewRow {
    fn from(r: &ReviewRecord) -> Self {
        Self {
            review: r.review.clone(),
            sentimiento: r.sentimiento,
            stars: r.stars,
        }
    }
}

/// Opciones disponibles para los controles de la barra lateral.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub sentimientos: Vec<Sentimiento>,
    pub min_stars: u8,
    pub max_stars: u8,
    pub total_rows: usize,
    pub pages: Vec<&'static str>,
}

pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    let (min_stars, max_stars) = dataset.star_bounds();
    FilterOptions {
        sentimientos: dataset.unique_sentiments(),
        min_stars,
        max_stars,
        total_rows: dataset.len(),
        pages: Page::ALL.iter().map(Page::label).collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct RowPage {
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
    pub rows: Vec<ReviewRow>,
}

fn paginate(view: &[&ReviewRecord], offset: Option<usize>, limit: Option<usize>) -> RowPage {
    let offset = offset.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let rows = view
        .iter()
        .skip(offset)
        .take(limit)
        .map(|r| ReviewRow::from(*r))
        .collect();
    RowPage {
        offset,
        limit,
        total: view.len(),
        rows,
    }
}

/// Vista `Data`: resumen de la tabla cargada.
#[derive(Debug, Serialize)]
pub struct DataView {
    pub filters: FilterState,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub columns: Vec<&'static str>,
    pub sample: Vec<ReviewRow>,
    pub metrics: Metrics,
    pub reviews_with_confidence: usize,
}

pub fn data_view(dataset: &Dataset, query: &ViewQuery) -> Result<DataView> {
    let filters = FilterState::resolve(&query.filters(), dataset)?;
    let view = filters.apply(dataset);

    Ok(DataView {
        total_rows: dataset.len(),
        filtered_rows: view.len(),
        columns: vec!["review", "stars", "sentimiento", "confianza"],
        sample: view.iter().take(SAMPLE_ROWS).map(|r| ReviewRow::from(*r)).collect(),
        metrics: filters::metrics(&view),
        reviews_with_confidence: dataset.reviews.iter().filter(|r| r.confianza.is_some()).count(),
        filters,
    })
}

/// Vista `Explore`: tabla completa filtrada, paginada.
#[derive(Debug, Serialize)]
pub struct ExploreView {
    pub filters: FilterState,
    pub metrics: Metrics,
    pub table: RowPage,
}

pub fn explore_view(dataset: &Dataset, query: &ViewQuery) -> Result<ExploreView> {
    let filters = FilterState::resolve(&query.filters(), dataset)?;
    let view = filters.apply(dataset);

    Ok(ExploreView {
        metrics: filters::metrics(&view),
        table: paginate(&view, query.offset, query.limit),
        filters,
    })
}

/// Vista `Visualizations`: métricas, las dos gráficas y el listado.
#[derive(Debug, Serialize)]
pub struct VisualizationsView {
    pub filters: FilterState,
    pub metrics: Metrics,
    pub sentiment_chart: Chart,
    pub stars_chart: Chart,
    pub table: RowPage,
}

pub fn visualizations_view(dataset: &Dataset, query: &ViewQuery) -> Result<VisualizationsView> {
    let filters = FilterState::resolve(&query.filters(), dataset)?;
    let view = filters.apply(dataset);

    Ok(VisualizationsView {
        metrics: filters::metrics(&view),
        sentiment_chart: filters::sentiment_distribution(&view),
        stars_chart: filters::star_distribution(&view),
        table: paginate(&view, query.offset, query.limit),
        filters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::sample_reviews;

    #[test]
    fn page_labels_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::from_label(page.label()).unwrap(), page);
        }
        assert_eq!(Page::from_label("sentiment analyst").unwrap(), Page::SentimentAnalyst);
        assert!(Page::from_label("Admin").is_err());
        assert_eq!(
            serde_json::to_value(Page::SentimentAnalyst).unwrap(),
            "Sentiment Analyst"
        );
    }

    #[test]
    fn data_view_summarises_whole_and_filtered_table() {
        let dataset = Dataset::new(sample_reviews());
        let query = ViewQuery {
            sentimientos: Some("Negativo".into()),
            ..Default::default()
        };
        let view = data_view(&dataset, &query).unwrap();
        assert_eq!(view.total_rows, 7);
        assert_eq!(view.filtered_rows, 3);
        assert_eq!(view.sample.len(), 3);
        assert_eq!(view.reviews_with_confidence, 7);
    }

    #[test]
    fn explore_view_paginates_filtered_rows() {
        let dataset = Dataset::new(sample_reviews());
        let query = ViewQuery {
            offset: Some(2),
            limit: Some(3),
            ..Default::default()
        };
        let view = explore_view(&dataset, &query).unwrap();
        assert_eq!(view.table.total, 7);
        assert_eq!(view.table.rows.len(), 3);
        assert_eq!(view.table.rows[0].review, "It was ok");

        let beyond = ViewQuery {
            offset: Some(50),
            ..Default::default()
        };
        assert!(explore_view(&dataset, &beyond).unwrap().table.rows.is_empty());
    }

    #[test]
    fn visualizations_view_recomputes_from_filters() {
        let dataset = Dataset::new(sample_reviews());
        let query = ViewQuery {
            min_stars: Some(4),
            max_stars: Some(4),
            ..Default::default()
        };
        let view = visualizations_view(&dataset, &query).unwrap();
        assert_eq!(view.metrics.total_reviews, 3);
        assert_eq!(view.metrics.average_stars, Some(4.0));
        assert_eq!(view.stars_chart.bars.len(), 1);
        assert_eq!(view.stars_chart.bars[0].category, "4");
        assert_eq!(view.stars_chart.bars[0].color, "#1a9850");
        assert_eq!(view.sentiment_chart.bars.len(), 2);
    }

    #[test]
    fn invalid_filters_surface_as_errors() {
        let dataset = Dataset::new(sample_reviews());
        let query = ViewQuery {
            min_stars: Some(4),
            max_stars: Some(1),
            ..Default::default()
        };
        assert!(visualizations_view(&dataset, &query).is_err());
    }
}
