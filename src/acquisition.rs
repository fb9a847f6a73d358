//! Descarga del dataset de reseñas desde el Hub de Hugging Face.
//!
//! Se descargan los ficheros parquet de los splits `train` y `test`, se
//! renombran `text` → `review` y `label` → `stars`, se concatenan (train y
//! después test) y se escriben en un único CSV.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, Int64Array, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use hf_hub::{api::tokio::ApiBuilder, Repo, RepoType};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::{dataset::write_csv, models::RawReview};

const TEXT_COLUMN: &str = "text";
const LABEL_COLUMN: &str = "label";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

/// Resumen de una descarga.
#[derive(Debug, Default)]
pub struct AcquisitionSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub output: PathBuf,
}

impl std::fmt::Display for AcquisitionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} reseñas de train + {} de test = {} filas escritas en {}.",
            self.train_rows,
            self.test_rows,
            self.train_rows + self.test_rows,
            self.output.display()
        )
    }
}

/// Ficheros parquet de un split, ordenados por nombre.
pub fn shards_for_split<'a>(files: &'a [String], split: Split) -> Vec<&'a str> {
    let prefix = format!("{}-", split.as_str());
    let mut shards: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|name| name.ends_with(".parquet"))
        .filter(|name| {
            let file_name = name.rsplit('/').next().unwrap_or(*name);
            file_name.starts_with(&prefix)
        })
        .collect();
    shards.sort_unstable();
    shards
}

/// Proyecta un lote de Arrow a filas `review, stars`.
pub fn rename_batch(batch: &RecordBatch) -> Result<Vec<RawReview>> {
    let text = batch
        .column_by_name(TEXT_COLUMN)
        .ok_or_else(|| anyhow!("Falta la columna '{TEXT_COLUMN}' en el dataset"))?;
    let label = batch
        .column_by_name(LABEL_COLUMN)
        .ok_or_else(|| anyhow!("Falta la columna '{LABEL_COLUMN}' en el dataset"))?;

    let text = cast(text, &DataType::Utf8)?;
    let text = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("La columna '{TEXT_COLUMN}' no es de texto"))?;
    let label = cast(label, &DataType::Int64)?;
    let label = label
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| anyhow!("La columna '{LABEL_COLUMN}' no es entera"))?;

    let mut rows = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        if label.is_null(i) {
            return Err(anyhow!("Etiqueta nula en la fila {i}"));
        }
        let stars = u8::try_from(label.value(i))
            .map_err(|_| anyhow!("Etiqueta fuera de rango en la fila {i}: {}", label.value(i)))?;
        let review = if text.is_null(i) {
            String::new()
        } else {
            text.value(i).to_string()
        };
        rows.push(RawReview { review, stars });
    }
    Ok(rows)
}

/// Lee un fichero parquet completo como filas renombradas.
pub fn read_parquet_split(path: &Path) -> Result<Vec<RawReview>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("No se pudo abrir {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(rename_batch(&batch?)?);
    }
    Ok(rows)
}

/// Concatena train y test y escribe el CSV de salida (sobrescribiéndolo).
pub fn write_combined(train: Vec<RawReview>, test: Vec<RawReview>, output: &Path) -> Result<AcquisitionSummary> {
    let summary = AcquisitionSummary {
        train_rows: train.len(),
        test_rows: test.len(),
        output: output.to_path_buf(),
    };

    let mut combined = train;
    combined.extend(test);
    write_csv(output, &combined)?;
    Ok(summary)
}

async fn download_split(
    repo: &hf_hub::api::tokio::ApiRepo,
    files: &[String],
    split: Split,
) -> Result<Vec<PathBuf>> {
    let shards = shards_for_split(files, split);
    if shards.is_empty() {
        return Err(anyhow!(
            "El dataset no contiene ficheros parquet para el split '{}'",
            split.as_str()
        ));
    }

    let mut paths = Vec::with_capacity(shards.len());
    for shard in shards {
        info!("Descargando {shard}...");
        let path = repo
            .get(shard)
            .await
            .with_context(|| format!("Error descargando '{shard}'"))?;
        paths.push(path);
    }
    Ok(paths)
}

async fn load_split(paths: Vec<PathBuf>) -> Result<Vec<RawReview>> {
    tokio::task::spawn_blocking(move || -> Result<Vec<RawReview>> {
        let mut rows = Vec::new();
        for path in paths {
            rows.extend(read_parquet_split(&path)?);
        }
        Ok(rows)
    })
    .await?
}

/// Descarga `dataset_id` y escribe `output` con las columnas `review, stars`.
pub async fn download_reviews(dataset_id: &str, output: &Path) -> Result<AcquisitionSummary> {
    let api = ApiBuilder::new().with_progress(true).build()?;
    let repo = api.repo(Repo::new(dataset_id.to_string(), RepoType::Dataset));

    info!("Consultando ficheros del dataset {dataset_id}...");
    let info = repo.info().await?;
    let files: Vec<String> = info.siblings.into_iter().map(|s| s.rfilename).collect();

    let (train_paths, test_paths) = futures::try_join!(
        download_split(&repo, &files, Split::Train),
        download_split(&repo, &files, Split::Test),
    )?;

    let (train, test) = futures::try_join!(load_split(train_paths), load_split(test_paths))?;
    info!("Leídas {} reseñas de train y {} de test.", train.len(), test.len());

    let output = output.to_path_buf();
    tokio::task::spawn_blocking(move || write_combined(train, test, &output)).await?
}
