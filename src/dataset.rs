//! Lectura de los CSV de reseñas y caché de lectura del dataset clasificado.
//!
//! La caché se indexa por ruta y fecha de modificación: si el fichero cambia en
//! disco, la siguiente lectura lo vuelve a cargar.

use std::{
    collections::HashMap,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::SystemTime,
};

use anyhow::{anyhow, Context, Result};
use csv::{Reader, Writer};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::models::{ReviewRecord, Sentimiento};

/// Tabla de reseñas clasificadas, inmutable una vez cargada.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub reviews: Vec<ReviewRecord>,
}

impl Dataset {
    pub fn new(reviews: Vec<ReviewRecord>) -> Self {
        Self { reviews }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Sentimientos presentes, en orden de primera aparición.
    pub fn unique_sentiments(&self) -> Vec<Sentimiento> {
        let mut seen = Vec::new();
        for review in &self.reviews {
            if !seen.contains(&review.sentimiento) {
                seen.push(review.sentimiento);
                if seen.len() == Sentimiento::ALL.len() {
                    break;
                }
            }
        }
        seen
    }

    /// Rango observado de estrellas; (0, 4) si la tabla está vacía.
    pub fn star_bounds(&self) -> (u8, u8) {
        let min = self.reviews.iter().map(|r| r.stars).min();
        let max = self.reviews.iter().map(|r| r.stars).max();
        match (min, max) {
            (Some(min), Some(max)) => (min, max),
            _ => (0, 4),
        }
    }
}

/// Lee un CSV con cabecera y lo deserializa fila a fila.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("No se pudo abrir el fichero: {}", path.display()))?;
    let mut reader = Reader::from_reader(file);

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize().enumerate() {
        let row: T = result.with_context(|| {
            format!("Fila {} no válida en {}", index + 2, path.display())
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Escribe `rows` como CSV con cabecera, creando el directorio si no existe.
/// Sobrescribe el fichero si ya existía.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("No se pudo crear el directorio: {}", parent.display())
            })?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("No se pudo crear el fichero: {}", path.display()))?;
    let mut writer = Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_classified(path: &Path) -> Result<Dataset> {
    let reviews: Vec<ReviewRecord> = read_csv(path)?;
    info!("Dataset cargado: {} reseñas desde {}", reviews.len(), path.display());
    Ok(Dataset::new(reviews))
}

#[derive(Clone)]
struct CachedDataset {
    modified: SystemTime,
    data: Arc<Dataset>,
}

/// Caché de lectura compartida por todas las peticiones del dashboard.
#[derive(Clone, Default)]
pub struct DatasetCache {
    entries: Arc<Mutex<HashMap<PathBuf, CachedDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devuelve el dataset de `path`, recargándolo sólo si su fecha de
    /// modificación cambió desde la última lectura.
    pub fn get(&self, path: &Path) -> Result<Arc<Dataset>> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("No se encuentra el dataset: {}", path.display()))?;

        if let Some(cached) = self.lookup(path)? {
            if cached.modified == modified {
                return Ok(cached.data);
            }
            info!("El dataset {} cambió en disco, recargando.", path.display());
        }

        // El CSV se parsea sin el lock: otras rutas y lecturas en caché no esperan.
        let data = Arc::new(load_classified(path)?);
        self.entries
            .lock()
            .map_err(|_| anyhow!("La caché del dataset quedó envenenada"))?
            .insert(
                path.to_path_buf(),
                CachedDataset {
                    modified,
                    data: data.clone(),
                },
            );
        Ok(data)
    }

    fn lookup(&self, path: &Path) -> Result<Option<CachedDataset>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("La caché del dataset quedó envenenada"))?;
        Ok(entries.get(path).cloned())
    }

    /// Igual que [`DatasetCache::get`] pero fuera del hilo del runtime.
    pub async fn get_async(&self, path: &Path) -> Result<Arc<Dataset>> {
        let cache = self.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || cache.get(&path)).await?
    }

    pub fn invalidate(&self, path: &Path) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(path);
        }
    }
}
