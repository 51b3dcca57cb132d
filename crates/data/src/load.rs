use crate::schema::CardsFile;
use anyhow::{bail, Context};
use deckforge_core::{
    duplicate_card_ids, Catalog, CatalogProvider, DifficultyTable, LoadedCatalog, SessionError,
};
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const CARDS_FILE: &str = "cards.json";
pub const DIFFICULTIES_FILE: &str = "difficulties.json";

pub fn load_cards(path: &Path) -> anyhow::Result<Catalog> {
    let file: CardsFile = load_json(path)?;
    let catalog = file.into_catalog();
    if catalog.games.is_empty() {
        bail!("{} defines no games", path.display());
    }
    let dupes = duplicate_card_ids(&catalog);
    if !dupes.is_empty() {
        warn!(
            "{} repeats card ids {}; lookups resolve to the first",
            path.display(),
            dupes.join(", ")
        );
    }
    Ok(catalog)
}

/// A missing difficulty file means no presets, not an error.
pub fn load_difficulties(path: &Path) -> anyhow::Result<DifficultyTable> {
    if !path.exists() {
        warn!("{} not found; no difficulty presets", path.display());
        return Ok(DifficultyTable::default());
    }
    load_json(path)
}

pub fn load_catalog(dir: &Path) -> anyhow::Result<LoadedCatalog> {
    let catalog = load_cards(&dir.join(CARDS_FILE))?;
    let difficulties = load_difficulties(&dir.join(DIFFICULTIES_FILE))?;
    info!(
        "loaded {} cards in {} games, {} difficulties from {}",
        catalog.card_count(),
        catalog.games.len(),
        difficulties.len(),
        dir.display()
    );
    Ok(LoadedCatalog {
        catalog,
        difficulties,
    })
}

/// Reads the catalog from a data directory each time a session opens.
#[derive(Debug, Clone)]
pub struct DirCatalogProvider {
    dir: PathBuf,
}

impl DirCatalogProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CatalogProvider for DirCatalogProvider {
    fn load(&self) -> Result<LoadedCatalog, SessionError> {
        load_catalog(&self.dir).map_err(|err| SessionError::CatalogLoadFailure(format!("{err:#}")))
    }
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
