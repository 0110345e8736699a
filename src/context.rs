use crate::catalog::Catalog;
use crate::config::{ConfigManager, RetrievalConfig};
use crate::embedder;
use crate::error::{NoResultsError, Result};
use crate::index::DescriptionIndex;
use crate::presentation::Recommendation;
use crate::protocol::{RecommendRequest, RecommendResponse, RecommendStats};
use crate::recommender::{QueryFilters, Recommender};
use crate::tagged;
use anyhow::Context as AnyhowContext;
use indicatif::MultiProgress;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Everything a request needs, built once at startup and shared by reference.
pub struct AppContext {
    pub catalog: Catalog,
    pub index: DescriptionIndex,
    pub retrieval: RetrievalConfig,
}

/// Command-line overrides applied on top of the config files.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub books_path: Option<PathBuf>,
    pub descriptions_path: Option<PathBuf>,
    pub final_top_k: Option<usize>,
}

impl AppContext {
    pub fn new(
        base_path: &Path,
        overrides: &Overrides,
        progress: Option<&MultiProgress>,
    ) -> anyhow::Result<Self> {
        let config_manager = ConfigManager::new(Some(base_path))?;
        let embedding_config = config_manager.get_embedding_config();
        let mut retrieval = config_manager.get_retrieval_config();
        if let Some(final_top_k) = overrides.final_top_k {
            retrieval.final_top_k = final_top_k;
        }
        let (books_path, descriptions_path) = resolve_paths(base_path, overrides, &config_manager);

        let catalog = Catalog::load(&books_path)?;
        info!("Loaded {} books from {}", catalog.len(), books_path.display());

        let lines = tagged::load_tagged_lines(&descriptions_path)?;
        let orphans = lines.iter().filter(|l| !catalog.contains(l.isbn13)).count();
        if orphans > 0 {
            warn!(
                "{} tagged descriptions have no catalog entry and will never be recommended",
                orphans
            );
        }

        let model_cache_dir = config_manager.get_model_cache_dir()?;
        fs::create_dir_all(&model_cache_dir).with_context(|| {
            format!(
                "Failed to create model cache directory {}",
                model_cache_dir.display()
            )
        })?;
        debug!("Using model cache directory: {}", model_cache_dir.display());

        let embedder = embedder::from_config(&embedding_config, &model_cache_dir)?;
        let index = DescriptionIndex::build_with_progress(
            embedder,
            &lines,
            embedding_config.batch_size,
            progress,
        )?;

        Ok(Self {
            catalog,
            index,
            retrieval,
        })
    }

    pub fn from_parts(catalog: Catalog, index: DescriptionIndex, retrieval: RetrievalConfig) -> Self {
        Self {
            catalog,
            index,
            retrieval,
        }
    }

    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(&self.catalog, &self.index, self.retrieval.clone())
    }

    /// Run one query end to end and format the results for display.
    pub fn execute_recommend(&self, filters: &QueryFilters) -> Result<RecommendResponse> {
        let start = Instant::now();

        let recommendations = self.recommender().recommend(filters)?;
        let results: Vec<Recommendation> = recommendations
            .entries
            .iter()
            .map(|entry| Recommendation::from(*entry))
            .collect();

        let num_results = results.len();
        Ok(RecommendResponse {
            request: RecommendRequest {
                query: filters.query.clone(),
                category: filters.category.to_string(),
                tone: filters.tone.to_string(),
            },
            results,
            stats: RecommendStats {
                total_time_ms: start.elapsed().as_millis() as u64,
                num_candidates: recommendations.num_candidates,
                num_results,
            },
        })
    }
}

/// Load only the catalog, for commands that never query the index.
pub fn load_catalog(base_path: &Path, overrides: &Overrides) -> anyhow::Result<Catalog> {
    let config_manager = ConfigManager::new(Some(base_path))?;
    let (books_path, _) = resolve_paths(base_path, overrides, &config_manager);
    Ok(Catalog::load(&books_path)?)
}

/// Catalog and tagged-description paths: CLI overrides first, then config.
/// Relative paths are joined onto the workspace.
fn resolve_paths(
    base_path: &Path,
    overrides: &Overrides,
    config_manager: &ConfigManager,
) -> (PathBuf, PathBuf) {
    let catalog_config = config_manager.get_catalog_config();
    let books_path = overrides
        .books_path
        .clone()
        .unwrap_or(catalog_config.books_path);
    let descriptions_path = overrides
        .descriptions_path
        .clone()
        .unwrap_or(catalog_config.descriptions_path);
    (base_path.join(books_path), base_path.join(descriptions_path))
}

impl RecommendResponse {
    /// Turn an empty answer into a `NoResultsError` for callers that report it.
    pub fn ensure_results(self) -> Result<Self, NoResultsError> {
        if self.results.is_empty() {
            Err(NoResultsError {
                query: self.request.query,
            })
        } else {
            Ok(self)
        }
    }
}
