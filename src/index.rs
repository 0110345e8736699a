use crate::db::Database;
use crate::embedder::Embedder;
use crate::error::{EmbedError, IndexBuildError, RetrievalError};
use crate::tagged::TaggedLine;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub isbn13: u64,
    pub line: String,
    /// 1 - cosine distance; higher is closer
    pub similarity: f32,
}

/// Nearest-neighbour index over tagged description lines. Built once; no
/// inserts or deletes afterwards.
pub struct DescriptionIndex {
    embedder: Box<dyn Embedder>,
    db: Database,
    len: usize,
}

impl DescriptionIndex {
    pub fn build(
        embedder: Box<dyn Embedder>,
        lines: &[TaggedLine],
        batch_size: usize,
    ) -> Result<Self, IndexBuildError> {
        Self::build_with_progress(embedder, lines, batch_size, None)
    }

    /// Embed every line and store it. When `progress` is given a bar is
    /// attached to it for the duration of the build.
    pub fn build_with_progress(
        embedder: Box<dyn Embedder>,
        lines: &[TaggedLine],
        batch_size: usize,
        progress: Option<&MultiProgress>,
    ) -> Result<Self, IndexBuildError> {
        let start = Instant::now();
        let dimensions = embedder.dimensions();
        let mut db = Database::open_in_memory(dimensions)?;

        let bar = match progress {
            Some(multi) => multi.add(ProgressBar::new(lines.len() as u64)),
            None => ProgressBar::hidden(),
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner} Embedding descriptions [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        for batch in lines.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|l| l.text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts)?;

            if embeddings.len() != batch.len() {
                return Err(IndexBuildError::Embedding(EmbedError::EmbeddingFailed(
                    format!("expected {} embeddings, got {}", batch.len(), embeddings.len()),
                )));
            }
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
                return Err(IndexBuildError::DimensionMismatch {
                    expected: dimensions,
                    got: bad.len(),
                });
            }

            let rows: Vec<(u64, &str, &[f32])> = batch
                .iter()
                .zip(&embeddings)
                .map(|(line, embedding)| (line.isbn13, line.text.as_str(), embedding.as_slice()))
                .collect();
            db.insert_lines(&rows)?;
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();
        let len = db.count_lines()?;

        info!(
            "Indexed {} descriptions with {} in {:.2}s",
            len,
            embedder.name(),
            start.elapsed().as_secs_f32()
        );

        Ok(Self { embedder, db, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` hits, most similar first.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        debug!("Searching index for: {}", query);
        let query_embedding = self.embedder.embed(query)?;
        let hits = self
            .db
            .find_similar_lines(&query_embedding, k)?
            .into_iter()
            .map(|(isbn13, line, distance)| SearchHit {
                isbn13,
                line,
                similarity: 1.0 - distance,
            })
            .collect::<Vec<_>>();

        debug!(
            "Found {} candidates. Top similarity: {:.4}",
            hits.len(),
            hits.first().map(|h| h.similarity).unwrap_or(0.0)
        );
        Ok(hits)
    }
}
