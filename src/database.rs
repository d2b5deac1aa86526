use anyhow::Result;
use log::{info, warn};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use std::path::Path;

use crate::metrics::Metric;
use crate::storage::FeatureFile;
use crate::types::{DatabaseRow, Match};

/// An in-memory feature database searched by exhaustive ranking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureDb {
    rows: Vec<DatabaseRow>,
}

impl FeatureDb {
    /// Load a persisted database. Malformed rows are skipped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = FeatureFile::read(path)?;
        if file.skipped > 0 {
            warn!("{}: skipped {} malformed rows", path.display(), file.skipped);
        }
        info!("loaded {} rows from {}", file.rows.len(), path.display());
        Ok(Self::from_rows(file.rows))
    }

    pub fn from_rows(rows: Vec<DatabaseRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatabaseRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row stored under `filename`.
    pub fn find(&self, filename: &str) -> Option<&DatabaseRow> {
        self.rows.iter().find(|r| r.filename == filename)
    }

    /// Keep only rows of the given length.
    pub fn retain_dim(&mut self, dim: usize) {
        self.rows.retain(|r| r.vector.len() == dim);
    }

    /// Rank rows against `query` with `metric`.
    ///
    /// Rows whose length differs from the query and the row named `exclude`
    /// are left out. Returns at most `k` matches, closest first.
    pub fn search(
        &self,
        query: &[f32],
        metric: &Metric,
        exclude: Option<&str>,
        k: usize,
    ) -> Vec<Match> {
        self.search_by(k, |row| {
            if row.vector.len() != query.len() || exclude == Some(row.filename.as_str()) {
                return None;
            }
            Some(metric.distance(query, &row.vector))
        })
    }

    /// Rank rows by an arbitrary score; `None` leaves the row out.
    ///
    /// Ties keep the stored row order, and the result does not depend on how
    /// the scoring is scheduled across threads.
    pub fn search_by<F>(&self, k: usize, score: F) -> Vec<Match>
    where
        F: Fn(&DatabaseRow) -> Option<f32> + Sync,
    {
        let mut results: Vec<Match> = self
            .rows
            .par_iter()
            .filter_map(|row| {
                score(row).map(|distance| Match {
                    filename: row.filename.clone(),
                    distance,
                })
            })
            .collect();
        results.sort_by_key(|m| OrderedFloat(m.distance));
        results.truncate(k);
        results
    }
}
