use std::collections::BTreeMap;

use csv::{ReaderBuilder, Trim};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;

use crate::core::features::FeatureVector;
use crate::core::species::Species;

const BUNDLED_IRIS_CSV: &str = include_str!("../../data/iris.csv");

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("malformed iris csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is empty")]
    Empty,

    #[error("invalid split: {0}")]
    InvalidSplit(String),
}

impl DatasetError {
    /// Line of the offending record, when the reader knows it.
    pub fn line(&self) -> Option<u64> {
        match self {
            DatasetError::Csv(e) => e.position().map(|p| p.line()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IrisRow {
    sepal_length: f64,
    sepal_width: f64,
    petal_length: f64,
    petal_width: f64,
    species: Species,
}

/// In-memory labelled table: one [`FeatureVector`] and one class label per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<FeatureVector>,
    labels: Vec<usize>,
}

impl Dataset {
    /// The 150-row Iris table shipped inside the binary.
    pub fn bundled_iris() -> Result<Self, DatasetError> {
        Self::from_csv_str(BUNDLED_IRIS_CSV)
    }

    /// Reads CSV with a `sepal_length,sepal_width,petal_length,petal_width,species`
    /// header. Columns are matched by name; `#` lines are skipped.
    pub fn from_csv_str(text: &str) -> Result<Self, DatasetError> {
        let mut reader = ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut records = Vec::new();
        let mut labels = Vec::new();
        for row in reader.deserialize::<IrisRow>() {
            let row = row?;
            records.push(FeatureVector::new(
                row.sepal_length,
                row.sepal_width,
                row.petal_length,
                row.petal_width,
            ));
            labels.push(row.species.label());
        }

        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FeatureVector] {
        &self.records
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureVector, usize)> {
        self.records.iter().zip(self.labels.iter().copied())
    }

    /// Row-major `len() x 4` buffer.
    pub fn flat_records(&self) -> Vec<f64> {
        self.records.iter().flat_map(|r| r.to_array()).collect()
    }

    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &y in &self.labels {
            *counts.entry(y).or_insert(0) += 1;
        }
        counts
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            records: indices.iter().map(|&i| self.records[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Splits into `(train, test)` keeping class proportions.
    ///
    /// Each class sends `round(test_size * class_count)` of its rows to the
    /// test partition. The same seed always yields the same partitions.
    pub fn stratified_split(
        &self,
        test_size: f64,
        seed: u64,
    ) -> Result<(Dataset, Dataset), DatasetError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DatasetError::InvalidSplit(format!(
                "test_size must be in (0, 1), got {test_size}"
            )));
        }
        if self.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &y) in self.labels.iter().enumerate() {
            by_class.entry(y).or_default().push(i);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train_idx = Vec::with_capacity(self.len());
        let mut test_idx = Vec::new();

        for (_, mut members) in by_class {
            members.shuffle(&mut rng);
            let n_test = ((test_size * members.len() as f64).round() as usize).min(members.len());
            test_idx.extend_from_slice(&members[..n_test]);
            train_idx.extend_from_slice(&members[n_test..]);
        }

        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(DatasetError::InvalidSplit(format!(
                "test_size {test_size} leaves {} train and {} test rows",
                train_idx.len(),
                test_idx.len()
            )));
        }

        train_idx.shuffle(&mut rng);
        test_idx.shuffle(&mut rng);

        Ok((self.select(&train_idx), self.select(&test_idx)))
    }
}
