//! Filesystem persistence of the fitted model.
//!
//! The artifact is an opaque bincode encoding of
//! [`LogisticRegressionClassifier`]. It carries no version tag; a blob that
//! does not decode is reported as [`ArtifactError::Decode`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::classifiers::LogisticRegressionClassifier;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot access model artifact at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact at {} is not a valid model: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("cannot encode model: {0}")]
    Encode(#[source] bincode::Error),
}

pub fn encode_model(model: &LogisticRegressionClassifier) -> Result<Vec<u8>, ArtifactError> {
    bincode::serialize(model).map_err(ArtifactError::Encode)
}

/// Writes the model to `path`, creating missing parent directories.
pub fn save_model<P: AsRef<Path>>(
    model: &LogisticRegressionClassifier,
    path: P,
) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = encode_model(model)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, &bytes).map_err(io_err)?;
    debug!(path = %path.display(), bytes = bytes.len(), "model artifact written");
    Ok(())
}

pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LogisticRegressionClassifier, ArtifactError> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    bincode::deserialize(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifiers::{Classifier, LogisticRegressionParams};
    use crate::core::Dataset;
    use tempfile::tempdir;

    fn model() -> LogisticRegressionClassifier {
        let ds = Dataset::bundled_iris().unwrap();
        LogisticRegressionClassifier::fit(&ds, &LogisticRegressionParams::default()).unwrap()
    }

    #[test]
    fn saved_model_predicts_like_the_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("artifacts/nested/model.bin");
        let original = model();

        save_model(&original, &path).unwrap();
        let loaded = load_model(&path).unwrap();

        for x in [[5.1, 3.5, 1.4, 0.2], [6.0, 2.9, 4.5, 1.5], [6.2, 3.4, 5.4, 2.3]] {
            assert_eq!(
                loaded.get_votes_for_features(&x).unwrap(),
                original.get_votes_for_features(&x).unwrap()
            );
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load_model(dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
        assert!(err.to_string().contains("nope.bin"));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        fs::write(&path, b"definitely not a model").unwrap();
        assert!(matches!(
            load_model(&path).unwrap_err(),
            ArtifactError::Decode { .. }
        ));
    }

    #[test]
    fn directory_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_model(dir.path()).unwrap_err(),
            ArtifactError::Io { .. }
        ));
    }
}
