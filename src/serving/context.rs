use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::artifact::{ArtifactError, load_model};
use crate::classifiers::Classifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Loaded,
    Unavailable,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Loaded => write!(f, "loaded"),
            ModelState::Unavailable => write!(f, "model_unavailable"),
        }
    }
}

/// Read-only state shared by every request handler.
///
/// The model is resolved once, when the context is built, and never
/// reloaded. A missing or unreadable artifact leaves the context in
/// [`ModelState::Unavailable`] instead of failing startup.
#[derive(Clone)]
pub struct AppContext {
    model: Option<Arc<dyn Classifier>>,
    model_path: PathBuf,
}

impl AppContext {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Self {
        let model_path = model_path.as_ref().to_path_buf();
        let model = match load_model(&model_path) {
            Ok(model) => {
                info!(
                    path = %model_path.display(),
                    classes = model.number_of_classes(),
                    "model loaded"
                );
                Some(Arc::new(model) as Arc<dyn Classifier>)
            }
            Err(ArtifactError::NotFound(path)) => {
                warn!(
                    "Model not found at {}. Run `iris-classifier train` first; /predict will answer 503 until the service is restarted with a model.",
                    path.display()
                );
                None
            }
            Err(e) => {
                warn!("Failed to load model: {e}. /predict will answer 503.");
                None
            }
        };
        Self { model, model_path }
    }

    pub fn with_model(model: Arc<dyn Classifier>) -> Self {
        Self {
            model: Some(model),
            model_path: PathBuf::new(),
        }
    }

    pub fn unavailable<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model: None,
            model_path: model_path.into(),
        }
    }

    pub fn model(&self) -> Option<&Arc<dyn Classifier>> {
        self.model.as_ref()
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn state(&self) -> ModelState {
        if self.model.is_some() {
            ModelState::Loaded
        } else {
            ModelState::Unavailable
        }
    }
}
