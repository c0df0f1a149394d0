use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ModelError, ModelLoader};
use crate::presentation::config::{ModelBackend, ModelSettings};

use super::scaffold_model::ScaffoldModelLoader;

pub struct ModelLoaderFactory;

impl ModelLoaderFactory {
    pub fn create(settings: &ModelSettings) -> Result<Arc<dyn ModelLoader>, ModelError> {
        match settings.backend {
            ModelBackend::Scaffold => Ok(Arc::new(ScaffoldModelLoader::new(
                settings.sample_rate,
                settings.default_duration_secs,
                Duration::from_millis(settings.scaffold_warmup_ms),
            ))),
            ModelBackend::Python => Self::python(settings),
        }
    }

    #[cfg(feature = "python")]
    fn python(settings: &ModelSettings) -> Result<Arc<dyn ModelLoader>, ModelError> {
        use super::python_model::{PythonModelLoader, PythonModelSpec};

        let python = &settings.python;
        Ok(Arc::new(PythonModelLoader::new(PythonModelSpec {
            module: python.module.clone(),
            class: python.class.clone(),
            checkpoint_artifact: python.checkpoint_artifact.clone(),
            dtype: python.dtype.clone(),
            python_path: python.python_path.clone(),
        })))
    }

    #[cfg(not(feature = "python"))]
    fn python(_settings: &ModelSettings) -> Result<Arc<dyn ModelLoader>, ModelError> {
        Err(ModelError::LoadFailed(
            "the python backend needs a build with the `python` feature".to_string(),
        ))
    }
}
