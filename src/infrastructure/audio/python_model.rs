use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::application::ports::{
    ArtifactPaths, AudioModel, ModelError, ModelInput, ModelLoader, ModelOutput,
};

use super::separate_signature::SeparateSignature;

static PYTHON_INIT: Once = Once::new();

const SPEECH_STEM: &str = "speech.wav";
const BACKGROUND_STEM: &str = "background.wav";

/// How to reach the separation model inside the embedded interpreter.
#[derive(Debug, Clone)]
pub struct PythonModelSpec {
    pub module: String,
    pub class: String,
    pub checkpoint_artifact: String,
    pub dtype: String,
    pub python_path: Option<PathBuf>,
}

pub struct PythonModelLoader {
    spec: PythonModelSpec,
}

impl PythonModelLoader {
    pub fn new(spec: PythonModelSpec) -> Self {
        Self { spec }
    }
}

fn init_python(extra_path: Option<&Path>) -> PyResult<()> {
    PYTHON_INIT.call_once(pyo3::prepare_freethreaded_python);

    Python::with_gil(|py| {
        if let Some(path) = extra_path {
            let sys_path = py.import("sys")?.getattr("path")?;
            sys_path.call_method1("insert", (0, path.to_string_lossy().as_ref()))?;
        }
        Ok(())
    })
}

/// cuda, then mps, then cpu.
fn detect_device(py: Python<'_>) -> String {
    let Ok(torch) = py.import("torch") else {
        return "cpu".to_string();
    };

    let available = |probe: PyResult<Bound<'_, PyAny>>| {
        probe
            .and_then(|p| p.call_method0("is_available"))
            .and_then(|v| v.extract::<bool>())
            .unwrap_or(false)
    };

    if available(torch.getattr("cuda")) {
        return "cuda".to_string();
    }
    if available(torch.getattr("backends").and_then(|b| b.getattr("mps"))) {
        return "mps".to_string();
    }
    "cpu".to_string()
}

/// Falls back to passing only the description when the signature cannot be read.
fn separate_signature(py: Python<'_>, model: &Bound<'_, PyAny>) -> SeparateSignature {
    let inspected = (|| -> PyResult<SeparateSignature> {
        let inspect = py.import("inspect")?;
        let var_keyword = inspect.getattr("Parameter")?.getattr("VAR_KEYWORD")?;
        let parameters = inspect
            .call_method1("signature", (model.getattr("separate")?,))?
            .getattr("parameters")?;

        let mut names = Vec::new();
        let mut accepts_any = false;
        for param in parameters.call_method0("values")?.try_iter()? {
            let param = param?;
            if param.getattr("kind")?.eq(&var_keyword)? {
                accepts_any = true;
            }
            names.push(param.getattr("name")?.extract::<String>()?);
        }
        Ok(SeparateSignature::from_parameters(
            names.iter().map(String::as_str),
            accepts_any,
        ))
    })();

    inspected.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not inspect separate(), passing the description only");
        SeparateSignature::default()
    })
}

fn classify(err: PyErr) -> ModelError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("cuda")
        || lowered.contains("out of memory")
        || lowered.contains("device-side")
    {
        ModelError::DeviceFault(message)
    } else {
        ModelError::InferenceFailed(message)
    }
}

impl ModelLoader for PythonModelLoader {
    fn load(&self, artifacts: &ArtifactPaths) -> Result<Arc<dyn AudioModel>, ModelError> {
        let checkpoint = artifacts.require(&self.spec.checkpoint_artifact)?;
        let checkpoint_dir = checkpoint.parent().unwrap_or(checkpoint).to_path_buf();

        init_python(self.spec.python_path.as_deref())
            .map_err(|e| ModelError::LoadFailed(format!("python init: {e}")))?;

        Python::with_gil(|py| {
            let device = detect_device(py);
            tracing::info!(
                module = %self.spec.module,
                class = %self.spec.class,
                device = %device,
                checkpoint = %checkpoint_dir.display(),
                "Loading python model"
            );

            let class = py
                .import(self.spec.module.as_str())?
                .getattr(self.spec.class.as_str())?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("dtype", self.spec.dtype.as_str())?;
            kwargs.set_item("enable_text_ranker", false)?;
            kwargs.set_item("enable_span_predictor", false)?;

            let mut model = class.call_method(
                "from_pretrained",
                (checkpoint_dir.to_string_lossy().as_ref(),),
                Some(&kwargs),
            )?;
            if model.hasattr("to")? {
                model = model.call_method1("to", (device.as_str(),))?;
            }
            let signature = separate_signature(py, &model);
            tracing::debug!(?signature, "Inspected separate() signature");

            Ok::<_, PyErr>(PythonModel {
                model: model.unbind(),
                device,
                signature,
            })
        })
        .map(|model| Arc::new(model) as Arc<dyn AudioModel>)
        .map_err(|e| ModelError::LoadFailed(e.to_string()))
    }
}

pub struct PythonModel {
    model: Py<PyAny>,
    device: String,
    signature: SeparateSignature,
}

impl AudioModel for PythonModel {
    fn device(&self) -> &str {
        &self.device
    }

    fn infer(&self, input: &ModelInput) -> Result<ModelOutput, ModelError> {
        let media = input.media.as_ref().ok_or_else(|| {
            ModelError::UnsupportedInput("this model needs reference media".to_string())
        })?;

        // Removed when dropped, whatever the outcome.
        let workdir =
            tempfile::tempdir().map_err(|e| ModelError::InferenceFailed(e.to_string()))?;
        let input_name = media
            .filename
            .as_deref()
            .and_then(|f| Path::new(f).file_name())
            .unwrap_or(OsStr::new("input"));
        let input_path = workdir.path().join(input_name);
        let speech_path = workdir.path().join(SPEECH_STEM);
        let background_path = workdir.path().join(BACKGROUND_STEM);

        std::fs::write(&input_path, &media.data)
            .map_err(|e| ModelError::InferenceFailed(format!("write input: {e}")))?;

        let unsupported = self.signature.unsupported(&input.params);
        if !unsupported.is_empty() {
            tracing::debug!(?unsupported, "Model ignores these generation parameters");
        }
        let extra = self.signature.kwargs(&input.params);

        Python::with_gil(|py| {
            let model = self.model.bind(py);
            let kwargs = PyDict::new(py);
            kwargs.set_item("description", input.prompt.as_str())?;
            if let Some(seed) = extra.seed {
                kwargs.set_item("seed", seed)?;
            }
            if let Some(guidance) = extra.guidance_scale {
                kwargs.set_item("guidance_scale", guidance)?;
            }

            let result = model.call_method(
                "separate",
                (input_path.to_string_lossy().as_ref(),),
                Some(&kwargs),
            )?;
            result.call_method1(
                "save",
                (
                    speech_path.to_string_lossy().as_ref(),
                    background_path.to_string_lossy().as_ref(),
                ),
            )?;
            Ok::<_, PyErr>(())
        })
        .map_err(classify)?;

        let (mut target, sample_rate) = read_wav_mono(&speech_path)?;
        let (mut residual, _) = read_wav_mono(&background_path)?;
        if let Some(limit) = input.params.duration_secs {
            let max = (limit * sample_rate as f32) as usize;
            target.truncate(max);
            residual.truncate(max);
        }

        Ok(ModelOutput {
            target,
            residual: Some(residual),
            sample_rate,
        })
    }
}

fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), ModelError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| ModelError::InferenceFailed(format!("read {}: {e}", path.display())))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| ModelError::InferenceFailed(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| ModelError::InferenceFailed(e.to_string()))?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate))
}
