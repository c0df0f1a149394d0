pub mod audio_decoder;
mod model_loader_factory;
#[cfg(feature = "python")]
mod python_model;
mod scaffold_model;
mod separate_signature;

pub use audio_decoder::{AudioDecodeError, DecodedAudio, decode_audio};
pub use model_loader_factory::ModelLoaderFactory;
#[cfg(feature = "python")]
pub use python_model::{PythonModel, PythonModelLoader, PythonModelSpec};
pub use scaffold_model::{ScaffoldModel, ScaffoldModelLoader};
pub use separate_signature::{SeparateKwargs, SeparateSignature};
