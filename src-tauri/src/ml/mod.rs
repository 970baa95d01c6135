pub mod engine;
pub mod postprocess;
pub mod preprocess;

#[cfg(feature = "ml")]
pub mod inference;
#[cfg(feature = "ml")]
pub mod ml_model;

pub use engine::{EngineOutput, InferenceBackend, LoadedModel};
pub use postprocess::{argmax, classify, softmax};
pub use preprocess::{preprocess, MEAN, STD};

#[cfg(feature = "ml")]
pub use inference::{backend_for, record_bytes, BurnBackend, BurnModel};
#[cfg(feature = "ml")]
pub use ml_model::{ModelConfig, SkinClassifier};
