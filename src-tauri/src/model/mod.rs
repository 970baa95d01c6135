pub mod config;
pub mod inference_config;
pub mod loader;
pub mod model_metadata;
pub mod model_storage;

pub use config::{AppConfig, DeviceType, InferenceSettings, ModelSettings};
pub use inference_config::InferenceConfig;
pub use loader::{load_model, load_model_handle, materialize_model, ModelHandle};
pub use model_metadata::ModelMetadata;
pub use model_storage::{load_metadata, load_model_bundle, save_model_bundle};
