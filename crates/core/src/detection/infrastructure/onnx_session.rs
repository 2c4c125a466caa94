use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::Session;

use crate::detection::domain::detection_error::DetectionError;

/// Preferred ONNX execution providers for the current platform.
///
/// ONNX Runtime falls back to CPU when a listed provider is unavailable.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Loads a model into a session configured for single-frame inference.
///
/// Several detector instances may run side by side on worker threads, so
/// each session keeps to one inter-op thread.
pub fn build_session(model_path: &Path) -> Result<Session, DetectionError> {
    let providers = preferred_execution_providers();
    log::debug!(
        "Loading {} with {} accelerated provider(s)",
        model_path.display(),
        providers.len()
    );

    commit(model_path, providers)
        .map_err(|e| DetectionError::Model(format!("{}: {e}", model_path.display())))
}

fn commit(
    model_path: &Path,
    providers: Vec<ExecutionProviderDispatch>,
) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::builder()?
        .with_inter_threads(1)?
        .with_execution_providers(providers)?
        .commit_from_file(model_path)?;
    Ok(session)
}
