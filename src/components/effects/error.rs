//! Error types for effect activation and per-frame simulation.

use thiserror::Error;

/// A drawing call the surface refused.
#[derive(Debug, Error)]
#[error("surface operation `{op}` failed: {message}")]
pub struct SurfaceError {
	/// Name of the failing drawing operation.
	pub op: &'static str,
	/// Backend-provided description.
	pub message: String,
}

impl SurfaceError {
	pub fn new(op: &'static str, message: impl Into<String>) -> Self {
		Self {
			op,
			message: message.into(),
		}
	}
}

/// Everything that can go wrong between choosing an effect and drawing its last frame.
#[derive(Debug, Error)]
pub enum EffectError {
	/// The container selector matched nothing in the document.
	#[error("effect container `{0}` could not be resolved")]
	ContainerNotFound(String),

	/// A container was found but no drawing surface could be attached to it.
	#[error("drawing surface unavailable: {0}")]
	SurfaceUnavailable(String),

	/// Only raised when the fallback policy rejects unknown effect types.
	#[error("unknown effect type `{0}`")]
	UnknownVariant(String),

	#[error("invalid color `{0}`, expected #rrggbb")]
	InvalidColor(String),

	/// Non-positive, non-finite, or (for counts) above [`MAX_COUNT`](super::types::MAX_COUNT).
	#[error("invalid {name} `{value}`, out of range")]
	InvalidParameter { name: &'static str, value: f64 },

	/// A simulation produced non-finite particle state.
	#[error("{0} simulation diverged")]
	Diverged(&'static str),

	#[error(transparent)]
	Surface(#[from] SurfaceError),

	#[error("effects controller has been shut down")]
	ShutDown,

	#[error("failed to encode effect settings: {0}")]
	Encode(#[from] serde_json::Error),
}
