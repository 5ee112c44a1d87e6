//! Frame timing: wall-clock deltas and the `requestAnimationFrame` loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;

use super::error::EffectError;

/// Turns animation-frame timestamps into simulation steps.
///
/// The first frame yields zero, clocks that run backwards yield zero, and
/// long gaps are clamped to `max_delta` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameClock {
	last: Option<f64>,
	max_delta: f64,
}

impl FrameClock {
	pub fn new(max_delta: f64) -> Self {
		Self {
			last: None,
			max_delta,
		}
	}

	/// Seconds since the previous timestamp (milliseconds).
	pub fn delta(&mut self, now_ms: f64) -> f64 {
		let Some(last) = self.last.replace(now_ms) else {
			return 0.0;
		};
		let dt = (now_ms - last) / 1000.0;
		if dt.is_finite() && dt > 0.0 {
			dt.min(self.max_delta)
		} else {
			0.0
		}
	}

	/// Forgets the previous timestamp so the next frame starts fresh.
	pub fn reset(&mut self) {
		self.last = None;
	}
}

impl Default for FrameClock {
	fn default() -> Self {
		Self::new(0.1)
	}
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Calls a closure on every animation frame until stopped.
pub struct AnimationLoop {
	running: Rc<Cell<bool>>,
	// Kept alive for as long as the browser may still call it.
	_callback: FrameCallback,
}

impl AnimationLoop {
	/// Starts the loop; `frame` receives the rAF timestamp in milliseconds.
	pub fn start(mut frame: impl FnMut(f64) + 'static) -> Result<Self, EffectError> {
		let running = Rc::new(Cell::new(true));
		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let (running_inner, callback_inner) = (running.clone(), callback.clone());

		*callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			if !running_inner.get() {
				return;
			}
			frame(timestamp);
			if let Some(ref cb) = *callback_inner.borrow() {
				if let Err(err) = request_frame(cb) {
					warn!("imp-fx: animation loop stopped: {err}");
					running_inner.set(false);
				}
			}
		}));
		if let Some(ref cb) = *callback.borrow() {
			request_frame(cb)?;
		}

		Ok(Self {
			running,
			_callback: callback,
		})
	}

	/// Stops re-requesting frames. A frame already queued becomes a no-op.
	pub fn stop(&self) {
		self.running.set(false);
	}
}

impl Drop for AnimationLoop {
	fn drop(&mut self) {
		self.stop();
	}
}

fn request_frame(cb: &Closure<dyn FnMut(f64)>) -> Result<i32, EffectError> {
	web_sys::window()
		.ok_or_else(|| EffectError::SurfaceUnavailable("no window".to_string()))?
		.request_animation_frame(cb.as_ref().unchecked_ref())
		.map_err(|err| EffectError::SurfaceUnavailable(format!("{err:?}")))
}
