//! imp-fx: Canvas particle effects for the imp web UI.
//!
//! This crate provides a WASM-based effects stage that plays fireworks and
//! ambient particle effects (sparkles, snow, bubbles, confetti, ...) on a
//! canvas layered over a page container.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::effects::{
	Bounds, Color, EffectConfig, EffectError, EffectHost, EffectParams, EffectSettings, EffectsController,
	EffectsStage, FallbackPolicy, HeadlessHost, ParticleSystem, RecordingSurface, Surface, Variant,
	mount_effect, resolve_variant,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("imp-fx: logging initialized");
}

/// Load page configuration from a script element with id="effect-config".
/// Expected format: JSON `EffectConfig`; every field is optional.
fn load_effect_config() -> Option<EffectConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("effect-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<EffectConfig>(&json_text) {
		Ok(config) => {
			info!(
				"imp-fx: loaded config, container `{}`, default effect `{}`",
				config.container, config.defaults.kind
			);
			Some(config)
		}
		Err(e) => {
			warn!("imp-fx: failed to parse effect config: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads the effect configuration from the DOM and renders the effects stage.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_effect_config().unwrap_or_default();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="imp Effects" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-effects">
			<EffectsStage config=config />
			<div class="effects-overlay">
				<h1>"imp Effects"</h1>
				<p class="subtitle">"Pick an effect, then click the stage to play it again."</p>
			</div>
		</div>
	}
}
