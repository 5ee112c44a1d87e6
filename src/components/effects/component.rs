//! Leptos component hosting the effects stage.
//!
//! Renders a toolbar with one button per effect and the container element
//! effect layers attach to. Once the container is mounted, an
//! [`EffectsController`] is created for it and driven by an
//! [`AnimationLoop`]. Clicking a button selects and plays that effect;
//! clicking the stage replays the current selection. Window resizes refit
//! the canvas to the container.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::MouseEvent;

use super::clock::AnimationLoop;
use super::controller::EffectsController;
use super::dom::DomHost;
use super::types::EffectConfig;
use super::variant::Variant;

type SharedController = Rc<RefCell<Option<EffectsController<DomHost>>>>;

fn play(controller: &SharedController, kind: Option<&str>) {
	if let Some(ref mut fx) = *controller.borrow_mut() {
		if let Err(err) = fx.play(kind) {
			warn!("imp-fx: could not play effect: {err}");
		}
	}
}

/// Effect picker plus the stage effects are drawn on.
#[component]
pub fn EffectsStage(config: EffectConfig) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let controller: SharedController = Rc::new(RefCell::new(None));
	let animation: Rc<RefCell<Option<AnimationLoop>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let selected = RwSignal::new(config.defaults.kind.clone());
	let (controller_init, animation_init, resize_init) =
		(controller.clone(), animation.clone(), resize_cb.clone());

	Effect::new(move |_| {
		if container_ref.get().is_none() || controller_init.borrow().is_some() {
			return;
		}
		let host = DomHost::new(config.container.clone());
		let seed = js_sys::Date::now() as u64;
		*controller_init.borrow_mut() = Some(EffectsController::new(host, &config, seed));

		let controller_frame = controller_init.clone();
		let started = AnimationLoop::start(move |timestamp| {
			if let Some(ref mut fx) = *controller_frame.borrow_mut() {
				if let Err(err) = fx.tick(timestamp) {
					warn!("imp-fx: frame skipped: {err}");
				}
			}
		});
		match started {
			Ok(running) => *animation_init.borrow_mut() = Some(running),
			Err(err) => error!("imp-fx: could not start animation loop: {err}"),
		}

		let controller_resize = controller_init.clone();
		*resize_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut fx) = *controller_resize.borrow_mut() {
				fx.resize();
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), resize_init.borrow().as_ref()) {
			if let Err(err) = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref()) {
				warn!("imp-fx: could not watch window resizes: {err:?}");
			}
		}
	});

	let buttons = Variant::ALL
		.into_iter()
		.map(|variant| {
			let controller = controller.clone();
			let on_click = move |_: MouseEvent| {
				selected.set(variant.key().to_string());
				if let Some(ref mut fx) = *controller.borrow_mut() {
					if let Err(err) = fx.select_effect(variant.key()) {
						warn!("imp-fx: could not select {variant}: {err}");
					}
				}
				play(&controller, None);
			};
			view! {
				<button
					class="fx-button"
					class:active=move || selected.get() == variant.key()
					on:click=on_click
				>
					{variant.label()}
				</button>
			}
		})
		.collect_view();

	let controller_stage = controller.clone();
	let on_stage_click = move |_: MouseEvent| play(&controller_stage, None);

	view! {
		<div class="effects-stage">
			<div class="fx-toolbar">{buttons}</div>
			<div
				node_ref=container_ref
				class="canvas-container"
				on:click=on_stage_click
				style="position: relative; width: 100%; height: 100%; cursor: pointer;"
			/>
		</div>
	}
}
