//! Browser host: a container element and the canvas layers drawn into it.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, Document, Element, HtmlCanvasElement};

use super::error::{EffectError, SurfaceError};
use super::surface::{ColorStop, Composite, Paint, Surface};
use super::types::Bounds;
use super::wrapper::EffectHost;

/// Class given to every canvas the engine creates.
pub const LAYER_CLASS: &str = "fx-layer";

fn js_error(op: &'static str) -> impl Fn(JsValue) -> SurfaceError {
	move |err| SurfaceError::new(op, format!("{err:?}"))
}

fn unavailable(err: JsValue) -> EffectError {
	EffectError::SurfaceUnavailable(format!("{err:?}"))
}

/// Attaches canvas layers to the first element matching a CSS selector.
#[derive(Clone, Debug)]
pub struct DomHost {
	selector: String,
	layer: Option<HtmlCanvasElement>,
}

impl DomHost {
	pub fn new(selector: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			layer: None,
		}
	}

	fn document() -> Result<Document, EffectError> {
		web_sys::window()
			.and_then(|w| w.document())
			.ok_or_else(|| EffectError::SurfaceUnavailable("no document".to_string()))
	}

	fn container(&self, document: &Document) -> Result<Element, EffectError> {
		document
			.query_selector(&self.selector)
			.ok()
			.flatten()
			.ok_or_else(|| EffectError::ContainerNotFound(self.selector.clone()))
	}

	/// Client size of an element, if it has been laid out.
	fn client_size(element: &Element) -> Option<Bounds> {
		match (element.client_width(), element.client_height()) {
			(w, h) if w > 0 && h > 0 => Some(Bounds::new(w as f64, h as f64)),
			_ => None,
		}
	}

	/// Removes layers left behind by earlier mounts.
	fn clear_layers(container: &Element) -> Result<(), EffectError> {
		let stale = container
			.query_selector_all(&format!("canvas.{LAYER_CLASS}"))
			.map_err(unavailable)?;
		for i in 0..stale.length() {
			if let Some(element) = stale.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
				element.remove();
			}
		}
		Ok(())
	}
}

impl EffectHost for DomHost {
	type Surface = CanvasLayer;

	fn attach_surface(&mut self) -> Result<CanvasLayer, EffectError> {
		let document = Self::document()?;
		let container = self.container(&document)?;
		Self::clear_layers(&container)?;

		let canvas: HtmlCanvasElement = document
			.create_element("canvas")
			.map_err(unavailable)?
			.dyn_into()
			.map_err(|_| EffectError::SurfaceUnavailable("canvas element".to_string()))?;
		let size = Self::client_size(&container).unwrap_or(Bounds::new(800.0, 600.0));
		canvas.set_width(size.width as u32);
		canvas.set_height(size.height as u32);
		canvas.set_class_name(LAYER_CLASS);
		let style = canvas.style();
		for (name, value) in [
			("position", "absolute"),
			("top", "0"),
			("left", "0"),
			("pointer-events", "none"),
		] {
			style.set_property(name, value).map_err(unavailable)?;
		}
		container.append_child(&canvas).map_err(unavailable)?;

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.map_err(unavailable)?
			.ok_or_else(|| EffectError::SurfaceUnavailable("2d context".to_string()))?
			.dyn_into()
			.map_err(|_| EffectError::SurfaceUnavailable("2d context".to_string()))?;

		self.layer = Some(canvas.clone());
		Ok(CanvasLayer {
			canvas,
			ctx,
			width: size.width,
			height: size.height,
		})
	}

	fn measure(&self) -> Option<Bounds> {
		let document = Self::document().ok()?;
		let container = self.container(&document).ok()?;
		Self::client_size(&container)
	}

	fn detach(&mut self) {
		if let Some(canvas) = self.layer.take() {
			canvas.remove();
		}
	}
}

/// A canvas layer and its 2D context.
pub struct CanvasLayer {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	width: f64,
	height: f64,
}

impl CanvasLayer {
	fn gradient(&self, paint: &Paint) -> Result<Option<CanvasGradient>, SurfaceError> {
		let (gradient, stops): (CanvasGradient, &[ColorStop]) = match paint {
			Paint::Solid(_) => return Ok(None),
			Paint::Radial {
				focus,
				center,
				radius,
				stops,
			} => (
				self.ctx
					.create_radial_gradient(focus.0, focus.1, 0.0, center.0, center.1, *radius)
					.map_err(js_error("create_radial_gradient"))?,
				stops.as_slice(),
			),
			Paint::Linear { from, to, stops } => (
				self.ctx.create_linear_gradient(from.0, from.1, to.0, to.1),
				stops.as_slice(),
			),
		};
		for (offset, color) in stops {
			gradient
				.add_color_stop(*offset as f32, &color.to_css())
				.map_err(js_error("add_color_stop"))?;
		}
		Ok(Some(gradient))
	}
}

impl Surface for CanvasLayer {
	fn width(&self) -> f64 {
		self.width
	}

	fn height(&self) -> f64 {
		self.height
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.canvas.set_width(width as u32);
		self.canvas.set_height(height as u32);
		self.width = width;
		self.height = height;
	}

	fn clear(&mut self) {
		self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
	}

	fn save(&mut self) {
		self.ctx.save();
	}

	fn restore(&mut self) {
		self.ctx.restore();
	}

	fn set_composite(&mut self, mode: Composite) -> Result<(), SurfaceError> {
		self.ctx
			.set_global_composite_operation(mode.as_str())
			.map_err(js_error("set_global_composite_operation"))
	}

	fn set_alpha(&mut self, alpha: f64) {
		self.ctx.set_global_alpha(alpha);
	}

	fn set_fill(&mut self, paint: &Paint) -> Result<(), SurfaceError> {
		match (paint, self.gradient(paint)?) {
			(_, Some(gradient)) => {
				#[allow(deprecated)]
				self.ctx.set_fill_style(&gradient);
			}
			(Paint::Solid(color), None) => self.ctx.set_fill_style_str(&color.to_css()),
			_ => {}
		}
		Ok(())
	}

	fn set_stroke(&mut self, paint: &Paint) -> Result<(), SurfaceError> {
		match (paint, self.gradient(paint)?) {
			(_, Some(gradient)) => {
				#[allow(deprecated)]
				self.ctx.set_stroke_style(&gradient);
			}
			(Paint::Solid(color), None) => self.ctx.set_stroke_style_str(&color.to_css()),
			_ => {}
		}
		Ok(())
	}

	fn set_line_width(&mut self, width: f64) {
		self.ctx.set_line_width(width);
	}

	fn set_round_caps(&mut self) {
		self.ctx.set_line_cap("round");
		self.ctx.set_line_join("round");
	}

	fn translate(&mut self, x: f64, y: f64) -> Result<(), SurfaceError> {
		self.ctx.translate(x, y).map_err(js_error("translate"))
	}

	fn rotate(&mut self, angle: f64) -> Result<(), SurfaceError> {
		self.ctx.rotate(angle).map_err(js_error("rotate"))
	}

	fn begin_path(&mut self) {
		self.ctx.begin_path();
	}

	fn move_to(&mut self, x: f64, y: f64) {
		self.ctx.move_to(x, y);
	}

	fn line_to(&mut self, x: f64, y: f64) {
		self.ctx.line_to(x, y);
	}

	fn bezier_to(&mut self, c1: (f64, f64), c2: (f64, f64), to: (f64, f64)) {
		self.ctx.bezier_curve_to(c1.0, c1.1, c2.0, c2.1, to.0, to.1);
	}

	fn arc(&mut self, x: f64, y: f64, radius: f64) -> Result<(), SurfaceError> {
		self.ctx.arc(x, y, radius, 0.0, TAU).map_err(js_error("arc"))
	}

	fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64) -> Result<(), SurfaceError> {
		self.ctx
			.ellipse(x, y, rx, ry, 0.0, 0.0, TAU)
			.map_err(js_error("ellipse"))
	}

	fn close_path(&mut self) {
		self.ctx.close_path();
	}

	fn fill(&mut self) -> Result<(), SurfaceError> {
		self.ctx.fill();
		Ok(())
	}

	fn stroke(&mut self) -> Result<(), SurfaceError> {
		self.ctx.stroke();
		Ok(())
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), SurfaceError> {
		self.ctx.fill_rect(x, y, w, h);
		Ok(())
	}
}
