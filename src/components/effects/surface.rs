//! The drawing surface simulations render into.
//!
//! [`Surface`] is the slice of a 2D immediate-mode canvas the effects need:
//! paths (arcs, ellipses, lines, beziers), rectangles under a transform,
//! solid or gradient paints, global alpha and additive compositing. The
//! browser implementation lives in `dom.rs`; [`RecordingSurface`] keeps a log
//! of completed draw calls and rejects the inputs a canvas would throw on.

use super::color::Color;
use super::error::SurfaceError;

/// Gradient stop: offset in `[0, 1]` and color.
pub type ColorStop = (f64, Color);

/// How new pixels combine with what is already on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Composite {
	#[default]
	SourceOver,
	/// Additive blending (`lighter`), used for glow.
	Lighter,
}

impl Composite {
	pub fn as_str(self) -> &'static str {
		match self {
			Composite::SourceOver => "source-over",
			Composite::Lighter => "lighter",
		}
	}
}

/// Fill or stroke paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
	Solid(Color),
	/// Radial gradient from a zero-radius `focus` out to `radius` around `center`.
	Radial {
		focus: (f64, f64),
		center: (f64, f64),
		radius: f64,
		stops: Vec<ColorStop>,
	},
	Linear {
		from: (f64, f64),
		to: (f64, f64),
		stops: Vec<ColorStop>,
	},
}

impl Paint {
	/// Concentric radial gradient.
	pub fn glow(x: f64, y: f64, radius: f64, stops: Vec<ColorStop>) -> Self {
		Paint::Radial {
			focus: (x, y),
			center: (x, y),
			radius,
			stops,
		}
	}

	fn is_drawable(&self) -> bool {
		let finite = |&(x, y): &(f64, f64)| x.is_finite() && y.is_finite();
		let stops_ok = |stops: &[ColorStop]| {
			stops
				.iter()
				.all(|(offset, _)| (0.0..=1.0).contains(offset))
		};
		match self {
			Paint::Solid(_) => true,
			Paint::Radial {
				focus,
				center,
				radius,
				stops,
			} => finite(focus) && finite(center) && radius.is_finite() && *radius >= 0.0 && stops_ok(stops),
			Paint::Linear { from, to, stops } => finite(from) && finite(to) && stops_ok(stops),
		}
	}
}

/// 2D immediate-mode drawing target.
pub trait Surface {
	fn width(&self) -> f64;
	fn height(&self) -> f64;
	/// Changes the drawing area; existing content may be discarded.
	fn resize(&mut self, width: f64, height: f64);

	/// Erases the whole surface to transparent.
	fn clear(&mut self);
	fn save(&mut self);
	fn restore(&mut self);

	fn set_composite(&mut self, mode: Composite) -> Result<(), SurfaceError>;
	fn set_alpha(&mut self, alpha: f64);
	fn set_fill(&mut self, paint: &Paint) -> Result<(), SurfaceError>;
	fn set_stroke(&mut self, paint: &Paint) -> Result<(), SurfaceError>;
	fn set_line_width(&mut self, width: f64);
	/// Round line caps and joins for subsequent strokes.
	fn set_round_caps(&mut self);

	fn translate(&mut self, x: f64, y: f64) -> Result<(), SurfaceError>;
	fn rotate(&mut self, angle: f64) -> Result<(), SurfaceError>;

	fn begin_path(&mut self);
	fn move_to(&mut self, x: f64, y: f64);
	fn line_to(&mut self, x: f64, y: f64);
	fn bezier_to(&mut self, c1: (f64, f64), c2: (f64, f64), to: (f64, f64));
	/// Full circle.
	fn arc(&mut self, x: f64, y: f64, radius: f64) -> Result<(), SurfaceError>;
	/// Full axis-aligned ellipse.
	fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64) -> Result<(), SurfaceError>;
	fn close_path(&mut self);
	fn fill(&mut self) -> Result<(), SurfaceError>;
	fn stroke(&mut self) -> Result<(), SurfaceError>;
	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), SurfaceError>;

	/// Fills a circle with `paint`. Negative radii draw nothing.
	fn fill_circle(&mut self, x: f64, y: f64, radius: f64, paint: &Paint) -> Result<(), SurfaceError> {
		if radius <= 0.0 {
			return Ok(());
		}
		self.begin_path();
		self.arc(x, y, radius)?;
		self.set_fill(paint)?;
		self.fill()
	}
}

/// One completed draw call as seen by a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
	Clear,
	Fill { composite: Composite, alpha: f64 },
	Stroke { composite: Composite, alpha: f64, width: f64 },
	Rect { composite: Composite, alpha: f64 },
}

#[derive(Clone, Copy, Debug)]
struct PenState {
	alpha: f64,
	composite: Composite,
	line_width: f64,
}

impl Default for PenState {
	fn default() -> Self {
		Self {
			alpha: 1.0,
			composite: Composite::SourceOver,
			line_width: 1.0,
		}
	}
}

/// Headless surface that records draw calls.
///
/// Path geometry is validated the way a browser canvas would: negative radii
/// fail immediately, and a fill or stroke of a path containing non-finite
/// coordinates fails instead of silently drawing nothing.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
	width: f64,
	height: f64,
	pen: PenState,
	saved: Vec<PenState>,
	path_finite: bool,
	calls: Vec<DrawCall>,
}

impl RecordingSurface {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			pen: PenState::default(),
			saved: Vec::new(),
			path_finite: true,
			calls: Vec::new(),
		}
	}

	pub fn calls(&self) -> &[DrawCall] {
		&self.calls
	}

	/// Calls recorded since the most recent clear.
	pub fn frame(&self) -> &[DrawCall] {
		let start = self
			.calls
			.iter()
			.rposition(|c| *c == DrawCall::Clear)
			.map_or(0, |i| i + 1);
		&self.calls[start..]
	}

	pub fn clear_count(&self) -> usize {
		self.calls.iter().filter(|c| **c == DrawCall::Clear).count()
	}

	/// Draw calls made with additive compositing in the current frame.
	pub fn additive_calls(&self) -> usize {
		self.frame()
			.iter()
			.filter(|c| match c {
				DrawCall::Fill { composite, .. }
				| DrawCall::Stroke { composite, .. }
				| DrawCall::Rect { composite, .. } => *composite == Composite::Lighter,
				DrawCall::Clear => false,
			})
			.count()
	}

	/// Composite mode currently in effect; renderers must leave it at source-over.
	pub fn composite(&self) -> Composite {
		self.pen.composite
	}

	pub fn save_depth(&self) -> usize {
		self.saved.len()
	}

	fn track(&mut self, values: &[f64]) {
		if values.iter().any(|v| !v.is_finite()) {
			self.path_finite = false;
		}
	}
}

impl Surface for RecordingSurface {
	fn width(&self) -> f64 {
		self.width
	}

	fn height(&self) -> f64 {
		self.height
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn clear(&mut self) {
		self.calls.push(DrawCall::Clear);
	}

	fn save(&mut self) {
		self.saved.push(self.pen);
	}

	fn restore(&mut self) {
		if let Some(pen) = self.saved.pop() {
			self.pen = pen;
		}
	}

	fn set_composite(&mut self, mode: Composite) -> Result<(), SurfaceError> {
		self.pen.composite = mode;
		Ok(())
	}

	fn set_alpha(&mut self, alpha: f64) {
		// Canvas ignores out-of-range alpha rather than clamping it.
		if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
			self.pen.alpha = alpha;
		}
	}

	fn set_fill(&mut self, paint: &Paint) -> Result<(), SurfaceError> {
		if paint.is_drawable() {
			Ok(())
		} else {
			Err(SurfaceError::new("set_fill", "gradient geometry out of range"))
		}
	}

	fn set_stroke(&mut self, paint: &Paint) -> Result<(), SurfaceError> {
		if paint.is_drawable() {
			Ok(())
		} else {
			Err(SurfaceError::new("set_stroke", "gradient geometry out of range"))
		}
	}

	fn set_line_width(&mut self, width: f64) {
		if width.is_finite() && width > 0.0 {
			self.pen.line_width = width;
		}
	}

	fn set_round_caps(&mut self) {}

	fn translate(&mut self, x: f64, y: f64) -> Result<(), SurfaceError> {
		if x.is_finite() && y.is_finite() {
			Ok(())
		} else {
			Err(SurfaceError::new("translate", "non-finite offset"))
		}
	}

	fn rotate(&mut self, angle: f64) -> Result<(), SurfaceError> {
		if angle.is_finite() {
			Ok(())
		} else {
			Err(SurfaceError::new("rotate", "non-finite angle"))
		}
	}

	fn begin_path(&mut self) {
		self.path_finite = true;
	}

	fn move_to(&mut self, x: f64, y: f64) {
		self.track(&[x, y]);
	}

	fn line_to(&mut self, x: f64, y: f64) {
		self.track(&[x, y]);
	}

	fn bezier_to(&mut self, c1: (f64, f64), c2: (f64, f64), to: (f64, f64)) {
		self.track(&[c1.0, c1.1, c2.0, c2.1, to.0, to.1]);
	}

	fn arc(&mut self, x: f64, y: f64, radius: f64) -> Result<(), SurfaceError> {
		if radius < 0.0 {
			return Err(SurfaceError::new("arc", format!("negative radius {radius}")));
		}
		self.track(&[x, y, radius]);
		Ok(())
	}

	fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64) -> Result<(), SurfaceError> {
		if rx < 0.0 || ry < 0.0 {
			return Err(SurfaceError::new("ellipse", "negative radius"));
		}
		self.track(&[x, y, rx, ry]);
		Ok(())
	}

	fn close_path(&mut self) {}

	fn fill(&mut self) -> Result<(), SurfaceError> {
		if !self.path_finite {
			return Err(SurfaceError::new("fill", "path has non-finite coordinates"));
		}
		self.calls.push(DrawCall::Fill {
			composite: self.pen.composite,
			alpha: self.pen.alpha,
		});
		Ok(())
	}

	fn stroke(&mut self) -> Result<(), SurfaceError> {
		if !self.path_finite {
			return Err(SurfaceError::new("stroke", "path has non-finite coordinates"));
		}
		self.calls.push(DrawCall::Stroke {
			composite: self.pen.composite,
			alpha: self.pen.alpha,
			width: self.pen.line_width,
		});
		Ok(())
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), SurfaceError> {
		if [x, y, w, h].iter().any(|v| !v.is_finite()) {
			return Err(SurfaceError::new("fill_rect", "non-finite rectangle"));
		}
		self.calls.push(DrawCall::Rect {
			composite: self.pen.composite,
			alpha: self.pen.alpha,
		});
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn records_fills_with_pen_state() {
		let mut surface = RecordingSurface::new(100.0, 50.0);
		surface.clear();
		surface.set_alpha(0.5);
		surface.set_composite(Composite::Lighter).unwrap();
		surface
			.fill_circle(10.0, 10.0, 4.0, &Paint::Solid(Color::WHITE))
			.unwrap();
		assert_eq!(
			surface.frame(),
			&[DrawCall::Fill {
				composite: Composite::Lighter,
				alpha: 0.5
			}]
		);
		assert_eq!(surface.additive_calls(), 1);
	}

	#[test]
	fn save_restore_round_trips_pen() {
		let mut surface = RecordingSurface::new(10.0, 10.0);
		surface.save();
		surface.set_alpha(0.2);
		surface.set_composite(Composite::Lighter).unwrap();
		surface.restore();
		assert_eq!(surface.composite(), Composite::SourceOver);
		assert_eq!(surface.save_depth(), 0);
	}

	#[test]
	fn rejects_non_finite_paths() {
		let mut surface = RecordingSurface::new(10.0, 10.0);
		let err = surface
			.fill_circle(f64::NAN, 1.0, 2.0, &Paint::Solid(Color::WHITE))
			.unwrap_err();
		assert_eq!(err.op, "fill");
		assert!(surface.arc(0.0, 0.0, -1.0).is_err());
		assert!(
			surface
				.set_fill(&Paint::glow(0.0, 0.0, f64::INFINITY, vec![]))
				.is_err()
		);
	}

	#[test]
	fn zero_radius_circle_is_skipped() {
		let mut surface = RecordingSurface::new(10.0, 10.0);
		surface
			.fill_circle(1.0, 1.0, 0.0, &Paint::Solid(Color::WHITE))
			.unwrap();
		assert!(surface.calls().is_empty());
	}
}
