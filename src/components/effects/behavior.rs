//! Behavior descriptors.
//!
//! One [`Behavior`] fully describes how a simulation emits, moves, colors,
//! draws and finishes. Variants differ only in the descriptor they build and
//! in the spawn functions that fill in per-particle state.

use rand::Rng;

use super::color::{self, Color};
use super::surface::Composite;

/// Slack for summed frame steps that land just short of a time mark.
pub const TIME_EPSILON: f64 = 1e-9;

/// Whether `elapsed` has reached `mark`, tolerating float drift.
pub fn reached(elapsed: f64, mark: f64) -> bool {
	elapsed + TIME_EPSILON >= mark
}

/// When and how many particles are created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emission {
	/// Live population the effect tops up to.
	pub target: usize,
	/// Particles created at construction.
	pub initial: usize,
	/// Spawn attempts per tick while the effect is running and below target.
	pub attempts: usize,
	/// Probability each attempt produces a particle.
	pub chance: f64,
	/// Most particles a single tick may add past `target`.
	pub burst: usize,
}

impl Emission {
	pub fn steady(target: usize, initial: usize, attempts: usize) -> Self {
		Self {
			target,
			initial: initial.min(target),
			attempts,
			chance: 1.0,
			burst: attempts,
		}
	}

	pub fn random(target: usize, initial: usize, attempts: usize, chance: f64) -> Self {
		Self {
			chance,
			..Self::steady(target, initial, attempts)
		}
	}

	/// Hard ceiling on the live population.
	pub fn cap(&self) -> usize {
		self.target.saturating_add(self.burst)
	}
}

/// Forces applied to free-flying particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Physics {
	/// Multiplier on the 9.8 px/s² base gravity; zero disables it.
	pub gravity: f64,
	/// Fraction of velocity kept per 60 fps frame.
	pub drag: f64,
}

impl Physics {
	pub const NONE: Physics = Physics {
		gravity: 0.0,
		drag: 1.0,
	};

	pub fn gravity(factor: f64) -> Self {
		Self {
			gravity: factor,
			drag: 1.0,
		}
	}

	pub fn with_drag(self, drag: f64) -> Self {
		Self { drag, ..self }
	}

	/// Acceleration in px/s² at the given speed multiplier.
	pub fn acceleration(&self, speed: f64) -> f64 {
		9.8 * self.gravity * speed
	}

	/// Velocity retention over `dt` seconds.
	pub fn retention(&self, dt: f64) -> f64 {
		if self.drag == 1.0 {
			1.0
		} else {
			self.drag.powf(dt * 60.0)
		}
	}
}

/// Where particle colors come from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorRule {
	Base,
	/// Base plus random siblings within `±spread`.
	Scatter { variants: usize, spread: i32 },
	Foliage,
	/// Even hue rotations around the base, one per launch.
	HueRamp,
	Blossom,
	Flame,
	Glitter,
	Confetti,
}

impl ColorRule {
	/// Builds the palette; `launches` sizes per-launch ramps.
	pub fn palette(self, base: Color, launches: usize, rng: &mut impl Rng) -> Vec<Color> {
		match self {
			ColorRule::Base => vec![base],
			ColorRule::Scatter { variants, spread } => color::scatter(base, variants, spread, rng),
			ColorRule::Foliage => color::foliage(base, rng),
			ColorRule::HueRamp => color::hue_ramp(base, launches),
			ColorRule::Blossom => color::blossom_spectrum(base),
			ColorRule::Flame => color::flame_palette(base),
			ColorRule::Glitter => color::glitter_palette(base),
			ColorRule::Confetti => color::CONFETTI.to_vec(),
		}
	}
}

/// Particle body shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Body {
	/// Filled circle; `shrink` scales the radius by the fade.
	Dot { shrink: bool },
	/// Circle whose size and alpha pulse.
	Blink,
	Star,
	Ribbon,
	Leaf,
	Bubble,
	/// Soft radial flame tongue.
	Flare,
	Flake,
	Glitter,
	Meteor,
}

/// Soft glow drawn around a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
	/// Glow radius as a multiple of the particle size.
	pub scale: f64,
	/// Glow alpha as a multiple of the particle alpha.
	pub strength: f64,
	/// Only web nodes glow.
	pub nodes_only: bool,
}

impl Glow {
	pub const fn new(scale: f64, strength: f64) -> Self {
		Self {
			scale,
			strength,
			nodes_only: false,
		}
	}
}

/// How particles are drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Look {
	pub blend: Composite,
	pub body: Body,
	pub glow: Option<Glow>,
}

impl Look {
	pub fn plain(body: Body) -> Self {
		Self {
			blend: Composite::SourceOver,
			body,
			glow: None,
		}
	}

	pub fn additive(body: Body) -> Self {
		Self {
			blend: Composite::Lighter,
			body,
			glow: None,
		}
	}

	pub fn with_glow(self, glow: Glow) -> Self {
		Self {
			glow: Some(glow),
			..self
		}
	}
}

/// When a simulation is finished.
///
/// Complete once the duration has elapsed and everything has drained, or
/// unconditionally at `duration * ceiling`. A ceiling of `1.0` makes the
/// duration a hard cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Completion {
	pub ceiling: f64,
}

impl Completion {
	pub const CUTOFF: Completion = Completion { ceiling: 1.0 };

	pub fn is_complete(&self, elapsed: f64, duration: f64, drained: bool) -> bool {
		(drained && reached(elapsed, duration)) || self.is_expired(elapsed, duration)
	}

	pub fn is_expired(&self, elapsed: f64, duration: f64) -> bool {
		reached(elapsed, duration * self.ceiling)
	}
}

/// Complete behavior descriptor for one simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Behavior {
	pub emission: Emission,
	pub physics: Physics,
	pub colors: ColorRule,
	pub look: Look,
	pub completion: Completion,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cutoff_ignores_live_particles() {
		let c = Completion::CUTOFF;
		assert!(!c.is_complete(0.99, 1.0, false));
		assert!(c.is_complete(1.0, 1.0, false));
	}

	#[test]
	fn ceiling_waits_for_drain() {
		let c = Completion { ceiling: 1.2 };
		assert!(!c.is_complete(3.1, 3.0, false));
		assert!(c.is_complete(3.1, 3.0, true));
		assert!(c.is_complete(3.6, 3.0, false));
	}

	#[test]
	fn summed_frames_reach_the_duration() {
		let c = Completion::CUTOFF;
		let tenths = (0..10).fold(0.0, |t, _| t + 0.1);
		assert!(tenths < 1.0);
		assert!(c.is_complete(tenths, 1.0, false));
		let thirtieths = (0..30).fold(0.0, |t, _| t + 1.0 / 30.0);
		assert!(c.is_complete(thirtieths, 1.0, false));
		assert!(!c.is_complete(0.999, 1.0, false));
	}

	#[test]
	fn cap_saturates() {
		assert_eq!(Emission::steady(usize::MAX, 0, 4).cap(), usize::MAX);
	}

	#[test]
	fn drag_retention_scales_with_frames() {
		let p = Physics::NONE.with_drag(0.5);
		assert!((p.retention(1.0 / 60.0) - 0.5).abs() < 1e-12);
		assert_eq!(p.retention(0.0), 1.0);
		assert_eq!(Physics::gravity(1.0).retention(0.3), 1.0);
	}

	#[test]
	fn steady_emission_clamps_initial() {
		let e = Emission::steady(10, 50, 3);
		assert_eq!(e.initial, 10);
		assert_eq!(e.cap(), 13);
	}
}
