//! Particle records.
//!
//! A [`Particle`] is a common kinematic core plus a [`Motion`] payload that
//! says how it moves and what extra state it carries. Short-lived secondary
//! elements (trails, embers, glints, flashes, shockwaves, ring halos) are
//! kept in their own collections and never count against an effect's target.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::Rng;

use super::color::Color;
use super::types::Bounds;

/// Horizontal sinusoidal sway.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wobble {
	pub amplitude: f64,
	pub frequency: f64,
	pub offset: f64,
}

impl Wobble {
	pub fn at(&self, time: f64) -> f64 {
		(time * self.frequency + self.offset).sin() * self.amplitude
	}
}

/// A trail point that fades on its own clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
	pub x: f64,
	pub y: f64,
	pub life: f64,
}

/// Vector shapes a leaf can be drawn as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafShape {
	Oval,
	Veined,
	Heart,
}

/// Per-particle motion policy and the state it needs.
#[derive(Clone, Debug, PartialEq)]
pub enum Motion {
	/// Straight flight under the effect's gravity and drag.
	Ballistic,
	/// Ballistic, and sheds short trail sparks.
	Trailing,
	/// Ballistic web member; linked to nearby nodes every tick.
	Node,
	/// Ballistic, and sheds embers and growing flames.
	Burning,
	/// Ballistic with a position history, newest first.
	History {
		points: VecDeque<(f64, f64)>,
		capacity: usize,
	},
	/// Ballistic with trail points that age out independently, oldest first.
	Fading {
		points: VecDeque<TrailPoint>,
		capacity: usize,
	},
	/// Ballistic with sinusoidal brightness. `glints` particles also shed glints.
	Twinkle { speed: f64, phase: f64, glints: bool },
	/// Travels to `target`, then idles there until its life runs out.
	Seek { target: (f64, f64), arrived: bool },
	/// Circles the origin at a fixed radius.
	Orbit { angle: f64, radius: f64, spin: f64 },
	/// Holds a slot on one of the rotating rings.
	Ring { tier: usize, angle: f64 },
	Flicker(Wobble),
	Drift {
		wobble: Wobble,
		rotation: f64,
		spin: f64,
	},
	Bubble {
		wobble: Wobble,
		opacity: f64,
		pop: f64,
		popping: bool,
	},
	Tumble {
		width: f64,
		height: f64,
		rotation: f64,
		spin: f64,
	},
	Leaf {
		shape: LeafShape,
		width: f64,
		height: f64,
		rotation: f64,
		spin: f64,
		sway: f64,
		sway_speed: f64,
	},
	/// Meteor head with a sampled tail, newest first.
	Streak {
		tail: VecDeque<(f64, f64)>,
		capacity: usize,
	},
	/// Rising marker that bursts once it climbs to `target_y`.
	Rocket { target_y: f64 },
	/// Salute shrapnel: an optional fuse for a delayed sub-burst and an optional trail cadence.
	Shell {
		fuse: Option<f64>,
		trail_every: Option<f64>,
		trail_clock: f64,
	},
}

/// Per-tick inputs shared by every particle of one simulation.
pub(crate) struct Step<'a> {
	pub dt: f64,
	/// Simulation time after this tick's advance.
	pub time: f64,
	pub speed: f64,
	/// Downward acceleration in px/s², already scaled by speed.
	pub gravity: f64,
	/// Velocity retention for this tick.
	pub drag: f64,
	pub origin: (f64, f64),
	pub halos: &'a [Halo],
}

/// A live particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub size: f64,
	pub color: Color,
	pub life: f64,
	pub max_life: f64,
	pub motion: Motion,
}

impl Particle {
	pub fn new(x: f64, y: f64, vx: f64, vy: f64, size: f64, color: Color, life: f64) -> Self {
		Self {
			x,
			y,
			vx,
			vy,
			size,
			color,
			life,
			max_life: life,
			motion: Motion::Ballistic,
		}
	}

	pub fn with_motion(self, motion: Motion) -> Self {
		Self { motion, ..self }
	}

	/// Remaining life as a fraction of the initial life, in `[0, 1]`.
	pub fn fade(&self) -> f64 {
		if self.max_life > 0.0 {
			(self.life / self.max_life).clamp(0.0, 1.0)
		} else {
			0.0
		}
	}

	pub fn is_node(&self) -> bool {
		matches!(self.motion, Motion::Node)
	}

	pub(crate) fn is_finite(&self) -> bool {
		[self.x, self.y, self.vx, self.vy, self.size, self.life]
			.iter()
			.all(|v| v.is_finite())
	}

	/// Outside the region this motion is allowed to wander.
	pub(crate) fn is_culled(&self, bounds: Bounds) -> bool {
		match &self.motion {
			Motion::Streak { .. } => self.x > bounds.width + 50.0 || self.y > bounds.height + 50.0,
			Motion::Tumble { .. } => self.y > bounds.height + 50.0,
			Motion::Drift { .. } => self.y > bounds.height + 20.0,
			Motion::Bubble { opacity, .. } => *opacity <= 0.0,
			_ => false,
		}
	}

	/// Advances one tick.
	pub(crate) fn step(&mut self, step: &Step<'_>, rng: &mut impl Rng) {
		let dt = step.dt;
		let Particle {
			x,
			y,
			vx,
			vy,
			size,
			life,
			max_life,
			motion,
			..
		} = self;

		match motion {
			Motion::Ballistic
			| Motion::Trailing
			| Motion::Node
			| Motion::Burning
			| Motion::Twinkle { .. }
			| Motion::Shell { .. } => {
				*life -= dt;
				fly(x, y, vx, vy, step);
			}
			Motion::History { points, capacity } => {
				*life -= dt;
				fly(x, y, vx, vy, step);
				points.push_front((*x, *y));
				points.truncate(*capacity);
			}
			Motion::Fading { points, capacity } => {
				*life -= dt;
				fly(x, y, vx, vy, step);
				for point in points.iter_mut() {
					point.life -= dt;
				}
				points.retain(|p| p.life > 0.0);
				points.push_back(TrailPoint {
					x: *x,
					y: *y,
					life: 0.5,
				});
				while points.len() > *capacity {
					points.pop_front();
				}
			}
			Motion::Seek { target, arrived } => {
				if *arrived {
					*life -= dt;
					// Idle shimmer, scaled to a 60 fps frame.
					*x += (rng.gen_range(0.0..1.0) - 0.5) * 0.4 * dt * 60.0;
					*y += (rng.gen_range(0.0..1.0) - 0.5) * 0.4 * dt * 60.0;
				} else {
					let (dx, dy) = (target.0 - *x, target.1 - *y);
					let distance = dx.hypot(dy);
					let reach = vx.hypot(*vy) * dt;
					if distance * distance < 10.0 || distance <= reach {
						*x = target.0;
						*y = target.1;
						*vx = 0.0;
						*vy = 0.0;
						*arrived = true;
						*life = 2.0 + rng.gen_range(0.0..0.5);
						*max_life = *life;
					} else {
						*x += *vx * dt;
						*y += *vy * dt;
					}
				}
			}
			Motion::Orbit {
				angle,
				radius,
				spin,
			} => {
				*life -= dt;
				*angle += *spin * dt * step.speed;
				*x = step.origin.0 + angle.cos() * *radius;
				*y = step.origin.1 + angle.sin() * *radius;
			}
			Motion::Ring { tier, angle } => {
				*life -= dt;
				match step.halos.get(*tier).filter(|h| h.life > 0.0) {
					Some(halo) => {
						let slot = *angle + halo.rotation;
						let tx = step.origin.0 + slot.cos() * halo.radius;
						let ty = step.origin.1 + slot.sin() * halo.radius;
						*vx = (tx - *x) * 2.0;
						*vy = (ty - *y) * 2.0;
						*x += *vx * dt;
						*y += *vy * dt;
					}
					None => fly(x, y, vx, vy, step),
				}
			}
			Motion::Flicker(wobble) => {
				*life -= dt;
				*x += *vx * dt + wobble.at(step.time) * dt;
				*y += *vy * dt;
			}
			Motion::Drift {
				wobble,
				rotation,
				spin,
			} => {
				*life -= dt;
				*x += wobble.at(step.time) * dt;
				*y += *vy * dt;
				*rotation += *spin * dt;
			}
			Motion::Bubble {
				wobble,
				opacity,
				pop,
				popping,
			} => {
				*life -= dt;
				if !*popping && (*y < *size * 2.0 || *life <= 0.3) {
					*popping = true;
					*vx = 0.0;
					*vy = 0.0;
				}
				if *popping {
					*pop += dt * 50.0 * step.speed;
					*opacity -= dt * 3.0;
				} else {
					*x += wobble.at(step.time) * dt * 60.0;
					*y += *vy * dt;
					*opacity = (*opacity + dt * 2.0).min(0.8);
				}
			}
			Motion::Tumble { rotation, spin, .. } => {
				*life -= dt;
				*x += (step.time * 0.3).sin() * 20.0 * dt;
				fly(x, y, vx, vy, step);
				*rotation += *spin * dt;
			}
			Motion::Leaf {
				rotation,
				spin,
				sway,
				sway_speed,
				..
			} => {
				*life -= dt;
				*rotation += *spin * dt;
				*sway += *sway_speed * dt;
				*x += sway.sin() * 10.0 * step.speed * dt;
				fly(x, y, vx, vy, step);
			}
			Motion::Streak { tail, capacity } => {
				*life -= dt;
				if step.time % 0.05 < dt {
					tail.push_front((*x, *y));
					tail.truncate(*capacity);
				}
				*x += *vx * dt;
				*y += *vy * dt;
			}
			Motion::Rocket { .. } => {
				*life -= dt;
				*x += *vx * dt;
				*y += *vy * dt;
			}
		}
	}
}

fn fly(x: &mut f64, y: &mut f64, vx: &mut f64, vy: &mut f64, step: &Step<'_>) {
	*x += *vx * step.dt;
	*y += *vy * step.dt;
	*vy += step.gravity * step.dt;
	*vx *= step.drag;
	*vy *= step.drag;
}

/// Secondary sub-particle behaviors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SparkKind {
	/// Falls with the effect's gravity.
	Trail,
	/// Shrinks and sinks slowly.
	Ember,
	/// Grows and rises.
	Flame { grow: f64 },
	/// Stationary pulsing glow.
	Glint { fade_speed: f64 },
	/// Drifts without gravity.
	Cinder,
}

/// A short-lived secondary particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Spark {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub size: f64,
	pub color: Color,
	pub life: f64,
	pub max_life: f64,
	pub kind: SparkKind,
}

impl Spark {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		x: f64,
		y: f64,
		vx: f64,
		vy: f64,
		size: f64,
		color: Color,
		life: f64,
		kind: SparkKind,
	) -> Self {
		Self {
			x,
			y,
			vx,
			vy,
			size,
			color,
			life,
			max_life: life,
			kind,
		}
	}

	pub fn fade(&self) -> f64 {
		if self.max_life > 0.0 {
			(self.life / self.max_life).clamp(0.0, 1.0)
		} else {
			0.0
		}
	}

	pub(crate) fn step(&mut self, dt: f64, gravity: f64) {
		self.life -= dt;
		let frames = dt * 60.0;
		match self.kind {
			SparkKind::Glint { .. } => return,
			SparkKind::Trail => self.vy += gravity * dt,
			SparkKind::Ember => {
				self.vy += 0.3 * dt;
				self.size *= 0.95f64.powf(frames);
			}
			SparkKind::Flame { grow } => {
				self.size *= grow.powf(frames);
				self.vy -= 5.0 * dt;
				self.vx *= 0.95f64.powf(frames);
			}
			SparkKind::Cinder => {}
		}
		self.x += self.vx * dt;
		self.y += self.vy * dt;
	}

	pub(crate) fn is_finite(&self) -> bool {
		[self.x, self.y, self.size, self.life]
			.iter()
			.all(|v| v.is_finite())
	}
}

/// A white radial burst of light.
#[derive(Clone, Debug, PartialEq)]
pub struct Flash {
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub life: f64,
	pub max_life: f64,
	pub strength: f64,
}

/// An expanding pressure ring.
#[derive(Clone, Debug, PartialEq)]
pub struct Shockwave {
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub max_radius: f64,
	pub growth: f64,
	pub life: f64,
	pub max_life: f64,
}

/// One rotating ring tier of the ring formation.
#[derive(Clone, Debug, PartialEq)]
pub struct Halo {
	pub radius: f64,
	pub rotation: f64,
	pub spin: f64,
	pub life: f64,
	pub max_life: f64,
}

impl Flash {
	pub(crate) fn step(&mut self, dt: f64) {
		self.life -= dt;
	}
}

impl Shockwave {
	pub(crate) fn step(&mut self, dt: f64) {
		self.life -= dt;
		self.radius = (self.radius + self.growth * dt).min(self.max_radius);
	}
}

impl Halo {
	pub(crate) fn step(&mut self, dt: f64) {
		self.life -= dt;
		self.rotation = (self.rotation + self.spin * dt) % TAU;
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::*;

	fn step(dt: f64, gravity: f64) -> Step<'static> {
		Step {
			dt,
			time: 1.0,
			speed: 5.0,
			gravity,
			drag: 1.0,
			origin: (100.0, 100.0),
			halos: &[],
		}
	}

	#[test]
	fn ballistic_integrates_then_accelerates() {
		let mut rng = SmallRng::seed_from_u64(1);
		let mut p = Particle::new(0.0, 0.0, 64.0, -32.0, 2.0, Color::WHITE, 1.0);
		p.step(&step(0.25, 8.0), &mut rng);
		assert_eq!((p.x, p.y), (16.0, -8.0));
		assert_eq!(p.vy, -30.0);
		assert_eq!(p.life, 0.75);
		assert_eq!(p.fade(), 0.75);
	}

	#[test]
	fn seek_snaps_when_within_one_step() {
		let mut rng = SmallRng::seed_from_u64(1);
		let mut p = Particle::new(0.0, 0.0, 100.0, 0.0, 2.0, Color::WHITE, 1.0).with_motion(
			Motion::Seek {
				target: (5.0, 0.0),
				arrived: false,
			},
		);
		p.step(&step(0.0625, 0.0), &mut rng);
		assert_eq!((p.x, p.y), (5.0, 0.0));
		assert!(matches!(p.motion, Motion::Seek { arrived: true, .. }));
		assert!(p.life >= 2.0 && p.life <= 2.5);
		assert_eq!(p.fade(), 1.0);
	}

	#[test]
	fn seek_does_not_age_in_flight() {
		let mut rng = SmallRng::seed_from_u64(1);
		let mut p = Particle::new(0.0, 0.0, 10.0, 0.0, 2.0, Color::WHITE, 1.0).with_motion(
			Motion::Seek {
				target: (500.0, 0.0),
				arrived: false,
			},
		);
		p.step(&step(0.5, 0.0), &mut rng);
		assert_eq!(p.life, 1.0);
		assert_eq!(p.x, 5.0);
	}

	#[test]
	fn history_keeps_newest_first() {
		let mut rng = SmallRng::seed_from_u64(1);
		let mut p = Particle::new(0.0, 0.0, 4.0, 0.0, 2.0, Color::WHITE, 1.0).with_motion(
			Motion::History {
				points: VecDeque::new(),
				capacity: 2,
			},
		);
		for _ in 0..3 {
			p.step(&step(0.25, 0.0), &mut rng);
		}
		let Motion::History { points, .. } = &p.motion else {
			panic!("motion changed");
		};
		assert_eq!(points.iter().copied().collect::<Vec<_>>(), vec![(3.0, 0.0), (2.0, 0.0)]);
	}

	#[test]
	fn bubble_pops_near_the_top() {
		let mut rng = SmallRng::seed_from_u64(1);
		let wobble = Wobble {
			amplitude: 0.0,
			frequency: 1.0,
			offset: 0.0,
		};
		let mut p = Particle::new(50.0, 5.0, 0.0, -20.0, 4.0, Color::WHITE, 3.0).with_motion(
			Motion::Bubble {
				wobble,
				opacity: 0.5,
				pop: 0.0,
				popping: false,
			},
		);
		p.step(&step(0.125, 0.0), &mut rng);
		let Motion::Bubble { popping, pop, opacity, .. } = p.motion else {
			panic!("motion changed");
		};
		assert!(popping);
		assert_eq!(pop, 0.125 * 50.0 * 5.0);
		assert_eq!(opacity, 0.5 - 0.375);
		assert_eq!(p.vy, 0.0);
	}

	#[test]
	fn culling_follows_motion() {
		let bounds = Bounds::new(100.0, 100.0);
		let flake = Particle::new(0.0, 121.0, 0.0, 0.0, 1.0, Color::WHITE, 1.0).with_motion(
			Motion::Drift {
				wobble: Wobble {
					amplitude: 0.0,
					frequency: 0.0,
					offset: 0.0,
				},
				rotation: 0.0,
				spin: 0.0,
			},
		);
		assert!(flake.is_culled(bounds));
		let plain = Particle::new(0.0, 1000.0, 0.0, 0.0, 1.0, Color::WHITE, 1.0);
		assert!(!plain.is_culled(bounds));
	}

	#[test]
	fn flame_spark_grows_and_rises() {
		let mut spark = Spark::new(
			0.0,
			0.0,
			0.0,
			0.0,
			2.0,
			Color::WHITE,
			1.0,
			SparkKind::Flame { grow: 1.02 },
		);
		spark.step(1.0 / 60.0, 9.8);
		assert!(spark.size > 2.0);
		assert!(spark.vy < 0.0);
	}
}
