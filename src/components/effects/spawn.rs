//! Particle creation for each variant.
//!
//! Spawn functions are pure apart from the random source: they read the
//! effect's parameters and origin through a [`Spawner`] and return a new
//! particle (or spark) for the engine to admit.

use std::collections::VecDeque;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use rand::Rng;
use rand::rngs::SmallRng;

use super::color::Color;
use super::particle::{LeafShape, Motion, Particle, Spark, SparkKind, Wobble};
use super::types::{Bounds, EffectParams};
use super::variant::Variant;

/// Rings in the ring formation.
pub const RING_TIERS: usize = 3;

/// Everything a spawn function may read.
pub(crate) struct Spawner<'a> {
	pub params: &'a EffectParams,
	pub origin: (f64, f64),
	pub bounds: Bounds,
	pub palette: &'a [Color],
	pub rng: &'a mut SmallRng,
	/// Particles this simulation has emitted so far.
	pub sequence: usize,
	/// Creating the initial population rather than a per-tick top-up.
	pub initial: bool,
}

impl Spawner<'_> {
	fn unit(&mut self) -> f64 {
		self.rng.gen_range(0.0..1.0)
	}

	/// Uniform in `[low, low + span)`.
	fn from(&mut self, low: f64, span: f64) -> f64 {
		low + self.unit() * span
	}

	/// Uniform in `[-half, half)`.
	fn jitter(&mut self, half: f64) -> f64 {
		(self.unit() - 0.5) * 2.0 * half
	}

	fn angle(&mut self) -> f64 {
		self.unit() * TAU
	}

	fn chance(&mut self, p: f64) -> bool {
		self.rng.gen_bool(p.clamp(0.0, 1.0))
	}

	fn pick(&mut self) -> Color {
		match self.palette.len() {
			0 => self.params.color,
			n => self.palette[self.rng.gen_range(0..n)],
		}
	}

	/// Particle at the origin flying outward at a random angle.
	fn radial(&mut self, speed: f64, size: f64, life: f64) -> Particle {
		let angle = self.angle();
		let color = self.pick();
		Particle::new(
			self.origin.0,
			self.origin.1,
			angle.cos() * speed,
			angle.sin() * speed,
			size,
			color,
			life,
		)
	}

	fn base(&self) -> f64 {
		self.params.size
	}

	fn speed(&self) -> f64 {
		self.params.speed
	}
}

/// Creates one regular particle for `variant`.
pub(crate) fn particle(variant: Variant, s: &mut Spawner<'_>) -> Particle {
	let base = s.base();
	let speed = s.speed();
	match variant {
		Variant::FireworkBasic => {
			let v = s.from(3.0, 2.0) * speed;
			let size = s.from(0.5, 0.5) * base;
			let life = s.from(0.5, 0.5);
			s.radial(v, size, life).with_motion(Motion::Trailing)
		}
		Variant::FireworkPeony => {
			let tier = [0.6, 0.8, 1.0][s.rng.gen_range(0..3)];
			let v = s.from(tier, 0.2) * speed * 30.0;
			let size = base * s.from(0.5, 0.5);
			let life = s.from(0.7, 0.5);
			let capacity = 4 + s.rng.gen_range(0..3);
			s.radial(v, size, life).with_motion(Motion::History {
				points: VecDeque::with_capacity(capacity + 1),
				capacity,
			})
		}
		Variant::FireworkWillow => {
			let v = s.from(3.0, 2.0) * speed;
			let size = base * s.from(0.5, 0.5);
			let life = s.from(1.0, 0.5);
			let mut p = s.radial(v, size, life).with_motion(Motion::Fading {
				points: VecDeque::with_capacity(11),
				capacity: 10,
			});
			p.vy -= 2.0;
			p
		}
		Variant::FireworkTwinkle => {
			let v = s.from(3.0, 2.0) * speed;
			let size = base * s.from(0.5, 0.5);
			let life = s.from(0.8, 0.5);
			let twinkle = Motion::Twinkle {
				speed: s.from(5.0, 10.0),
				phase: s.angle(),
				glints: true,
			};
			s.radial(v, size, life).with_motion(twinkle)
		}
		Variant::FireworkFlame => {
			let v = s.from(3.0, 2.0) * speed;
			let size = base * s.from(0.5, 0.5);
			let life = s.from(0.5, 0.5);
			let motion = if s.chance(0.3) {
				Motion::Burning
			} else {
				Motion::Ballistic
			};
			s.radial(v, size, life).with_motion(motion)
		}
		Variant::FireworkLeaf => {
			let v = s.from(0.4, 0.6) * speed * 30.0;
			let life = s.from(1.5, 1.0);
			let shape = [LeafShape::Oval, LeafShape::Veined, LeafShape::Heart][s.rng.gen_range(0..3)];
			let leaf = Motion::Leaf {
				shape,
				width: base * s.from(0.8, 0.6),
				height: base * s.from(1.0, 0.8),
				rotation: s.angle(),
				spin: s.jitter(PI),
				sway: s.angle(),
				sway_speed: s.from(2.0, 3.0),
			};
			s.radial(v, base, life).with_motion(leaf)
		}
		Variant::FireworkRing => {
			let per_ring = (s.params.count / RING_TIERS).max(1);
			let tier = (s.sequence / per_ring).min(RING_TIERS - 1);
			let angle = (s.sequence % per_ring) as f64 / per_ring as f64 * TAU;
			let size = base * (1.0 - tier as f64 * 0.2);
			let life = s.params.duration * (1.0 - tier as f64 * 0.1);
			let color = s.pick();
			Particle::new(s.origin.0, s.origin.1, 0.0, 0.0, size, color, life)
				.with_motion(Motion::Ring { tier, angle })
		}
		Variant::FireworkSpider => {
			let v = s.from(4.0, 2.0) * speed;
			let size = base * s.from(0.5, 0.5);
			let life = s.from(0.8, 0.5);
			let motion = if s.chance(0.3) {
				Motion::Node
			} else {
				Motion::Ballistic
			};
			s.radial(v, size, life).with_motion(motion)
		}
		Variant::FireworkSalute => {
			let v = s.from(4.0, 3.0) * speed;
			let size = s.from(0.5, 0.5) * base;
			let life = s.from(0.3, 0.3);
			s.radial(v, size, life)
		}
		// Roman candle particles come only from its launch schedule.
		Variant::FireworkRomanCandle => {
			let ((x, y), color) = (s.origin, s.params.color);
			shrapnel(s, x, y, color)
		}
		Variant::Sparkle => {
			let distance = s.unit() * 50.0 * (base / 5.0);
			let angle = s.angle();
			let size = base * s.from(0.2, 0.8);
			let life = s.from(0.0, 0.5);
			let blink = Motion::Twinkle {
				speed: 5.0 + s.unit() * 5.0 * speed,
				phase: 0.0,
				glints: false,
			};
			Particle::new(
				s.origin.0 + angle.cos() * distance,
				s.origin.1 + angle.sin() * distance,
				0.0,
				0.0,
				size,
				s.params.color,
				life,
			)
			.with_motion(blink)
		}
		Variant::Fountain => {
			let angle = -FRAC_PI_2 + (s.unit() - 0.5) * 0.5;
			let v = s.from(0.8, 0.4) * speed * 40.0;
			let x = s.origin.0 + s.jitter(5.0);
			let size = base * s.from(0.5, 0.5);
			let life = s.from(0.8, 0.6);
			Particle::new(
				x,
				s.origin.1,
				angle.cos() * v,
				angle.sin() * v,
				size,
				s.params.color,
				life,
			)
		}
		Variant::Meteor => {
			let x = s.unit() * s.bounds.width;
			let v = s.from(40.0, 60.0) * speed;
			let angle = FRAC_PI_4 + s.unit() * FRAC_PI_4;
			let size = s.from(1.0, 1.0) * base;
			let life = s.from(2.0, 1.0);
			let capacity = 10 + s.rng.gen_range(0..20);
			Particle::new(
				x,
				-20.0,
				angle.cos() * v,
				angle.sin() * v,
				size,
				s.params.color,
				life,
			)
			.with_motion(Motion::Streak {
				tail: VecDeque::with_capacity(capacity + 1),
				capacity,
			})
		}
		Variant::Spiral => {
			let angle = s.sequence as f64 * 0.1;
			let radius = spiral_radius(s.sequence);
			let size = base * s.from(0.5, 0.5);
			let life = s.from(1.0, 0.5);
			let spin = s.from(0.5, 0.5);
			Particle::new(
				s.origin.0 + angle.cos() * radius,
				s.origin.1 + angle.sin() * radius,
				0.0,
				0.0,
				size,
				s.params.color,
				life,
			)
			.with_motion(Motion::Orbit {
				angle,
				radius,
				spin,
			})
		}
		Variant::Heart => {
			let (hx, hy) = heart_point(s.angle(), heart_scale(base));
			let target = (s.origin.0 + hx, s.origin.1 - hy);
			let (dx, dy) = (target.0 - s.origin.0, target.1 - s.origin.1);
			let distance = dx.hypot(dy).max(f64::EPSILON);
			let v = 40.0 * speed;
			let size = base * s.from(0.5, 0.5);
			Particle::new(
				s.origin.0,
				s.origin.1,
				dx / distance * v,
				dy / distance * v,
				size,
				s.params.color,
				1.0,
			)
			.with_motion(Motion::Seek {
				target,
				arrived: false,
			})
		}
		Variant::Confetti => {
			let angle = s.angle();
			let v = 100.0 * speed;
			let vx = angle.cos() * v * s.from(0.3, 0.7);
			let vy = angle.sin() * v * s.from(0.3, 0.7);
			let x = s.origin.0 + s.jitter(10.0);
			let y = s.origin.1 + s.jitter(10.0);
			let color = s.pick();
			let life = s.from(1.0, 2.0);
			let tumble = Motion::Tumble {
				width: s.from(0.5, 1.0) * base,
				height: s.from(1.0, 2.0) * base,
				rotation: s.angle(),
				spin: s.jitter(PI),
			};
			Particle::new(x, y, vx, vy, base, color, life).with_motion(tumble)
		}
		Variant::Stars => {
			let x = s.unit() * s.bounds.width;
			let y = s.unit() * s.bounds.height;
			let size = s.from(0.5, 1.5) * base;
			let life = s.from(5.0, 5.0);
			let twinkle = Motion::Twinkle {
				speed: s.from(1.0, 3.0),
				phase: s.angle(),
				glints: false,
			};
			Particle::new(x, y, 0.0, 0.0, size, s.params.color, life).with_motion(twinkle)
		}
		Variant::Bubbles => {
			let x = s.origin.0 + (s.unit() - 0.5) * s.bounds.width * 0.8;
			let size = base * s.from(0.5, 2.0);
			let rise = s.from(0.5, 0.5) * speed * (1.0 - size / (base * 3.0));
			let life = 1.5 + size / base + s.unit();
			let wobble = Wobble {
				amplitude: s.unit() * 2.0 * speed,
				frequency: s.from(0.5, 2.0),
				offset: s.angle(),
			};
			Particle::new(x, s.origin.1, 0.0, -rise * 20.0, size, s.params.color, life).with_motion(
				Motion::Bubble {
					wobble,
					opacity: 0.5,
					pop: 0.0,
					popping: false,
				},
			)
		}
		Variant::Flame => {
			let x = s.origin.0 + (s.unit() - 0.5) * 40.0 * base / 5.0;
			let y = s.origin.1 + s.unit() * 10.0;
			let vx = (s.unit() - 0.5) * 5.0 * speed;
			let vy = -20.0 - s.unit() * 30.0 * speed;
			let size = s.from(0.5, 1.5) * base;
			let life = s.from(0.5, 0.5);
			let color = s.pick();
			let wobble = Wobble {
				amplitude: s.unit() * 3.0,
				frequency: s.from(2.0, 3.0),
				offset: s.angle(),
			};
			Particle::new(x, y, vx, vy, size, color, life).with_motion(Motion::Flicker(wobble))
		}
		Variant::Snow => {
			let x = s.unit() * s.bounds.width;
			let y = if s.initial {
				s.unit() * s.bounds.height
			} else {
				-20.0
			};
			let size = s.from(0.5, 1.5) * base;
			let fall = s.from(0.3, 0.7) * speed * 20.0 * (size / base);
			let life = s.from(5.0, 5.0);
			let drift = Motion::Drift {
				wobble: Wobble {
					amplitude: s.unit() * 3.0 * speed,
					frequency: s.from(0.2, 0.8),
					offset: s.angle(),
				},
				rotation: s.angle(),
				spin: s.jitter(1.0),
			};
			Particle::new(x, y, 0.0, fall, size, s.params.color, life).with_motion(drift)
		}
		Variant::Glitter => {
			let distance = s.unit() * 50.0 * base / 5.0;
			let at = s.angle();
			let heading = s.angle();
			let v = s.from(0.5, 1.5) * speed * 40.0;
			let size = s.from(0.2, 0.8) * base;
			let life = s.from(0.5, 1.0);
			let color = s.pick();
			let twinkle = Motion::Twinkle {
				speed: s.from(5.0, 15.0),
				phase: s.angle(),
				glints: false,
			};
			Particle::new(
				s.origin.0 + at.cos() * distance,
				s.origin.1 + at.sin() * distance,
				heading.cos() * v,
				heading.sin() * v,
				size,
				color,
				life,
			)
			.with_motion(twinkle)
		}
	}
}

/// Spiral arm radius of the `n`th particle.
pub fn spiral_radius(n: usize) -> f64 {
	5.0 + n as f64 * 0.5
}

/// Outermost spiral radius for a base size.
pub fn spiral_limit(base: f64) -> f64 {
	80.0 + base * 10.0
}

pub fn heart_scale(base: f64) -> f64 {
	16.0 * (3.0 + base * 2.0)
}

/// Point on the parametric heart curve, y pointing up.
pub fn heart_point(t: f64, scale: f64) -> (f64, f64) {
	let x = scale * t.sin().powi(3);
	let y = scale
		* (13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos())
		/ 16.0;
	(x, y)
}

/// Roman candle rocket rising from `(x, y)`.
pub(crate) fn rocket(s: &mut Spawner<'_>, x: f64, y: f64, color: Color) -> Particle {
	let target_y = 50.0 + s.unit() * s.bounds.height * 0.4;
	Particle::new(x, y, 0.0, -s.speed() * 100.0, s.base() * 1.2, color, 1.0)
		.with_motion(Motion::Rocket { target_y })
}

/// Burst fragment of an exploded rocket.
pub(crate) fn shrapnel(s: &mut Spawner<'_>, x: f64, y: f64, color: Color) -> Particle {
	let angle = s.angle();
	let v = s.from(0.5, 0.5) * s.speed() * 40.0;
	let size = s.base() * s.from(0.3, 0.7);
	let life = s.from(0.5, 0.5);
	Particle::new(x, y, angle.cos() * v, angle.sin() * v, size, color, life)
}

/// Salute primary fragment, possibly fused for a sub-burst and possibly trailing.
pub(crate) fn salute_shell(s: &mut Spawner<'_>) -> Particle {
	let v = s.from(0.8, 0.4) * s.speed() * 70.0;
	let size = s.base() * s.from(0.5, 0.5);
	let life = s.from(0.3, 0.3);
	let fuse = s.chance(0.1).then(|| s.from(0.1, 0.2));
	let trail_every = s.chance(0.5).then(|| s.from(0.01, 0.02));
	let angle = s.angle();
	Particle::new(
		s.origin.0,
		s.origin.1,
		angle.cos() * v,
		angle.sin() * v,
		size,
		Color::WHITE,
		life,
	)
	.with_motion(Motion::Shell {
		fuse,
		trail_every,
		trail_clock: 0.0,
	})
}

/// Salute sub-burst fragment in the effect's base color.
pub(crate) fn salute_fragment(s: &mut Spawner<'_>, x: f64, y: f64) -> Particle {
	let angle = s.angle();
	let v = s.from(0.5, 0.5) * s.speed() * 40.0;
	let size = s.base() * s.from(0.3, 0.3);
	let life = s.from(0.5, 0.5);
	Particle::new(
		x,
		y,
		angle.cos() * v,
		angle.sin() * v,
		size,
		s.params.color,
		life,
	)
}

/// Slow twinkling ember left in the blast area.
pub(crate) fn aftershock(s: &mut Spawner<'_>, blast_radius: f64) -> Particle {
	let radius = blast_radius * s.from(0.5, 0.5);
	let at = s.angle();
	let v = s.speed() * 10.0 * s.unit();
	let heading = s.angle();
	let size = s.base() * s.from(0.2, 0.3);
	let life = s.from(0.3, 0.5);
	let twinkle = Motion::Twinkle {
		speed: s.from(5.0, 5.0),
		phase: s.angle(),
		glints: false,
	};
	Particle::new(
		s.origin.0 + at.cos() * radius,
		s.origin.1 + at.sin() * radius,
		heading.cos() * v,
		heading.sin() * v - 5.0,
		size,
		s.params.color,
		life,
	)
	.with_motion(twinkle)
}

/// Faint spark left behind a moving particle.
pub(crate) fn trail(p: &Particle) -> Spark {
	Spark::new(
		p.x,
		p.y,
		p.vx * 0.1,
		p.vy * 0.1,
		p.size * 0.5,
		p.color,
		0.2,
		SparkKind::Trail,
	)
}

/// Tiny spark shed by a salute fragment.
pub(crate) fn streamer(rng: &mut SmallRng, p: &Particle, base: f64) -> Spark {
	let mut u = || rng.gen_range(0.0..1.0);
	Spark::new(
		p.x + (u() - 0.5) * 2.0,
		p.y + (u() - 0.5) * 2.0,
		(u() - 0.5) * 3.0,
		(u() - 0.5) * 3.0,
		base * 0.2 * (0.5 + u() * 0.5),
		p.color,
		0.1 + u() * 0.1,
		SparkKind::Cinder,
	)
}

/// Glowing ember that sinks and shrinks behind a burning particle.
pub(crate) fn ember(p: &Particle) -> Spark {
	Spark::new(
		p.x,
		p.y,
		p.vx * 0.2,
		p.vy * 0.2,
		p.size * 1.5,
		Color::rgb(0xff, 0x33, 0x00),
		0.3,
		SparkKind::Ember,
	)
}

/// Rising, growing flame tongue near a burning particle.
pub(crate) fn flame_tongue(rng: &mut SmallRng, p: &Particle, palette: &[Color]) -> Spark {
	let color = match palette.len() {
		0 => p.color,
		n => palette[rng.gen_range(0..n)],
	};
	let mut u = || rng.gen_range(0.0..1.0);
	Spark::new(
		p.x + (u() - 0.5) * 6.0,
		p.y + (u() - 0.5) * 6.0,
		(u() - 0.5) * 10.0,
		-10.0 * u(),
		p.size * (0.5 + u() * 0.5),
		color,
		0.3 + u() * 0.3,
		SparkKind::Flame {
			grow: 1.01 + u() * 0.03,
		},
	)
}

/// Pulsing glint pinned where a twinkling particle was.
pub(crate) fn glint(rng: &mut SmallRng, p: &Particle) -> Spark {
	Spark::new(
		p.x,
		p.y,
		0.0,
		0.0,
		p.size * 2.0,
		p.color,
		p.life * 0.5,
		SparkKind::Glint {
			fade_speed: rng.gen_range(5.0..10.0),
		},
	)
}

/// Ascent spark under a roman candle rocket.
pub(crate) fn cinder(rng: &mut SmallRng, p: &Particle, base: f64) -> Spark {
	let mut u = || rng.gen_range(0.0..1.0);
	Spark::new(
		p.x + (u() - 0.5) * 3.0,
		p.y + (u() - 0.5) * 3.0,
		(u() - 0.5) * 5.0,
		(u() - 0.5) * 5.0 + 10.0,
		base * 0.3 * (0.5 + u() * 0.5),
		p.color,
		0.2 + u() * 0.2,
		SparkKind::Cinder,
	)
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;

	fn spawner<'a>(
		params: &'a EffectParams,
		palette: &'a [Color],
		rng: &'a mut SmallRng,
	) -> Spawner<'a> {
		Spawner {
			params,
			origin: (400.0, 300.0),
			bounds: Bounds::new(800.0, 600.0),
			palette,
			rng,
			sequence: 0,
			initial: false,
		}
	}

	#[test]
	fn heart_curve_is_mirror_symmetric() {
		let scale = heart_scale(5.0);
		for t in [0.0, 0.4, 1.0, PI / 2.0, 2.5, PI] {
			let (x, y) = heart_point(t, scale);
			let (mx, my) = heart_point(TAU - t, scale);
			assert!((x + mx).abs() < 1e-9, "t={t}");
			assert!((y - my).abs() < 1e-9, "t={t}");
		}
		let (top_x, top_y) = heart_point(0.0, scale);
		let (tip_x, tip_y) = heart_point(PI, scale);
		assert_eq!(top_x, 0.0);
		assert!(tip_x.abs() < 1e-9);
		assert!((top_y - scale * 5.0 / 16.0).abs() < 1e-9);
		assert!((tip_y + scale * 17.0 / 16.0).abs() < 1e-9);
	}

	#[test]
	fn heart_particles_aim_at_their_target() {
		let params = EffectParams::default();
		let mut rng = SmallRng::seed_from_u64(5);
		let mut s = spawner(&params, &[], &mut rng);
		for _ in 0..20 {
			let p = particle(Variant::Heart, &mut s);
			let Motion::Seek { target, arrived } = p.motion else {
				panic!("heart particle without target");
			};
			assert!(!arrived);
			let (dx, dy) = (target.0 - p.x, target.1 - p.y);
			let norm = dx.hypot(dy) * p.vx.hypot(p.vy);
			assert!(((dx * p.vy - dy * p.vx) / norm).abs() < 1e-9);
			assert!(dx * p.vx + dy * p.vy > 0.0);
			assert!((p.vx.hypot(p.vy) - 200.0).abs() < 1e-9);
		}
	}

	#[test]
	fn ring_slots_fill_tier_by_tier() {
		let params = EffectParams {
			count: 9,
			..Default::default()
		};
		let mut rng = SmallRng::seed_from_u64(2);
		let mut s = spawner(&params, &[], &mut rng);
		let mut tiers = Vec::new();
		for n in 0..12 {
			s.sequence = n;
			let Motion::Ring { tier, .. } = particle(Variant::FireworkRing, &mut s).motion else {
				panic!("ring particle without tier");
			};
			tiers.push(tier);
		}
		assert_eq!(tiers, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 2, 2, 2]);
	}

	#[test]
	fn spiral_radius_grows_per_particle() {
		assert_eq!(spiral_radius(0), 5.0);
		assert_eq!(spiral_radius(10), 10.0);
		assert_eq!(spiral_limit(5.0), 130.0);
	}

	#[test]
	fn snow_starts_scattered_then_falls_from_the_top() {
		let params = EffectParams::default();
		let mut rng = SmallRng::seed_from_u64(8);
		let mut s = spawner(&params, &[], &mut rng);
		assert_eq!(particle(Variant::Snow, &mut s).y, -20.0);
		s.initial = true;
		let scattered = particle(Variant::Snow, &mut s);
		assert!((0.0..600.0).contains(&scattered.y));
		assert!(scattered.vy > 0.0);
	}

	#[test]
	fn palette_colors_are_used() {
		let params = EffectParams::default();
		let palette = [Color::rgb(1, 2, 3)];
		let mut rng = SmallRng::seed_from_u64(4);
		let mut s = spawner(&params, &palette, &mut rng);
		assert_eq!(particle(Variant::Confetti, &mut s).color, palette[0]);
		assert_eq!(particle(Variant::FireworkPeony, &mut s).color, palette[0]);
	}
}
