//! The particle simulation engine.
//!
//! A [`ParticleSystem`] owns one effect instance: its live particles, the
//! secondary elements they shed, and the variant-specific schedule that
//! drives multi-stage effects (ring halos, roman candle launches, salute
//! bursts). Advancing and drawing are separate so the same simulation can
//! run headless or against a browser canvas.

use std::f64::consts::PI;

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::behavior::{self, Behavior, Look};
use super::color::Color;
use super::error::{EffectError, SurfaceError};
use super::particle::{Flash, Halo, Motion, Particle, Shockwave, Spark, Step};
use super::render;
use super::spawn::{self, Spawner};
use super::surface::Surface;
use super::types::{Bounds, EffectParams};
use super::variant::Variant;
use super::web::{self, WebLink};

/// Roman candle launch cadence in seconds.
const LAUNCH_INTERVAL: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SalutePhase {
	Primed,
	Secondary,
	Aftershock,
}

/// Variant-specific timeline layered on top of regular emission.
#[derive(Clone, Debug)]
enum Schedule {
	Steady,
	Rings {
		halos: Vec<Halo>,
	},
	Launcher {
		total: usize,
		fired: usize,
		last_launch: f64,
		per_launch: usize,
		x: f64,
		y: f64,
	},
	Salute {
		phase: SalutePhase,
		last_burst: f64,
		radius: f64,
	},
}

/// Side effects of stepping one particle, applied once the particle loop ends.
enum Event {
	Explode { x: f64, y: f64, color: Color },
	Detonate { x: f64, y: f64 },
}

/// One running effect instance.
pub struct ParticleSystem {
	variant: Variant,
	behavior: Behavior,
	params: EffectParams,
	origin: (f64, f64),
	bounds: Bounds,
	elapsed: f64,
	emitted: usize,
	pub(crate) particles: Vec<Particle>,
	sparks: Vec<Spark>,
	flashes: Vec<Flash>,
	shockwaves: Vec<Shockwave>,
	links: Vec<WebLink>,
	schedule: Schedule,
	palette: Vec<Color>,
	rng: SmallRng,
}

impl ParticleSystem {
	/// Builds a simulation and its initial population.
	pub fn new(variant: Variant, params: EffectParams, bounds: Bounds, seed: u64) -> Self {
		let mut rng = SmallRng::seed_from_u64(seed);
		let behavior = variant.behavior(&params);
		let launches = match variant {
			Variant::FireworkRomanCandle => rng.gen_range(5..=9),
			_ => 0,
		};
		let palette = behavior.colors.palette(params.color, launches, &mut rng);
		let origin = variant.origin(bounds);

		let schedule = match variant {
			Variant::FireworkRing => Schedule::Rings {
				halos: (0..spawn::RING_TIERS)
					.map(|tier| {
						let life = params.duration * (1.0 - tier as f64 * 0.1);
						Halo {
							radius: (tier + 1) as f64 * 50.0,
							rotation: 0.0,
							spin: (rng.gen_range(0.0..1.0) * 2.0 - 1.0) * PI,
							life,
							max_life: life,
						}
					})
					.collect(),
			},
			Variant::FireworkRomanCandle => Schedule::Launcher {
				total: launches,
				fired: 0,
				last_launch: -LAUNCH_INTERVAL,
				per_launch: (params.count / launches).max(1),
				x: origin.0,
				y: origin.1,
			},
			Variant::FireworkSalute => Schedule::Salute {
				phase: SalutePhase::Primed,
				last_burst: 0.0,
				radius: 10.0,
			},
			_ => Schedule::Steady,
		};

		let mut system = Self {
			variant,
			behavior,
			params,
			origin,
			bounds,
			elapsed: 0.0,
			emitted: 0,
			particles: Vec::with_capacity(behavior.emission.cap()),
			sparks: Vec::new(),
			flashes: Vec::new(),
			shockwaves: Vec::new(),
			links: Vec::new(),
			schedule,
			palette,
			rng,
		};
		for _ in 0..behavior.emission.initial {
			system.emit_one(true);
		}
		debug!(
			"imp-fx: {} started with {} particles at ({:.0}, {:.0})",
			variant,
			system.particles.len(),
			origin.0,
			origin.1
		);
		system
	}

	pub fn variant(&self) -> Variant {
		self.variant
	}

	pub fn params(&self) -> &EffectParams {
		&self.params
	}

	pub fn behavior(&self) -> &Behavior {
		&self.behavior
	}

	pub fn look(&self) -> Look {
		self.behavior.look
	}

	pub fn origin(&self) -> (f64, f64) {
		self.origin
	}

	pub fn bounds(&self) -> Bounds {
		self.bounds
	}

	/// Simulated seconds since creation.
	pub fn elapsed(&self) -> f64 {
		self.elapsed
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn particle_count(&self) -> usize {
		self.particles.len()
	}

	pub fn sparks(&self) -> &[Spark] {
		&self.sparks
	}

	pub fn flashes(&self) -> &[Flash] {
		&self.flashes
	}

	pub fn shockwaves(&self) -> &[Shockwave] {
		&self.shockwaves
	}

	pub fn links(&self) -> &[WebLink] {
		&self.links
	}

	pub fn halos(&self) -> &[Halo] {
		match &self.schedule {
			Schedule::Rings { halos } => halos,
			_ => &[],
		}
	}

	/// Roman candle launches as `(fired, scheduled)`.
	pub fn launches(&self) -> Option<(usize, usize)> {
		match self.schedule {
			Schedule::Launcher { fired, total, .. } => Some((fired, total)),
			_ => None,
		}
	}

	/// Salute has finished its sub-bursts and is shedding embers.
	pub fn in_aftershock(&self) -> bool {
		matches!(
			self.schedule,
			Schedule::Salute {
				phase: SalutePhase::Aftershock,
				..
			}
		)
	}

	/// Nothing left on screen.
	pub fn is_drained(&self) -> bool {
		self.particles.is_empty()
			&& self.sparks.is_empty()
			&& self.flashes.is_empty()
			&& self.shockwaves.is_empty()
	}

	pub fn is_complete(&self) -> bool {
		self.behavior
			.completion
			.is_complete(self.elapsed, self.params.duration, self.is_drained())
	}

	/// Advances the simulation by `dt` seconds.
	///
	/// Zero, negative and non-finite steps are ignored. Fails only when the
	/// state has become non-finite.
	pub fn update(&mut self, dt: f64) -> Result<(), EffectError> {
		if !(dt.is_finite() && dt > 0.0) {
			return Ok(());
		}
		self.elapsed += dt;
		if self
			.behavior
			.completion
			.is_expired(self.elapsed, self.params.duration)
		{
			self.retire();
			return Ok(());
		}

		self.run_schedule(dt);
		let events = self.step_particles(dt);
		self.apply(events);
		self.settle_salute();
		self.step_secondary(dt);
		if self.variant == Variant::FireworkSpider {
			self.links = web::link_nodes(&self.particles);
		}
		self.emit();
		self.check_finite()
	}

	/// Draws the current state. Leaves the surface at source-over compositing.
	pub fn render<S: Surface>(&self, surface: &mut S) -> Result<(), SurfaceError> {
		render::draw(self, surface)
	}

	fn retire(&mut self) {
		self.particles.clear();
		self.sparks.clear();
		self.flashes.clear();
		self.shockwaves.clear();
		self.links.clear();
	}

	fn spawn(&mut self, initial: bool, make: impl FnOnce(&mut Spawner<'_>) -> Particle) -> Particle {
		let mut spawner = Spawner {
			params: &self.params,
			origin: self.origin,
			bounds: self.bounds,
			palette: &self.palette,
			rng: &mut self.rng,
			sequence: self.emitted,
			initial,
		};
		let particle = make(&mut spawner);
		self.emitted += 1;
		particle
	}

	/// Adds a particle unless the population is at its ceiling.
	fn admit(&mut self, particle: Particle) -> bool {
		if self.particles.len() < self.behavior.emission.cap() {
			self.particles.push(particle);
			true
		} else {
			false
		}
	}

	fn emit_one(&mut self, initial: bool) {
		let variant = self.variant;
		let particle = self.spawn(initial, |s| spawn::particle(variant, s));
		if matches!(particle.motion, Motion::Twinkle { glints: true, .. }) && self.rng.gen_bool(0.4) {
			self.sparks.push(spawn::glint(&mut self.rng, &particle));
		}
		self.admit(particle);
	}

	/// Tops the population up toward its target while the effect is running.
	fn emit(&mut self) {
		if behavior::reached(self.elapsed, self.params.duration) {
			return;
		}
		let emission = self.behavior.emission;
		for _ in 0..emission.attempts {
			if self.particles.len() >= emission.target {
				break;
			}
			if emission.chance < 1.0 && !self.rng.gen_bool(emission.chance) {
				continue;
			}
			if self.variant == Variant::Spiral
				&& spawn::spiral_radius(self.emitted) >= spawn::spiral_limit(self.params.size)
			{
				break;
			}
			self.emit_one(false);
		}
	}

	fn run_schedule(&mut self, dt: f64) {
		match &mut self.schedule {
			Schedule::Steady => {}
			Schedule::Rings { halos } => {
				for halo in halos.iter_mut() {
					halo.step(dt);
				}
			}
			Schedule::Launcher {
				total,
				fired,
				last_launch,
				x,
				y,
				..
			} => {
				let running = !behavior::reached(self.elapsed, self.params.duration);
				if running && *fired < *total && self.elapsed - *last_launch >= LAUNCH_INTERVAL {
					let color = self.palette.get(*fired).copied().unwrap_or(self.params.color);
					let (x, y) = (*x, *y);
					*fired += 1;
					*last_launch = self.elapsed;
					let rocket = self.spawn(false, |s| spawn::rocket(s, x, y, color));
					self.admit(rocket);
				}
			}
			Schedule::Salute {
				phase,
				last_burst,
				radius,
			} => match phase {
				SalutePhase::Primed => {
					*phase = SalutePhase::Secondary;
					*last_burst = self.elapsed;
					self.primary_burst();
				}
				SalutePhase::Secondary => {}
				SalutePhase::Aftershock => {
					*radius += dt * self.params.speed * 20.0;
					let radius = *radius;
					for _ in 0..3 {
						if self.rng.gen_bool(0.2) {
							let ember = self.spawn(false, |s| spawn::aftershock(s, radius));
							self.admit(ember);
						}
					}
				}
			},
		}
	}

	fn primary_burst(&mut self) {
		let (x, y) = self.origin;
		let base = self.params.size;
		self.flashes.push(Flash {
			x,
			y,
			radius: base * 10.0,
			life: 0.2,
			max_life: 0.2,
			strength: 0.8,
		});
		self.shockwaves.push(Shockwave {
			x,
			y,
			radius: 0.0,
			max_radius: 100.0,
			growth: self.params.speed * 100.0,
			life: 0.5,
			max_life: 0.5,
		});
		let shells = (self.params.count as f64 * 0.3) as usize;
		for _ in 0..shells {
			let shell = self.spawn(false, spawn::salute_shell);
			if !self.admit(shell) {
				break;
			}
		}
	}

	/// Moves to the aftershock once every fused shell has gone off.
	fn settle_salute(&mut self) {
		let live_fuses = self
			.particles
			.iter()
			.any(|p| matches!(p.motion, Motion::Shell { fuse: Some(_), .. }));
		let elapsed = self.elapsed;
		if let Schedule::Salute {
			phase, last_burst, ..
		} = &mut self.schedule
		{
			if *phase == SalutePhase::Secondary && !live_fuses && elapsed - *last_burst > 0.1 {
				*phase = SalutePhase::Aftershock;
				debug!("imp-fx: salute entering aftershock at {elapsed:.2}s");
			}
		}
	}

	fn step_particles(&mut self, dt: f64) -> Vec<Event> {
		let physics = self.behavior.physics;
		let gravity = physics.acceleration(self.params.speed);
		let halos: &[Halo] = match &self.schedule {
			Schedule::Rings { halos } => halos,
			_ => &[],
		};
		let step = Step {
			dt,
			time: self.elapsed,
			speed: self.params.speed,
			gravity,
			drag: physics.retention(dt),
			origin: self.origin,
			halos,
		};
		let base = self.params.size;
		let rng = &mut self.rng;
		let sparks = &mut self.sparks;
		let palette = &self.palette;
		let mut events = Vec::new();

		for p in self.particles.iter_mut() {
			p.step(&step, rng);
			match p.motion {
				Motion::Trailing => {
					if rng.gen_bool(0.1) {
						sparks.push(spawn::trail(p));
					}
				}
				Motion::Burning => {
					if rng.gen_bool(0.3) {
						sparks.push(spawn::ember(p));
					}
					if rng.gen_bool(0.15) {
						sparks.push(spawn::flame_tongue(rng, p, palette));
					}
				}
				Motion::Twinkle { glints: true, .. } => {
					if rng.gen_bool((dt * 2.0).min(1.0)) {
						sparks.push(spawn::glint(rng, p));
					}
				}
				Motion::Rocket { target_y } => {
					if p.y <= target_y || p.life <= 0.0 {
						events.push(Event::Explode {
							x: p.x,
							y: p.y,
							color: p.color,
						});
						p.life = 0.0;
					} else if rng.gen_bool(0.3) {
						sparks.push(spawn::cinder(rng, p, base));
					}
				}
				Motion::Shell { .. } => {
					let (detonate, shed) = tick_shell(&mut p.motion, dt);
					if detonate {
						events.push(Event::Detonate { x: p.x, y: p.y });
					}
					if shed {
						sparks.push(spawn::streamer(rng, p, base));
					}
				}
				_ => {}
			}
		}

		let bounds = self.bounds;
		self.particles
			.retain(|p| p.life > 0.0 && !p.is_culled(bounds));
		events
	}

	fn apply(&mut self, events: Vec<Event>) {
		for event in events {
			match event {
				Event::Explode { x, y, color } => {
					let per_launch = match self.schedule {
						Schedule::Launcher { per_launch, .. } => per_launch,
						_ => 0,
					};
					for _ in 0..per_launch {
						let fragment = self.spawn(false, |s| spawn::shrapnel(s, x, y, color));
						if !self.admit(fragment) {
							break;
						}
					}
				}
				Event::Detonate { x, y } => {
					self.flashes.push(Flash {
						x,
						y,
						radius: self.params.size * 5.0,
						life: 0.1,
						max_life: 0.1,
						strength: 0.6,
					});
					let fragments = (self.params.count as f64 * 0.1) as usize;
					for _ in 0..fragments {
						let fragment = self.spawn(false, |s| spawn::salute_fragment(s, x, y));
						if !self.admit(fragment) {
							break;
						}
					}
					if let Schedule::Salute { last_burst, .. } = &mut self.schedule {
						*last_burst = self.elapsed;
					}
				}
			}
		}
	}

	fn step_secondary(&mut self, dt: f64) {
		let gravity = self.behavior.physics.acceleration(self.params.speed);
		for spark in self.sparks.iter_mut() {
			spark.step(dt, gravity);
		}
		self.sparks.retain(|s| s.life > 0.0);
		for flash in self.flashes.iter_mut() {
			flash.step(dt);
		}
		self.flashes.retain(|f| f.life > 0.0);
		for wave in self.shockwaves.iter_mut() {
			wave.step(dt);
		}
		self.shockwaves.retain(|w| w.life > 0.0);
	}

	fn check_finite(&self) -> Result<(), EffectError> {
		let finite = self.particles.iter().all(Particle::is_finite)
			&& self.sparks.iter().all(Spark::is_finite);
		if finite {
			Ok(())
		} else {
			Err(EffectError::Diverged(self.variant.key()))
		}
	}
}

/// Burns a salute shell's fuse and trail clock. Returns `(detonated, shed_spark)`.
fn tick_shell(motion: &mut Motion, dt: f64) -> (bool, bool) {
	let Motion::Shell {
		fuse,
		trail_every,
		trail_clock,
	} = motion
	else {
		return (false, false);
	};
	let detonated = match fuse {
		Some(left) => {
			*left -= dt;
			*left <= 0.0
		}
		None => false,
	};
	if detonated {
		*fuse = None;
	}
	let shed = match *trail_every {
		Some(every) => {
			*trail_clock += dt;
			let due = *trail_clock >= every;
			if due {
				*trail_clock = 0.0;
			}
			due
		}
		None => false,
	};
	(detonated, shed)
}

#[cfg(test)]
mod tests {
	use super::*;

	const TICK: f64 = 1.0 / 64.0;

	fn system(variant: Variant, count: usize, duration: f64) -> ParticleSystem {
		let params = EffectParams {
			color: variant.default_color(),
			count,
			duration,
			..Default::default()
		};
		ParticleSystem::new(variant, params, Bounds::new(800.0, 600.0), 11)
	}

	#[test]
	fn initial_population_follows_emission() {
		assert_eq!(system(Variant::Sparkle, 20, 1.0).particle_count(), 20);
		assert_eq!(system(Variant::FireworkPeony, 20, 1.0).particle_count(), 0);
		assert_eq!(system(Variant::Confetti, 80, 1.0).particle_count(), 50);
		assert_eq!(system(Variant::Heart, 30, 1.0).particle_count(), 30);
	}

	#[test]
	fn zero_and_invalid_steps_change_nothing() {
		let mut s = system(Variant::Fountain, 30, 2.0);
		let before = s.particles().to_vec();
		s.update(0.0).unwrap();
		s.update(-1.0).unwrap();
		s.update(f64::NAN).unwrap();
		assert_eq!(s.elapsed(), 0.0);
		assert_eq!(s.particles(), &before[..]);
	}

	#[test]
	fn cutoff_retires_everything() {
		let mut s = system(Variant::Stars, 40, 0.5);
		for _ in 0..32 {
			s.update(TICK).unwrap();
		}
		assert_eq!(s.particle_count(), 0);
		assert!(s.is_complete());
	}

	#[test]
	fn ring_builds_three_halos() {
		let s = system(Variant::FireworkRing, 30, 2.0);
		let radii: Vec<f64> = s.halos().iter().map(|h| h.radius).collect();
		assert_eq!(radii, vec![50.0, 100.0, 150.0]);
		assert!((s.halos()[2].life - 1.6).abs() < 1e-12);
	}

	#[test]
	fn salute_bursts_on_first_tick() {
		let mut s = system(Variant::FireworkSalute, 50, 2.0);
		s.update(TICK).unwrap();
		assert_eq!(s.flashes().len(), 1);
		assert_eq!(s.shockwaves().len(), 1);
		assert!(s.particle_count() >= 15);
		assert!(s.particle_count() <= s.behavior().emission.cap());
	}

	#[test]
	fn roman_candle_launches_rockets() {
		let mut s = system(Variant::FireworkRomanCandle, 50, 3.0);
		s.update(TICK).unwrap();
		assert_eq!(s.particle_count(), 1);
		assert!(matches!(s.particles()[0].motion, Motion::Rocket { .. }));
	}

	#[test]
	fn roman_candle_fires_every_launch() {
		let mut s = system(Variant::FireworkRomanCandle, 50, 3.0);
		for _ in 0..192 {
			s.update(TICK).unwrap();
		}
		let (fired, total) = s.launches().unwrap();
		assert_eq!(fired, total);
		assert!((5..=9).contains(&total));
	}

	#[test]
	fn roman_candle_colors_each_launch() {
		let s = system(Variant::FireworkRomanCandle, 50, 3.0);
		let (_, total) = s.launches().unwrap();
		assert_eq!(s.palette, crate::components::effects::color::hue_ramp(s.params().color, total));
	}

	#[test]
	fn roman_candle_stops_launching_at_duration() {
		for seed in 0..16 {
			let params = EffectParams {
				color: Variant::FireworkRomanCandle.default_color(),
				duration: 1.5,
				..Default::default()
			};
			let mut s = ParticleSystem::new(Variant::FireworkRomanCandle, params, Bounds::new(800.0, 600.0), seed);
			for _ in 0..96 {
				s.update(TICK).unwrap();
			}
			let at_duration = s.launches().unwrap().0;
			assert!(at_duration <= 5, "seed {seed} fired {at_duration} by 1.5s");
			while !s.is_complete() {
				s.update(TICK).unwrap();
			}
			assert_eq!(s.launches().unwrap().0, at_duration, "seed {seed} launched after its duration");
		}
	}

	#[test]
	fn sparkle_ends_on_coarse_frames() {
		for (dt, frames) in [(0.1, 10), (1.0 / 30.0, 30)] {
			let mut s = system(Variant::Sparkle, 20, 1.0);
			for _ in 0..frames {
				s.update(dt).unwrap();
			}
			assert_eq!(s.particle_count(), 0, "dt {dt}");
			assert!(s.is_complete(), "dt {dt}");
		}
	}

	#[test]
	fn salute_reaches_aftershock() {
		let mut s = system(Variant::FireworkSalute, 50, 2.0);
		for _ in 0..64 {
			s.update(TICK).unwrap();
		}
		assert!(s.in_aftershock());
	}

	#[test]
	fn spider_links_nodes() {
		let mut s = system(Variant::FireworkSpider, 60, 2.0);
		for _ in 0..8 {
			s.update(TICK).unwrap();
		}
		assert!(s.links().iter().all(|l| {
			(l.from.0 - l.to.0).hypot(l.from.1 - l.to.1) < web::LINK_DISTANCE
		}));
	}

	#[test]
	fn divergence_is_reported() {
		let mut s = system(Variant::Sparkle, 10, 2.0);
		s.particles[0].life = 1.0;
		s.particles[0].vx = f64::NAN;
		assert!(matches!(
			s.update(TICK),
			Err(EffectError::Diverged("sparkle"))
		));
	}
}
