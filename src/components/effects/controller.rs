//! The effects controller: one drawing surface, any number of running effects.
//!
//! The controller owns the current selection, attaches its surface lazily on
//! the first `play`, and on every frame updates and draws each active
//! simulation in start order before reaping the finished ones. A simulation
//! that fails (diverged state, a refused draw call) is logged and dropped
//! without disturbing the others.

use std::collections::VecDeque;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use super::clock::FrameClock;
use super::color::Color;
use super::error::EffectError;
use super::surface::Surface;
use super::system::ParticleSystem;
use super::types::{Bounds, EffectConfig, EffectSettings, particle_count, positive};
use super::variant::{FallbackPolicy, Variant, resolve_variant};
use super::wrapper::{self, EffectHost};

/// Plays every variant in turn, `interval` seconds apart.
#[derive(Clone, Debug)]
struct Showcase {
	queue: VecDeque<Variant>,
	interval: f64,
	next_at: f64,
}

pub struct EffectsController<H: EffectHost> {
	host: H,
	surface: Option<H::Surface>,
	active: Vec<ParticleSystem>,
	settings: EffectSettings,
	clock: FrameClock,
	fallback: FallbackPolicy,
	showcase: Option<Showcase>,
	uptime: f64,
	seeder: SmallRng,
	shut_down: bool,
}

impl<H: EffectHost> EffectsController<H> {
	pub fn new(host: H, config: &EffectConfig, seed: u64) -> Self {
		Self {
			host,
			surface: None,
			active: Vec::new(),
			settings: config.defaults.clone(),
			clock: FrameClock::new(config.max_frame_delta),
			fallback: config.fallback,
			showcase: None,
			uptime: 0.0,
			seeder: SmallRng::seed_from_u64(seed),
			shut_down: false,
		}
	}

	/// Current selection.
	pub fn settings(&self) -> &EffectSettings {
		&self.settings
	}

	/// Current selection as JSON, with the count exported as `particles`.
	pub fn save_settings(&self) -> Result<String, EffectError> {
		let json = serde_json::to_string(&self.settings)?;
		info!("imp-fx: saved effect settings {json}");
		Ok(json)
	}

	pub fn set_fallback_policy(&mut self, policy: FallbackPolicy) {
		self.fallback = policy;
	}

	/// Selects the effect type later `play(None)` calls will start.
	pub fn select_effect(&mut self, name: &str) -> Result<Variant, EffectError> {
		let variant = resolve_variant(name, self.fallback)?;
		self.settings.kind = variant.key().to_string();
		Ok(variant)
	}

	pub fn set_color(&mut self, hex: &str) -> Result<(), EffectError> {
		self.settings.color = Some(Color::from_hex(hex)?.to_hex());
		Ok(())
	}

	pub fn set_size(&mut self, size: f64) -> Result<(), EffectError> {
		self.settings.size = positive("size", size)?;
		Ok(())
	}

	/// Accepts counts from 1 to [`MAX_COUNT`](super::types::MAX_COUNT).
	pub fn set_count(&mut self, count: usize) -> Result<(), EffectError> {
		self.settings.count = particle_count(count)?;
		Ok(())
	}

	pub fn set_speed(&mut self, speed: f64) -> Result<(), EffectError> {
		self.settings.speed = positive("speed", speed)?;
		Ok(())
	}

	pub fn set_duration(&mut self, duration: f64) -> Result<(), EffectError> {
		self.settings.duration = Some(positive("duration", duration)?);
		Ok(())
	}

	/// Starts an effect. An explicit `kind` overrides the current selection.
	///
	/// The surface is attached on first use and refitted to the container on
	/// later plays; a missing container is reported rather than silently ignored.
	pub fn play(&mut self, kind: Option<&str>) -> Result<Variant, EffectError> {
		if self.shut_down {
			return Err(EffectError::ShutDown);
		}
		let variant = resolve_variant(kind.unwrap_or(&self.settings.kind), self.fallback)?;
		let params = self.settings.resolve(variant)?;
		let seed = self.seeder.next_u64();

		self.resize();
		let system = match &self.surface {
			Some(surface) => wrapper::simulate_on(surface, variant, params, seed),
			None => {
				let (surface, system) = wrapper::mount_effect(&mut self.host, variant, params, seed)?;
				self.surface = Some(surface);
				system
			}
		};
		self.active.push(system);
		info!(
			"imp-fx: playing {} ({} active)",
			variant,
			self.active.len()
		);
		Ok(variant)
	}

	/// Queues every variant to play `interval` seconds apart.
	pub fn showcase(&mut self, interval: f64) -> Result<(), EffectError> {
		if self.shut_down {
			return Err(EffectError::ShutDown);
		}
		self.showcase = Some(Showcase {
			queue: Variant::ALL.into_iter().collect(),
			interval: positive("interval", interval)?,
			next_at: self.uptime,
		});
		Ok(())
	}

	/// Refits the surface to the container's current size.
	///
	/// Running effects keep the bounds they started with; effects played
	/// afterwards use the new size. Returns the new size when it changed.
	pub fn resize(&mut self) -> Option<Bounds> {
		let surface = self.surface.as_mut()?;
		let bounds = self.host.measure()?;
		if bounds == Bounds::new(surface.width(), surface.height()) {
			return None;
		}
		surface.resize(bounds.width, bounds.height);
		debug!("imp-fx: surface resized to {}x{}", bounds.width, bounds.height);
		Some(bounds)
	}

	pub fn is_showcasing(&self) -> bool {
		self.showcase.is_some()
	}

	/// Advances by the wall-clock time since the previous frame.
	pub fn tick(&mut self, timestamp_ms: f64) -> Result<(), EffectError> {
		let dt = self.clock.delta(timestamp_ms);
		self.advance(dt)
	}

	/// Advances every active effect by `dt` seconds, draws them and reaps the
	/// finished ones. A no-op after shutdown.
	pub fn advance(&mut self, dt: f64) -> Result<(), EffectError> {
		if self.shut_down {
			return Ok(());
		}
		if dt.is_finite() && dt > 0.0 {
			self.uptime += dt;
		}
		self.run_showcase();

		let Some(surface) = self.surface.as_mut() else {
			return Ok(());
		};
		surface.clear();
		self.active.retain_mut(|system| {
			let stepped = system
				.update(dt)
				.and_then(|()| system.render(surface).map_err(EffectError::from));
			if let Err(err) = stepped {
				warn!("imp-fx: dropping {} effect: {}", system.variant(), err);
				return false;
			}
			if system.is_complete() {
				debug!(
					"imp-fx: {} completed after {:.2}s",
					system.variant(),
					system.elapsed()
				);
				return false;
			}
			true
		});
		Ok(())
	}

	fn run_showcase(&mut self) {
		let Some(showcase) = self.showcase.as_mut() else {
			return;
		};
		if self.uptime < showcase.next_at {
			return;
		}
		let next = showcase.queue.pop_front();
		showcase.next_at += showcase.interval;
		if showcase.queue.is_empty() {
			self.showcase = None;
		}
		if let Some(variant) = next {
			if let Err(err) = self.play(Some(variant.key())) {
				warn!("imp-fx: showcase could not play {variant}: {err}");
			}
		}
	}

	/// Stops every effect and releases the surface. Later `play` and
	/// `showcase` calls fail with [`EffectError::ShutDown`]; ticks do nothing.
	pub fn shutdown(&mut self) {
		if self.shut_down {
			return;
		}
		self.active.clear();
		self.showcase = None;
		self.surface = None;
		self.host.detach();
		self.clock.reset();
		self.shut_down = true;
		info!("imp-fx: effects controller shut down");
	}

	pub fn is_shut_down(&self) -> bool {
		self.shut_down
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn has_surface(&self) -> bool {
		self.surface.is_some()
	}

	pub fn surface(&self) -> Option<&H::Surface> {
		self.surface.as_ref()
	}

	pub fn active_count(&self) -> usize {
		self.active.len()
	}

	/// Live particles across every active effect.
	pub fn particle_count(&self) -> usize {
		self.active.iter().map(ParticleSystem::particle_count).sum()
	}

	pub fn active(&self) -> &[ParticleSystem] {
		&self.active
	}
}
