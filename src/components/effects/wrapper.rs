//! Mounting effects onto a host surface.

use log::info;

use super::error::EffectError;
use super::surface::{RecordingSurface, Surface};
use super::system::ParticleSystem;
use super::types::{Bounds, EffectParams};
use super::variant::Variant;

/// Something that can hand out a drawing surface for effects.
pub trait EffectHost {
	type Surface: Surface;

	/// Resolves the container and returns a fresh surface sized to it.
	/// Stray layers from earlier mounts are removed first.
	fn attach_surface(&mut self) -> Result<Self::Surface, EffectError>;

	/// Current container size, or `None` while it cannot be measured.
	fn measure(&self) -> Option<Bounds>;

	/// Releases any surface this host attached.
	fn detach(&mut self) {}
}

/// Fixed-size host for native runs and tests.
#[derive(Clone, Debug)]
pub struct HeadlessHost {
	pub width: f64,
	pub height: f64,
	/// When false, `attach_surface` reports a missing container.
	pub available: bool,
}

impl HeadlessHost {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width,
			height,
			available: true,
		}
	}

	/// A host whose container never resolves.
	pub fn missing() -> Self {
		Self {
			available: false,
			..Self::new(0.0, 0.0)
		}
	}
}

impl EffectHost for HeadlessHost {
	type Surface = RecordingSurface;

	fn attach_surface(&mut self) -> Result<RecordingSurface, EffectError> {
		if !self.available {
			return Err(EffectError::ContainerNotFound("headless".to_string()));
		}
		if !(self.width > 0.0 && self.height > 0.0) {
			return Err(EffectError::SurfaceUnavailable(format!(
				"empty container {}x{}",
				self.width, self.height
			)));
		}
		Ok(RecordingSurface::new(self.width, self.height))
	}

	fn measure(&self) -> Option<Bounds> {
		(self.available && self.width > 0.0 && self.height > 0.0).then(|| Bounds::new(self.width, self.height))
	}
}

/// Attaches a surface and builds a simulation sized to it.
pub fn mount_effect<H: EffectHost>(
	host: &mut H,
	variant: Variant,
	params: EffectParams,
	seed: u64,
) -> Result<(H::Surface, ParticleSystem), EffectError> {
	let surface = host.attach_surface()?;
	let system = simulate_on(&surface, variant, params, seed);
	info!(
		"imp-fx: mounted {} on {}x{} surface",
		variant,
		surface.width(),
		surface.height()
	);
	Ok((surface, system))
}

/// Builds a simulation sized to an existing surface.
pub fn simulate_on<S: Surface>(surface: &S, variant: Variant, params: EffectParams, seed: u64) -> ParticleSystem {
	let bounds = Bounds::new(surface.width(), surface.height());
	ParticleSystem::new(variant, params, bounds, seed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mounts_sized_to_the_host() {
		let mut host = HeadlessHost::new(640.0, 480.0);
		let (surface, system) =
			mount_effect(&mut host, Variant::Fountain, EffectParams::default(), 1).unwrap();
		assert_eq!(surface.width(), 640.0);
		assert_eq!(system.bounds(), Bounds::new(640.0, 480.0));
		assert_eq!(system.origin(), (320.0, 480.0));
	}

	#[test]
	fn measures_only_usable_containers() {
		assert_eq!(HeadlessHost::new(300.0, 200.0).measure(), Some(Bounds::new(300.0, 200.0)));
		assert_eq!(HeadlessHost::new(0.0, 200.0).measure(), None);
		assert_eq!(HeadlessHost::missing().measure(), None);
	}

	#[test]
	fn missing_container_is_an_error() {
		let mut host = HeadlessHost::missing();
		let result = mount_effect(&mut host, Variant::Snow, EffectParams::default(), 1);
		assert!(matches!(result, Err(EffectError::ContainerNotFound(_))));

		let mut empty = HeadlessHost::new(0.0, 300.0);
		let result = mount_effect(&mut empty, Variant::Snow, EffectParams::default(), 1);
		assert!(matches!(result, Err(EffectError::SurfaceUnavailable(_))));
	}
}
