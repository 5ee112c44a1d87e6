//! Spider web links between node particles.

use super::particle::Particle;

/// Nodes closer than this are linked.
pub const LINK_DISTANCE: f64 = 100.0;

/// A transient line between two node particles, rebuilt every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct WebLink {
	pub from: (f64, f64),
	pub to: (f64, f64),
	pub life: f64,
	pub max_life: f64,
	pub thickness: f64,
}

impl WebLink {
	pub fn fade(&self) -> f64 {
		if self.max_life > 0.0 {
			(self.life / self.max_life).clamp(0.0, 1.0)
		} else {
			0.0
		}
	}
}

/// Links every pair of node particles strictly closer than [`LINK_DISTANCE`].
///
/// A link inherits the shorter remaining life of its endpoints and half the
/// smaller endpoint size as its thickness.
pub fn link_nodes(particles: &[Particle]) -> Vec<WebLink> {
	let nodes: Vec<&Particle> = particles.iter().filter(|p| p.is_node()).collect();
	let mut links = Vec::new();
	for (i, a) in nodes.iter().enumerate() {
		for b in &nodes[i + 1..] {
			let distance = (a.x - b.x).hypot(a.y - b.y);
			if distance < LINK_DISTANCE {
				let (life, max_life) = if a.life <= b.life {
					(a.life, a.max_life)
				} else {
					(b.life, b.max_life)
				};
				links.push(WebLink {
					from: (a.x, a.y),
					to: (b.x, b.y),
					life,
					max_life,
					thickness: a.size.min(b.size) * 0.5,
				});
			}
		}
	}
	links
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::color::Color;
	use crate::components::effects::particle::Motion;

	fn node(x: f64, life: f64, size: f64) -> Particle {
		Particle::new(x, 0.0, 0.0, 0.0, size, Color::WHITE, life).with_motion(Motion::Node)
	}

	#[test]
	fn links_only_close_nodes() {
		let particles = vec![
			node(0.0, 1.0, 4.0),
			node(99.999, 0.5, 2.0),
			node(199.999, 1.0, 4.0),
			Particle::new(50.0, 0.0, 0.0, 0.0, 1.0, Color::WHITE, 1.0),
		];
		let links = link_nodes(&particles);
		assert_eq!(links.len(), 2);
		assert_eq!(links[0].life, 0.5);
		assert_eq!(links[0].thickness, 1.0);
	}

	#[test]
	fn exact_threshold_does_not_link() {
		let particles = vec![node(0.0, 1.0, 2.0), node(100.0, 1.0, 2.0)];
		assert!(link_nodes(&particles).is_empty());
	}
}
