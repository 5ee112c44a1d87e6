//! Drawing for particle systems.
//!
//! Layers are drawn back to front:
//! 1. Ring halos and spider links
//! 2. Secondary sparks
//! 3. Particle glows, then bodies
//! 4. Flashes and shockwaves (always additive)
//!
//! Every pass leaves the surface at source-over with full alpha.

use std::f64::consts::{PI, TAU};

use super::behavior::{Body, Glow};
use super::color::Color;
use super::error::SurfaceError;
use super::particle::{LeafShape, Motion, Particle, Spark, SparkKind};
use super::surface::{Composite, Paint, Surface};
use super::system::ParticleSystem;

/// Draws one simulation.
pub fn draw<S: Surface>(system: &ParticleSystem, surface: &mut S) -> Result<(), SurfaceError> {
	let result = draw_layers(system, surface);
	surface.set_alpha(1.0);
	surface.set_composite(Composite::SourceOver)?;
	result
}

fn draw_layers<S: Surface>(system: &ParticleSystem, surface: &mut S) -> Result<(), SurfaceError> {
	let look = system.look();
	let time = system.elapsed();
	let color = system.params().color;

	surface.set_composite(look.blend)?;
	draw_halos(system, surface, color)?;
	draw_links(system, surface, color)?;

	for spark in system.sparks() {
		draw_spark(surface, spark, time)?;
	}

	if let Some(glow) = look.glow {
		for p in system.particles() {
			if !glow.nodes_only || p.is_node() {
				draw_glow(surface, p, glow, time)?;
			}
		}
	}
	for p in system.particles() {
		draw_body(surface, p, look.body, time)?;
	}

	surface.set_composite(Composite::Lighter)?;
	surface.set_alpha(1.0);
	for flash in system.flashes() {
		let fade = (flash.life / flash.max_life).clamp(0.0, 1.0);
		let stops = vec![
			(0.0, Color::WHITE.with_alpha(flash.strength * fade)),
			(1.0, Color::WHITE.with_alpha(0.0)),
		];
		surface.fill_circle(flash.x, flash.y, flash.radius, &Paint::glow(flash.x, flash.y, flash.radius, stops))?;
	}
	for wave in system.shockwaves() {
		let fade = (wave.life / wave.max_life).clamp(0.0, 1.0);
		surface.set_alpha(fade * 0.5);
		surface.set_line_width(2.0);
		stroke_circle(surface, wave.x, wave.y, wave.radius, &Paint::Solid(Color::WHITE))?;
	}
	Ok(())
}

fn draw_halos<S: Surface>(system: &ParticleSystem, surface: &mut S, color: Color) -> Result<(), SurfaceError> {
	let (x, y) = system.origin();
	for halo in system.halos().iter().filter(|h| h.life > 0.0) {
		surface.set_alpha((halo.life / halo.max_life).clamp(0.0, 1.0) * 0.15);
		surface.set_line_width(1.0);
		stroke_circle(surface, x, y, halo.radius, &Paint::Solid(color))?;
	}
	Ok(())
}

fn draw_links<S: Surface>(system: &ParticleSystem, surface: &mut S, color: Color) -> Result<(), SurfaceError> {
	if system.links().is_empty() {
		return Ok(());
	}
	surface.set_stroke(&Paint::Solid(color))?;
	surface.set_round_caps();
	for link in system.links() {
		surface.set_alpha(link.fade() * 0.5);
		surface.set_line_width(link.thickness.max(0.1));
		surface.begin_path();
		surface.move_to(link.from.0, link.from.1);
		surface.line_to(link.to.0, link.to.1);
		surface.stroke()?;
	}
	Ok(())
}

fn stroke_circle<S: Surface>(surface: &mut S, x: f64, y: f64, radius: f64, paint: &Paint) -> Result<(), SurfaceError> {
	if radius <= 0.0 {
		return Ok(());
	}
	surface.begin_path();
	surface.arc(x, y, radius)?;
	surface.set_stroke(paint)?;
	surface.stroke()
}

/// Sinusoidal brightness in `[0, 1]` for twinkling particles, 1 otherwise.
fn twinkle(p: &Particle, time: f64) -> f64 {
	match p.motion {
		Motion::Twinkle { speed, phase, .. } => (time * speed + phase).sin() * 0.5 + 0.5,
		_ => 1.0,
	}
}

/// Blinking dots shrink to half size at the bottom of their pulse.
fn blink_radius(size: f64, pulse: f64) -> f64 {
	size * (0.5 + 0.5 * pulse)
}

fn draw_spark<S: Surface>(surface: &mut S, spark: &Spark, time: f64) -> Result<(), SurfaceError> {
	let alpha = match spark.kind {
		SparkKind::Glint { fade_speed } => ((time * fade_speed).sin() * 0.5 + 0.5) * spark.fade(),
		SparkKind::Trail => spark.fade() * 0.5,
		_ => spark.fade(),
	};
	surface.set_alpha(alpha);
	match spark.kind {
		SparkKind::Glint { .. } | SparkKind::Flame { .. } => {
			let stops = vec![(0.0, spark.color), (1.0, spark.color.with_alpha(0.0))];
			surface.fill_circle(spark.x, spark.y, spark.size, &Paint::glow(spark.x, spark.y, spark.size, stops))
		}
		_ => surface.fill_circle(spark.x, spark.y, spark.size, &Paint::Solid(spark.color)),
	}
}

fn draw_glow<S: Surface>(surface: &mut S, p: &Particle, glow: Glow, time: f64) -> Result<(), SurfaceError> {
	let radius = p.size * glow.scale;
	let alpha = p.fade() * twinkle(p, time) * glow.strength;
	surface.set_alpha(1.0);
	let stops = vec![(0.0, p.color.with_alpha(alpha)), (1.0, p.color.with_alpha(0.0))];
	surface.fill_circle(p.x, p.y, radius, &Paint::glow(p.x, p.y, radius, stops))
}

fn draw_body<S: Surface>(surface: &mut S, p: &Particle, body: Body, time: f64) -> Result<(), SurfaceError> {
	let fade = p.fade();
	match body {
		Body::Dot { shrink } => {
			draw_trail(surface, p)?;
			let radius = if shrink { p.size * fade } else { p.size };
			surface.set_alpha(fade * twinkle(p, time));
			surface.fill_circle(p.x, p.y, radius, &Paint::Solid(p.color))
		}
		Body::Blink => {
			let pulse = twinkle(p, time);
			surface.set_alpha(fade * pulse);
			surface.fill_circle(p.x, p.y, blink_radius(p.size, pulse), &Paint::Solid(p.color))
		}
		Body::Star => draw_star(surface, p, time),
		Body::Ribbon => draw_ribbon(surface, p),
		Body::Leaf => draw_leaf(surface, p),
		Body::Bubble => draw_bubble(surface, p),
		Body::Flare => {
			let radius = p.size * (0.5 + fade * 0.5);
			surface.set_alpha(1.0);
			let stops = vec![
				(0.0, Color::WHITE.with_alpha(fade)),
				(0.4, p.color.with_alpha(fade * 0.8)),
				(1.0, p.color.with_alpha(0.0)),
			];
			surface.fill_circle(p.x, p.y, radius, &Paint::glow(p.x, p.y, radius, stops))
		}
		Body::Flake => draw_flake(surface, p),
		Body::Glitter => {
			let shine = twinkle(p, time);
			surface.set_alpha(fade * shine);
			surface.fill_circle(p.x, p.y, p.size, &Paint::Solid(p.color))?;
			if shine > 0.8 {
				let reach = p.size * 3.0 * shine;
				surface.set_line_width(p.size * 0.3);
				surface.set_stroke(&Paint::Solid(Color::WHITE))?;
				surface.begin_path();
				surface.move_to(p.x - reach, p.y);
				surface.line_to(p.x + reach, p.y);
				surface.move_to(p.x, p.y - reach);
				surface.line_to(p.x, p.y + reach);
				surface.stroke()?;
			}
			Ok(())
		}
		Body::Meteor => draw_meteor(surface, p),
	}
}

/// History lines and fading trail points behind firework particles.
fn draw_trail<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), SurfaceError> {
	match &p.motion {
		Motion::History { points, .. } if points.len() > 1 => {
			surface.set_alpha(p.fade() * 0.5);
			surface.set_line_width(p.size * 0.5);
			surface.set_round_caps();
			surface.set_stroke(&Paint::Solid(p.color))?;
			surface.begin_path();
			surface.move_to(p.x, p.y);
			for &(x, y) in points {
				surface.line_to(x, y);
			}
			surface.stroke()
		}
		Motion::Fading { points, .. } => {
			for point in points {
				surface.set_alpha((point.life / 0.5).clamp(0.0, 1.0) * p.fade() * 0.6);
				surface.fill_circle(point.x, point.y, p.size * 0.6, &Paint::Solid(p.color))?;
			}
			Ok(())
		}
		_ => Ok(()),
	}
}

fn draw_star<S: Surface>(surface: &mut S, p: &Particle, time: f64) -> Result<(), SurfaceError> {
	let rotation = match p.motion {
		Motion::Twinkle { phase, .. } => phase,
		_ => 0.0,
	};
	// Fade in over the first second and out over the last.
	let age = p.max_life - p.life;
	let envelope = age.min(1.0).min(p.life).clamp(0.0, 1.0);
	surface.set_alpha(envelope * (0.3 + 0.7 * twinkle(p, time)));
	surface.set_fill(&Paint::Solid(p.color))?;
	surface.begin_path();
	let (outer, inner) = (p.size, p.size * 0.4);
	for i in 0..10 {
		let radius = if i % 2 == 0 { outer } else { inner };
		let angle = rotation + i as f64 * PI / 5.0 - PI / 2.0;
		let (x, y) = (p.x + angle.cos() * radius, p.y + angle.sin() * radius);
		if i == 0 {
			surface.move_to(x, y);
		} else {
			surface.line_to(x, y);
		}
	}
	surface.close_path();
	surface.fill()
}

fn draw_ribbon<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), SurfaceError> {
	let Motion::Tumble {
		width,
		height,
		rotation,
		..
	} = p.motion
	else {
		return surface.fill_circle(p.x, p.y, p.size, &Paint::Solid(p.color));
	};
	transformed(surface, p, rotation, |surface| {
		surface.set_fill(&Paint::Solid(p.color))?;
		surface.fill_rect(-width / 2.0, -height / 2.0, width, height)
	})
}

/// Runs `paint` with the origin moved to the particle and rotated.
fn transformed<S: Surface>(
	surface: &mut S,
	p: &Particle,
	rotation: f64,
	paint: impl FnOnce(&mut S) -> Result<(), SurfaceError>,
) -> Result<(), SurfaceError> {
	surface.save();
	let result = surface
		.translate(p.x, p.y)
		.and_then(|()| surface.rotate(rotation))
		.and_then(|()| {
			surface.set_alpha(p.fade());
			paint(surface)
		});
	surface.restore();
	result
}

fn draw_leaf<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), SurfaceError> {
	let Motion::Leaf {
		shape,
		width,
		height,
		rotation,
		..
	} = p.motion
	else {
		return surface.fill_circle(p.x, p.y, p.size, &Paint::Solid(p.color));
	};
	transformed(surface, p, rotation, |surface| {
		surface.set_fill(&Paint::Solid(p.color))?;
		surface.begin_path();
		let (hw, hh) = (width / 2.0, height / 2.0);
		match shape {
			LeafShape::Oval | LeafShape::Veined => surface.ellipse(0.0, 0.0, hw, hh)?,
			LeafShape::Heart => {
				surface.move_to(0.0, hh);
				surface.bezier_to((-hw * 2.0, 0.0), (-hw, -hh * 1.2), (0.0, -hh * 0.4));
				surface.bezier_to((hw, -hh * 1.2), (hw * 2.0, 0.0), (0.0, hh));
				surface.close_path();
			}
		}
		surface.fill()?;
		if shape == LeafShape::Veined {
			surface.set_stroke(&Paint::Solid(p.color.darken(0.7)))?;
			surface.set_line_width((width * 0.08).max(0.5));
			surface.begin_path();
			surface.move_to(0.0, -hh);
			surface.line_to(0.0, hh);
			surface.stroke()?;
		}
		Ok(())
	})
}

fn draw_bubble<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), SurfaceError> {
	let Motion::Bubble {
		opacity,
		pop,
		popping,
		..
	} = p.motion
	else {
		return Ok(());
	};
	let opacity = opacity.clamp(0.0, 1.0);
	surface.set_alpha(1.0);
	if popping {
		surface.set_alpha(opacity);
		surface.set_line_width(1.0);
		return stroke_circle(surface, p.x, p.y, p.size + pop, &Paint::Solid(p.color));
	}
	let light = p.color.adjust(60, 60, 60);
	let paint = Paint::Radial {
		focus: (p.x - p.size * 0.3, p.y - p.size * 0.3),
		center: (p.x, p.y),
		radius: p.size,
		stops: vec![
			(0.0, light.with_alpha(opacity * 0.2)),
			(0.8, p.color.with_alpha(opacity * 0.4)),
			(1.0, p.color.with_alpha(opacity * 0.8)),
		],
	};
	surface.fill_circle(p.x, p.y, p.size, &paint)?;
	surface.fill_circle(
		p.x - p.size * 0.35,
		p.y - p.size * 0.35,
		p.size * 0.2,
		&Paint::Solid(Color::WHITE.with_alpha(opacity * 0.8)),
	)
}

fn draw_flake<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), SurfaceError> {
	let age = p.max_life - p.life;
	let envelope = (age / 0.5).min(p.life).clamp(0.0, 1.0);
	surface.set_alpha(envelope * 0.7);
	surface.fill_circle(p.x, p.y, p.size * 0.5, &Paint::Solid(p.color))?;
	let rotation = match p.motion {
		Motion::Drift { rotation, .. } => rotation,
		_ => 0.0,
	};
	surface.set_line_width((p.size * 0.15).max(0.5));
	surface.set_stroke(&Paint::Solid(p.color))?;
	surface.begin_path();
	for arm in 0..3 {
		let angle = rotation + arm as f64 * TAU / 6.0;
		let (dx, dy) = (angle.cos() * p.size, angle.sin() * p.size);
		surface.move_to(p.x - dx, p.y - dy);
		surface.line_to(p.x + dx, p.y + dy);
	}
	surface.stroke()
}

fn draw_meteor<S: Surface>(surface: &mut S, p: &Particle) -> Result<(), SurfaceError> {
	let fade = p.fade();
	let tail = match &p.motion {
		Motion::Streak { tail, .. } => Some(tail),
		_ => None,
	};
	if let Some((tail, &end)) = tail.and_then(|t| t.back().map(|end| (t, end))) {
		surface.set_alpha(1.0);
		surface.set_line_width(p.size);
		surface.set_round_caps();
		surface.set_stroke(&Paint::Linear {
			from: (p.x, p.y),
			to: end,
			stops: vec![(0.0, p.color.with_alpha(fade)), (1.0, p.color.with_alpha(0.0))],
		})?;
		surface.begin_path();
		surface.move_to(p.x, p.y);
		for &(x, y) in tail {
			surface.line_to(x, y);
		}
		surface.stroke()?;
	}
	let radius = p.size * 2.0;
	let stops = vec![
		(0.0, Color::WHITE.with_alpha(fade)),
		(0.3, p.color.with_alpha(fade * 0.8)),
		(1.0, p.color.with_alpha(0.0)),
	];
	surface.set_alpha(1.0);
	surface.fill_circle(p.x, p.y, radius, &Paint::glow(p.x, p.y, radius, stops))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::surface::{DrawCall, RecordingSurface};
	use crate::components::effects::types::{Bounds, EffectParams};
	use crate::components::effects::variant::Variant;

	fn run(variant: Variant, ticks: usize) -> (ParticleSystem, RecordingSurface) {
		let params = EffectParams {
			color: variant.default_color(),
			duration: 3.0,
			..Default::default()
		};
		let mut system = ParticleSystem::new(variant, params, Bounds::new(800.0, 600.0), 3);
		for _ in 0..ticks {
			system.update(1.0 / 64.0).unwrap();
		}
		let mut surface = RecordingSurface::new(800.0, 600.0);
		surface.clear();
		system.render(&mut surface).unwrap();
		(system, surface)
	}

	#[test]
	fn every_variant_renders_and_restores_composite() {
		for variant in Variant::ALL {
			let (_, surface) = run(variant, 20);
			assert_eq!(surface.composite(), Composite::SourceOver, "{variant}");
			assert_eq!(surface.save_depth(), 0, "{variant}");
		}
	}

	#[test]
	fn blink_pulses_between_half_and_full_size() {
		assert_eq!(blink_radius(4.0, 0.0), 2.0);
		assert_eq!(blink_radius(4.0, 0.5), 3.0);
		assert_eq!(blink_radius(4.0, 1.0), 4.0);
	}

	#[test]
	fn additive_variants_blend_with_lighter() {
		let (system, surface) = run(Variant::FireworkPeony, 10);
		assert!(system.particle_count() > 0);
		assert!(surface.additive_calls() >= system.particle_count());

		let (system, surface) = run(Variant::Sparkle, 10);
		assert!(system.particle_count() > 0);
		assert_eq!(surface.additive_calls(), 0);
	}

	#[test]
	fn confetti_draws_rectangles() {
		let (system, surface) = run(Variant::Confetti, 4);
		let rects = surface
			.frame()
			.iter()
			.filter(|c| matches!(c, DrawCall::Rect { .. }))
			.count();
		assert_eq!(rects, system.particle_count());
	}
}
