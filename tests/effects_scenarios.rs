//! End-to-end effect scenarios against a headless host.

#![allow(unused_crate_dependencies)]

use std::f64::consts::{PI, TAU};

use imp_fx::components::effects::{DrawCall, heart_point, heart_scale};
use imp_fx::{
	Bounds, EffectConfig, EffectError, EffectParams, EffectSettings, EffectsController, FallbackPolicy,
	HeadlessHost, ParticleSystem, Variant,
};

const TICK: f64 = 1.0 / 64.0;

fn controller(defaults: EffectSettings) -> EffectsController<HeadlessHost> {
	let config = EffectConfig {
		defaults,
		..Default::default()
	};
	EffectsController::new(HeadlessHost::new(800.0, 600.0), &config, 2024)
}

fn params(variant: Variant, count: usize, duration: f64) -> EffectParams {
	EffectParams {
		color: variant.default_color(),
		size: 5.0,
		count,
		speed: 5.0,
		duration,
	}
}

#[test]
fn sparkle_runs_for_its_duration_then_clears() {
	let mut fx = controller(EffectSettings {
		kind: "sparkle".into(),
		count: 20,
		duration: Some(1.0),
		..Default::default()
	});
	assert_eq!(fx.play(None).unwrap(), Variant::Sparkle);

	for _ in 0..32 {
		fx.advance(TICK).unwrap();
	}
	assert!(fx.particle_count() > 0);
	assert_eq!(fx.active_count(), 1);
	let frame = fx.surface().unwrap().frame();
	assert!(frame.iter().any(|c| matches!(c, DrawCall::Fill { .. })));

	for _ in 0..32 {
		fx.advance(TICK).unwrap();
	}
	assert_eq!(fx.particle_count(), 0);
	assert_eq!(fx.active_count(), 0);
}

#[test]
fn sparkle_clears_on_coarse_frame_steps() {
	for (dt, frames) in [(0.1, 10), (1.0 / 30.0, 30)] {
		let mut fx = controller(EffectSettings {
			kind: "sparkle".into(),
			count: 20,
			duration: Some(1.0),
			..Default::default()
		});
		fx.play(None).unwrap();
		for _ in 0..frames {
			fx.advance(dt).unwrap();
		}
		assert_eq!(fx.particle_count(), 0, "dt {dt}");
		assert_eq!(fx.active_count(), 0, "dt {dt}");
	}
}

#[test]
fn oversized_counts_never_start() {
	let mut fx = controller(EffectSettings::default());
	assert!(fx.set_count(usize::MAX).is_err());
	assert!(fx.play(Some("fountain")).is_ok());

	let mut huge = controller(EffectSettings {
		count: 1_000_000_000,
		..Default::default()
	});
	assert!(matches!(
		huge.play(Some("fountain")),
		Err(EffectError::InvalidParameter { name: "count", .. })
	));
	assert_eq!(huge.active_count(), 0);
}

#[test]
fn unknown_types_fall_back_or_fail() {
	let mut fx = controller(EffectSettings::default());
	assert_eq!(fx.play(Some("laser-show")).unwrap(), Variant::FireworkBasic);
	assert_eq!(fx.play(Some("  FIREWORK ")).unwrap(), Variant::FireworkBasic);

	fx.set_fallback_policy(FallbackPolicy::Reject);
	assert!(matches!(
		fx.play(Some("laser-show")),
		Err(EffectError::UnknownVariant(name)) if name == "laser-show"
	));
	assert_eq!(fx.active_count(), 2);
}

#[test]
fn roman_candle_terminates_for_any_seed() {
	for seed in 0..8 {
		let mut system = ParticleSystem::new(
			Variant::FireworkRomanCandle,
			params(Variant::FireworkRomanCandle, 50, 3.0),
			Bounds::new(800.0, 600.0),
			seed,
		);
		let done_at = (1..=130).find(|_| {
			system.update(0.03).unwrap();
			system.is_complete()
		});
		assert!(done_at.is_some(), "seed {seed} still running after 130 ticks");
	}
}

#[test]
fn every_variant_completes_within_its_ceiling() {
	for variant in Variant::ALL {
		let mut system = ParticleSystem::new(
			variant,
			params(variant, 40, 1.0),
			Bounds::new(800.0, 600.0),
			9,
		);
		let ceiling = system.behavior().completion.ceiling;
		let limit = (ceiling * 64.0).ceil() as usize;
		for _ in 0..limit {
			system.update(TICK).unwrap();
		}
		assert!(system.is_complete(), "{variant} running at {:.3}s", system.elapsed());
	}
}

#[test]
fn zero_delta_is_a_no_op() {
	for variant in [Variant::Fountain, Variant::Snow, Variant::Heart, Variant::Spiral] {
		let mut system = ParticleSystem::new(variant, params(variant, 30, 2.0), Bounds::new(640.0, 480.0), 5);
		system.update(TICK).unwrap();
		let before = system.particles().to_vec();
		system.update(0.0).unwrap();
		assert_eq!(system.particles(), &before[..], "{variant}");
		assert_eq!(system.elapsed(), TICK);
	}
}

#[test]
fn population_never_exceeds_target_plus_burst() {
	for variant in Variant::ALL {
		let mut system = ParticleSystem::new(variant, params(variant, 30, 2.0), Bounds::new(800.0, 600.0), 17);
		let cap = system.behavior().emission.cap();
		for tick in 0..160 {
			system.update(TICK).unwrap();
			assert!(
				system.particle_count() <= cap,
				"{variant} has {} particles at tick {tick}, cap {cap}",
				system.particle_count()
			);
		}
	}
}

#[test]
fn heart_curve_is_mirror_symmetric() {
	let scale = heart_scale(5.0);
	for i in 0..=32 {
		let t = i as f64 * PI / 32.0;
		let (x, y) = heart_point(t, scale);
		let (mx, my) = heart_point(TAU - t, scale);
		assert!((x + mx).abs() < 1e-9);
		assert!((y - my).abs() < 1e-9);
	}
	assert!(heart_point(0.0, scale).0.abs() < 1e-12);
	assert!(heart_point(PI, scale).0.abs() < 1e-9);
}

#[test]
fn shutdown_releases_the_surface() {
	let mut fx = controller(EffectSettings::default());
	fx.play(Some("snow")).unwrap();
	fx.advance(TICK).unwrap();
	assert!(fx.has_surface());

	fx.shutdown();
	assert!(fx.is_shut_down());
	assert!(!fx.has_surface());
	assert_eq!(fx.active_count(), 0);
	assert!(matches!(fx.play(None), Err(EffectError::ShutDown)));
	assert!(fx.advance(TICK).is_ok());
	assert!(fx.tick(1000.0).is_ok());
	assert!(!fx.has_surface());
}

#[test]
fn missing_container_is_reported() {
	let mut fx = EffectsController::new(HeadlessHost::missing(), &EffectConfig::default(), 1);
	assert!(matches!(fx.play(Some("meteor")), Err(EffectError::ContainerNotFound(_))));
	assert_eq!(fx.active_count(), 0);
}

#[test]
fn settings_round_trip_through_json() {
	let mut fx = controller(EffectSettings::default());
	fx.select_effect("bubbles").unwrap();
	fx.set_color("#3366FF").unwrap();
	fx.set_count(120).unwrap();
	fx.set_duration(4.5).unwrap();

	let json = fx.save_settings().unwrap();
	let value: serde_json::Value = serde_json::from_str(&json).unwrap();
	assert_eq!(value["type"], "bubbles");
	assert_eq!(value["color"], "#3366ff");
	assert_eq!(value["particles"], 120);
	assert_eq!(value["duration"], 4.5);

	let restored: EffectSettings = serde_json::from_str(&json).unwrap();
	assert_eq!(&restored, fx.settings());
}

#[test]
fn wall_clock_ticks_are_clamped() {
	let mut fx = controller(EffectSettings {
		kind: "stars".into(),
		duration: Some(5.0),
		..Default::default()
	});
	fx.play(None).unwrap();
	fx.tick(1000.0).unwrap();
	assert_eq!(fx.active()[0].elapsed(), 0.0);
	fx.tick(9000.0).unwrap();
	assert!((fx.active()[0].elapsed() - 0.1).abs() < 1e-12);
}
