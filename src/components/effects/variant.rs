//! The effect catalogue.
//!
//! Maps effect type keys to [`Variant`]s, carries each variant's defaults
//! (color, duration, origin) and builds its [`Behavior`] descriptor.

use log::warn;
use serde::{Deserialize, Serialize};

use super::behavior::{Behavior, Body, ColorRule, Completion, Emission, Glow, Look, Physics};
use super::color::Color;
use super::error::EffectError;
use super::types::{Bounds, EffectParams};

/// Every effect the engine can play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
	FireworkBasic,
	FireworkPeony,
	FireworkWillow,
	FireworkTwinkle,
	FireworkFlame,
	FireworkLeaf,
	FireworkRing,
	FireworkSpider,
	FireworkSalute,
	FireworkRomanCandle,
	Sparkle,
	Fountain,
	Meteor,
	Spiral,
	Heart,
	Confetti,
	Stars,
	Bubbles,
	Flame,
	Snow,
	Glitter,
}

/// Short names accepted in place of canonical keys.
const ALIASES: &[(&str, Variant)] = &[
	("firework", Variant::FireworkBasic),
	("firework-roman", Variant::FireworkRomanCandle),
];

/// What to do when asked for an effect type that does not exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
	/// Play the basic radial burst instead.
	#[default]
	Basic,
	/// Report [`EffectError::UnknownVariant`].
	Reject,
}

/// Resolves a type key under `policy`.
///
/// Keys are matched case-insensitively after trimming, aliases included.
pub fn resolve_variant(name: &str, policy: FallbackPolicy) -> Result<Variant, EffectError> {
	match Variant::from_key(name) {
		Some(variant) => Ok(variant),
		None => match policy {
			FallbackPolicy::Basic => {
				warn!("imp-fx: unknown effect type `{name}`, playing firework-basic");
				Ok(Variant::FireworkBasic)
			}
			FallbackPolicy::Reject => Err(EffectError::UnknownVariant(name.to_string())),
		},
	}
}

impl Variant {
	pub const ALL: [Variant; 21] = [
		Variant::FireworkBasic,
		Variant::FireworkPeony,
		Variant::FireworkWillow,
		Variant::FireworkTwinkle,
		Variant::FireworkFlame,
		Variant::FireworkLeaf,
		Variant::FireworkRing,
		Variant::FireworkSpider,
		Variant::FireworkSalute,
		Variant::FireworkRomanCandle,
		Variant::Sparkle,
		Variant::Fountain,
		Variant::Meteor,
		Variant::Spiral,
		Variant::Heart,
		Variant::Confetti,
		Variant::Stars,
		Variant::Bubbles,
		Variant::Flame,
		Variant::Snow,
		Variant::Glitter,
	];

	/// Canonical type key.
	pub fn key(self) -> &'static str {
		match self {
			Variant::FireworkBasic => "firework-basic",
			Variant::FireworkPeony => "firework-peony",
			Variant::FireworkWillow => "firework-willow",
			Variant::FireworkTwinkle => "firework-twinkle",
			Variant::FireworkFlame => "firework-flame",
			Variant::FireworkLeaf => "firework-leaf",
			Variant::FireworkRing => "firework-ring",
			Variant::FireworkSpider => "firework-spider",
			Variant::FireworkSalute => "firework-salute",
			Variant::FireworkRomanCandle => "firework-roman-candle",
			Variant::Sparkle => "sparkle",
			Variant::Fountain => "fountain",
			Variant::Meteor => "meteor",
			Variant::Spiral => "spiral",
			Variant::Heart => "heart",
			Variant::Confetti => "confetti",
			Variant::Stars => "stars",
			Variant::Bubbles => "bubbles",
			Variant::Flame => "flame",
			Variant::Snow => "snow",
			Variant::Glitter => "glitter",
		}
	}

	/// Human-readable name for buttons and logs.
	pub fn label(self) -> &'static str {
		match self {
			Variant::FireworkBasic => "Firework",
			Variant::FireworkPeony => "Peony",
			Variant::FireworkWillow => "Willow",
			Variant::FireworkTwinkle => "Twinkle",
			Variant::FireworkFlame => "Flame Blossom",
			Variant::FireworkLeaf => "Leaf",
			Variant::FireworkRing => "Ring",
			Variant::FireworkSpider => "Spider",
			Variant::FireworkSalute => "Salute",
			Variant::FireworkRomanCandle => "Roman Candle",
			Variant::Sparkle => "Sparkle",
			Variant::Fountain => "Fountain",
			Variant::Meteor => "Meteor",
			Variant::Spiral => "Spiral",
			Variant::Heart => "Heart",
			Variant::Confetti => "Confetti",
			Variant::Stars => "Stars",
			Variant::Bubbles => "Bubbles",
			Variant::Flame => "Flame",
			Variant::Snow => "Snow",
			Variant::Glitter => "Glitter",
		}
	}

	/// Looks up a canonical key or alias.
	pub fn from_key(name: &str) -> Option<Variant> {
		let key = name.trim().to_ascii_lowercase();
		Variant::ALL
			.into_iter()
			.find(|v| v.key() == key)
			.or_else(|| {
				ALIASES
					.iter()
					.find(|(alias, _)| *alias == key)
					.map(|(_, v)| *v)
			})
	}

	pub fn is_firework(self) -> bool {
		self.key().starts_with("firework-")
	}

	pub fn default_color(self) -> Color {
		match self {
			Variant::Meteor => Color::rgb(0x55, 0x88, 0xff),
			Variant::Sparkle | Variant::Glitter => Color::rgb(0xff, 0xff, 0x00),
			Variant::Spiral => Color::rgb(0xff, 0x00, 0xff),
			Variant::Heart => Color::rgb(0xff, 0x00, 0x66),
			Variant::Stars | Variant::Snow => Color::WHITE,
			Variant::Bubbles => Color::rgb(0x00, 0xff, 0xff),
			_ => Color::rgb(0xff, 0x55, 0x00),
		}
	}

	/// Seconds the effect keeps emitting when no duration is given.
	pub fn default_duration(self) -> f64 {
		if self.is_firework() { 2.0 } else { 3.0 }
	}

	/// Emission origin for a surface of the given size.
	pub fn origin(self, bounds: Bounds) -> (f64, f64) {
		let Bounds { width, height } = bounds;
		match self {
			Variant::FireworkRomanCandle => (width / 2.0, height - 50.0),
			Variant::Fountain | Variant::Bubbles => (width / 2.0, height),
			Variant::Meteor | Variant::Confetti => (width / 2.0, height / 3.0),
			Variant::Flame => (width / 2.0, height - 20.0),
			Variant::Snow => (width / 2.0, 0.0),
			_ => bounds.center(),
		}
	}

	/// Builds the behavior descriptor for the given parameters.
	pub fn behavior(self, params: &EffectParams) -> Behavior {
		let count = params.count;
		let (emission, physics, colors, look) = match self {
			Variant::FireworkBasic => (
				Emission::steady(count, count, 1),
				Physics::gravity(0.5),
				ColorRule::Base,
				Look::plain(Body::Dot { shrink: true }),
			),
			Variant::FireworkPeony => (
				Emission::steady(count, 0, 3),
				Physics::gravity(0.8),
				ColorRule::Scatter {
					variants: 3,
					spread: 25,
				},
				Look::additive(Body::Dot { shrink: true }),
			),
			Variant::FireworkWillow => (
				Emission::steady(count, 0, 3),
				Physics::gravity(0.15),
				ColorRule::Base,
				Look::additive(Body::Dot { shrink: false }).with_glow(Glow::new(2.0, 0.3)),
			),
			Variant::FireworkTwinkle => (
				Emission::steady(count, 0, 3),
				Physics::gravity(0.1),
				ColorRule::Base,
				Look::additive(Body::Dot { shrink: false }).with_glow(Glow::new(3.0, 0.5)),
			),
			Variant::FireworkFlame => (
				Emission::steady(count, 0, 4),
				Physics::gravity(0.3),
				ColorRule::Blossom,
				Look::additive(Body::Dot { shrink: false }),
			),
			Variant::FireworkLeaf => (
				Emission::steady(count, 0, 1),
				Physics::gravity(0.6).with_drag(0.98),
				ColorRule::Foliage,
				Look::plain(Body::Leaf),
			),
			Variant::FireworkRing => (
				Emission::steady(count, 0, 3),
				Physics::gravity(0.2),
				ColorRule::Base,
				Look::additive(Body::Dot { shrink: false }).with_glow(Glow::new(3.0, 0.5)),
			),
			Variant::FireworkSpider => (
				Emission::steady(count, 0, 3),
				Physics::gravity(0.3),
				ColorRule::Base,
				Look::additive(Body::Dot { shrink: false }).with_glow(Glow {
					scale: 4.0,
					strength: 0.4,
					nodes_only: true,
				}),
			),
			Variant::FireworkSalute => (
				Emission::steady(count, 0, 3),
				Physics::gravity(0.4),
				ColorRule::Base,
				Look::additive(Body::Dot { shrink: false }).with_glow(Glow::new(3.0, 0.5)),
			),
			Variant::FireworkRomanCandle => (
				Emission {
					burst: 1,
					..Emission::steady(count, 0, 0)
				},
				Physics::gravity(1.0),
				ColorRule::HueRamp,
				Look::additive(Body::Dot { shrink: true }),
			),
			Variant::Sparkle => (
				Emission::steady(count, count, 3),
				Physics::NONE,
				ColorRule::Base,
				Look::plain(Body::Blink),
			),
			Variant::Fountain => (
				Emission::steady(count, count, 4),
				Physics::gravity(1.0),
				ColorRule::Base,
				Look::plain(Body::Dot { shrink: true }),
			),
			Variant::Meteor => (
				Emission::random((count / 5).max(1), (count / 10).min(5), 1, 0.05),
				Physics::NONE,
				ColorRule::Base,
				Look::additive(Body::Meteor),
			),
			Variant::Spiral => {
				let target = count.min(150);
				(
					Emission::steady(target, target, 2),
					Physics::NONE,
					ColorRule::Base,
					Look::plain(Body::Dot { shrink: true }),
				)
			}
			Variant::Heart => (
				Emission::steady(count, count, 0),
				Physics::NONE,
				ColorRule::Base,
				Look::plain(Body::Dot { shrink: true }),
			),
			Variant::Confetti => (
				Emission::steady(count, 50, 2),
				Physics::gravity(10.0).with_drag(0.98),
				ColorRule::Confetti,
				Look::plain(Body::Ribbon),
			),
			Variant::Stars => (
				Emission::random(count, 40, 1, 0.1),
				Physics::NONE,
				ColorRule::Base,
				Look::plain(Body::Star),
			),
			Variant::Bubbles => (
				Emission::random(count, 0, (count / 30).max(1), 0.1),
				Physics::NONE,
				ColorRule::Base,
				Look::plain(Body::Bubble),
			),
			Variant::Flame => (
				Emission::steady(count, 50, (count / 20).max(5)),
				Physics::NONE,
				ColorRule::Flame,
				Look::additive(Body::Flare),
			),
			Variant::Snow => (
				Emission::random(count, 30, (count / 60).max(1), 0.2),
				Physics::NONE,
				ColorRule::Base,
				Look::plain(Body::Flake),
			),
			Variant::Glitter => (
				Emission::steady(count, 50, (count / 20).max(3)),
				Physics::NONE.with_drag(0.95),
				ColorRule::Glitter,
				Look::additive(Body::Glitter),
			),
		};
		let completion = match self {
			Variant::FireworkRomanCandle => Completion { ceiling: 1.2 },
			Variant::FireworkFlame => Completion { ceiling: 1.5 },
			_ => Completion::CUTOFF,
		};
		Behavior {
			emission,
			physics,
			colors,
			look,
			completion,
		}
	}
}

impl std::fmt::Display for Variant {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.key())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_round_trip() {
		for v in Variant::ALL {
			assert_eq!(Variant::from_key(v.key()), Some(v));
		}
	}

	#[test]
	fn aliases_normalize() {
		assert_eq!(Variant::from_key("firework"), Some(Variant::FireworkBasic));
		assert_eq!(
			Variant::from_key(" Firework-Roman "),
			Some(Variant::FireworkRomanCandle)
		);
		assert_eq!(Variant::from_key("SNOW"), Some(Variant::Snow));
	}

	#[test]
	fn unknown_types_follow_policy() {
		assert_eq!(
			resolve_variant("firework-chrysanthemum", FallbackPolicy::Basic).unwrap(),
			Variant::FireworkBasic
		);
		assert!(matches!(
			resolve_variant("firework-chrysanthemum", FallbackPolicy::Reject),
			Err(EffectError::UnknownVariant(name)) if name == "firework-chrysanthemum"
		));
		assert_eq!(
			resolve_variant("heart", FallbackPolicy::Reject).unwrap(),
			Variant::Heart
		);
	}

	#[test]
	fn origins_sit_inside_the_surface() {
		let bounds = Bounds::new(800.0, 600.0);
		for v in Variant::ALL {
			let (x, y) = v.origin(bounds);
			assert!((0.0..=800.0).contains(&x) && (0.0..=600.0).contains(&y), "{v}");
		}
		assert_eq!(Variant::Fountain.origin(bounds), (400.0, 600.0));
		assert_eq!(Variant::FireworkRomanCandle.origin(bounds), (400.0, 550.0));
	}

	#[test]
	fn stricter_completion_ceilings() {
		let params = EffectParams::default();
		assert_eq!(
			Variant::FireworkRomanCandle.behavior(&params).completion.ceiling,
			1.2
		);
		assert_eq!(Variant::FireworkFlame.behavior(&params).completion.ceiling, 1.5);
		assert_eq!(Variant::Sparkle.behavior(&params).completion, Completion::CUTOFF);
	}

	#[test]
	fn spiral_population_is_capped() {
		let params = EffectParams {
			count: 400,
			..Default::default()
		};
		assert_eq!(Variant::Spiral.behavior(&params).emission.target, 150);
	}

	#[test]
	fn serde_policy_names() {
		let p: FallbackPolicy = serde_json::from_str("\"reject\"").unwrap();
		assert_eq!(p, FallbackPolicy::Reject);
	}
}
