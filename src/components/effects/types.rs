//! Effect configuration types.

use serde::{Deserialize, Serialize};

use super::color::Color;
use super::error::EffectError;
use super::variant::{FallbackPolicy, Variant};

/// Largest accepted particle count.
pub const MAX_COUNT: usize = 2000;

/// User-facing effect selection, as read from page config or saved by the UI.
///
/// Every field is optional on input. `color` and `duration` fall back to the
/// chosen variant's own defaults when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
	/// Effect type key or alias, e.g. `"firework"` or `"snow"`.
	#[serde(rename = "type")]
	pub kind: String,
	/// `#rrggbb` base color.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Baseline particle radius.
	pub size: f64,
	/// Target live particle population.
	#[serde(rename = "particles", alias = "count")]
	pub count: usize,
	/// Velocity and time multiplier.
	pub speed: f64,
	/// Scheduled active lifetime in seconds.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration: Option<f64>,
}

impl Default for EffectSettings {
	fn default() -> Self {
		Self {
			kind: "firework".to_string(),
			color: None,
			size: 5.0,
			count: 50,
			speed: 5.0,
			duration: None,
		}
	}
}

impl EffectSettings {
	/// Validates the settings and fills in the variant's defaults.
	pub fn resolve(&self, variant: Variant) -> Result<EffectParams, EffectError> {
		let color = match &self.color {
			Some(hex) => Color::from_hex(hex)?,
			None => variant.default_color(),
		};
		Ok(EffectParams {
			color,
			size: positive("size", self.size)?,
			count: particle_count(self.count)?,
			speed: positive("speed", self.speed)?,
			duration: positive(
				"duration",
				self.duration.unwrap_or_else(|| variant.default_duration()),
			)?,
		})
	}
}

/// Fully resolved parameters a simulation is built from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectParams {
	pub color: Color,
	pub size: f64,
	pub count: usize,
	pub speed: f64,
	pub duration: f64,
}

impl Default for EffectParams {
	fn default() -> Self {
		Self {
			color: Color::rgb(0xff, 0x55, 0x00),
			size: 5.0,
			count: 50,
			speed: 5.0,
			duration: 2.0,
		}
	}
}

/// Pixel dimensions of the drawing surface an effect was sized for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub width: f64,
	pub height: f64,
}

impl Bounds {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

/// Page-level configuration, read from `<script id="effect-config">`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
	/// CSS selector of the element effect layers are attached to.
	pub container: String,
	/// Initial selection shown in the UI.
	pub defaults: EffectSettings,
	/// Longest frame step in seconds; longer gaps (tab switches, stalls) are clamped.
	pub max_frame_delta: f64,
	/// What to do with unregistered effect types.
	pub fallback: FallbackPolicy,
}

impl Default for EffectConfig {
	fn default() -> Self {
		Self {
			container: ".canvas-container".to_string(),
			defaults: EffectSettings::default(),
			max_frame_delta: 0.1,
			fallback: FallbackPolicy::default(),
		}
	}
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64, EffectError> {
	if value.is_finite() && value > 0.0 {
		Ok(value)
	} else {
		Err(EffectError::InvalidParameter { name, value })
	}
}

/// Accepts counts in `1..=MAX_COUNT`.
pub(crate) fn particle_count(count: usize) -> Result<usize, EffectError> {
	if (1..=MAX_COUNT).contains(&count) {
		Ok(count)
	} else {
		Err(EffectError::InvalidParameter {
			name: "count",
			value: count as f64,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn settings_fill_variant_defaults() {
		let params = EffectSettings::default().resolve(Variant::Snow).unwrap();
		assert_eq!(params.color, Color::WHITE);
		assert_eq!(params.duration, 3.0);
		assert_eq!(params.count, 50);
	}

	#[test]
	fn settings_reject_bad_values() {
		let bad_speed = EffectSettings {
			speed: -1.0,
			..Default::default()
		};
		assert!(matches!(
			bad_speed.resolve(Variant::Sparkle),
			Err(EffectError::InvalidParameter { name: "speed", .. })
		));
		let bad_color = EffectSettings {
			color: Some("orange".into()),
			..Default::default()
		};
		assert!(matches!(
			bad_color.resolve(Variant::Sparkle),
			Err(EffectError::InvalidColor(_))
		));
	}

	#[test]
	fn oversized_counts_are_rejected() {
		let huge: EffectSettings = serde_json::from_str(r##"{"particles":1000000000}"##).unwrap();
		assert!(matches!(
			huge.resolve(Variant::Fountain),
			Err(EffectError::InvalidParameter { name: "count", .. })
		));
		let largest = EffectSettings {
			count: MAX_COUNT,
			..Default::default()
		};
		assert_eq!(largest.resolve(Variant::Fountain).unwrap().count, MAX_COUNT);
	}

	#[test]
	fn settings_accept_partial_json() {
		let settings: EffectSettings =
			serde_json::from_str(r##"{"type":"sparkle","count":20,"duration":1.0}"##).unwrap();
		assert_eq!(settings.kind, "sparkle");
		assert_eq!(settings.count, 20);
		assert_eq!(settings.size, 5.0);
		assert_eq!(settings.duration, Some(1.0));

		let saved: EffectSettings = serde_json::from_str(r##"{"particles":7}"##).unwrap();
		assert_eq!(saved.count, 7);
	}

	#[test]
	fn config_defaults() {
		let config: EffectConfig = serde_json::from_str("{}").unwrap();
		assert_eq!(config.container, ".canvas-container");
		assert_eq!(config.max_frame_delta, 0.1);
		assert_eq!(config.fallback, FallbackPolicy::Basic);
	}
}
