//! Colors and palette generation for effects.
//!
//! Every palette helper takes and produces `#rrggbb` colors; channel math is
//! done in `i32` and clamped back into `0..=255` before it reaches a [`Color`].

use rand::Rng;

use super::error::EffectError;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self {
			a: a.clamp(0.0, 1.0),
			..self
		}
	}

	/// Parses a `#rrggbb` string. Surrounding whitespace is ignored.
	pub fn from_hex(hex: &str) -> Result<Self, EffectError> {
		let trimmed = hex.trim();
		let invalid = || EffectError::InvalidColor(hex.to_string());
		let digits = trimmed.strip_prefix('#').ok_or_else(invalid)?;
		if digits.len() != 6 || !digits.is_ascii() {
			return Err(invalid());
		}
		let channel = |range: std::ops::Range<usize>| {
			u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
		};
		Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
	}

	/// `#rrggbb`, alpha dropped.
	pub fn to_hex(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			self.to_hex()
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Adds a signed delta to each channel, clamping to the valid range.
	pub fn adjust(self, dr: i32, dg: i32, db: i32) -> Self {
		Self {
			r: clamp_channel(self.r as i32 + dr),
			g: clamp_channel(self.g as i32 + dg),
			b: clamp_channel(self.b as i32 + db),
			a: self.a,
		}
	}

	/// Shifts all three channels by the same amount.
	pub fn brighten(self, delta: i32) -> Self {
		self.adjust(delta, delta, delta)
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// Green channel dominates both others.
	pub fn is_greenish(self) -> bool {
		self.g > self.r.max(self.b)
	}

	/// Hue in whole degrees `[0, 360)`, saturation and value in `[0, 1]`.
	pub fn to_hsv(self) -> (f64, f64, f64) {
		let (r, g, b) = (
			self.r as f64 / 255.0,
			self.g as f64 / 255.0,
			self.b as f64 / 255.0,
		);
		let max = r.max(g).max(b);
		let min = r.min(g).min(b);
		let delta = max - min;

		let hue = if delta == 0.0 {
			0.0
		} else if max == r {
			60.0 * ((g - b) / delta).rem_euclid(6.0)
		} else if max == g {
			60.0 * ((b - r) / delta + 2.0)
		} else {
			60.0 * ((r - g) / delta + 4.0)
		};
		let saturation = if max == 0.0 { 0.0 } else { delta / max };

		(hue.round().rem_euclid(360.0), saturation, max)
	}

	pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
		let h = hue.rem_euclid(360.0);
		let s = saturation.clamp(0.0, 1.0);
		let v = value.clamp(0.0, 1.0);
		let c = v * s;
		let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
		let m = v - c;
		let (r, g, b) = match (h / 60.0) as u32 {
			0 => (c, x, 0.0),
			1 => (x, c, 0.0),
			2 => (0.0, c, x),
			3 => (0.0, x, c),
			4 => (x, 0.0, c),
			_ => (c, 0.0, x),
		};
		let to_u8 = |channel: f64| clamp_channel(((channel + m) * 255.0).round() as i32);
		Self::rgb(to_u8(r), to_u8(g), to_u8(b))
	}

	/// Rotates the hue, keeping saturation and value.
	pub fn rotate_hue(self, degrees: f64) -> Self {
		let (h, s, v) = self.to_hsv();
		Self {
			a: self.a,
			..Self::from_hsv(h + degrees, s, v)
		}
	}
}

fn clamp_channel(value: i32) -> u8 {
	value.clamp(0, 255) as u8
}

/// Curated confetti colors.
pub const CONFETTI: [Color; 5] = [
	Color::rgb(0xfd, 0x6a, 0x78), // Coral
	Color::rgb(0x6a, 0xca, 0xfd), // Sky
	Color::rgb(0xfe, 0xd2, 0x0c), // Marigold
	Color::rgb(0x58, 0xfd, 0x7d), // Mint
	Color::rgb(0xca, 0x58, 0xfd), // Orchid
];

/// Base color followed by `variants` random siblings within `±spread` per channel.
pub fn scatter(base: Color, variants: usize, spread: i32, rng: &mut impl Rng) -> Vec<Color> {
	let mut palette = Vec::with_capacity(variants + 1);
	palette.push(base);
	for _ in 0..variants {
		palette.push(base.adjust(
			rng.gen_range(-spread..=spread),
			rng.gen_range(-spread..=spread),
			rng.gen_range(-spread..=spread),
		));
	}
	palette
}

/// Five foliage tones. Green bases drift toward autumn (more red, less blue);
/// other bases get an even `±25` scatter.
pub fn foliage(base: Color, rng: &mut impl Rng) -> Vec<Color> {
	let green = base.is_greenish();
	(0..5)
		.map(|_| {
			if green {
				base.adjust(
					((rng.gen_range(0.0..1.0) - 0.3) * 60.0) as i32,
					((rng.gen_range(0.0..1.0) - 0.2) * 40.0) as i32,
					((rng.gen_range(0.0..1.0) - 0.6) * 30.0) as i32,
				)
			} else {
				base.adjust(
					rng.gen_range(-25..=25),
					rng.gen_range(-25..=25),
					rng.gen_range(-25..=25),
				)
			}
		})
		.collect()
}

/// `count` colors evenly spread around the hue wheel starting at `base`.
pub fn hue_ramp(base: Color, count: usize) -> Vec<Color> {
	let count = count.max(1);
	(0..count)
		.map(|i| base.rotate_hue(i as f64 / count as f64 * 360.0))
		.collect()
}

/// Hot core to cool edge, ending on the base color and a lighter shade of it.
pub fn blossom_spectrum(base: Color) -> Vec<Color> {
	vec![
		Color::WHITE,
		Color::rgb(0xff, 0xdd, 0x00),
		Color::rgb(0xff, 0x95, 0x00),
		Color::rgb(0xff, 0x55, 0x00),
		Color::rgb(0xff, 0x00, 0x00),
		base,
		base.brighten(40),
	]
}

pub fn flame_palette(base: Color) -> Vec<Color> {
	vec![
		base,
		base.adjust(50, 50, 0),
		base.adjust(-30, -60, -30),
		Color::rgb(0xff, 0xff, 0x80),
		Color::WHITE,
	]
}

pub fn glitter_palette(base: Color) -> Vec<Color> {
	vec![
		base,
		base.brighten(50),
		Color::WHITE,
		Color::rgb(0xff, 0xd7, 0x00), // Gold
		Color::rgb(0xc0, 0xc0, 0xc0), // Silver
	]
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::*;

	fn is_hex(s: &str) -> bool {
		s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
	}

	#[test]
	fn hex_round_trip() {
		let c = Color::from_hex("#ff5500").unwrap();
		assert_eq!(c, Color::rgb(255, 85, 0));
		assert_eq!(c.to_hex(), "#ff5500");
		assert_eq!(Color::from_hex("  #5588FF ").unwrap().to_hex(), "#5588ff");
	}

	#[test]
	fn rejects_malformed_hex() {
		for bad in ["ff5500", "#ff55", "#ff55001", "#gg5500", "", "#ÿÿÿ"] {
			assert!(Color::from_hex(bad).is_err(), "{bad} should not parse");
		}
	}

	#[test]
	fn adjust_clamps_channels() {
		let c = Color::rgb(250, 5, 128).adjust(60, -60, 0);
		assert_eq!(c, Color::rgb(255, 0, 128));
		assert_eq!(Color::WHITE.brighten(60).to_hex(), "#ffffff");
		assert_eq!(Color::rgb(0, 0, 0).brighten(-40).to_hex(), "#000000");
	}

	#[test]
	fn palettes_stay_in_hex_range() {
		let mut rng = SmallRng::seed_from_u64(7);
		for base in ["#ff5500", "#ffffff", "#000000", "#00ff00", "#10e020", "#fefefe"] {
			let base = Color::from_hex(base).unwrap();
			let mut all = scatter(base, 12, 25, &mut rng);
			all.extend(foliage(base, &mut rng));
			all.extend(hue_ramp(base, 9));
			all.extend(blossom_spectrum(base));
			all.extend(flame_palette(base));
			all.extend(glitter_palette(base));
			for color in all {
				let hex = color.to_hex();
				assert!(is_hex(&hex), "{hex}");
				assert_eq!(Color::from_hex(&hex).unwrap(), color.with_alpha(1.0));
			}
		}
	}

	#[test]
	fn scatter_keeps_base_first_and_within_spread() {
		let mut rng = SmallRng::seed_from_u64(3);
		let base = Color::rgb(100, 100, 100);
		let palette = scatter(base, 3, 25, &mut rng);
		assert_eq!(palette.len(), 4);
		assert_eq!(palette[0], base);
		for c in &palette[1..] {
			for ch in [c.r, c.g, c.b] {
				assert!((75..=125).contains(&ch));
			}
		}
	}

	#[test]
	fn hsv_round_trip_primaries() {
		for c in [
			Color::rgb(255, 0, 0),
			Color::rgb(0, 255, 0),
			Color::rgb(0, 0, 255),
			Color::rgb(255, 85, 0),
			Color::rgb(128, 128, 128),
		] {
			let (h, s, v) = c.to_hsv();
			assert_eq!(Color::from_hsv(h, s, v), c);
		}
		assert_eq!(Color::rgb(255, 0, 0).rotate_hue(120.0), Color::rgb(0, 255, 0));
		assert_eq!(Color::rgb(255, 0, 0).rotate_hue(-120.0), Color::rgb(0, 0, 255));
	}

	#[test]
	fn hue_ramp_starts_at_base() {
		let base = Color::rgb(255, 0, 0);
		let ramp = hue_ramp(base, 3);
		assert_eq!(ramp, vec![base, Color::rgb(0, 255, 0), Color::rgb(0, 0, 255)]);
		assert_eq!(hue_ramp(base, 0).len(), 1);
	}

	#[test]
	fn foliage_warms_green_bases() {
		let mut rng = SmallRng::seed_from_u64(11);
		let base = Color::rgb(60, 160, 60);
		for c in foliage(base, &mut rng) {
			assert!(c.r >= 42 && c.r <= 102, "red {}", c.r);
			assert!(c.b <= 71, "blue {}", c.b);
		}
	}
}
