//! Canvas particle effects.
//!
//! Twenty-one effect variants (fireworks, sparkles, fountains, meteors,
//! confetti, snow, ...) built on one simulation engine:
//! - A [`ParticleSystem`] per running effect, configured by a behavior descriptor
//! - Drawing through the [`Surface`] trait, so effects run headless or on a canvas
//! - An [`EffectsController`] owning the surface and every active effect
//! - A Leptos [`EffectsStage`] component wiring it all to the page
//!
//! # Example
//!
//! ```ignore
//! use imp_fx::{EffectConfig, EffectsController, HeadlessHost};
//!
//! let mut fx = EffectsController::new(HeadlessHost::new(800.0, 600.0), &EffectConfig::default(), 7);
//! fx.play(Some("firework-peony"))?;
//! fx.advance(1.0 / 60.0)?;
//! ```

pub mod behavior;
pub mod clock;
pub mod color;
mod component;
pub mod controller;
pub mod dom;
pub mod error;
pub mod particle;
mod render;
mod spawn;
pub mod surface;
pub mod system;
pub mod types;
pub mod variant;
pub mod web;
pub mod wrapper;

pub use clock::{AnimationLoop, FrameClock};
pub use color::Color;
pub use component::EffectsStage;
pub use controller::EffectsController;
pub use dom::{CanvasLayer, DomHost};
pub use error::{EffectError, SurfaceError};
pub use spawn::{heart_point, heart_scale};
pub use surface::{Composite, DrawCall, Paint, RecordingSurface, Surface};
pub use system::ParticleSystem;
pub use types::{Bounds, EffectConfig, EffectParams, EffectSettings};
pub use variant::{FallbackPolicy, Variant, resolve_variant};
pub use wrapper::{EffectHost, HeadlessHost, mount_effect};
