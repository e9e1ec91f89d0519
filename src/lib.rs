//! Animated decorations for a portfolio page: a 3D danfo bus mascot that
//! throws tool icons out of its back, a CSS fallback of the same effect,
//! and the small page-shell interactions around them.
//!
//! Everything except the [`web`] entry points is platform independent, so
//! the simulation and configuration can be exercised natively and headless.

pub mod app;
pub mod catalog;
pub mod config;
pub mod context;
pub mod dom_drop;
pub mod driver;
pub mod emitter;
pub mod input;
pub mod integrator;
pub mod mascot;
pub mod mesh;
pub mod page;
pub mod render;
pub mod scene;
pub mod texture;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use catalog::{Rgb, ToolCatalog, ToolEntry};
pub use config::{ConfigError, DecorConfig, Presentation};
pub use context::{SceneContext, SceneStats};
pub use dom_drop::{plan_drop, DomDropEmitter, DropElement, DropHost, Rect};
pub use driver::{Clock, FrameDriver, FrameReport, FrameTarget, Headless, PresentError, StopHandle};
pub use emitter::{DecorativeObject, Emitter, SpawnTrigger};
pub use input::{KeyCode, KeySequence, NamedKey};
pub use integrator::Integrator;
pub use mascot::{Mascot, MascotPose};
pub use mesh::{Mesh, MeshId, MeshLibrary};
pub use page::{dangler_angle, PageShell};
pub use render::{Camera, CameraParams, LightParams, Lighting, Renderer, SurfaceSize};
pub use scene::{Material, NodeKey, SceneGraph, SceneNode, Transform};
pub use texture::{DirectoryIcons, GlyphOnly, IconSource, IconTexture, TextureCache};
