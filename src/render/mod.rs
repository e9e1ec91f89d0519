pub mod common;
pub mod gpu;

pub use common::{Camera, CameraParams, LightParams, Lighting, SurfaceSize};
pub use gpu::Renderer;
