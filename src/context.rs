use glam::Vec3;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::DecorConfig;
use crate::emitter::DecorativeObject;
use crate::mascot::Mascot;
use crate::mesh::{Mesh, MeshId, MeshLibrary};
use crate::render::{Camera, Lighting, SurfaceSize};
use crate::scene::SceneGraph;
use crate::texture::TextureCache;

/// Running totals kept for logging and the preview summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub spawned: u64,
    pub removed: u64,
}

/// All mutable state of one decorated scene, created once at bootstrap.
#[derive(Debug)]
pub struct SceneContext {
    pub config: DecorConfig,
    pub graph: SceneGraph,
    pub meshes: MeshLibrary,
    pub textures: TextureCache,
    pub camera: Camera,
    pub lighting: Lighting,
    pub mascot: Mascot,
    pub icon_mesh: MeshId,
    pub live: Vec<DecorativeObject>,
    pub rng: StdRng,
    pub stats: SceneStats,
    pub surface: SurfaceSize,
}

impl SceneContext {
    pub fn new(config: DecorConfig) -> Self {
        Self::with_textures(config, TextureCache::default())
    }

    /// Bootstraps the scene: camera, lights, the mascot and the shared icon cube.
    pub fn with_textures(config: DecorConfig, textures: TextureCache) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut graph = SceneGraph::new();
        let mut meshes = MeshLibrary::new();
        let mascot = Mascot::build(&mut graph, &mut meshes);
        let icon_mesh = meshes.add(Mesh::cuboid(Vec3::splat(config.scene.icon_size)));

        let surface = SurfaceSize::default();
        let mut camera = Camera::default();
        camera.fit(&surface);

        info!(
            "bootstrapped scene with {} mascot parts and {} tools",
            mascot.part_count(),
            config.catalog.len()
        );
        Self {
            config,
            graph,
            meshes,
            textures,
            camera,
            lighting: Lighting::default(),
            mascot,
            icon_mesh,
            live: Vec::new(),
            rng,
            stats: SceneStats::default(),
            surface,
        }
    }

    /// Records a new container box and refits the camera to it.
    pub fn resize(&mut self, surface: SurfaceSize) {
        self.surface = surface;
        self.camera.fit(&surface);
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_builds_mascot_and_icon_mesh() {
        let ctx = SceneContext::new(DecorConfig::default());
        assert_eq!(ctx.graph.len(), 1 + ctx.mascot.part_count());
        assert!(ctx.meshes.get(ctx.icon_mesh).is_some());
        assert!(ctx.live.is_empty());
        assert!(ctx.textures.is_empty());
        assert_eq!(ctx.stats, SceneStats::default());
    }

    #[test]
    fn resize_updates_surface_and_camera() {
        let mut ctx = SceneContext::new(DecorConfig::default());
        let surface = SurfaceSize::for_container(500.0, 250.0, 2.0);
        ctx.resize(surface);
        assert_eq!(ctx.surface.physical(), (1000, 500));
        assert_eq!(ctx.camera.aspect, 2.0);
    }

    #[test]
    fn seeded_contexts_draw_identical_sequences() {
        use rand::Rng;
        let config = DecorConfig {
            seed: Some(99),
            ..DecorConfig::default()
        };
        let mut a = SceneContext::new(config.clone());
        let mut b = SceneContext::new(config);
        let left: Vec<u32> = (0..8).map(|_| a.rng.gen()).collect();
        let right: Vec<u32> = (0..8).map(|_| b.rng.gen()).collect();
        assert_eq!(left, right);
    }
}
