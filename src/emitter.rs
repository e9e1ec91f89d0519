use std::sync::Arc;

use glam::Vec3;
use log::debug;

use crate::config::{SceneSettings, Span};
use crate::context::SceneContext;
use crate::scene::{Material, NodeKey, SceneGraph, SceneNode, Transform};
use crate::texture::IconTexture;

/// A tool icon cube thrown out of the back of the bus.
#[derive(Debug, Clone)]
pub struct DecorativeObject {
    pub node: NodeKey,
    pub label: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    /// Radians added to `rotation` every frame.
    pub spin: Vec3,
    pub texture: Arc<IconTexture>,
}

impl DecorativeObject {
    /// One integration step: move, fall, turn.
    pub fn step(&mut self, gravity: f32) {
        self.position += self.velocity;
        self.velocity.y -= gravity;
        self.rotation += self.spin;
    }

    /// Copies the simulated state onto the object's scene node.
    pub fn sync(&self, graph: &mut SceneGraph) {
        if let Some(node) = graph.get_mut(self.node) {
            node.transform.translation = self.position;
            node.transform.rotation = self.rotation;
        }
    }
}

/// Periodic trigger: fires when `floor(elapsed * rate)` is a multiple of `modulus`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTrigger {
    rate: f64,
    modulus: u64,
}

impl SpawnTrigger {
    // Absorbs the representation error of `frame * step` products.
    const EPSILON: f64 = 1e-9;

    pub fn new(rate: f64, modulus: u64) -> Self {
        Self {
            rate,
            modulus: modulus.max(1),
        }
    }

    pub fn counter(&self, elapsed: f64) -> u64 {
        (elapsed * self.rate + Self::EPSILON).floor().max(0.0) as u64
    }

    pub fn fires_at(&self, elapsed: f64) -> bool {
        self.counter(elapsed) % self.modulus == 0
    }
}

/// Spawns decorative objects next to the mascot.
#[derive(Debug, Clone)]
pub struct Emitter {
    trigger: SpawnTrigger,
    offset: Vec3,
    velocity: [Span; 3],
    spin: Span,
}

impl Emitter {
    pub fn new(settings: &SceneSettings) -> Self {
        Self {
            trigger: SpawnTrigger::new(settings.spawn_rate, settings.spawn_modulus),
            offset: settings.spawn_offset,
            velocity: [settings.velocity_x, settings.velocity_y, settings.velocity_z],
            spin: settings.spin,
        }
    }

    pub fn trigger(&self) -> SpawnTrigger {
        self.trigger
    }

    /// Spawns one object if the trigger holds for `elapsed`.
    pub fn emit(&self, ctx: &mut SceneContext, elapsed: f64) -> Option<NodeKey> {
        self.trigger.fires_at(elapsed).then(|| self.spawn(ctx))
    }

    /// Unconditionally spawns one object at the mascot plus the spawn offset.
    pub fn spawn(&self, ctx: &mut SceneContext) -> NodeKey {
        let tool = ctx.config.catalog.choose(&mut ctx.rng);
        let label = tool.name.clone();
        let texture = ctx.textures.get_or_create(tool);

        let rng = &mut ctx.rng;
        let position = ctx.mascot.position(&ctx.graph) + self.offset;
        let velocity = Vec3::new(
            self.velocity[0].sample(rng),
            self.velocity[1].sample(rng),
            self.velocity[2].sample(rng),
        );
        let spin = Vec3::new(self.spin.sample(rng), self.spin.sample(rng), self.spin.sample(rng));

        let node = ctx.graph.insert(SceneNode {
            name: format!("icon-{label}"),
            parent: None,
            transform: Transform::from_translation(position),
            mesh: Some(ctx.icon_mesh),
            material: Material::textured(Arc::clone(&texture)),
        });
        debug!("spawned {label} icon at {position:?} with velocity {velocity:?}");

        ctx.live.push(DecorativeObject {
            node,
            label,
            position,
            velocity,
            rotation: Vec3::ZERO,
            spin,
            texture,
        });
        ctx.stats.spawned += 1;
        node
    }
}
