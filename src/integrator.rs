use log::trace;

use crate::config::SceneSettings;
use crate::context::SceneContext;

/// Per-frame physics for live decorative objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub gravity: f32,
    pub removal_threshold: f32,
}

impl Integrator {
    pub fn new(settings: &SceneSettings) -> Self {
        Self {
            gravity: settings.gravity,
            removal_threshold: settings.removal_threshold,
        }
    }

    /// Advances every live object one frame and drops the ones that fell
    /// below the removal threshold, detaching their scene nodes. Returns the
    /// number of objects removed.
    pub fn tick(&self, ctx: &mut SceneContext) -> usize {
        let graph = &mut ctx.graph;
        let mut removed = 0;
        ctx.live.retain_mut(|object| {
            object.step(self.gravity);
            if object.position.y < self.removal_threshold {
                trace!("removing {} icon at y={:.2}", object.label, object.position.y);
                graph.remove(object.node);
                removed += 1;
                false
            } else {
                object.sync(graph);
                true
            }
        });
        ctx.stats.removed += removed as u64;
        removed
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec3;

    use super::*;
    use crate::config::DecorConfig;
    use crate::emitter::Emitter;

    fn context_with(count: usize) -> SceneContext {
        let mut ctx = SceneContext::new(DecorConfig {
            seed: Some(3),
            ..DecorConfig::default()
        });
        let emitter = Emitter::new(&ctx.config.scene);
        for _ in 0..count {
            emitter.spawn(&mut ctx);
        }
        ctx
    }

    #[test]
    fn gravity_reduces_vertical_velocity_once_per_tick() {
        let mut ctx = context_with(5);
        let integrator = Integrator::new(&ctx.config.scene);
        let before: Vec<f32> = ctx.live.iter().map(|o| o.velocity.y).collect();
        integrator.tick(&mut ctx);
        for (object, prior) in ctx.live.iter().zip(before) {
            assert_relative_eq!(object.velocity.y, prior - 0.005);
        }
    }

    #[test]
    fn vertical_velocity_scenario() {
        let mut ctx = context_with(1);
        ctx.live[0].velocity = Vec3::new(-0.07, 0.12, 0.0);
        Integrator::new(&ctx.config.scene).tick(&mut ctx);
        assert_relative_eq!(ctx.live[0].velocity.y, 0.115, epsilon = 1e-6);
    }

    #[test]
    fn position_and_rotation_advance_and_sync_to_node() {
        let mut ctx = context_with(1);
        let start = ctx.live[0].clone();
        Integrator::new(&ctx.config.scene).tick(&mut ctx);
        let object = &ctx.live[0];
        assert_eq!(object.position, start.position + start.velocity);
        assert_eq!(object.rotation, start.spin);
        let node = ctx.graph.get(object.node).unwrap();
        assert_eq!(node.transform.translation, object.position);
        assert_eq!(node.transform.rotation, object.rotation);
    }

    #[test]
    fn objects_below_threshold_leave_live_set_and_graph() {
        let mut ctx = context_with(3);
        let sinking = ctx.live[1].node;
        ctx.live[1].position.y = -2.99;
        ctx.live[1].velocity.y = -0.5;
        let nodes_before = ctx.graph.len();

        let removed = Integrator::new(&ctx.config.scene).tick(&mut ctx);
        assert_eq!(removed, 1);
        assert_eq!(ctx.live.len(), 2);
        assert!(ctx.live.iter().all(|o| o.node != sinking));
        assert!(!ctx.graph.contains(sinking));
        assert_eq!(ctx.graph.len(), nodes_before - 1);
        assert_eq!(ctx.stats.removed, 1);
    }

    #[test]
    fn every_object_eventually_falls_out() {
        let mut ctx = context_with(20);
        let integrator = Integrator::new(&ctx.config.scene);
        let mut frames = 0;
        while !ctx.live.is_empty() {
            integrator.tick(&mut ctx);
            frames += 1;
            assert!(frames < 1000);
        }
        assert_eq!(ctx.stats.removed, 20);
        assert_eq!(ctx.graph.len(), 1 + ctx.mascot.part_count());
    }
}
