use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::config::DecorConfig;
use crate::context::SceneContext;

/// Reads a `<decor>` document, or returns the built-in configuration.
pub fn load_config(path: Option<&Path>) -> Result<DecorConfig> {
    let Some(path) = path else {
        return Ok(DecorConfig::default());
    };
    let xml = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = DecorConfig::from_xml(&xml)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    info!(
        "loaded {} with {} tools ({:?} presentation)",
        path.display(),
        config.catalog.len(),
        config.presentation
    );
    Ok(config)
}

pub fn bootstrap_summary(ctx: &SceneContext) -> String {
    format!(
        "Bootstrapped scene with {} mascot parts and {} tools",
        ctx.mascot.part_count(),
        ctx.config.catalog.len()
    )
}

pub fn run_summary(frames: u64, ctx: &SceneContext) -> String {
    format!(
        "Simulated {frames} frames: spawned {}, removed {}, live {}",
        ctx.stats.spawned,
        ctx.stats.removed,
        ctx.live.len()
    )
}

pub fn pose_summary(ctx: &SceneContext) -> String {
    let pose = ctx.mascot.pose(&ctx.graph);
    format!("Mascot pose y={:.4} roll={:.4}", pose.bob, pose.roll)
}

pub fn print_final_state(frames: u64, ctx: &SceneContext) {
    println!("{}", run_summary(frames, ctx));
    println!("{}", pose_summary(ctx));
    for object in &ctx.live {
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) vel=({:.3}, {:.3}, {:.3})",
            object.label,
            object.position.x,
            object.position.y,
            object.position.z,
            object.velocity.x,
            object.velocity.y,
            object.velocity.z
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::Presentation;
    use crate::driver::{FrameDriver, Headless};

    #[test]
    fn missing_path_uses_builtin_config() {
        assert_eq!(load_config(None).unwrap(), DecorConfig::default());
    }

    #[test]
    fn loads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "<decor><presentation>dom</presentation><seed>4</seed></decor>"
        )
        .unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.presentation, Presentation::Dom);
        assert_eq!(config.seed, Some(4));
    }

    #[test]
    fn invalid_config_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<decor><tools></tools></decor>").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("tool catalog is empty"));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn summaries_reflect_context() {
        let mut ctx = SceneContext::new(DecorConfig {
            seed: Some(1),
            ..DecorConfig::default()
        });
        assert_eq!(
            bootstrap_summary(&ctx),
            "Bootstrapped scene with 12 mascot parts and 6 tools"
        );
        let mut driver = FrameDriver::new(&ctx.config.scene);
        let frames = driver.run(&mut ctx, &mut Headless, 120);
        assert_eq!(
            run_summary(frames, &ctx),
            format!(
                "Simulated 120 frames: spawned 2, removed {}, live {}",
                ctx.stats.removed,
                ctx.live.len()
            )
        );
        assert!(pose_summary(&ctx).starts_with("Mascot pose y="));
    }
}
