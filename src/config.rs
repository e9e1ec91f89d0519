use glam::{Vec2, Vec3};
use rand::Rng;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::catalog::ToolCatalog;
use crate::input::{KeyCode, KeySequence};

/// Errors raised while loading a decoration configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{tag}> is not a number: {value:?}")]
    Number { tag: String, value: String },
    #[error("<{tag}> must be finite, got {value:?}")]
    NotFinite { tag: String, value: String },
    #[error("<{tag}> expects {expected} components, got {value:?}")]
    Components {
        tag: String,
        expected: usize,
        value: String,
    },
    #[error("<{tag}> must be greater than zero")]
    NonPositive { tag: String },
    #[error("<{tag}> range is inverted: {min} > {max}")]
    Range { tag: String, min: f32, max: f32 },
    #[error("invalid colour {0:?}, expected #rrggbb")]
    Color(String),
    #[error("tool entry is missing <{0}>")]
    MissingField(&'static str),
    #[error("tool catalog is empty")]
    EmptyCatalog,
    #[error("unknown presentation {0:?}, expected \"scene\" or \"dom\"")]
    Presentation(String),
    #[error("unknown key name {0:?} in easter egg sequence")]
    KeyName(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Which icon-drop effect the page runs. The two never run together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    #[default]
    Scene,
    Dom,
}

impl Presentation {
    pub fn from_name(name: &str) -> ConfigResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "scene" | "3d" | "webgl" => Ok(Self::Scene),
            "dom" | "css" => Ok(Self::Dom),
            _ => Err(ConfigError::Presentation(name.to_string())),
        }
    }
}

/// Closed interval sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate or non-finite spans yield `min` instead of sampling.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min < self.max && (self.max - self.min).is_finite() {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Tunables for the 3D scene: clock, emitter and integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    pub container_id: String,
    /// Elapsed-time units added per rendered frame.
    pub time_step: f64,
    pub spawn_rate: f64,
    pub spawn_modulus: u64,
    pub spawn_offset: Vec3,
    pub velocity_x: Span,
    pub velocity_y: Span,
    pub velocity_z: Span,
    pub spin: Span,
    pub gravity: f32,
    pub removal_threshold: f32,
    pub icon_size: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            container_id: "bus-container".to_string(),
            time_step: 0.05,
            spawn_rate: 20.0,
            spawn_modulus: 50,
            spawn_offset: Vec3::new(-1.5, 0.5, 0.0),
            velocity_x: Span::new(-0.1, -0.05),
            velocity_y: Span::new(0.1, 0.2),
            velocity_z: Span::new(-0.05, 0.05),
            spin: Span::new(0.0, 0.1),
            gravity: 0.005,
            removal_threshold: -3.0,
            icon_size: 0.5,
        }
    }
}

/// Tunables for the DOM icon drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSettings {
    pub mascot_selector: String,
    pub container_selector: String,
    pub element_classes: String,
    pub interval_ms: u32,
    pub lifetime_ms: u32,
    /// Drop point relative to the mascot's top-left corner, in CSS pixels.
    pub offset: Vec2,
    pub margin: f32,
}

impl Default for DropSettings {
    fn default() -> Self {
        Self {
            mascot_selector: ".danfo-bus".to_string(),
            container_selector: ".bus-animation-container".to_string(),
            element_classes: "dropping-icon icon-drop-anim".to_string(),
            interval_ms: 600,
            lifetime_ms: 2000,
            offset: Vec2::new(20.0, 60.0),
            margin: 50.0,
        }
    }
}

/// Selectors and behaviour of the page-shell interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub reveal_selector: String,
    pub reveal_class: String,
    pub dangler_selector: String,
    pub dangler_degrees: f32,
    pub anchor_selector: String,
    pub easter_egg: Vec<KeyCode>,
    pub easter_egg_class: String,
    pub honk_class: String,
}

impl PageSettings {
    pub fn easter_egg_sequence(&self) -> KeySequence {
        KeySequence::new(self.easter_egg.clone())
    }
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            reveal_selector: ".hidden".to_string(),
            reveal_class: "show".to_string(),
            dangler_selector: ".dangler".to_string(),
            dangler_degrees: 10.0,
            anchor_selector: "a[href^=\"#\"]".to_string(),
            easter_egg: KeySequence::konami().keys().to_vec(),
            easter_egg_class: "danfo-party".to_string(),
            honk_class: "honk".to_string(),
        }
    }
}

/// Complete configuration of the decoration layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecorConfig {
    pub presentation: Presentation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub catalog: ToolCatalog,
    pub scene: SceneSettings,
    pub drop: DropSettings,
    pub page: PageSettings,
}

impl DecorConfig {
    /// Parses a `<decor>` document. Missing sections and values keep their defaults.
    pub fn from_xml(xml: &str) -> ConfigResult<Self> {
        let document = Document::parse(xml)?;
        let root = document.root_element();
        let mut config = Self::default();

        if let Some(name) = optional_text(&root, "presentation") {
            config.presentation = Presentation::from_name(&name)?;
        }
        if let Some(seed) = optional_text(&root, "seed") {
            let parsed = seed.parse::<u64>().map_err(|_| ConfigError::Number {
                tag: "seed".to_string(),
                value: seed.clone(),
            })?;
            config.seed = Some(parsed);
        }
        if let Some(tools) = child(&root, "tools") {
            config.catalog = ToolCatalog::from_node(&tools)?;
        }
        if let Some(scene) = child(&root, "scene") {
            config.scene = parse_scene(&scene, config.scene)?;
        }
        if let Some(drop) = child(&root, "drop") {
            config.drop = parse_drop(&drop, config.drop)?;
        }
        if let Some(page) = child(&root, "page") {
            config.page = parse_page(&page, config.page)?;
        }
        Ok(config)
    }
}

fn parse_scene(node: &Node<'_, '_>, mut scene: SceneSettings) -> ConfigResult<SceneSettings> {
    if let Some(id) = optional_text(node, "container-id") {
        scene.container_id = id;
    }
    scene.time_step = positive("time-step", parse_f64(node, "time-step", scene.time_step)?)?;
    scene.spawn_rate =
        positive("spawn-rate", parse_f64(node, "spawn-rate", scene.spawn_rate)?)?;
    scene.spawn_modulus = parse_u64(node, "spawn-modulus", scene.spawn_modulus)?;
    if scene.spawn_modulus == 0 {
        return Err(ConfigError::NonPositive {
            tag: "spawn-modulus".to_string(),
        });
    }
    scene.spawn_offset = parse_vec3(node, "spawn-offset", scene.spawn_offset)?;
    scene.velocity_x = parse_span(node, "velocity-x", scene.velocity_x)?;
    scene.velocity_y = parse_span(node, "velocity-y", scene.velocity_y)?;
    scene.velocity_z = parse_span(node, "velocity-z", scene.velocity_z)?;
    scene.spin = parse_span(node, "spin", scene.spin)?;
    scene.gravity = parse_f32(node, "gravity", scene.gravity)?;
    scene.removal_threshold = parse_f32(node, "removal-threshold", scene.removal_threshold)?;
    scene.icon_size = parse_f32(node, "icon-size", scene.icon_size)?;
    if scene.icon_size <= 0.0 {
        return Err(ConfigError::NonPositive {
            tag: "icon-size".to_string(),
        });
    }
    Ok(scene)
}

fn parse_drop(node: &Node<'_, '_>, mut drop: DropSettings) -> ConfigResult<DropSettings> {
    if let Some(selector) = optional_text(node, "mascot-selector") {
        drop.mascot_selector = selector;
    }
    if let Some(selector) = optional_text(node, "container-selector") {
        drop.container_selector = selector;
    }
    if let Some(classes) = optional_text(node, "classes") {
        drop.element_classes = classes;
    }
    drop.interval_ms = parse_u32(node, "interval-ms", drop.interval_ms)?;
    drop.lifetime_ms = parse_u32(node, "lifetime-ms", drop.lifetime_ms)?;
    if drop.interval_ms == 0 {
        return Err(ConfigError::NonPositive {
            tag: "interval-ms".to_string(),
        });
    }
    let offset = parse_components::<2>(node, "offset")?;
    if let Some([x, y]) = offset {
        drop.offset = Vec2::new(x, y);
    }
    drop.margin = parse_f32(node, "margin", drop.margin)?;
    Ok(drop)
}

fn parse_page(node: &Node<'_, '_>, mut page: PageSettings) -> ConfigResult<PageSettings> {
    if let Some(selector) = optional_text(node, "reveal-selector") {
        page.reveal_selector = selector;
    }
    if let Some(class) = optional_text(node, "reveal-class") {
        page.reveal_class = class;
    }
    if let Some(selector) = optional_text(node, "dangler-selector") {
        page.dangler_selector = selector;
    }
    page.dangler_degrees = parse_f32(node, "dangler-degrees", page.dangler_degrees)?;
    if let Some(sequence) = optional_text(node, "easter-egg") {
        page.easter_egg = sequence
            .split_whitespace()
            .map(|name| KeyCode::from_name(name).ok_or_else(|| ConfigError::KeyName(name.into())))
            .collect::<ConfigResult<Vec<_>>>()?;
    }
    if let Some(class) = optional_text(node, "easter-egg-class") {
        page.easter_egg_class = class;
    }
    if let Some(class) = optional_text(node, "honk-class") {
        page.honk_class = class;
    }
    Ok(page)
}

pub(crate) fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

pub(crate) fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_number<T: std::str::FromStr>(tag: &str, value: &str) -> ConfigResult<T> {
    value.parse::<T>().map_err(|_| ConfigError::Number {
        tag: tag.to_string(),
        value: value.to_string(),
    })
}

/// Like [`parse_number`], but `NaN` and infinities are rejected.
fn parse_finite<T>(tag: &str, value: &str) -> ConfigResult<T>
where
    T: std::str::FromStr + Copy + Into<f64>,
{
    let parsed: T = parse_number(tag, value)?;
    if parsed.into().is_finite() {
        Ok(parsed)
    } else {
        Err(ConfigError::NotFinite {
            tag: tag.to_string(),
            value: value.to_string(),
        })
    }
}

fn parse_f32(node: &Node<'_, '_>, tag: &str, default: f32) -> ConfigResult<f32> {
    match optional_text(node, tag) {
        Some(value) => parse_finite(tag, &value),
        None => Ok(default),
    }
}

fn parse_f64(node: &Node<'_, '_>, tag: &str, default: f64) -> ConfigResult<f64> {
    match optional_text(node, tag) {
        Some(value) => parse_finite(tag, &value),
        None => Ok(default),
    }
}

fn parse_u32(node: &Node<'_, '_>, tag: &str, default: u32) -> ConfigResult<u32> {
    match optional_text(node, tag) {
        Some(value) => parse_number(tag, &value),
        None => Ok(default),
    }
}

fn parse_u64(node: &Node<'_, '_>, tag: &str, default: u64) -> ConfigResult<u64> {
    match optional_text(node, tag) {
        Some(value) => parse_number(tag, &value),
        None => Ok(default),
    }
}

fn positive(tag: &str, value: f64) -> ConfigResult<f64> {
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive {
            tag: tag.to_string(),
        })
    }
}

fn parse_components<const N: usize>(
    node: &Node<'_, '_>,
    tag: &str,
) -> ConfigResult<Option<[f32; N]>> {
    let Some(value) = optional_text(node, tag) else {
        return Ok(None);
    };
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != N {
        return Err(ConfigError::Components {
            tag: tag.to_string(),
            expected: N,
            value,
        });
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = parse_finite(tag, part)?;
    }
    Ok(Some(out))
}

fn parse_vec3(node: &Node<'_, '_>, tag: &str, default: Vec3) -> ConfigResult<Vec3> {
    Ok(parse_components::<3>(node, tag)?
        .map(Vec3::from_array)
        .unwrap_or(default))
}

fn parse_span(node: &Node<'_, '_>, tag: &str, default: Span) -> ConfigResult<Span> {
    let Some([min, max]) = parse_components::<2>(node, tag)? else {
        return Ok(default);
    };
    if min > max {
        return Err(ConfigError::Range {
            tag: tag.to_string(),
            min,
            max,
        });
    }
    Ok(Span::new(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = DecorConfig::from_xml("<decor/>").unwrap();
        assert_eq!(config, DecorConfig::default());
        assert_eq!(config.catalog.len(), 6);
        assert_eq!(config.presentation, Presentation::Scene);
    }

    #[test]
    fn scene_section_overrides_values() {
        let xml = r#"
        <decor>
            <presentation>dom</presentation>
            <seed>7</seed>
            <scene>
                <gravity>0.01</gravity>
                <spawn-offset>-2 1 0.5</spawn-offset>
                <velocity-y>0.2 0.3</velocity-y>
            </scene>
            <drop><margin>10</margin><offset>5 6</offset></drop>
        </decor>"#;
        let config = DecorConfig::from_xml(xml).unwrap();
        assert_eq!(config.presentation, Presentation::Dom);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.scene.gravity, 0.01);
        assert_eq!(config.scene.spawn_offset, Vec3::new(-2.0, 1.0, 0.5));
        assert_eq!(config.scene.velocity_y, Span::new(0.2, 0.3));
        assert_eq!(config.scene.velocity_x, SceneSettings::default().velocity_x);
        assert_eq!(config.drop.margin, 10.0);
        assert_eq!(config.drop.offset, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let xml = "<decor><scene><spin>0.2 0.1</spin></scene></decor>";
        assert!(matches!(
            DecorConfig::from_xml(xml),
            Err(ConfigError::Range { .. })
        ));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let bad_number = "<decor><scene><gravity>heavy</gravity></scene></decor>";
        assert!(matches!(
            DecorConfig::from_xml(bad_number),
            Err(ConfigError::Number { .. })
        ));
        let bad_vector = "<decor><scene><spawn-offset>1 2</spawn-offset></scene></decor>";
        assert!(matches!(
            DecorConfig::from_xml(bad_vector),
            Err(ConfigError::Components { expected: 3, .. })
        ));
        let zero_modulus = "<decor><scene><spawn-modulus>0</spawn-modulus></scene></decor>";
        assert!(DecorConfig::from_xml(zero_modulus).is_err());
        assert!(DecorConfig::from_xml("<decor><presentation>vr</presentation></decor>").is_err());
        assert!(DecorConfig::from_xml("<decor>").is_err());
    }

    #[test]
    fn non_finite_values_are_rejected() {
        for xml in [
            "<decor><scene><velocity-x>NaN NaN</velocity-x></scene></decor>",
            "<decor><scene><spin>-inf inf</spin></scene></decor>",
            "<decor><scene><spawn-offset>0 inf 0</spawn-offset></scene></decor>",
            "<decor><scene><gravity>NaN</gravity></scene></decor>",
            "<decor><scene><removal-threshold>-inf</removal-threshold></scene></decor>",
            "<decor><scene><time-step>inf</time-step></scene></decor>",
        ] {
            assert!(
                matches!(DecorConfig::from_xml(xml), Err(ConfigError::NotFinite { .. })),
                "accepted {xml}"
            );
        }
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let xml = "<decor><drop><interval-ms>4294967896</interval-ms></drop></decor>";
        assert!(matches!(
            DecorConfig::from_xml(xml),
            Err(ConfigError::Number { tag, .. }) if tag == "interval-ms"
        ));
        let xml = "<decor><drop><lifetime-ms>4294967295</lifetime-ms></drop></decor>";
        assert_eq!(DecorConfig::from_xml(xml).unwrap().drop.lifetime_ms, u32::MAX);
    }

    #[test]
    fn easter_egg_sequence_is_parsed() {
        let xml = "<decor><page><easter-egg>ArrowUp d a n f o</easter-egg></page></decor>";
        let config = DecorConfig::from_xml(xml).unwrap();
        assert_eq!(config.page.easter_egg.len(), 6);
        assert_eq!(config.page.easter_egg[0], KeyCode::Named(NamedKey::Up));
        assert_eq!(config.page.easter_egg[1], KeyCode::Character('d'));

        let bad = "<decor><page><easter-egg>ArrowUp Hyper</easter-egg></page></decor>";
        assert!(matches!(
            DecorConfig::from_xml(bad),
            Err(ConfigError::KeyName(name)) if name == "Hyper"
        ));
    }

    #[test]
    fn span_samples_within_bounds() {
        let mut rng = rand::thread_rng();
        let span = Span::new(-0.1, -0.05);
        for _ in 0..100 {
            assert!(span.contains(span.sample(&mut rng)));
        }
        assert_eq!(Span::new(0.3, 0.3).sample(&mut rng), 0.3);
        assert!(Span::new(f32::NAN, f32::NAN).sample(&mut rng).is_nan());
        assert_eq!(
            Span::new(f32::NEG_INFINITY, f32::INFINITY).sample(&mut rng),
            f32::NEG_INFINITY
        );
    }
}
