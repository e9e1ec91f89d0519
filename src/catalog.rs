use glam::Vec3;
use rand::Rng;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use crate::config::{optional_text, ConfigError, ConfigResult};

/// 8-bit sRGB colour as written in CSS hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::from_u32(0xffffff);

    pub const fn from_u32(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(text: &str) -> ConfigResult<Self> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::Color(text.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Self::from_u32)
            .map_err(|_| ConfigError::Color(text.to_string()))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Linear-light colour for shading; the hex value is sRGB encoded.
    pub fn to_linear(self) -> Vec3 {
        Vec3::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// One technology shown as a dropping icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEntry {
    pub name: String,
    pub color: Rgb,
    /// Font Awesome icon class used by the DOM presentation, e.g. `fa-docker`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Icon lives in the solid set rather than the brands set.
    #[serde(default)]
    pub solid: bool,
    /// Character painted onto generated textures; defaults to the first letter of the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph: Option<char>,
    /// Optional image file used as the cube texture instead of the generated glyph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ToolEntry {
    pub fn new(name: &str, color: u32, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Rgb::from_u32(color),
            icon: Some(icon.to_string()),
            solid: false,
            glyph: None,
            image: None,
        }
    }

    pub fn glyph(&self) -> char {
        self.glyph
            .or_else(|| self.name.chars().next())
            .unwrap_or('?')
    }

    /// Class list for the `<i>` element rendered by the icon font.
    pub fn icon_classes(&self) -> Option<String> {
        let icon = self.icon.as_deref()?;
        let set = if self.solid { "fas" } else { "fab" };
        Some(format!("{set} {icon}"))
    }

    fn from_node(node: &Node<'_, '_>) -> ConfigResult<Self> {
        let name = optional_text(node, "name").ok_or(ConfigError::MissingField("name"))?;
        let color = optional_text(node, "color").ok_or(ConfigError::MissingField("color"))?;
        let solid = match optional_text(node, "solid").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Number {
                    tag: "solid".to_string(),
                    value: other.to_string(),
                })
            }
        };
        Ok(Self {
            color: Rgb::parse_hex(&color)?,
            icon: optional_text(node, "icon"),
            solid,
            glyph: optional_text(node, "glyph").and_then(|text| text.chars().next()),
            image: optional_text(node, "image"),
            name,
        })
    }
}

/// Fixed list of tools the emitters choose from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ToolEntry>", into = "Vec<ToolEntry>")]
pub struct ToolCatalog {
    tools: Vec<ToolEntry>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolEntry>) -> ConfigResult<Self> {
        if tools.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self { tools })
    }

    pub(crate) fn from_node(node: &Node<'_, '_>) -> ConfigResult<Self> {
        let tools = node
            .children()
            .filter(|n| n.has_tag_name("tool"))
            .map(|n| ToolEntry::from_node(&n))
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::new(tools)
    }

    pub fn tools(&self) -> &[ToolEntry] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Uniform pick. The catalog is never empty once constructed.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &ToolEntry {
        &self.tools[rng.gen_range(0..self.tools.len())]
    }
}

impl TryFrom<Vec<ToolEntry>> for ToolCatalog {
    type Error = ConfigError;

    fn try_from(tools: Vec<ToolEntry>) -> ConfigResult<Self> {
        Self::new(tools)
    }
}

impl From<ToolCatalog> for Vec<ToolEntry> {
    fn from(catalog: ToolCatalog) -> Self {
        catalog.tools
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        let mut k8s = ToolEntry::new("K8s", 0x326ce5, "fa-dharmachakra");
        k8s.solid = true;
        Self {
            tools: vec![
                ToolEntry::new("AWS", 0xff9900, "fa-aws"),
                ToolEntry::new("Docker", 0x0db7ed, "fa-docker"),
                ToolEntry::new("Python", 0x3776ab, "fa-python"),
                k8s,
                ToolEntry::new("Git", 0xf05032, "fa-git-alt"),
                ToolEntry::new("Linux", 0xf5a623, "fa-linux"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    #[test]
    fn parses_hex_colours() {
        assert_eq!(Rgb::parse_hex("#ff9900").unwrap(), Rgb::from_u32(0xff9900));
        assert_eq!(Rgb::parse_hex("0db7ed").unwrap().to_hex(), "#0db7ed");
        assert!(Rgb::parse_hex("#ff99").is_err());
        assert!(Rgb::parse_hex("#gg9900").is_err());
    }

    #[test]
    fn linear_conversion_keeps_extremes() {
        assert_eq!(Rgb::WHITE.to_linear(), Vec3::ONE);
        assert_eq!(Rgb::from_u32(0).to_linear(), Vec3::ZERO);
    }

    #[test]
    fn default_catalog_matches_tool_list() {
        let catalog = ToolCatalog::default();
        assert_eq!(catalog.len(), 6);
        let k8s = catalog.get("K8s").unwrap();
        assert_eq!(k8s.icon_classes().as_deref(), Some("fas fa-dharmachakra"));
        assert_eq!(k8s.glyph(), 'K');
        let aws = catalog.get("AWS").unwrap();
        assert_eq!(aws.icon_classes().as_deref(), Some("fab fa-aws"));
    }

    #[test]
    fn parses_tool_nodes_with_optional_fields() {
        let xml = r##"
        <tools>
            <tool><name>Rust</name><color>#dea584</color><glyph>R</glyph><image>rust.png</image></tool>
            <tool><name>Nix</name><color>#7e7eff</color><icon>fa-snowflake</icon><solid>true</solid></tool>
        </tools>"##;
        let doc = Document::parse(xml).unwrap();
        let catalog = ToolCatalog::from_node(&doc.root_element()).unwrap();
        assert_eq!(catalog.len(), 2);
        let rust = &catalog.tools()[0];
        assert_eq!(rust.icon, None);
        assert_eq!(rust.image.as_deref(), Some("rust.png"));
        assert_eq!(rust.icon_classes(), None);
        assert!(catalog.tools()[1].solid);
    }

    #[test]
    fn rejects_empty_or_incomplete_catalogs() {
        let doc = Document::parse("<tools/>").unwrap();
        assert!(matches!(
            ToolCatalog::from_node(&doc.root_element()),
            Err(ConfigError::EmptyCatalog)
        ));
        let doc = Document::parse("<tools><tool><name>X</name></tool></tools>").unwrap();
        assert!(matches!(
            ToolCatalog::from_node(&doc.root_element()),
            Err(ConfigError::MissingField("color"))
        ));
    }

    #[test]
    fn deserializing_goes_through_the_empty_check() {
        use serde::de::value::{Error as ValueError, SeqDeserializer};
        use serde::de::IntoDeserializer;

        let empty: SeqDeserializer<std::vec::IntoIter<u8>, ValueError> =
            Vec::<u8>::new().into_deserializer();
        let err = ToolCatalog::deserialize(empty).unwrap_err();
        assert!(err.to_string().contains("tool catalog is empty"));
    }

    #[test]
    fn choose_is_uniform_over_catalog() {
        let catalog = ToolCatalog::default();
        let mut rng = rand::thread_rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(catalog.choose(&mut rng).name.clone());
        }
        assert_eq!(seen.len(), catalog.len());
    }
}
