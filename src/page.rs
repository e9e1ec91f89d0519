use crate::config::PageSettings;
use crate::input::KeySequence;

/// Sway of the dangler at `index` for a pointer at `x` across a viewport
/// of `width` CSS pixels. Deeper danglers swing further.
pub fn dangler_angle(x: f64, width: f64, index: usize, degrees: f32) -> f64 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width - 0.5) * (index as f64 + 1.0) * f64::from(degrees)
}

pub fn rotate_transform(angle: f64) -> String {
    format!("rotate({angle}deg)")
}

/// Element id targeted by an in-page anchor, `None` for a bare `#`.
pub fn anchor_target(href: &str) -> Option<&str> {
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

/// Browser-independent state of the page-shell interactions.
#[derive(Debug, Clone)]
pub struct PageShell {
    settings: PageSettings,
    easter_egg: KeySequence,
}

impl PageShell {
    pub fn new(settings: PageSettings) -> Self {
        let easter_egg = settings.easter_egg_sequence();
        Self {
            settings,
            easter_egg,
        }
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Feeds a `KeyboardEvent.key` value. Returns the body class to toggle
    /// when the easter egg sequence completes.
    pub fn on_key(&mut self, key: &str) -> Option<&str> {
        self.easter_egg
            .push_name(key)
            .then_some(self.settings.easter_egg_class.as_str())
    }

    /// `style.transform` values for every dangler given the pointer position.
    pub fn dangler_transforms(&self, x: f64, width: f64, count: usize) -> Vec<String> {
        (0..count)
            .map(|index| {
                rotate_transform(dangler_angle(x, width, index, self.settings.dangler_degrees))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn dangler_angle_scales_with_depth() {
        assert_relative_eq!(dangler_angle(500.0, 1000.0, 0, 10.0), 0.0);
        assert_relative_eq!(dangler_angle(1000.0, 1000.0, 0, 10.0), 5.0);
        assert_relative_eq!(dangler_angle(0.0, 1000.0, 2, 10.0), -15.0);
        assert_relative_eq!(dangler_angle(750.0, 1000.0, 3, 10.0), 10.0);
        assert_eq!(dangler_angle(10.0, 0.0, 1, 10.0), 0.0);
    }

    #[test]
    fn transforms_cover_every_dangler() {
        let shell = PageShell::new(PageSettings::default());
        let transforms = shell.dangler_transforms(0.0, 800.0, 3);
        assert_eq!(
            transforms,
            vec!["rotate(-5deg)", "rotate(-10deg)", "rotate(-15deg)"]
        );
    }

    #[test]
    fn anchor_target_strips_hash() {
        assert_eq!(anchor_target("#projects"), Some("projects"));
        assert_eq!(anchor_target("#"), None);
        assert_eq!(anchor_target("/about"), None);
    }

    #[test]
    fn konami_code_toggles_party_class() {
        let mut shell = PageShell::new(PageSettings::default());
        let keys = [
            "ArrowUp", "ArrowUp", "ArrowDown", "ArrowDown", "ArrowLeft", "ArrowRight",
            "ArrowLeft", "ArrowRight", "b",
        ];
        for key in keys {
            assert_eq!(shell.on_key(key), None);
        }
        assert_eq!(shell.on_key("a"), Some("danfo-party"));
        assert_eq!(shell.on_key("a"), None);
    }
}
