use anyhow::Result;
use gloo_timers::callback::{Interval, Timeout};
use log::{debug, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::config::DecorConfig;
use crate::dom_drop::{DomDropEmitter, DropElement, DropHost, Rect};

use super::{config_or_default, document, to_js};

/// Starts the CSS icon drop under `.bus-animation-container`.
#[wasm_bindgen]
pub fn start_icon_drops(config_xml: Option<String>) -> Result<(), JsValue> {
    start(config_or_default(config_xml.as_deref())).map_err(to_js)
}

pub(super) fn start(config: DecorConfig) -> Result<()> {
    let mut host = PageHost {
        document: document()?,
    };
    let interval = config.drop.interval_ms;
    let mut emitter = DomDropEmitter::new(config.drop, config.catalog, config.seed);
    Interval::new(interval, move || {
        emitter.tick(&mut host);
    })
    .forget();
    info!("icon drops every {interval} ms");
    Ok(())
}

struct PageHost {
    document: Document,
}

impl PageHost {
    fn build(&self, planned: &DropElement) -> Result<HtmlElement, JsValue> {
        let element = self
            .document
            .create_element("div")?
            .dyn_into::<HtmlElement>()?;
        element.set_class_name(&planned.classes);
        let style = element.style();
        style.set_property("left", &format!("{}px", planned.left))?;
        style.set_property("top", &format!("{}px", planned.top))?;
        style.set_property("color", &planned.color)?;

        let icon = self.document.create_element("i")?;
        match &planned.icon_classes {
            Some(classes) => icon.set_class_name(classes),
            None => icon.set_text_content(Some(&planned.glyph.to_string())),
        }
        icon.set_attribute("aria-hidden", "true")?;
        element.append_child(&icon)?;
        Ok(element)
    }
}

impl DropHost for PageHost {
    type Element = HtmlElement;

    fn bounds(&self, selector: &str) -> Option<Rect> {
        let element = self.document.query_selector(selector).ok().flatten()?;
        let rect = element.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn spawn(&mut self, parent_selector: &str, planned: &DropElement) -> Option<HtmlElement> {
        let parent = self.document.query_selector(parent_selector).ok().flatten()?;
        let element = match self.build(planned) {
            Ok(element) => element,
            Err(err) => {
                debug!("failed to build drop element: {err:?}");
                return None;
            }
        };
        parent.append_child(&element).ok()?;
        Some(element)
    }

    fn remove_after(&mut self, element: HtmlElement, delay_ms: u32) {
        Timeout::new(delay_ms, move || element.remove()).forget();
    }
}
