use anyhow::{anyhow, Result};
use gloo_events::{EventListener, EventListenerOptions};
use log::{debug, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    window, Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    KeyboardEvent, MouseEvent, ScrollBehavior, ScrollIntoViewOptions,
};

use crate::config::DecorConfig;
use crate::page::{anchor_target, PageShell};

use super::{config_or_default, document, to_js};

/// Installs scroll reveal, dangler sway, anchor scrolling, the easter egg
/// and the mascot honk.
#[wasm_bindgen]
pub fn install_page_shell(config_xml: Option<String>) -> Result<(), JsValue> {
    install(config_or_default(config_xml.as_deref())).map_err(to_js)
}

pub(super) fn install(config: DecorConfig) -> Result<()> {
    let document = document()?;
    let revealed = observe_reveals(&document, &config)?;
    watch_danglers(&document, &config);
    smooth_anchors(&document, &config);
    watch_keys(&document, &config)?;
    let honk = watch_mascot(&document, &config);
    info!("page shell installed ({revealed} reveal targets, honk: {honk})");
    Ok(())
}

fn observe_reveals(document: &Document, config: &DecorConfig) -> Result<u32> {
    let class = config.page.reveal_class.clone();
    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, _: IntersectionObserver| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if entry.is_intersecting() {
                let _ = entry.target().class_list().add_1(&class);
            }
        }
    }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);
    let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("IntersectionObserver unavailable: {err:?}"))?;
    callback.forget();

    let targets = document
        .query_selector_all(&config.page.reveal_selector)
        .map_err(|err| anyhow!("invalid reveal selector: {err:?}"))?;
    for index in 0..targets.length() {
        if let Some(element) = targets.item(index).and_then(|node| node.dyn_into::<Element>().ok())
        {
            observer.observe(&element);
        }
    }
    Ok(targets.length())
}

fn watch_danglers(document: &Document, config: &DecorConfig) {
    let shell = PageShell::new(config.page.clone());
    let target = document.clone();
    EventListener::new(document, "mousemove", move |event| {
        let Some(event) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let width = window()
            .and_then(|win| win.inner_width().ok())
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0);
        let Ok(danglers) = target.query_selector_all(&shell.settings().dangler_selector) else {
            return;
        };
        let transforms =
            shell.dangler_transforms(f64::from(event.client_x()), width, danglers.length() as usize);
        for (index, transform) in transforms.iter().enumerate() {
            let element = danglers
                .item(index as u32)
                .and_then(|node| node.dyn_into::<HtmlElement>().ok());
            if let Some(element) = element {
                let _ = element.style().set_property("transform", transform);
            }
        }
    })
    .forget();
}

fn smooth_anchors(document: &Document, config: &DecorConfig) {
    let selector = config.page.anchor_selector.clone();
    let target = document.clone();
    let options = EventListenerOptions::enable_prevent_default();
    EventListener::new_with_options(document, "click", options, move |event| {
        let anchor = event
            .target()
            .and_then(|node| node.dyn_into::<Element>().ok())
            .and_then(|element| element.closest(&selector).ok().flatten());
        let Some(anchor) = anchor else {
            return;
        };
        let href = anchor.get_attribute("href").unwrap_or_default();
        let Some(destination) = anchor_target(&href).and_then(|id| target.get_element_by_id(id))
        else {
            return;
        };
        event.prevent_default();
        let mut options = ScrollIntoViewOptions::new();
        options.behavior(ScrollBehavior::Smooth);
        destination.scroll_into_view_with_scroll_into_view_options(&options);
    })
    .forget();
}

fn watch_keys(document: &Document, config: &DecorConfig) -> Result<()> {
    let body = document
        .body()
        .ok_or_else(|| anyhow!("document has no body element"))?;
    let mut shell = PageShell::new(config.page.clone());
    EventListener::new(document, "keydown", move |event| {
        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if let Some(class) = shell.on_key(&event.key()) {
            info!("easter egg: toggling {class}");
            let _ = body.class_list().toggle(class);
        }
    })
    .forget();
    Ok(())
}

fn watch_mascot(document: &Document, config: &DecorConfig) -> bool {
    let Ok(Some(mascot)) = document.query_selector(&config.drop.mascot_selector) else {
        debug!("no {} element, honk disabled", config.drop.mascot_selector);
        return false;
    };
    let class = config.page.honk_class.clone();
    let element = mascot.clone();
    EventListener::new(&mascot, "click", move |_| {
        let _ = element.class_list().toggle(&class);
    })
    .forget();
    true
}
