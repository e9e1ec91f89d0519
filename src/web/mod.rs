#![cfg(target_arch = "wasm32")]

//! Browser entry points exported to JavaScript.

mod icon_drop;
mod page;
mod scene;

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, Document};

use crate::config::{DecorConfig, Presentation};

pub use icon_drop::start_icon_drops;
pub use page::install_page_shell;
pub use scene::{start_bus_scene, SceneHandle};

/// Id of an optional `<script type="application/xml">` holding the page's `<decor>` document.
const CONFIG_ELEMENT_ID: &str = "danfo-config";

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = wasm_logger::init(wasm_logger::Config::default());

    let Some(xml) = document().ok().and_then(|doc| embedded_config(&doc)) else {
        debug!("no #{CONFIG_ELEMENT_ID} element; waiting for explicit calls");
        return;
    };
    let config = config_or_default(Some(&xml));
    info!("auto-starting {:?} presentation", config.presentation);

    if let Err(err) = page::install(config.clone()) {
        warn!("page shell not installed: {err:#}");
    }
    match config.presentation {
        Presentation::Scene => spawn_local(async move {
            let container = config.scene.container_id.clone();
            if let Err(err) = scene::start(&container, config).await {
                error!("bus scene failed to start: {err:#}");
            }
        }),
        Presentation::Dom => {
            if let Err(err) = icon_drop::start(config) {
                warn!("icon drops not started: {err:#}");
            }
        }
    }
}

/// Parses the optional XML, falling back to the built-in configuration.
fn config_or_default(xml: Option<&str>) -> DecorConfig {
    match xml.map(DecorConfig::from_xml) {
        None => DecorConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            warn!("{err}; using built-in configuration");
            DecorConfig::default()
        }
    }
}

fn embedded_config(document: &Document) -> Option<String> {
    document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content())
}

fn document() -> Result<Document> {
    window()
        .ok_or_else(|| anyhow!("window not available"))?
        .document()
        .ok_or_else(|| anyhow!("document not available"))
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
