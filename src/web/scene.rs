use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use gloo_events::EventListener;
use log::{debug, error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Element, HtmlCanvasElement};

use crate::config::DecorConfig;
use crate::context::SceneContext;
use crate::driver::{FrameDriver, StopHandle};
use crate::render::{Renderer, SurfaceSize};

use super::{config_or_default, document, to_js};

/// Handle returned to JavaScript for a running bus scene.
#[wasm_bindgen]
pub struct SceneHandle {
    stop: StopHandle,
}

#[wasm_bindgen]
impl SceneHandle {
    /// Stops requesting animation frames. The canvas keeps its last image.
    pub fn stop(&self) {
        self.stop.stop();
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.stop.is_running()
    }
}

/// Mounts the 3D bus scene inside the element with id `container_id`.
/// Resolves to `undefined` when the container does not exist.
#[wasm_bindgen]
pub async fn start_bus_scene(
    container_id: String,
    config_xml: Option<String>,
) -> Result<Option<SceneHandle>, JsValue> {
    let config = config_or_default(config_xml.as_deref());
    start(&container_id, config).await.map_err(to_js)
}

pub(super) async fn start(container_id: &str, config: DecorConfig) -> Result<Option<SceneHandle>> {
    let document = document()?;
    let Some(container) = document.get_element_by_id(container_id) else {
        debug!("no #{container_id} element, bus scene skipped");
        return Ok(None);
    };

    let canvas = document
        .create_element("canvas")
        .map_err(|err| anyhow!("failed to create canvas: {err:?}"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("created element is not a canvas"))?;
    let style = canvas.style();
    for (property, value) in [("display", "block"), ("width", "100%"), ("height", "100%")] {
        style
            .set_property(property, value)
            .map_err(|err| anyhow!("failed to style canvas: {err:?}"))?;
    }
    container
        .append_child(&canvas)
        .map_err(|err| anyhow!("failed to append canvas: {err:?}"))?;

    let size = measure(&container)?;
    let (width, height) = size.physical();
    canvas.set_width(width);
    canvas.set_height(height);

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::GL,
        ..Default::default()
    });
    let surface = instance
        .create_surface_from_canvas(canvas.clone())
        .map_err(|err| anyhow!("failed to create canvas surface: {err}"))?;
    let renderer = Renderer::new(&instance, surface, (width, height)).await?;

    let mut ctx = SceneContext::new(config);
    ctx.resize(size);
    let driver = FrameDriver::new(&ctx.config.scene);
    let handle = SceneHandle {
        stop: driver.stop_handle(),
    };

    let state = Rc::new(RefCell::new(SceneState {
        ctx,
        driver,
        renderer,
        canvas,
        container,
        _resize: None,
    }));
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let resize_state = Rc::clone(&state);
    let listener = EventListener::new(&window, "resize", move |_| {
        if let Err(err) = resize_state.borrow_mut().fit() {
            error!("resize failed: {err:#}");
        }
    });
    state.borrow_mut()._resize = Some(listener);

    schedule_animation_loop(state)?;
    info!("bus scene running in #{container_id} at {width}x{height}");
    Ok(Some(handle))
}

struct SceneState {
    ctx: SceneContext,
    driver: FrameDriver,
    renderer: Renderer,
    canvas: HtmlCanvasElement,
    container: Element,
    _resize: Option<EventListener>,
}

impl SceneState {
    /// Runs one frame; `false` once the driver has stopped.
    fn frame(&mut self) -> bool {
        self.driver
            .frame(&mut self.ctx, &mut self.renderer)
            .is_some()
            && self.driver.is_running()
    }

    fn fit(&mut self) -> Result<()> {
        let size = measure(&self.container)?;
        let (width, height) = size.physical();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.ctx.resize(size);
        debug!("bus canvas resized to {width}x{height}");
        Ok(())
    }
}

/// Fractional bounding-box size of the container, borders included.
fn measure(container: &Element) -> Result<SurfaceSize> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let bounds = container.get_bounding_client_rect();
    Ok(SurfaceSize::for_container(
        bounds.width(),
        bounds.height(),
        window.device_pixel_ratio(),
    ))
}

fn schedule_animation_loop(state: Rc<RefCell<SceneState>>) -> Result<()> {
    let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&callback);

    *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !state.borrow_mut().frame() {
            info!("bus scene stopped");
            next.borrow_mut().take();
            return;
        }
        if let Err(err) = request_frame(next.borrow().as_ref()) {
            error!("{err:#}");
        }
    }) as Box<dyn FnMut()>));

    request_frame(callback.borrow().as_ref())?;
    Ok(())
}

fn request_frame(callback: Option<&Closure<dyn FnMut()>>) -> Result<()> {
    let Some(callback) = callback else {
        return Ok(());
    };
    window()
        .ok_or_else(|| anyhow!("window not available"))?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
    Ok(())
}
