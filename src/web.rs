#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use gloo_events::EventListener;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlCanvasElement, HtmlInputElement};
use winit::dpi::LogicalSize;
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys};
use winit::window::{Window, WindowBuilder};

use crate::app::{ViewerApp, ViewerEvent};
use crate::commands::ViewerCommand;
use crate::config::ViewerConfig;
use crate::loader::fetch_url;
use crate::render::Renderer;
use crate::session::ViewerSession;

/// Page element ids wired to viewer commands.
const TRIGGER_IDS: [&str; 4] = ["toggleShadows", "applyColor", "toggleGloss", "homePosition"];
const COLOR_PICKER_ID: &str = "colorPicker";

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Starts the viewer on the canvas with id `canvas_id`. The asset is fetched
/// from `asset_url` (or the default asset) in the background.
#[wasm_bindgen]
pub async fn start_viewer(canvas_id: String, asset_url: Option<String>) -> Result<(), JsValue> {
    let mut config = ViewerConfig::default();
    if let Some(url) = asset_url {
        config.asset_url = url;
    }
    spawn_local(async move {
        if let Err(err) = run_viewer(canvas_id, config).await {
            log::error!("viewer error: {err:?}");
        }
    });
    Ok(())
}

async fn run_viewer(canvas_id: String, config: ViewerConfig) -> Result<()> {
    let document = web_sys::window()
        .and_then(|win| win.document())
        .ok_or_else(|| anyhow!("document not available"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| anyhow!("canvas element {canvas_id} not found"))?
        .dyn_into()
        .map_err(|_| anyhow!("element {canvas_id} is not a canvas"))?;

    let asset_url = config.asset_url.clone();
    let session = Rc::new(RefCell::new(ViewerSession::new(config)));

    // Controls go live before the asset arrives; the session ignores them until then.
    let mut listeners = attach_controls(&document, &session);

    let load_session = Rc::clone(&session);
    spawn_local(async move {
        let outcome = fetch_url(&asset_url).await;
        load_session.borrow_mut().complete_load(outcome);
    });

    let event_loop = EventLoopBuilder::<ViewerEvent>::with_user_event().build();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Model Viewer")
            .with_canvas(Some(canvas))
            .with_inner_size(browser_size())
            .build(&event_loop)
            .map_err(|err| anyhow!("failed to create window: {err}"))?,
    );
    listeners.extend(resize_listener(Arc::clone(&window)));

    let renderer = Renderer::new(Arc::clone(&window)).await?;
    let mut app = ViewerApp::new(renderer, session);

    event_loop.spawn(move |event, _target, control_flow| {
        let _listeners = &listeners;
        *control_flow = ControlFlow::Poll;
        if let Err(err) = app.process_event(event, control_flow) {
            log::error!("event processing error: {err:?}");
            control_flow.set_exit();
        }
    });

    Ok(())
}

fn attach_controls(document: &Document, session: &Rc<RefCell<ViewerSession>>) -> Vec<EventListener> {
    let picker: Option<HtmlInputElement> = document
        .get_element_by_id(COLOR_PICKER_ID)
        .and_then(|element| element.dyn_into().ok());

    TRIGGER_IDS
        .iter()
        .filter_map(|&id| {
            let Some(element) = document.get_element_by_id(id) else {
                log::warn!("control #{id} missing from page");
                return None;
            };
            let session = Rc::clone(session);
            let picker = picker.clone();
            Some(EventListener::new(&element, "click", move |_event| {
                let value = picker.as_ref().map(HtmlInputElement::value);
                let Some(command) = ViewerCommand::from_trigger(id, value.as_deref()) else {
                    return;
                };
                let changed = command.dispatch(&mut session.borrow_mut());
                log::debug!("{command}: {}", if changed { "applied" } else { "ignored" });
            }))
        })
        .collect()
}

fn resize_listener(window: Arc<Window>) -> Option<EventListener> {
    let target = web_sys::window()?;
    Some(EventListener::new(&target, "resize", move |_event| {
        window.set_inner_size(browser_size());
    }))
}

fn browser_size() -> LogicalSize<f64> {
    let dimension = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64());
    web_sys::window()
        .and_then(|win| Some((dimension(win.inner_width())?, dimension(win.inner_height())?)))
        .map(|(width, height)| LogicalSize::new(width, height))
        .unwrap_or_else(|| LogicalSize::new(1280.0, 720.0))
}
