//! Browser tests, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use slingshot::engine::input::{MouseState, PointerInput};
use slingshot::level::Levels;
use slingshot::loader::{Loader, SoundFormat};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{HtmlCanvasElement, MouseEvent};

wasm_bindgen_test_configure!(run_in_browser);

// 1x1 transparent gif, loads without touching the network
const PIXEL: &str = "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

#[wasm_bindgen_test]
async fn loader_with_nothing_queued_finishes_immediately() {
    let loader = Loader::init().expect("loader should init");
    assert!(loader.is_loaded());
    let report = loader.finished().await.expect("report");
    assert_eq!(report.total, 0);
}

#[wasm_bindgen_test]
async fn loader_waits_for_every_image() {
    let loader = Loader::init().expect("loader should init");
    let first = loader.load_image(PIXEL).expect("image");
    let second = loader.load_image(PIXEL).expect("image");

    let report = loader.finished().await.expect("report");
    assert_eq!(report.loaded, 2);
    assert_eq!(report.total, 2);
    assert!(report.failed.is_empty());
    assert!(first.complete() && second.complete());
}

#[wasm_bindgen_test]
async fn broken_image_is_reported_instead_of_stalling() {
    let loader = Loader::init().expect("loader should init");
    loader.load_image(PIXEL).expect("image");
    loader.load_image("data:image/png;base64,AAAA").expect("image");

    let report = loader.finished().await.expect("report");
    assert_eq!(report.loaded, 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.into_result().is_err());
}

#[wasm_bindgen_test]
fn sound_urls_get_the_detected_extension() {
    let loader = Loader::init().expect("loader should init");
    match loader.sound_format() {
        Some(format) => {
            let audio = loader.load_sound("sounds/bounce").expect("sound");
            assert!(audio.src().ends_with(format.extension()));
            assert!(!loader.is_loaded());
        }
        None => assert!(loader.load_sound("sounds/bounce").is_err()),
    }
    assert!(SoundFormat::detect().is_ok());
}

#[wasm_bindgen_test]
fn builtin_levels_are_available_in_the_browser() {
    let levels = Levels::builtin();
    assert_eq!(levels.len(), 2);
    assert!(levels.get(0).is_ok());
    assert!(levels.get(levels.len()).is_err());
}

fn test_canvas() -> HtmlCanvasElement {
    web_sys::window()
        .and_then(|window| window.document())
        .expect("document")
        .create_element("canvas")
        .expect("canvas element")
        .dyn_into::<HtmlCanvasElement>()
        .expect("HtmlCanvasElement")
}

fn dispatch(canvas: &HtmlCanvasElement, name: &str) {
    let event = MouseEvent::new(name).expect("mouse event");
    canvas.dispatch_event(&event).expect("dispatch");
}

#[wasm_bindgen_test]
fn pointer_input_stops_listening_once_detached() {
    let canvas = test_canvas();
    let mut input = PointerInput::attach(&canvas).expect("attach");
    let mut mouse = MouseState::default();

    dispatch(&canvas, "mousedown");
    input.process(&mut mouse);
    assert!(mouse.down);

    input.detach();
    dispatch(&canvas, "mouseup");
    input.process(&mut mouse);
    assert!(mouse.down);
}
