use crate::app::SharedApp;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Computer-keyboard piano on the window. Auto-repeat is filtered by the
/// adapter.
pub fn wire_keyboard(app: &SharedApp) {
    let Some(window) = web::window() else {
        return;
    };

    let app_down = app.clone();
    let keydown = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        if ev.ctrl_key() || ev.meta_key() || ev.alt_key() {
            return;
        }
        let mut a = app_down.borrow_mut();
        if let Some(event) = a.keyboard.key_down(&ev.key(), ev.repeat()) {
            ev.prevent_default();
            a.dispatch(event);
        }
    }) as Box<dyn FnMut(_)>);
    _ = window.add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref());
    keydown.forget();

    let app_up = app.clone();
    let keyup = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        let mut a = app_up.borrow_mut();
        if let Some(event) = a.keyboard.key_up(&ev.key()) {
            a.dispatch(event);
        }
    }) as Box<dyn FnMut(_)>);
    _ = window.add_event_listener_with_callback("keyup", keyup.as_ref().unchecked_ref());
    keyup.forget();
}
