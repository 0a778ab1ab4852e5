use crate::app::{SharedApp, WebApp};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

fn pointer_down(app: &mut WebApp, ev: &web::PointerEvent) {
    let WebApp { pointers, rng, .. } = app;
    let events = pointers.pointer_down(ev.pointer_id(), Some(ev.pressure()), rng);
    for event in events {
        app.dispatch(event);
    }
}

fn pointer_up(app: &mut WebApp, ev: &web::PointerEvent) {
    if let Some(event) = app.pointers.pointer_up(ev.pointer_id()) {
        app.dispatch(event);
    }
}

/// Mouse, touch and pen on the canvas: each pointer id holds one note.
pub fn wire_pointer(app: &SharedApp, canvas: &web::HtmlCanvasElement) {
    let app_down = app.clone();
    let down = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        ev.prevent_default();
        pointer_down(&mut app_down.borrow_mut(), &ev);
    }) as Box<dyn FnMut(_)>);
    _ = canvas.add_event_listener_with_callback("pointerdown", down.as_ref().unchecked_ref());
    down.forget();

    for name in ["pointerup", "pointercancel", "pointerleave"] {
        let app_up = app.clone();
        let up = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
            pointer_up(&mut app_up.borrow_mut(), &ev);
        }) as Box<dyn FnMut(_)>);
        _ = canvas.add_event_listener_with_callback(name, up.as_ref().unchecked_ref());
        up.forget();
    }
}
