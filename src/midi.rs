use crate::app::SharedApp;
use anyhow::anyhow;
use sky_core::decode_midi;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Request WebMIDI access and route every input into the app. Returns the
/// number of inputs wired.
pub async fn connect(app: SharedApp) -> anyhow::Result<usize> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let navigator = window.navigator();
    let has_midi = js_sys::Reflect::has(&navigator, &JsValue::from_str("requestMIDIAccess"))
        .unwrap_or(false);
    if !has_midi {
        return Err(anyhow!("WebMIDI not supported"));
    }
    let promise = navigator
        .request_midi_access()
        .map_err(|e| anyhow!("{:?}", e))?;
    let access: web::MidiAccess = JsFuture::from(promise)
        .await
        .map_err(|_| anyhow!("access denied"))?
        .dyn_into()
        .map_err(|e| anyhow!("{:?}", e))?;

    let inputs: js_sys::Map = access.inputs().unchecked_into();
    let mut count = 0;
    inputs.for_each(&mut |value, _key| {
        let Ok(input) = value.dyn_into::<web::MidiInput>() else {
            return;
        };
        let app = app.clone();
        let closure = Closure::wrap(Box::new(move |ev: web::MidiMessageEvent| {
            let Ok(data) = ev.data() else {
                return;
            };
            if let Some(event) = decode_midi(&data) {
                app.borrow_mut().dispatch_midi(event);
            }
        }) as Box<dyn FnMut(_)>);
        input.set_onmidimessage(Some(closure.as_ref().unchecked_ref()));
        closure.forget();
        log::info!("[midi] wired input {:?}", input.name());
        count += 1;
    });
    Ok(count)
}
