#![cfg(target_arch = "wasm32")]
use anyhow::anyhow;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_core::{parse_manifest, EngineParams, QuantumSeed, SkyEngine, SoundBank, Status};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod app;
mod audio;
mod constants;
mod dom;
mod dsp;
mod events;
mod fetch;
mod frame;
mod midi;
mod overlay;
mod render;

use app::{SharedApp, WebApp};
use constants::*;

async fn load_sound_bank(
    params: &EngineParams,
) -> anyhow::Result<SoundBank<audio::HtmlSamplePlayer>> {
    let text = fetch::fetch_text(SOUNDBANK_URL).await?;
    let manifest = parse_manifest(&text)?;
    Ok(SoundBank::load(
        &manifest,
        params.polyphony,
        audio::HtmlSamplePlayer::load,
    ))
}

async fn load_quantum_seed(now_ms: f64) -> anyhow::Result<QuantumSeed> {
    let text = fetch::fetch_text(&seed_url(now_ms)).await?;
    Ok(QuantumSeed::from_json(&text)?)
}

/// Unlock audio on the start button: build the graph, start the atmosphere
/// layer, hide the overlay and try MIDI.
fn start_audio(app: &SharedApp, document: &web::Document, status: &Status) -> anyhow::Result<()> {
    if app.borrow().audio_ready() {
        return Ok(());
    }
    let audio_ctx = web::AudioContext::new().map_err(|e| anyhow!("AudioContext: {:?}", e))?;
    _ = audio_ctx.resume();
    let fx = audio::build_fx_buses(&audio_ctx)?;
    let synth = audio::SynthVoice::new(&audio_ctx, &fx)?;
    {
        let mut a = app.borrow_mut();
        a.synth = Some(synth);
        let now = a.now_ms();
        a.engine.start_audio(now);
    }
    overlay::hide(document);

    let app_midi = app.clone();
    let doc_midi = document.clone();
    let status = status.clone();
    spawn_local(async move {
        let status = match midi::connect(app_midi).await {
            Ok(n) => status.after_midi(Ok(n)),
            Err(e) => {
                log::warn!("[midi] {}", e);
                status.after_midi(Err(e.to_string()))
            }
        };
        overlay::set_status(&doc_midi, &status);
    });
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("quantum-sky web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow!("missing #{}", CANVAS_ID))?
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow!("{:?}", e))?;
    dom::wire_canvas_resize(&canvas);
    overlay::set_status(&document, &Status::Loading);

    let params = EngineParams::default();
    let (bank, sounds_ok) = match load_sound_bank(&params).await {
        Ok(bank) => (bank, true),
        Err(e) => {
            log::warn!("[sound] {}: {}", SOUNDBANK_URL, e);
            (SoundBank::empty(), false)
        }
    };
    let seed = match load_quantum_seed(js_sys::Date::now()).await {
        Ok(seed) => seed,
        Err(e) => {
            log::warn!("[seed] {} unavailable, using default: {}", QUANTUM_SEED_URL, e);
            QuantumSeed::default()
        }
    };

    let engine = SkyEngine::new(params, bank, seed, StdRng::from_entropy());
    let app: SharedApp = Rc::new(RefCell::new(WebApp::new(engine, StdRng::from_entropy())));
    events::wire_keyboard(&app);
    events::wire_pointer(&app, &canvas);

    let status = if sounds_ok {
        Status::PressStart
    } else {
        Status::NoSounds
    };
    let app_start = app.clone();
    let doc_start = document.clone();
    let status_start = status.clone();
    let wired = dom::add_click_listener(&document, START_BUTTON_ID, move || {
        if let Err(e) = start_audio(&app_start, &doc_start, &status_start) {
            log::error!("[audio] start failed: {:?}", e);
        }
    });
    if !wired {
        log::warn!("#{} not found; audio stays locked", START_BUTTON_ID);
    }
    overlay::set_status(&document, &status);

    let gpu = frame::init_gpu(&canvas).await;
    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        app,
        gpu,
        instances: Vec::new(),
    }));
    frame::start_loop(frame_ctx);
    Ok(())
}
