use anyhow::Context;
use clap::Parser;
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_core::{
    parse_manifest, EngineParams, InstanceData, KeyboardAdapter, NoteEvent, PointerTracker,
    QuantumSeed, SkyEngine, SoundBank, Status,
};
use std::path::{Path, PathBuf};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

mod audio;
mod feeds;
mod midi;
mod render;

use audio::{AudioOut, NativeSamplePlayer};

const SOUNDBANK_FILE: &str = "soundbank.json";
const QUANTUM_SEED_FILE: &str = "quantum_seed.json";
const MOUSE_POINTER_ID: i32 = -1;

#[derive(Parser, Debug)]
#[command(name = "sky-native")]
#[command(about = "Weather- and satellite-modulated particle sky, played from MIDI, keys or mouse")]
struct Cli {
    /// Directory holding soundbank.json, quantum_seed.json and the samples
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// JSON file with engine parameter overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Latitude for the weather feed
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude for the weather feed
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
}

fn load_params(cli: &Cli) -> anyhow::Result<EngineParams> {
    let mut params = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {:?}", path))?;
            EngineParams::from_json(&text).with_context(|| format!("parsing config {:?}", path))?
        }
        None => EngineParams::default(),
    };
    if let Some(lat) = cli.lat {
        params.latitude = lat;
    }
    if let Some(lon) = cli.lon {
        params.longitude = lon;
    }
    Ok(params)
}

fn load_bank(
    assets: &Path,
    params: &EngineParams,
    audio: &AudioOut,
) -> anyhow::Result<SoundBank<NativeSamplePlayer>> {
    let path = assets.join(SOUNDBANK_FILE);
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
    let manifest = parse_manifest(&text)?;
    let mut loader = audio.loader(assets);
    Ok(SoundBank::load(&manifest, params.polyphony, |file| {
        loader.load(file)
    }))
}

fn load_seed(assets: &Path) -> QuantumSeed {
    let path = assets.join(QUANTUM_SEED_FILE);
    let parsed = std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|text| Ok(QuantumSeed::from_json(&text)?));
    match parsed {
        Ok(seed) => seed,
        Err(e) => {
            log::warn!("[seed] {:?} unavailable, using default: {}", path, e);
            QuantumSeed::default()
        }
    }
}

/// Owns the engine and every input source; lives on the event-loop thread.
struct NativeApp {
    engine: SkyEngine<NativeSamplePlayer>,
    audio: AudioOut,
    keyboard: KeyboardAdapter,
    pointers: PointerTracker,
    rng: StdRng,
    feeds: Option<feeds::FeedWorker>,
    midi: Option<midi::MidiLink>,
    instances: Vec<InstanceData>,
    clock: Instant,
}

impl NativeApp {
    #[inline]
    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    fn dispatch(&mut self, event: NoteEvent) {
        let now = self.now_ms();
        match self.engine.handle(event, now) {
            Some(outcome) => self.audio.synth_note_on(&outcome.patch),
            None => {
                if self.engine.is_silent() {
                    self.audio.synth_release();
                }
            }
        }
    }

    fn key(&mut self, event: &KeyEvent) {
        let Key::Character(text) = &event.logical_key else {
            return;
        };
        let note = match event.state {
            ElementState::Pressed => self.keyboard.key_down(text.as_str(), event.repeat),
            ElementState::Released => self.keyboard.key_up(text.as_str()),
        };
        if let Some(note) = note {
            self.dispatch(note);
        }
    }

    fn pointer_down(&mut self, id: i32, pressure: Option<f32>) {
        let events = self.pointers.pointer_down(id, pressure, &mut self.rng);
        for event in events {
            self.dispatch(event);
        }
    }

    fn pointer_up(&mut self, id: i32) {
        if let Some(event) = self.pointers.pointer_up(id) {
            self.dispatch(event);
        }
    }

    fn frame(&mut self) {
        let midi_events: Vec<NoteEvent> = self
            .midi
            .as_ref()
            .map(|m| m.events.try_iter().collect())
            .unwrap_or_default();
        for event in midi_events {
            self.dispatch(event);
        }

        let now = self.now_ms();
        if let Some(worker) = &self.feeds {
            for feed in self.engine.due_feeds(now) {
                worker.request(feed, self.engine.feed_url(feed));
            }
            for (feed, body) in worker.finished() {
                // failures are logged by the world updater
                _ = match &body {
                    Ok(text) => self.engine.ingest(feed, Ok(text.as_str())),
                    Err(e) => self.engine.ingest(feed, Err(e.as_str())),
                };
            }
        }
        self.engine.frame(now, &mut self.instances);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let cli = Cli::parse();
    let params = load_params(&cli)?;

    let audio = AudioOut::start();
    let (bank, status) = match load_bank(&cli.assets, &params, &audio) {
        Ok(bank) => (bank, Status::Loading),
        Err(e) => {
            log::warn!("[sound] {:#}", e);
            (SoundBank::empty(), Status::NoSounds)
        }
    };
    let seed = load_seed(&cli.assets);
    let engine = SkyEngine::new(params, bank, seed, StdRng::from_entropy());

    let feeds = match feeds::FeedWorker::spawn() {
        Ok(w) => Some(w),
        Err(e) => {
            log::warn!("[world] feeds disabled: {}", e);
            None
        }
    };
    let (midi, status) = match midi::connect() {
        Ok(link) => {
            let status = status.after_midi(Ok(link.input_count()));
            (Some(link), status)
        }
        Err(e) => {
            log::warn!("[midi] {}", e);
            (None, status.after_midi(Err(e.to_string())))
        }
    };
    log::info!("[status] {}", status);

    let mut app = NativeApp {
        engine,
        audio,
        keyboard: KeyboardAdapter::new(),
        pointers: PointerTracker::new(),
        rng: StdRng::from_entropy(),
        feeds,
        midi,
        instances: Vec::new(),
        clock: Instant::now(),
    };
    let now = app.now_ms();
    app.engine.start_audio(now);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(format!("quantum-sky · {}", status))
        .build(&event_loop)?;
    let mut gpu = pollster::block_on(render::GpuState::new(&window))?;

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => gpu.resize(size),
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.logical_key == Key::Named(NamedKey::Escape) {
                    elwt.exit();
                } else {
                    app.key(&event);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => app.pointer_down(MOUSE_POINTER_ID, None),
                ElementState::Released => app.pointer_up(MOUSE_POINTER_ID),
            },
            WindowEvent::CursorLeft { .. } => app.pointer_up(MOUSE_POINTER_ID),
            WindowEvent::Touch(touch) => {
                let id = touch.id as i32;
                match touch.phase {
                    TouchPhase::Started => {
                        app.pointer_down(id, touch.force.map(|f| f.normalized() as f32))
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => app.pointer_up(id),
                    TouchPhase::Moved => {}
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            app.frame();
            match gpu.render(&app.instances) {
                Ok(()) => gpu.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    gpu.resize(gpu.window.inner_size())
                }
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(e) => log::warn!("[gpu] frame skipped: {:?}", e),
            }
        }
        _ => {}
    })?;
    Ok(())
}
