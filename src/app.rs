use crate::audio::{HtmlSamplePlayer, SynthVoice};
use instant::Instant;
use rand::rngs::StdRng;
use sky_core::{KeyboardAdapter, NoteEvent, PointerTracker, SkyEngine};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything the page's event handlers and frame loop share.
pub struct WebApp {
    pub engine: SkyEngine<HtmlSamplePlayer>,
    pub synth: Option<SynthVoice>,
    pub keyboard: KeyboardAdapter,
    pub pointers: PointerTracker,
    pub rng: StdRng,
    clock: Instant,
}

pub type SharedApp = Rc<RefCell<WebApp>>;

impl WebApp {
    pub fn new(engine: SkyEngine<HtmlSamplePlayer>, rng: StdRng) -> Self {
        Self {
            engine,
            synth: None,
            keyboard: KeyboardAdapter::new(),
            pointers: PointerTracker::new(),
            rng,
            clock: Instant::now(),
        }
    }

    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    #[inline]
    pub fn audio_ready(&self) -> bool {
        self.synth.is_some()
    }

    pub fn dispatch(&mut self, event: NoteEvent) {
        let now = self.now_ms();
        match self.engine.handle(event, now) {
            Some(outcome) => {
                if let Some(s) = &self.synth {
                    s.note_on(&outcome.patch);
                }
            }
            None => {
                if self.engine.is_silent() {
                    if let Some(s) = &self.synth {
                        s.release();
                    }
                }
            }
        }
    }

    /// MIDI is only listened to once audio has been unlocked.
    pub fn dispatch_midi(&mut self, event: NoteEvent) {
        if self.audio_ready() {
            self.dispatch(event);
        }
    }
}
