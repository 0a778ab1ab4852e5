use crate::constants::*;
use crate::dsp;
use anyhow::anyhow;
use sky_core::synth::{SYNTH_ATTACK_S, SYNTH_RELEASE_S};
use sky_core::{Player, SoundError, SynthPatch};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

/// One `<audio>` element per sample slot. The element is created before the
/// browser knows whether the file exists, so a later `error` event marks the
/// slot unavailable instead of the loader.
pub struct HtmlSamplePlayer {
    el: web::HtmlAudioElement,
    failed: Rc<Cell<bool>>,
}

impl HtmlSamplePlayer {
    pub fn load(path: &str) -> Result<Self, SoundError> {
        let el = web::HtmlAudioElement::new_with_src(path).map_err(|e| SoundError::Load {
            path: path.to_string(),
            reason: format!("{:?}", e),
        })?;
        el.set_preload("auto");

        let failed = Rc::new(Cell::new(false));
        let flag = failed.clone();
        let source = path.to_string();
        let on_error = Closure::wrap(Box::new(move || {
            if !flag.replace(true) {
                log::warn!("[sound] failed to load `{}`, slot disabled", source);
            }
        }) as Box<dyn FnMut()>);
        _ = el.add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref());
        on_error.forget();
        Ok(Self { el, failed })
    }
}

impl Player for HtmlSamplePlayer {
    fn play(&mut self) {
        self.el.set_current_time(0.0);
        match self.el.play() {
            Ok(promise) => {
                let failed = self.failed.clone();
                spawn_local(async move {
                    if let Err(e) = JsFuture::from(promise).await {
                        // a pause() before playback starts also rejects
                        if !failed.get() {
                            log::debug!("[sound] play rejected: {:?}", e);
                        }
                    }
                });
            }
            Err(e) => log::warn!("[sound] play failed: {:?}", e),
        }
    }

    fn stop(&mut self) {
        _ = self.el.pause();
        self.el.set_current_time(0.0);
    }

    fn is_playing(&self) -> bool {
        !self.el.paused() && !self.el.ended()
    }

    fn set_volume(&mut self, volume: f32) {
        self.el.set_volume(volume.clamp(0.0, 1.0) as f64);
    }

    fn set_rate(&mut self, rate: f32) {
        self.el.set_playback_rate(rate as f64);
    }

    fn is_available(&self) -> bool {
        !self.failed.get()
    }
}

fn js_err(label: &str, e: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow!("{} error: {:?}", label, e)
}

fn create_gain(
    audio_ctx: &web::AudioContext,
    value: f32,
    label: &str,
) -> anyhow::Result<web::GainNode> {
    let g = web::GainNode::new(audio_ctx).map_err(|e| js_err(label, e))?;
    g.gain().set_value(value);
    Ok(g)
}

pub struct FxBuses {
    pub master_gain: web::GainNode,
    pub reverb_in: web::GainNode,
    pub delay_in: web::GainNode,
}

pub fn build_fx_buses(audio_ctx: &web::AudioContext) -> anyhow::Result<FxBuses> {
    let master_gain = create_gain(audio_ctx, MASTER_GAIN, "master")?;
    _ = master_gain.connect_with_audio_node(&audio_ctx.destination());

    // Reverb bus with a procedural stereo tail
    let reverb_in = create_gain(audio_ctx, 1.0, "reverb in")?;
    let reverb = web::ConvolverNode::new(audio_ctx).map_err(|e| js_err("ConvolverNode", e))?;
    reverb.set_normalize(true);
    let sr = audio_ctx.sample_rate();
    let len = (sr * REVERB_SECONDS) as u32;
    let ir = audio_ctx
        .create_buffer(2, len, sr)
        .map_err(|e| js_err("impulse buffer", e))?;
    for (ch, seed) in [(0, 0x1234_ABCD_u32), (1, 0x7890_FEDC_u32)] {
        let mut buf = dsp::impulse_response(sr, REVERB_SECONDS, REVERB_DECAY_TAU, seed);
        buf.truncate(len as usize);
        _ = ir.copy_to_channel(&mut buf, ch);
    }
    reverb.set_buffer(Some(&ir));
    let reverb_wet = create_gain(audio_ctx, REVERB_WET, "reverb wet")?;
    _ = reverb_in.connect_with_audio_node(&reverb);
    _ = reverb.connect_with_audio_node(&reverb_wet);
    _ = reverb_wet.connect_with_audio_node(&master_gain);

    // Delay bus with a darkened feedback loop
    let delay_in = create_gain(audio_ctx, 1.0, "delay in")?;
    let delay = audio_ctx
        .create_delay_with_max_delay_time(1.0)
        .map_err(|e| js_err("DelayNode", e))?;
    delay.delay_time().set_value(DELAY_TIME_SEC as f32);
    let delay_tone =
        web::BiquadFilterNode::new(audio_ctx).map_err(|e| js_err("BiquadFilterNode", e))?;
    delay_tone.set_type(web::BiquadFilterType::Lowpass);
    delay_tone.frequency().set_value(DELAY_TONE_HZ);
    let delay_feedback = create_gain(audio_ctx, DELAY_FEEDBACK, "delay feedback")?;
    let delay_wet = create_gain(audio_ctx, DELAY_WET, "delay wet")?;
    _ = delay_in.connect_with_audio_node(&delay);
    _ = delay.connect_with_audio_node(&delay_tone);
    _ = delay_tone.connect_with_audio_node(&delay_feedback);
    _ = delay_feedback.connect_with_audio_node(&delay);
    _ = delay_tone.connect_with_audio_node(&delay_wet);
    _ = delay_wet.connect_with_audio_node(&master_gain);

    Ok(FxBuses {
        master_gain,
        reverb_in,
        delay_in,
    })
}

/// The mono oscillator voice layered under the samples. It keeps running;
/// notes only move its frequencies and gains.
pub struct SynthVoice {
    audio_ctx: web::AudioContext,
    carrier: web::OscillatorNode,
    metal: web::OscillatorNode,
    gains: [web::GainNode; 3],
    filter: web::BiquadFilterNode,
    _noise: web::AudioBufferSourceNode,
}

impl SynthVoice {
    pub fn new(audio_ctx: &web::AudioContext, fx: &FxBuses) -> anyhow::Result<Self> {
        let filter =
            web::BiquadFilterNode::new(audio_ctx).map_err(|e| js_err("synth filter", e))?;
        filter.set_type(web::BiquadFilterType::Lowpass);
        filter.frequency().set_value(2_200.0);
        filter.q().set_value(8.0);
        _ = filter.connect_with_audio_node(&fx.master_gain);
        let reverb_send = create_gain(audio_ctx, SYNTH_REVERB_SEND, "synth reverb send")?;
        let delay_send = create_gain(audio_ctx, SYNTH_DELAY_SEND, "synth delay send")?;
        _ = filter.connect_with_audio_node(&reverb_send);
        _ = filter.connect_with_audio_node(&delay_send);
        _ = reverb_send.connect_with_audio_node(&fx.reverb_in);
        _ = delay_send.connect_with_audio_node(&fx.delay_in);

        let gains = [
            create_gain(audio_ctx, 0.0, "carrier")?,
            create_gain(audio_ctx, 0.0, "metal")?,
            create_gain(audio_ctx, 0.0, "noise")?,
        ];
        for g in &gains {
            _ = g.connect_with_audio_node(&filter);
        }

        let carrier = web::OscillatorNode::new(audio_ctx).map_err(|e| js_err("carrier", e))?;
        carrier.set_type(web::OscillatorType::Triangle);
        let metal = web::OscillatorNode::new(audio_ctx).map_err(|e| js_err("metal", e))?;
        metal.set_type(web::OscillatorType::Sawtooth);
        _ = carrier.connect_with_audio_node(&gains[0]);
        _ = metal.connect_with_audio_node(&gains[1]);

        let sr = audio_ctx.sample_rate();
        let len = (sr * NOISE_SECONDS) as usize;
        let noise_buf = audio_ctx
            .create_buffer(1, len as u32, sr)
            .map_err(|e| js_err("noise buffer", e))?;
        let mut pink = dsp::pink_noise(len, 0x2545_F491);
        _ = noise_buf.copy_to_channel(&mut pink, 0);
        let noise = web::AudioBufferSourceNode::new(audio_ctx).map_err(|e| js_err("noise", e))?;
        noise.set_buffer(Some(&noise_buf));
        noise.set_loop(true);
        _ = noise.connect_with_audio_node(&gains[2]);

        let t0 = audio_ctx.current_time();
        _ = carrier.start_with_when(t0);
        _ = metal.start_with_when(t0);
        _ = noise.start_with_when(t0);

        Ok(Self {
            audio_ctx: audio_ctx.clone(),
            carrier,
            metal,
            gains,
            filter,
            _noise: noise,
        })
    }

    fn ramp(&self, targets: [f32; 3], times: [f64; 3]) {
        let now = self.audio_ctx.current_time();
        for ((g, target), dt) in self.gains.iter().zip(targets).zip(times) {
            let param = g.gain();
            let current = param.value();
            _ = param.cancel_scheduled_values(now);
            _ = param.set_value_at_time(current, now);
            _ = param.linear_ramp_to_value_at_time(target, now + dt);
        }
    }

    pub fn note_on(&self, patch: &SynthPatch) {
        let now = self.audio_ctx.current_time();
        _ = self.carrier.frequency().set_value_at_time(patch.carrier_hz, now);
        _ = self.metal.frequency().set_value_at_time(patch.metal_hz, now);
        _ = self.filter.frequency().set_value_at_time(patch.cutoff_hz, now);
        _ = self.filter.q().set_value_at_time(patch.resonance, now);
        self.ramp(
            [patch.carrier_gain, patch.metal_gain, patch.noise_gain],
            SYNTH_ATTACK_S,
        );
    }

    pub fn release(&self) {
        self.ramp([0.0; 3], SYNTH_RELEASE_S);
    }
}
