//! cpal output: a small software mixer for the sample bank plus the
//! oscillator voice, shared with the audio callback behind a mutex.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use fnv::FnvHashMap;
use sky_core::synth::{SYNTH_ATTACK_S, SYNTH_RELEASE_S};
use sky_core::{Player, SoundError, SynthPatch};
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const MASTER_GAIN: f32 = 0.8;
const DELAY_TIME_SEC: f32 = 0.25;
const DELAY_FEEDBACK: f32 = 0.35;
const DELAY_WET: f32 = 0.4;
const SYNTH_DELAY_SEND: f32 = 0.35;
const FALLBACK_SAMPLE_RATE: f32 = 48_000.0;

/// Linear gain ramp advanced once per output sample.
#[derive(Clone, Copy, Default)]
struct Ramp {
    value: f32,
    target: f32,
    step: f32,
}

impl Ramp {
    fn ramp_to(&mut self, target: f32, seconds: f64, sample_rate: f32) {
        let samples = (seconds as f32 * sample_rate).max(1.0);
        self.target = target;
        self.step = (target - self.value) / samples;
    }

    #[inline]
    fn next(&mut self) -> f32 {
        if self.value != self.target {
            self.value += self.step;
            let overshot = (self.step > 0.0 && self.value > self.target)
                || (self.step < 0.0 && self.value < self.target);
            if overshot || self.step == 0.0 {
                self.value = self.target;
            }
        }
        self.value
    }
}

struct SampleSlot {
    data: Arc<[f32]>,
    source_rate: f32,
    pos: f64,
    volume: f32,
    rate: f32,
    playing: bool,
}

/// Triangle carrier, saw "metal" partial and white noise through a
/// resonant state-variable lowpass.
struct SynthState {
    carrier_hz: f32,
    metal_hz: f32,
    carrier_phase: f32,
    metal_phase: f32,
    gains: [Ramp; 3],
    noise: u32,
    cutoff_hz: f32,
    resonance: f32,
    low: f32,
    band: f32,
}

impl SynthState {
    fn new() -> Self {
        Self {
            carrier_hz: 220.0,
            metal_hz: 440.0,
            carrier_phase: 0.0,
            metal_phase: 0.0,
            gains: [Ramp::default(); 3],
            noise: 0x2545_F491,
            cutoff_hz: 2_200.0,
            resonance: 8.0,
            low: 0.0,
            band: 0.0,
        }
    }

    fn next(&mut self, sample_rate: f32) -> f32 {
        let [g_carrier, g_metal, g_noise] = [
            self.gains[0].next(),
            self.gains[1].next(),
            self.gains[2].next(),
        ];
        if g_carrier == 0.0 && g_metal == 0.0 && g_noise == 0.0 {
            return 0.0;
        }
        self.carrier_phase = (self.carrier_phase + self.carrier_hz / sample_rate).fract();
        self.metal_phase = (self.metal_phase + self.metal_hz / sample_rate).fract();
        let tri = 1.0 - 4.0 * (self.carrier_phase - 0.5).abs();
        let saw = 2.0 * self.metal_phase - 1.0;

        let mut x = self.noise;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise = x;
        let white = (x as f32 / u32::MAX as f32) * 2.0 - 1.0;

        let input = tri * g_carrier + saw * g_metal + white * g_noise;
        // Chamberlin SVF; stable while cutoff stays well under sample_rate / 6
        let f = 2.0 * (std::f32::consts::PI * self.cutoff_hz / sample_rate).sin();
        let q = 1.0 / self.resonance.max(0.5);
        self.low += f * self.band;
        let high = input - self.low - q * self.band;
        self.band += f * high;
        self.low
    }
}

pub struct MixerState {
    sample_rate: f32,
    slots: Vec<SampleSlot>,
    synth: SynthState,
    delay: Vec<f32>,
    delay_pos: usize,
}

impl MixerState {
    fn new(sample_rate: f32) -> Self {
        let delay_len = (DELAY_TIME_SEC * sample_rate).max(1.0) as usize;
        Self {
            sample_rate,
            slots: Vec::new(),
            synth: SynthState::new(),
            delay: vec![0.0; delay_len],
            delay_pos: 0,
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        let delay_len = (DELAY_TIME_SEC * sample_rate).max(1.0) as usize;
        self.delay = vec![0.0; delay_len];
        self.delay_pos = 0;
    }

    fn next_sample(&mut self) -> f32 {
        let sr = self.sample_rate;
        let mut samples = 0.0;
        for slot in self.slots.iter_mut().filter(|s| s.playing) {
            let i = slot.pos as usize;
            let Some(&v) = slot.data.get(i) else {
                slot.playing = false;
                continue;
            };
            samples += v * slot.volume;
            slot.pos += (slot.rate * slot.source_rate / sr) as f64;
        }

        let synth = self.synth.next(sr);
        let delayed = self.delay[self.delay_pos];
        self.delay[self.delay_pos] = synth * SYNTH_DELAY_SEND + delayed * DELAY_FEEDBACK;
        self.delay_pos = (self.delay_pos + 1) % self.delay.len();

        ((samples + synth + delayed * DELAY_WET) * MASTER_GAIN).tanh()
    }
}

pub type Mixer = Arc<Mutex<MixerState>>;

/// Handle to one mixer slot.
pub struct NativeSamplePlayer {
    slot: usize,
    mixer: Mixer,
}

impl NativeSamplePlayer {
    fn with_slot(&self, f: impl FnOnce(&mut SampleSlot)) {
        if let Ok(mut m) = self.mixer.lock() {
            if let Some(slot) = m.slots.get_mut(self.slot) {
                f(slot);
            }
        }
    }
}

impl Player for NativeSamplePlayer {
    fn play(&mut self) {
        self.with_slot(|s| {
            s.pos = 0.0;
            s.playing = true;
        });
    }

    fn stop(&mut self) {
        self.with_slot(|s| {
            s.playing = false;
            s.pos = 0.0;
        });
    }

    fn is_playing(&self) -> bool {
        self.mixer
            .lock()
            .ok()
            .and_then(|m| m.slots.get(self.slot).map(|s| s.playing))
            .unwrap_or(false)
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_slot(|s| s.volume = volume.clamp(0.0, 1.0));
    }

    fn set_rate(&mut self, rate: f32) {
        self.with_slot(|s| s.rate = rate.max(0.01));
    }
}

/// Decode a WAV file to mono f32 at its own sample rate.
fn decode_wav(path: &Path) -> Result<(Arc<[f32]>, f32), hound::Error> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };
    let channels = spec.channels.max(1) as usize;
    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono.into(), spec.sample_rate as f32))
}

/// Resolves manifest paths against the assets directory and decodes each
/// file once, however many slots it gets.
pub struct SampleLoader {
    mixer: Mixer,
    assets: PathBuf,
    decoded: FnvHashMap<String, (Arc<[f32]>, f32)>,
}

impl SampleLoader {
    pub fn load(&mut self, path: &str) -> Result<NativeSamplePlayer, SoundError> {
        let (data, source_rate) = match self.decoded.get(path) {
            Some(entry) => entry.clone(),
            None => {
                let entry = decode_wav(&self.assets.join(path)).map_err(|e| SoundError::Load {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
                self.decoded.insert(path.to_string(), entry.clone());
                entry
            }
        };
        let mut m = self.mixer.lock().map_err(|_| SoundError::Load {
            path: path.to_string(),
            reason: "mixer poisoned".into(),
        })?;
        m.slots.push(SampleSlot {
            data,
            source_rate,
            pos: 0.0,
            volume: 1.0,
            rate: 1.0,
            playing: false,
        });
        Ok(NativeSamplePlayer {
            slot: m.slots.len() - 1,
            mixer: self.mixer.clone(),
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mixer: Mixer,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let Ok(mut m) = mixer.lock() else {
                data.fill(T::EQUILIBRIUM);
                return;
            };
            for frame in data.chunks_mut(channels) {
                let v = T::from_sample(m.next_sample());
                frame.fill(v);
            }
        },
        |err| log::error!("[audio] stream error: {}", err),
        None,
    )
}

fn open_stream(mixer: &Mixer) -> anyhow::Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device"))?;
    let supported = device.default_output_config()?;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    if let Ok(mut m) = mixer.lock() {
        m.set_sample_rate(config.sample_rate.0 as f32);
    }
    let stream = match format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer.clone())?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer.clone())?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer.clone())?,
        other => return Err(anyhow!("unsupported sample format {:?}", other)),
    };
    stream.play()?;
    log::info!(
        "[audio] output {} Hz, {} ch, {:?}",
        config.sample_rate.0,
        config.channels,
        format
    );
    Ok(stream)
}

/// Owns the mixer and, when a device is available, the output stream.
/// Without a device the mixer still exists so sample handles stay valid.
pub struct AudioOut {
    mixer: Mixer,
    _stream: Option<cpal::Stream>,
}

impl AudioOut {
    pub fn start() -> Self {
        let mixer: Mixer = Arc::new(Mutex::new(MixerState::new(FALLBACK_SAMPLE_RATE)));
        let stream = match open_stream(&mixer) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("[audio] running silent: {}", e);
                None
            }
        };
        Self {
            mixer,
            _stream: stream,
        }
    }

    pub fn loader(&self, assets: &Path) -> SampleLoader {
        SampleLoader {
            mixer: self.mixer.clone(),
            assets: assets.to_path_buf(),
            decoded: FnvHashMap::default(),
        }
    }

    pub fn synth_note_on(&self, patch: &SynthPatch) {
        let Ok(mut m) = self.mixer.lock() else {
            return;
        };
        let sr = m.sample_rate;
        let synth = &mut m.synth;
        synth.carrier_hz = patch.carrier_hz;
        synth.metal_hz = patch.metal_hz;
        synth.cutoff_hz = patch.cutoff_hz;
        synth.resonance = patch.resonance;
        let targets = [patch.carrier_gain, patch.metal_gain, patch.noise_gain];
        for ((g, target), secs) in synth.gains.iter_mut().zip(targets).zip(SYNTH_ATTACK_S) {
            g.ramp_to(target, secs, sr);
        }
    }

    pub fn synth_release(&self) {
        let Ok(mut m) = self.mixer.lock() else {
            return;
        };
        let sr = m.sample_rate;
        for (g, secs) in m.synth.gains.iter_mut().zip(SYNTH_RELEASE_S) {
            g.ramp_to(0.0, secs, sr);
        }
    }
}
