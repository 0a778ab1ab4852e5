/// Procedural buffers for the web audio graph. Pure functions so host tests
/// can include this file.

/// One xorshift32 step mapped to -1..1.
#[inline]
pub fn xorshift_noise(state: &mut u32) -> f32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    (x as f32 / u32::MAX as f32) * 2.0 - 1.0
}

/// Exponentially decaying noise tail that darkens toward its end.
pub fn impulse_response(sample_rate: f32, seconds: f32, decay_tau: f32, seed: u32) -> Vec<f32> {
    let len = (sample_rate * seconds).max(1.0) as usize;
    let mut state = seed.max(1);
    let dt = 1.0 / sample_rate;
    (0..len)
        .map(|i| {
            let t = i as f32 * dt;
            let n = xorshift_noise(&mut state);
            let decay = (-t / decay_tau).exp();
            let dark = (1.0 - t / seconds).max(0.0);
            n * decay * (0.6 + 0.4 * dark)
        })
        .collect()
}

/// Pink noise via Paul Kellet's economy filter, normalized to about ±1.
pub fn pink_noise(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.max(1);
    let (mut b0, mut b1, mut b2) = (0.0_f32, 0.0_f32, 0.0_f32);
    (0..len)
        .map(|_| {
            let white = xorshift_noise(&mut state);
            b0 = 0.99765 * b0 + white * 0.0990460;
            b1 = 0.96300 * b1 + white * 0.2965164;
            b2 = 0.57000 * b2 + white * 1.0526913;
            ((b0 + b1 + b2 + white * 0.1848) * 0.25).clamp(-1.0, 1.0)
        })
        .collect()
}
