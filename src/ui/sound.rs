/// Sound engine: procedural terminal-style cues via rodio.
///
/// All cues are generated as in-memory WAV buffers at init time and
/// played fire-and-forget through detached sinks. Build without the
/// "sound" feature for a silent stub with the same API.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 24000;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_boot: Arc<Vec<u8>>,
        sfx_key: Arc<Vec<u8>>,
        sfx_deny: Arc<Vec<u8>>,
        sfx_grant: Arc<Vec<u8>>,
        sfx_lockout: Arc<Vec<u8>>,
        sfx_glitch: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx_boot = Arc::new(make_wav(&gen_boot()));
            let sfx_key = Arc::new(make_wav(&gen_key()));
            let sfx_deny = Arc::new(make_wav(&gen_deny()));
            let sfx_grant = Arc::new(make_wav(&gen_grant()));
            let sfx_lockout = Arc::new(make_wav(&gen_lockout()));
            let sfx_glitch = Arc::new(make_wav(&gen_glitch()));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_boot,
                sfx_key,
                sfx_deny,
                sfx_grant,
                sfx_lockout,
                sfx_glitch,
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_boot(&self) { self.play(&self.sfx_boot); }
        pub fn play_key(&self) { self.play(&self.sfx_key); }
        pub fn play_deny(&self) { self.play(&self.sfx_deny); }
        pub fn play_grant(&self) { self.play(&self.sfx_grant); }
        pub fn play_lockout(&self) { self.play(&self.sfx_lockout); }
        pub fn play_glitch(&self) { self.play(&self.sfx_glitch); }
    }

    // ── Waveform generators (mono f32 samples) ──

    fn tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * freq * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Boot: two quick rising blips.
    fn gen_boot() -> Vec<f32> {
        let mut s = tone(620.0, 0.05, 0.22);
        s.extend(tone(930.0, 0.07, 0.22));
        s
    }

    /// Guess keypress: one short mid blip.
    fn gen_key() -> Vec<f32> {
        tone(740.0, 0.04, 0.2)
    }

    /// Refused action: flat low buzz.
    fn gen_deny() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.12) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                // Square-ish for a harsher texture
                let w = (t * 150.0 * TAU).sin() * 0.6 + (t * 450.0 * TAU).sin() * 0.4;
                let env = 1.0 - (i as f32 / n as f32) * 0.5;
                w * env * 0.2
            })
            .collect()
    }

    /// Access granted: ascending three-note fanfare with a sustained top.
    fn gen_grant() -> Vec<f32> {
        let mut s = Vec::new();
        for &(freq, dur) in &[(523.0f32, 0.09), (784.0, 0.09), (1047.0, 0.22)] {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.7);
                let w = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                s.push(w * env * 0.26);
            }
        }
        s
    }

    /// Lockout: slow descending drone.
    fn gen_lockout() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.5) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 330.0 - p * 180.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - p).powf(0.4);
                (t * freq * TAU).sin() * env * 0.28
            })
            .collect()
    }

    /// Reset glitch: white-noise burst with a falling filter feel.
    fn gen_glitch() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.18) as usize;
        let mut lcg: u32 = 0x5eed;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                lcg = lcg.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (lcg as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                let hum = (t * (500.0 - p * 350.0) * TAU).sin();
                (noise * 0.7 + hum * 0.3) * (1.0 - p) * 0.24
            })
            .collect()
    }

    // ── WAV encoder ──

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align = bits_per_sample / 8; // mono
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// Public API: compiles to no-ops when the sound feature is off.

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_boot(&self) {}
    pub fn play_key(&self) {}
    pub fn play_deny(&self) {}
    pub fn play_grant(&self) {}
    pub fn play_lockout(&self) {}
    pub fn play_glitch(&self) {}
}
