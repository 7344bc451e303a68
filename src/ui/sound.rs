/// Sound engine: procedural chiptune-style effects via rodio.
///
/// All effects are synthesized into in-memory WAV buffers at init time.
/// Playback is fire-and-forget via detached Sinks. Building without the
/// "sound" feature swaps in a stub engine that does nothing.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_gem: Arc<Vec<u8>>,
        sfx_jump: Arc<Vec<u8>>,
        sfx_switch: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_gem: Arc::new(make_wav(&gen_gem())),
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_switch: Arc::new(make_wav(&gen_switch())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
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

        pub fn play_gem(&self) { self.play(&self.sfx_gem); }
        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_switch(&self) { self.play(&self.sfx_switch); }
        pub fn play_die(&self) { self.play(&self.sfx_die); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
    }

    // ── Waveform generators (mono f32 samples) ──

    fn tone(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32);
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Gem pickup: two quick rising notes.
    fn gen_gem() -> Vec<f32> {
        let mut s = tone(988.0, 0.05, 0.3);
        s.extend(tone(1319.0, 0.07, 0.3));
        s
    }

    /// Jump: short upward sweep.
    fn gen_jump() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.08) as usize;
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let frac = i as f32 / n as f32;
                let freq = 220.0 + 440.0 * frac;
                phase += freq * 2.0 * std::f32::consts::PI / SAMPLE_RATE as f32;
                phase.sin() * (1.0 - frac) * 0.25
            })
            .collect()
    }

    /// Switch press: a dull low click.
    fn gen_switch() -> Vec<f32> {
        tone(330.0, 0.05, 0.3)
    }

    /// Death: descending minor fall.
    fn gen_die() -> Vec<f32> {
        let mut s = tone(440.0, 0.12, 0.35);
        s.extend(tone(349.0, 0.12, 0.35));
        s.extend(tone(262.0, 0.2, 0.35));
        s
    }

    /// Stage clear: ascending major arpeggio.
    fn gen_clear() -> Vec<f32> {
        let mut s = Vec::new();
        for &freq in &[523.0f32, 659.0, 784.0, 1047.0] {
            s.extend(tone(freq, 0.1, 0.3));
        }
        s
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);

        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());

        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

#[cfg(not(feature = "sound"))]
mod inner {
    /// Stub engine when the sound feature is off.
    pub struct SoundEngine;

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            None
        }

        pub fn play_gem(&self) {}
        pub fn play_jump(&self) {}
        pub fn play_switch(&self) {}
        pub fn play_die(&self) {}
        pub fn play_clear(&self) {}
    }
}

pub use inner::SoundEngine;
