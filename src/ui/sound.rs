/// Sound engine: procedural chiptune effects via rodio.
///
/// All effects are rendered to in-memory WAV buffers once at startup.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Build without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

use crate::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Jump,
    WallJump,
    Land,
    Win,
    Lose,
    Select,
}

impl Sfx {
    pub const ALL: [Sfx; 6] = [Sfx::Jump, Sfx::WallJump, Sfx::Land, Sfx::Win, Sfx::Lose, Sfx::Select];

    /// Effect for a simulation event, if it has one.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::Jumped => Some(Sfx::Jump),
            GameEvent::WallJumped => Some(Sfx::WallJump),
            GameEvent::Landed => Some(Sfx::Land),
            GameEvent::LevelWon { .. } => Some(Sfx::Win),
            GameEvent::LevelLost { .. } => Some(Sfx::Lose),
            GameEvent::BumpedCeiling => None,
        }
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::{debug, warn};

    use super::Sfx;

    pub(super) const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Sfx, Arc<Vec<u8>>)>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "no audio output, sound disabled");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(make_wav(&render(sfx)))))
                .collect();
            debug!("sound effects rendered");
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some((_, buf)) = self.buffers.iter().find(|(s, _)| *s == sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Effects: mono f32 samples
    // ════════════════════════════════════════════════════════════

    pub(super) fn render(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::Jump => sweep(330.0, 660.0, 0.09, 0.22),
            Sfx::WallJump => {
                let mut s = sweep(440.0, 880.0, 0.05, 0.22);
                s.extend(sweep(660.0, 1320.0, 0.06, 0.22));
                s
            }
            Sfx::Land => thud(0.06),
            Sfx::Win => arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.09, 0.25),
            Sfx::Lose => arpeggio(&[392.0, 330.0, 262.0, 196.0], 0.12, 0.25),
            Sfx::Select => sweep(880.0, 880.0, 0.04, 0.18),
        }
    }

    /// Square-ish tone gliding linearly from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                let wave = (phase * TAU).sin() * 0.75 + (phase * 3.0 * TAU).sin() * 0.25;
                wave * (1.0 - t) * volume
            })
            .collect()
    }

    /// Low noise burst for landings.
    fn thud(duration: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0x2545_F491;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng ^= rng << 13;
                rng ^= rng >> 17;
                rng ^= rng << 5;
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let tone = (i as f32 / SAMPLE_RATE as f32 * 90.0 * TAU).sin();
                (tone * 0.6 + noise * 0.4) * (1.0 - t).powi(2) * 0.3
            })
            .collect()
    }

    /// Notes back to back with a short decay each; the last one rings out.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for (k, &freq) in notes.iter().enumerate() {
            let dur = if k + 1 == notes.len() { note_dur * 2.5 } else { note_dur };
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            samples.extend((0..n).map(|i| {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let wave = (ti * freq * TAU).sin() * 0.7 + (ti * freq * 2.0 * TAU).sin() * 0.3;
                wave * env * volume
            }));
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_to_effects() {
        assert_eq!(Sfx::for_event(&GameEvent::WallJumped), Some(Sfx::WallJump));
        assert_eq!(Sfx::for_event(&GameEvent::LevelLost { level: 2 }), Some(Sfx::Lose));
        assert_eq!(Sfx::for_event(&GameEvent::BumpedCeiling), None);
    }

    #[cfg(feature = "sound")]
    #[test]
    fn wav_header_matches_payload() {
        for sfx in Sfx::ALL {
            let samples = inner::render(sfx);
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));

            let wav = inner::make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size as usize, samples.len() * 2);
            assert_eq!(wav.len(), 44 + samples.len() * 2);
        }
    }
}
