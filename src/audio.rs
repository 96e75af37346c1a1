use std::time::{Duration, Instant};

use fundsp::prelude32::*;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

// ── Flap cadence ────────────────────────────────────────────────────────────

/// Clicks-per-second from the latest two flap timestamps. No history beyond
/// the last interval is kept.
#[derive(Debug, Default)]
pub struct FlapCadence {
    last_flap_ms: Option<u64>,
    pub clicks_per_second: f64,
}

impl FlapCadence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last_flap_ms = None;
        self.clicks_per_second = 0.0;
    }

    /// Record a flap at `now_ms`. Returns the new speed once two timestamps
    /// exist; the very first flap of a round only arms the measurement.
    pub fn record(&mut self, now_ms: u64) -> Option<f64> {
        let speed = match self.last_flap_ms {
            Some(prev) if now_ms > prev => Some(1000.0 / (now_ms - prev) as f64),
            _ => None,
        };
        self.last_flap_ms = Some(now_ms);
        if let Some(s) = speed {
            self.clicks_per_second = s;
        }
        speed
    }
}

/// Six fixed bands, 0.3x for a near-idle player up to 2.0x for frantic
/// clicking. Applied to the music filter cutoff, never to gameplay.
pub fn pitch_factor(speed: f64) -> f64 {
    if speed <= 0.5 {
        0.3
    } else if speed <= 1.0 {
        0.5
    } else if speed <= 2.0 {
        0.8
    } else if speed <= 3.0 {
        1.2
    } else if speed <= 4.0 {
        1.6
    } else {
        2.0
    }
}

/// Volume fades as the cadence rises, floored at 0.1.
pub fn volume_factor(speed: f64) -> f64 {
    (1.0 - speed / 8.0).max(0.1)
}

pub fn cutoff_hz(speed: f64) -> f64 {
    2000.0 * pitch_factor(speed)
}

/// Dashboard label for the current band.
pub fn band_label(speed: f64) -> &'static str {
    if speed <= 0.5 {
        "Very Low"
    } else if speed <= 1.0 {
        "Low"
    } else if speed <= 2.0 {
        "Medium-Low"
    } else if speed <= 3.0 {
        "Medium-High"
    } else if speed <= 4.0 {
        "High"
    } else {
        "Very High"
    }
}

// ── Synth playback ──────────────────────────────────────────────────────────

const SAMPLE_RATE: u32 = 44_100;

/// Adapts a fundsp graph into a rodio source. `remaining = None` loops
/// forever (the background track); one-shots carry a sample budget.
struct SynthSource {
    unit: Box<dyn AudioUnit + Send>,
    remaining: Option<usize>,
}

impl SynthSource {
    fn new(mut unit: Box<dyn AudioUnit + Send>, duration: Option<Duration>) -> Self {
        unit.set_sample_rate(SAMPLE_RATE as f64);
        let remaining = duration.map(|d| (d.as_secs_f64() * SAMPLE_RATE as f64) as usize);
        Self { unit, remaining }
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if let Some(n) = &mut self.remaining {
            if *n == 0 {
                return None;
            }
            *n -= 1;
        }
        Some(self.unit.get_mono())
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// All sound lives behind this. If the output device is missing or refuses
/// to open, every method is a silent no-op: audio must never block a tick.
pub struct AudioEngine {
    out: Option<(OutputStream, OutputStreamHandle)>,
    music: Option<Sink>,
    music_started: Option<Instant>,
}

impl AudioEngine {
    pub fn new(muted: bool) -> Self {
        let out = if muted {
            None
        } else {
            match OutputStream::try_default() {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!("audio unavailable, continuing silent: {e}");
                    None
                }
            }
        };
        Self {
            out,
            music: None,
            music_started: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.out.is_some()
    }

    /// Fire-and-forget a short graph; the sink detaches and is collected
    /// after its envelope dies out.
    fn one_shot(&self, unit: Box<dyn AudioUnit + Send>, duration: Duration) {
        let Some((_, handle)) = &self.out else {
            return;
        };
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(SynthSource::new(unit, Some(duration)));
                sink.detach();
            }
            Err(e) => debug!("dropped sound effect: {e}"),
        }
    }

    pub fn play_flap(&self) {
        // Quiet blip so it sits under the music.
        let gain = lfo(|t: f32| lerp(0.08, 0.0, (t / 0.05).min(1.0)));
        self.one_shot(
            Box::new(sine_hz(800.0) * gain),
            Duration::from_millis(60),
        );
    }

    pub fn play_start(&self) {
        let gain = lfo(|t: f32| lerp(0.12, 0.0, (t / 0.2).min(1.0)));
        self.one_shot(
            Box::new(sine_hz(440.0) * gain),
            Duration::from_millis(220),
        );
    }

    /// Score chirp rises with the raw score.
    pub fn play_score(&self, raw_score: u32) {
        let freq = 1000.0 + raw_score as f32 * 50.0;
        let gain = lfo(|t: f32| lerp(0.1, 0.0, (t / 0.15).min(1.0)));
        self.one_shot(
            Box::new(triangle_hz(freq) * gain),
            Duration::from_millis(170),
        );
    }

    pub fn play_best(&self) {
        let gain = lfo(|t: f32| lerp(0.12, 0.0, (t / 0.3).min(1.0)));
        self.one_shot(
            Box::new(sine_hz(1200.0) * gain),
            Duration::from_millis(320),
        );
    }

    /// Falling sawtooth sweep for a crash.
    pub fn play_crash(&self) {
        let freq = lfo(|t: f32| lerp(200.0, 60.0, (t / 0.4).min(1.0)));
        let gain = lfo(|t: f32| lerp(0.15, 0.0, (t / 0.5).min(1.0)));
        self.one_shot(
            Box::new((freq >> saw()) * gain),
            Duration::from_millis(520),
        );
    }

    /// Start the background loop at neutral pitch and volume.
    pub fn start_music(&mut self) {
        self.stop_music();
        let Some((_, handle)) = &self.out else {
            return;
        };
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(SynthSource::new(music_graph(2000.0, 0.0), None));
                sink.set_volume(0.4);
                self.music = Some(sink);
                self.music_started = Some(Instant::now());
            }
            Err(e) => warn!("music unavailable: {e}"),
        }
    }

    /// Re-pitch the running track for the given flap cadence. The filter
    /// graph is rebuilt per adjustment; flaps are human-rate, not
    /// frame-rate, so the node churn is negligible.
    pub fn retune_music(&mut self, speed: f64) {
        if self.music.is_none() {
            return;
        }
        let Some((_, handle)) = &self.out else {
            return;
        };
        let beat = self
            .music_started
            .map(|t| t.elapsed().as_secs_f32() * STEPS_PER_SECOND)
            .unwrap_or(0.0);
        let cutoff = cutoff_hz(speed) as f32;
        let volume = (0.4 * volume_factor(speed)) as f32;
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(SynthSource::new(music_graph(cutoff, beat), None));
                sink.set_volume(volume);
                if let Some(old) = self.music.replace(sink) {
                    old.stop();
                }
                debug!(speed, cutoff, volume, "music retuned");
            }
            Err(e) => debug!("music retune dropped: {e}"),
        }
    }

    pub fn stop_music(&mut self) {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
        self.music_started = None;
    }

    pub fn music_playing(&self) -> bool {
        self.music.is_some()
    }
}

const STEPS_PER_SECOND: f32 = 4.0;

/// The looping backing track: a slow minor arpeggio under a low-pass whose
/// cutoff carries the cadence reaction. `start_beat` lets a rebuilt graph
/// pick up roughly where the old one left off.
fn music_graph(cutoff: f32, start_beat: f32) -> Box<dyn AudioUnit + Send> {
    let melody = lfo(move |t: f32| {
        const STEPS: [f32; 8] = [0.0, 3.0, 7.0, 12.0, 7.0, 3.0, 0.0, -5.0];
        let i = ((t * STEPS_PER_SECOND + start_beat) as usize) % STEPS.len();
        midi_hz(57.0 + STEPS[i])
    });
    let voice = (melody >> triangle()) * 0.5;
    Box::new(voice >> lowpass_hz(cutoff, 1.0))
}

// ── Tests ───────────────────────────────────────────────────────────────────
