//! Browser audio: looping `<audio>` tracks from the extension bundle and
//! synthesized WebAudio cues.

use std::collections::HashMap;

use tracing::warn;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{AudioContext, AudioContextState, HtmlAudioElement};

use crate::core::host::{AudioSink, Cue, HostError, Track, soften};

use super::js_reason;

/// Gain floor for exponential ramps; WebAudio rejects a zero target.
const RAMP_FLOOR: f32 = 0.01;

/// Volume bookkeeping for the one track that may be playing.
#[derive(Debug, Default)]
struct Mix {
    current: Option<(Track, f64)>,
    muted: bool,
}

impl Mix {
    fn level(&self, volume: f64) -> f64 {
        if self.muted { 0.0 } else { volume }
    }

    /// Remember `volume` as the track's own level and return what to apply now.
    fn start(&mut self, track: Track, volume: f64) -> f64 {
        self.current = Some((track, volume));
        self.level(volume)
    }

    fn stop(&mut self) {
        self.current = None;
    }

    /// The playing track and the level it should now be heard at.
    fn set_muted(&mut self, muted: bool) -> Option<(Track, f64)> {
        self.muted = muted;
        self.current.map(|(track, volume)| (track, self.level(volume)))
    }
}

type Rejection = Closure<dyn FnMut(JsValue)>;

pub struct WebAudio {
    asset_base: String,
    tracks: HashMap<Track, HtmlAudioElement>,
    mix: Mix,
    synth: Option<AudioContext>,
    rejected: Option<Rejection>,
}

impl WebAudio {
    /// `asset_base` is the bundle URL prefix, e.g. the extension's root URL.
    pub fn new(asset_base: impl Into<String>) -> Self {
        Self { asset_base: asset_base.into(), tracks: HashMap::new(), mix: Mix::default(), synth: None, rejected: None }
    }

    fn element(&mut self, track: Track) -> Result<HtmlAudioElement, HostError> {
        if let Some(el) = self.tracks.get(&track) {
            return Ok(el.clone());
        }
        let url = asset_url(&self.asset_base, track.asset_path());
        let el = HtmlAudioElement::new_with_src(&url).map_err(|e| audio_err(track.name(), e))?;
        el.set_loop(track.looping());
        self.tracks.insert(track, el.clone());
        Ok(el)
    }

    /// Handler for promises the browser may reject later (autoplay policy,
    /// a context that cannot resume). Built on first use and kept for the
    /// sink's lifetime.
    fn on_rejected(&mut self) -> &Rejection {
        self.rejected.get_or_insert_with(|| {
            Closure::wrap(Box::new(|e: JsValue| {
                warn!(reason = %js_reason(e), "browser refused audio playback");
            }) as Box<dyn FnMut(JsValue)>)
        })
    }

    /// Created on first use; browsers only allow it after a user gesture.
    fn synth(&mut self) -> Result<AudioContext, HostError> {
        let ctx = match &self.synth {
            Some(ctx) => ctx.clone(),
            None => {
                let ctx = AudioContext::new().map_err(|e| audio_err("context", e))?;
                self.synth = Some(ctx.clone());
                ctx
            }
        };
        if ctx.state() == AudioContextState::Suspended {
            let resumed = ctx.resume().map_err(|e| audio_err("context", e))?;
            let _ = resumed.catch(self.on_rejected());
        }
        Ok(ctx)
    }
}

fn asset_url(base: &str, path: &str) -> String {
    if base.is_empty() || base.ends_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn audio_err(name: &'static str, e: JsValue) -> HostError {
    HostError::Audio { name, reason: js_reason(e) }
}

impl AudioSink for WebAudio {
    fn play_cue(&mut self, cue: Cue) -> Result<(), HostError> {
        let name = cue.name();
        let ctx = self.synth()?;
        let start = ctx.current_time();
        for tone in cue.tones() {
            let osc = ctx.create_oscillator().map_err(|e| audio_err(name, e))?;
            let gain = ctx.create_gain().map_err(|e| audio_err(name, e))?;
            osc.connect_with_audio_node(&gain).map_err(|e| audio_err(name, e))?;
            gain.connect_with_audio_node(&ctx.destination()).map_err(|e| audio_err(name, e))?;

            let at = start + tone.offset;
            let end = at + tone.secs;
            let freq = osc.frequency();
            freq.set_value_at_time(tone.from_hz as f32, at).map_err(|e| audio_err(name, e))?;
            if tone.to_hz != tone.from_hz {
                freq.exponential_ramp_to_value_at_time(tone.to_hz as f32, end).map_err(|e| audio_err(name, e))?;
            }
            let level = gain.gain();
            level.set_value_at_time(tone.gain as f32, at).map_err(|e| audio_err(name, e))?;
            level.exponential_ramp_to_value_at_time(RAMP_FLOOR, end).map_err(|e| audio_err(name, e))?;

            osc.start_with_when(at).map_err(|e| audio_err(name, e))?;
            osc.stop_with_when(end).map_err(|e| audio_err(name, e))?;
        }
        Ok(())
    }

    fn play_track(&mut self, track: Track, volume: f64) -> Result<(), HostError> {
        soften("stop audio", self.stop_all());
        let el = self.element(track)?;
        el.set_volume(self.mix.start(track, volume));
        el.set_current_time(0.0);
        let playing = el.play().map_err(|e| audio_err(track.name(), e))?;
        let _ = playing.catch(self.on_rejected());
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), HostError> {
        self.mix.stop();
        let mut failed = None;
        for (track, el) in &self.tracks {
            if let Err(e) = el.pause() {
                failed.get_or_insert_with(|| audio_err(track.name(), e));
            }
            el.set_current_time(0.0);
        }
        failed.map_or(Ok(()), Err)
    }

    fn set_muted(&mut self, muted: bool) {
        if let Some((track, level)) = self.mix.set_muted(muted) {
            if let Some(el) = self.tracks.get(&track) {
                el.set_volume(level);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mix, asset_url};
    use crate::core::host::Track;

    #[test]
    fn asset_urls_join_with_one_slash() {
        assert_eq!(asset_url("chrome-extension://abc/", "audio/x.mp3"), "chrome-extension://abc/audio/x.mp3");
        assert_eq!(asset_url("chrome-extension://abc", "audio/x.mp3"), "chrome-extension://abc/audio/x.mp3");
        assert_eq!(asset_url("", "audio/x.mp3"), "audio/x.mp3");
    }

    #[test]
    fn unmuting_restores_a_track_started_while_muted() {
        let mut mix = Mix::default();
        assert_eq!(mix.set_muted(true), None);
        assert_eq!(mix.start(Track::BossBattle, 0.6), 0.0);
        assert_eq!(mix.set_muted(false), Some((Track::BossBattle, 0.6)));
    }

    #[test]
    fn stopped_track_is_not_resumed_by_unmute() {
        let mut mix = Mix::default();
        mix.start(Track::ParadeSong, 0.5);
        mix.stop();
        assert_eq!(mix.set_muted(false), None);
    }
}
