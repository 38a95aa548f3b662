//! Animation tracks, the clip mixer, and the locomotion state machine.
//!
//! The state machine is driven by the same [`MovementIntent`] as the
//! character controller but keeps its own clock: playback advances by frame
//! time, not by simulation sub-steps.

use serde::Serialize;
use std::collections::HashMap;

use super::assets::CharacterAsset;
use super::input::MovementIntent;
use crate::config::{AnimationConfig, ClipNames};

/// Playback state for one clip.
#[derive(Debug, Clone)]
pub struct AnimationTrack {
    pub clip: String,
    pub length: f32,
    pub looped: bool,
    pub speed: f32,
    pub time_position: f32,
    pub is_playing: bool,
    pub is_stopping: bool,
    pub weight_current: f32,
    pub weight_target: f32,
    pub fade_from: f32,
    pub fade_to: f32,
    pub fade_duration: f32,
    pub fade_elapsed: f32,
    /// Number of times this track was (re)started
    pub play_count: u32,
}

impl AnimationTrack {
    pub fn new(clip: impl Into<String>, length: f32) -> Self {
        Self {
            clip: clip.into(),
            length: length.max(0.01),
            looped: true,
            speed: 1.0,
            time_position: 0.0,
            is_playing: false,
            is_stopping: false,
            weight_current: 0.0,
            weight_target: 1.0,
            fade_from: 0.0,
            fade_to: 0.0,
            fade_duration: 0.0,
            fade_elapsed: 0.0,
            play_count: 0,
        }
    }

    /// Rewinds to time zero at full target weight and normal speed.
    pub fn reset(&mut self) {
        self.time_position = 0.0;
        self.speed = 1.0;
        self.weight_target = 1.0;
        self.is_stopping = false;
    }

    /// Starts playback. With `fade > 0` the weight ramps in from zero,
    /// otherwise it snaps to the target.
    pub fn play(&mut self, fade: f32) {
        let fade = fade.max(0.0);
        self.is_playing = true;
        self.is_stopping = false;
        self.play_count += 1;
        if fade > 0.0 {
            self.start_fade(0.0, self.weight_target, fade);
        } else {
            self.fade_duration = 0.0;
            self.fade_elapsed = 0.0;
            self.fade_from = self.weight_target;
            self.fade_to = self.weight_target;
            self.weight_current = self.weight_target;
        }
    }

    /// Fades the track out and stops it once its weight reaches zero.
    pub fn fade_out(&mut self, fade: f32) {
        if !self.is_playing && !self.is_stopping {
            return;
        }
        let fade = fade.max(0.0);
        self.weight_target = 0.0;
        if fade > 0.0 {
            self.is_stopping = true;
            self.start_fade(self.weight_current.max(0.0), 0.0, fade);
        } else {
            self.stop();
        }
    }

    pub fn stop(&mut self) {
        self.is_playing = false;
        self.is_stopping = false;
        self.weight_current = 0.0;
        self.weight_target = 0.0;
        self.fade_duration = 0.0;
        self.fade_elapsed = 0.0;
    }

    fn start_fade(&mut self, from: f32, to: f32, duration: f32) {
        self.fade_from = from;
        self.fade_to = to;
        self.fade_duration = duration;
        self.fade_elapsed = 0.0;
        self.weight_current = from;
    }

    pub fn tick(&mut self, delta_time: f32) {
        let dt = delta_time.max(0.0);
        if !self.is_playing && !self.is_stopping {
            return;
        }

        if self.fade_duration > 0.0 {
            self.fade_elapsed = (self.fade_elapsed + dt).min(self.fade_duration);
            let alpha = (self.fade_elapsed / self.fade_duration).clamp(0.0, 1.0);
            self.weight_current = self.fade_from + (self.fade_to - self.fade_from) * alpha;
            if (self.fade_duration - self.fade_elapsed).abs() <= f32::EPSILON {
                self.fade_duration = 0.0;
                self.fade_elapsed = 0.0;
                self.weight_current = self.fade_to;
            }
        } else {
            self.weight_current = self.weight_target.max(0.0);
        }
        self.weight_current = self.weight_current.max(0.0);

        if self.is_playing {
            self.time_position += dt * self.speed.max(0.0);
            if self.time_position >= self.length {
                if self.looped {
                    self.time_position %= self.length;
                } else {
                    self.time_position = self.length;
                    self.stop();
                    return;
                }
            }
        }

        if self.is_stopping && self.weight_current <= 0.0001 {
            self.stop();
        }
    }
}

/// Owns one track per loaded clip.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    tracks: HashMap<String, AnimationTrack>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_asset(asset: &CharacterAsset) -> Self {
        let mut mixer = Self::new();
        for clip in asset.clips.values() {
            mixer.add_clip(&clip.name, clip.duration);
        }
        mixer
    }

    pub fn add_clip(&mut self, name: &str, length: f32) {
        self.tracks
            .insert(name.to_string(), AnimationTrack::new(name, length));
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.tracks.contains_key(name)
    }

    pub fn track(&self, name: &str) -> Option<&AnimationTrack> {
        self.tracks.get(name)
    }

    pub fn clip_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tracks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Starts `name` directly with no blend source.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(track) = self.tracks.get_mut(name) else {
            return false;
        };
        track.reset();
        track.play(0.0);
        true
    }

    /// Resets and plays `to`, blending it in over `duration` while `from`
    /// fades out.
    pub fn crossfade(&mut self, from: &str, to: &str, duration: f32) -> bool {
        if !self.tracks.contains_key(to) {
            return false;
        }
        if let Some(old) = self.tracks.get_mut(from) {
            old.fade_out(duration);
        }
        if let Some(new) = self.tracks.get_mut(to) {
            new.reset();
            new.play(duration);
        }
        true
    }

    /// Advances every track by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for track in self.tracks.values_mut() {
            track.tick(dt);
        }
    }

    /// Tracks currently contributing to the pose.
    pub fn active_tracks(&self) -> impl Iterator<Item = &AnimationTrack> {
        self.tracks
            .values()
            .filter(|t| t.is_playing || t.is_stopping)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LocomotionState {
    Idle,
    Walk,
    Run,
    RunBack,
    Jump,
}

/// Locomotion states by priority; the first whose condition holds wins and
/// Idle is the fallback.
const STATE_PRIORITY: [(LocomotionState, fn(&MovementIntent) -> bool); 4] = [
    (LocomotionState::Jump, is_jumping),
    (LocomotionState::Run, is_running_forward),
    (LocomotionState::Walk, is_walking_forward),
    (LocomotionState::RunBack, is_moving_backward),
];

fn is_jumping(intent: &MovementIntent) -> bool {
    intent.jump
}

fn is_running_forward(intent: &MovementIntent) -> bool {
    intent.forward && intent.sprint
}

fn is_walking_forward(intent: &MovementIntent) -> bool {
    intent.forward
}

fn is_moving_backward(intent: &MovementIntent) -> bool {
    intent.backward
}

impl LocomotionState {
    pub fn from_intent(intent: &MovementIntent) -> Self {
        STATE_PRIORITY
            .iter()
            .find(|(_, holds)| holds(intent))
            .map(|(state, _)| *state)
            .unwrap_or(LocomotionState::Idle)
    }

    pub fn clip_name(self, clips: &ClipNames) -> &str {
        match self {
            LocomotionState::Idle => &clips.idle,
            LocomotionState::Walk => &clips.walk,
            LocomotionState::Run => &clips.run,
            LocomotionState::RunBack => &clips.run_back,
            LocomotionState::Jump => &clips.jump,
        }
    }
}

/// Outcome of one state machine evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Computed state matches the active one
    Unchanged,
    /// First clip, started without a blend source
    Started(LocomotionState),
    Crossfaded {
        from: LocomotionState,
        to: LocomotionState,
    },
    /// The target clip is not loaded; the active state is kept
    Skipped(LocomotionState),
}

pub struct AnimationStateMachine {
    clips: ClipNames,
    fade_time: f32,
    current: Option<LocomotionState>,
    mixer: AnimationMixer,
}

impl AnimationStateMachine {
    pub fn new(mixer: AnimationMixer, config: &AnimationConfig) -> Self {
        let machine = Self {
            clips: config.clips.clone(),
            fade_time: config.fade_time,
            current: None,
            mixer,
        };
        log::debug!("[Animation] clips available: {:?}", machine.mixer.clip_names());
        machine
    }

    pub fn current_state(&self) -> Option<LocomotionState> {
        self.current
    }

    /// Clip name of the active state
    pub fn active_clip(&self) -> Option<&str> {
        self.current.map(|s| s.clip_name(&self.clips))
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    /// Evaluates the transition for `intent` without advancing time.
    ///
    /// If the target clip is not loaded the machine stays in its current
    /// state and that clip keeps playing, so the next available state
    /// crossfades from it instead of starting cold.
    pub fn transition(&mut self, intent: &MovementIntent) -> Transition {
        let next = LocomotionState::from_intent(intent);
        if self.current == Some(next) {
            return Transition::Unchanged;
        }

        let to = next.clip_name(&self.clips);
        if !self.mixer.has_clip(to) {
            return Transition::Skipped(next);
        }

        let from = self
            .current
            .filter(|prev| self.mixer.has_clip(prev.clip_name(&self.clips)));
        let outcome = match from {
            Some(prev) => {
                let from_clip = prev.clip_name(&self.clips).to_string();
                let to_clip = to.to_string();
                self.mixer.crossfade(&from_clip, &to_clip, self.fade_time);
                Transition::Crossfaded { from: prev, to: next }
            }
            None => {
                let to_clip = to.to_string();
                self.mixer.play(&to_clip);
                Transition::Started(next)
            }
        };

        self.current = Some(next);
        outcome
    }

    /// Evaluates the transition, then advances playback by `dt`.
    pub fn advance(&mut self, intent: &MovementIntent, dt: f32) -> Transition {
        let outcome = self.transition(intent);
        self.mixer.update(dt);
        outcome
    }
}
