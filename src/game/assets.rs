//! Character asset import.
//!
//! Loading runs on a background thread and reports exactly once through a
//! channel. The frame loop polls the channel each tick and activates the
//! player the first time a result arrives.

use crossbeam_channel::{Receiver, TryRecvError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

use super::constants::animation::FALLBACK_CLIP_LENGTH;
use crate::config::ClipNames;

/// One animation clip available on the character.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub name: String,
    /// Seconds
    pub duration: f32,
}

/// Skeleton and clips imported from a character model.
#[derive(Debug, Clone)]
pub struct CharacterAsset {
    pub path: PathBuf,
    /// Joint names of the first skin, in skin order
    pub joint_names: Vec<String>,
    pub clips: HashMap<String, ClipInfo>,
}

impl CharacterAsset {
    /// A model-less character carrying the configured locomotion clips.
    pub fn placeholder(clips: &ClipNames) -> Self {
        let names = [&clips.idle, &clips.walk, &clips.run, &clips.run_back, &clips.jump];
        let clips = names
            .into_iter()
            .map(|name| {
                (
                    name.clone(),
                    ClipInfo {
                        name: name.clone(),
                        duration: FALLBACK_CLIP_LENGTH,
                    },
                )
            })
            .collect();
        Self {
            path: PathBuf::new(),
            joint_names: Vec::new(),
            clips,
        }
    }

    pub fn clip_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug)]
pub enum AssetError {
    Import(PathBuf, gltf::Error),
    /// The model has no skin to animate
    NoSkeleton(PathBuf),
    /// The loader thread exited without reporting
    Disconnected(PathBuf),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Import(path, e) => write!(f, "Failed to import {}: {}", path.display(), e),
            AssetError::NoSkeleton(path) => write!(f, "{} has no skinned skeleton", path.display()),
            AssetError::Disconnected(path) => {
                write!(f, "Loader for {} exited without a result", path.display())
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Import(_, e) => Some(e),
            AssetError::NoSkeleton(_) | AssetError::Disconnected(_) => None,
        }
    }
}

/// Imports the skeleton joint names and every animation clip from a glTF/GLB file.
pub fn load_character(path: &Path) -> Result<CharacterAsset, AssetError> {
    let (doc, buffers, _images) =
        gltf::import(path).map_err(|e| AssetError::Import(path.to_path_buf(), e))?;

    let skin = doc
        .skins()
        .next()
        .ok_or_else(|| AssetError::NoSkeleton(path.to_path_buf()))?;
    let joint_names = skin
        .joints()
        .map(|j| j.name().unwrap_or("").to_string())
        .collect();

    let mut clips = HashMap::new();
    for anim in doc.animations() {
        let name = anim.name().unwrap_or("").to_string();
        let mut duration = 0.0f32;
        for ch in anim.channels() {
            let rdr = ch.reader(|b| buffers.get(b.index()).map(|bb| bb.0.as_slice()));
            let Some(inputs) = rdr.read_inputs() else {
                continue;
            };
            if let Some(last) = inputs.last() {
                duration = duration.max(last);
            }
        }
        if duration <= 0.0 {
            duration = FALLBACK_CLIP_LENGTH;
        }
        clips.insert(name.clone(), ClipInfo { name, duration });
    }

    Ok(CharacterAsset {
        path: path.to_path_buf(),
        joint_names,
        clips,
    })
}

/// A character load in flight.
pub struct PendingCharacter {
    path: PathBuf,
    rx: Receiver<Result<CharacterAsset, AssetError>>,
}

impl PendingCharacter {
    /// Wraps an existing result channel.
    pub fn from_receiver(path: PathBuf, rx: Receiver<Result<CharacterAsset, AssetError>>) -> Self {
        Self { path, rx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking check for the load result.
    pub fn poll(&self) -> Option<Result<CharacterAsset, AssetError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AssetError::Disconnected(self.path.clone()))),
        }
    }

    /// Blocks until the load reports.
    pub fn wait(self) -> Result<CharacterAsset, AssetError> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(AssetError::Disconnected(self.path.clone())))
    }
}

/// Starts loading `path` on a background thread.
pub fn spawn_character_load(path: PathBuf) -> PendingCharacter {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let thread_path = path.clone();
    thread::spawn(move || {
        let result = load_character(&thread_path);
        // Receiver may already be gone if the scene was dropped.
        let _ = tx.send(result);
    });
    PendingCharacter::from_receiver(path, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_has_locomotion_clips() {
        let clips = ClipNames::default();
        let asset = CharacterAsset::placeholder(&clips);
        assert_eq!(asset.clips.len(), 5);
        assert!(asset.clips.contains_key("Jump"));
        assert_eq!(asset.clips["CharacterArmature|Run"].duration, FALLBACK_CLIP_LENGTH);
    }

    #[test]
    fn test_missing_file_fails_once() {
        let pending = spawn_character_load(PathBuf::from("/nonexistent/model.glb"));
        let result = pending.wait();
        assert!(matches!(result, Err(AssetError::Import(..))));
    }

    #[test]
    fn test_poll_reports_pending_then_result() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let pending = PendingCharacter::from_receiver(PathBuf::from("p.glb"), rx);
        assert!(pending.poll().is_none());

        tx.send(Ok(CharacterAsset::placeholder(&ClipNames::default()))).unwrap();
        assert!(matches!(pending.poll(), Some(Ok(_))));
    }

    #[test]
    fn test_dropped_loader_reports_disconnected() {
        let (tx, rx) = crossbeam_channel::bounded::<Result<CharacterAsset, AssetError>>(1);
        drop(tx);
        let pending = PendingCharacter::from_receiver(PathBuf::from("p.glb"), rx);
        assert!(matches!(pending.poll(), Some(Err(AssetError::Disconnected(_)))));
    }

    #[test]
    fn test_model_without_skin_is_rejected() {
        let path = std::env::temp_dir().join(format!("roomwalk_noskin_{}.gltf", std::process::id()));
        std::fs::write(&path, r#"{"asset":{"version":"2.0"}}"#).unwrap();

        let result = load_character(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(AssetError::NoSkeleton(_))));
    }
}
