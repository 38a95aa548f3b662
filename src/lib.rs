//! Roomwalk scene library
//!
//! A physics-driven character walking through a row of rooms: rapier3d
//! simulation, body-to-visual sync, a force-based player controller and a
//! locomotion animation state machine, tied together one tick at a time.

pub mod config;
pub mod game;
