//! Pose model inference

pub mod pose;

pub use pose::{decode_predictions, DecodeParams, YoloPoseModel};
