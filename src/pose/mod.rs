pub mod landmark;

pub use landmark::{Landmark, LandmarkIndex, Pose, PoseFrame, TRACKED_JOINTS};
