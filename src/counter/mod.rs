pub mod angles;
pub mod driver;
pub mod host;
pub mod presence;
pub mod similarity;
pub mod worker;

pub use angles::{extract_joint_angles, AngleRow, JointAngles};
pub use driver::{Feedback, FrameOutput, FrameStatus, LungeSession};
pub use host::{ExerciseRepCounter, RecordingHost, RepCounterHost};
pub use presence::PresenceFilter;
pub use similarity::TemplateScorer;
pub use worker::{Baseline, LungeWorker};
