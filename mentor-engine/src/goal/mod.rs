//! Learning goals: the blueprint and how it is elicited.

pub mod blueprint;
pub mod elicitor;

pub use blueprint::{BlueprintStatus, BlueprintUpdate, LearningBlueprint, LearningStyle, Level};
pub use elicitor::{BlueprintElicitor, ContentAnalysis, Elicitation, Intent};
