// rotorgym-task: Goal states and reference trajectories.

pub mod reference;
pub mod trajectory;
pub mod transform;

pub use reference::TaskGoal;
pub use trajectory::{ParametricTrajectory, ReferenceTrajectory, TrajectoryGenerator};
pub use transform::PlaneProjection;
