// rotorgym-dynamics: Closed-form quadrotor dynamics for 1D, 2D and 3D fidelity.

pub mod model;
pub mod params;
pub mod rotation;
pub mod vehicle;

pub use model::{DynamicsModel, cost_weight_matrix};
pub use params::VehicleParams;
pub use vehicle::VehicleDynamics;
