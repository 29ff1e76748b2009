//! Reference physics for rotorgym.
//!
//! [`RigidBodyEngine`] implements [`PhysicsEngine`](rotorgym_core::traits::PhysicsEngine)
//! for one quadrotor among static gates and obstacles, and [`PwmMotorMap`]
//! converts thrust commands into rotor speeds through the motor PWM range.

pub mod engine;
pub mod geometry;
pub mod motor;

pub use engine::{GATE_BAR_RADIUS, RigidBodyEngine, VEHICLE_RADIUS};
pub use geometry::Capsule;
pub use motor::PwmMotorMap;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{engine::RigidBodyEngine, geometry::Capsule, motor::PwmMotorMap};
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotorgym_core::traits::{PhysicsEngine, ThrustToRpm};

    #[test]
    fn engine_and_motor_map_are_send() {
        fn assert_send<T: Send>() {}
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send::<RigidBodyEngine>();
        assert_send_sync::<PwmMotorMap>();
    }

    #[test]
    fn usable_as_trait_objects() {
        let config = rotorgym_core::config::VehicleConfig::default();
        let engine: Box<dyn PhysicsEngine> = Box::new(RigidBodyEngine::from_vehicle(&config));
        let motors: Box<dyn ThrustToRpm> = Box::new(PwmMotorMap::from_vehicle(&config));
        assert_eq!(engine.name(), "rigid_body");
        assert!(motors.thrust_limits(4).0 > 0.0);
    }
}
