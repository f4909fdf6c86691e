//! Spring/damper rigid body driven by the two sensors
//!
//! Each sensor owns a simulated point that is pulled towards the measured
//! ("raw") sensor position by a spring and slowed by a damper. The raw points
//! are first projected onto a bar of the physical sensor spacing so the body
//! stays rigid. Integration is velocity Verlet.

use crate::math::{self, IDENTITY, Mat2f, Vec2f};
use crate::{SENSOR_DISTANCE, SENSOR_LEFT_OFFSET, SENSOR_RIGHT_OFFSET};
use itchy_protocol::SimulationParameters;

/// Share of the measured bar rotation applied to the body.
const ANGLE_GAIN: f32 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub position: Vec2f,
    pub velocity: Vec2f,
    pub angle: f32,
    pub angular_velocity: f32,
    pub rotation: Mat2f,
    pub position_left: Vec2f,
    pub position_right: Vec2f,
    pub raw_left: Vec2f,
    pub raw_right: Vec2f,
    pub velocity_left: Vec2f,
    pub velocity_right: Vec2f,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            velocity: [0.0, 0.0],
            angle: 0.0,
            angular_velocity: 0.0,
            rotation: IDENTITY,
            position_left: SENSOR_LEFT_OFFSET,
            position_right: SENSOR_RIGHT_OFFSET,
            raw_left: SENSOR_LEFT_OFFSET,
            raw_right: SENSOR_RIGHT_OFFSET,
            velocity_left: [0.0, 0.0],
            velocity_right: [0.0, 0.0],
        }
    }
}

impl RigidBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the rest pose at the origin.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Re-seat both sensors at their rest offsets around the current
    /// position, e.g. after the device was lifted and put down again.
    pub fn reset_rotation(&mut self) {
        self.position_left = math::add(SENSOR_LEFT_OFFSET, self.position);
        self.position_right = math::add(SENSOR_RIGHT_OFFSET, self.position);
        self.raw_left = self.position_left;
        self.raw_right = self.position_right;
    }

    /// Advance by `dt` seconds after the sensors moved by `delta_left` and
    /// `delta_right` (sensor frame, metres).
    pub fn step(
        &mut self,
        delta_left: Vec2f,
        delta_right: Vec2f,
        params: &SimulationParameters,
        dt: f32,
    ) {
        let inverse_mass = 1.0 / params.mass;

        self.raw_left = math::add(self.raw_left, math::mul_mat(&self.rotation, delta_left));
        self.raw_right = math::add(self.raw_right, math::mul_mat(&self.rotation, delta_right));
        self.project_raw();

        let accel = |position: Vec2f, raw: Vec2f, velocity: Vec2f| {
            let spring = math::scale(math::sub(position, raw), params.stiffness);
            let damper = math::scale(velocity, params.damping);
            math::scale(math::add(spring, damper), inverse_mass)
        };

        let accel_left = accel(self.position_left, self.raw_left, self.velocity_left);
        let accel_right = accel(self.position_right, self.raw_right, self.velocity_right);

        let half_left = math::sub(self.velocity_left, math::scale(accel_left, 0.5 * dt));
        let half_right = math::sub(self.velocity_right, math::scale(accel_right, 0.5 * dt));

        self.position_left = math::add(self.position_left, math::scale(half_left, dt));
        self.position_right = math::add(self.position_right, math::scale(half_right, dt));

        let accel_left = accel(self.position_left, self.raw_left, half_left);
        let accel_right = accel(self.position_right, self.raw_right, half_right);

        self.velocity_left = math::sub(half_left, math::scale(accel_left, 0.5 * dt));
        self.velocity_right = math::sub(half_right, math::scale(accel_right, 0.5 * dt));

        self.update_pose();
    }

    fn project_raw(&mut self) {
        let center = math::scale(math::add(self.raw_left, self.raw_right), 0.5);
        let Some(direction) = math::normalized(math::sub(self.raw_left, self.raw_right)) else {
            return;
        };
        let half_bar = math::scale(direction, SENSOR_DISTANCE * 0.5);
        self.raw_left = math::add(center, half_bar);
        self.raw_right = math::sub(center, half_bar);
    }

    fn update_pose(&mut self) {
        let bar = math::sub(self.position_left, self.position_right);

        self.position = math::scale(math::add(self.position_left, self.position_right), 0.5);
        self.angle = ANGLE_GAIN * (bar[1].atan2(bar[0]) - crate::static_angle());
        self.rotation = math::rotation(self.angle);

        self.velocity = math::add(self.velocity_left, self.velocity_right);
        self.angular_velocity = math::cross([0.0, SENSOR_DISTANCE * 0.5], self.velocity_left)
            + math::cross([0.0, -SENSOR_DISTANCE * 0.5], self.velocity_right);
    }
}
