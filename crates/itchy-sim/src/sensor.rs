//! Optical motion sensor with two-step calibration

use crate::math::{self, Mat2f, Vec2f};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Counts per metre of an uncalibrated sensor at 1800 cpi.
const NOMINAL_COUNTS_PER_METRE: f32 = 1800.0 / 0.0254;

/// Correction of a single sensor.
///
/// `alpha` holds cosine and sine of the mounting rotation, `scale` converts
/// counts to metres per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorCalibration {
    pub alpha: [f32; 2],
    pub scale: [f32; 2],
}

impl Default for SensorCalibration {
    /// Placeholder the firmware ships with until the first calibration run.
    fn default() -> Self {
        Self {
            alpha: [0.0, 1.0],
            scale: [1.0, 1.0],
        }
    }
}

impl SensorCalibration {
    /// Unrotated sensor at nominal resolution.
    pub fn nominal() -> Self {
        let scale = 1.0 / NOMINAL_COUNTS_PER_METRE;
        Self {
            alpha: [1.0, 0.0],
            scale: [scale, scale],
        }
    }

    fn correction(&self) -> Mat2f {
        let [a0, a1] = self.alpha;
        [a0, a1, -a1, a0]
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    flip_x: bool,
    flip_y: bool,
    integrated: [i64; 2],
    calibration: SensorCalibration,
    correction: Mat2f,
    target: Vec2f,
    lifted: bool,
}

impl Sensor {
    pub fn new(flip_x: bool, flip_y: bool) -> Self {
        let calibration = SensorCalibration::default();
        Self {
            flip_x,
            flip_y,
            integrated: [0, 0],
            calibration,
            correction: calibration.correction(),
            target: crate::DEFAULT_CALIBRATION_TARGET,
            lifted: false,
        }
    }

    pub fn calibration(&self) -> SensorCalibration {
        self.calibration
    }

    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.calibration = calibration;
        self.correction = calibration.correction();
        self.reset();
    }

    pub fn calibration_target(&self) -> Vec2f {
        self.target
    }

    pub fn set_calibration_target(&mut self, target: Vec2f) {
        self.target = target;
    }

    pub fn is_lifted(&self) -> bool {
        self.lifted
    }

    pub fn set_lifted(&mut self, lifted: bool) {
        self.lifted = lifted;
    }

    /// Accumulate one motion report and return its calibrated displacement
    /// in metres. A lifted sensor reports no motion.
    pub fn integrate(&mut self, counts: [i16; 2]) -> Vec2f {
        if self.lifted {
            return [0.0, 0.0];
        }

        let mut delta = [i64::from(counts[0]), i64::from(counts[1])];
        if self.flip_x {
            delta[0] = -delta[0];
        }
        if self.flip_y {
            delta[1] = -delta[1];
        }

        self.integrated[0] += delta[0];
        self.integrated[1] += delta[1];

        let scaled = [
            delta[0] as f32 * self.calibration.scale[0],
            delta[1] as f32 * self.calibration.scale[1],
        ];
        math::mul_mat(&self.correction, scaled)
    }

    /// Calibrated position of all counts since the last reset.
    pub fn absolute_position(&self) -> Vec2f {
        let scaled = [
            self.integrated[0] as f32 * self.calibration.scale[0],
            self.integrated[1] as f32 * self.calibration.scale[1],
        ];
        math::mul_mat(&self.correction, scaled)
    }

    pub fn raw_position(&self) -> [i64; 2] {
        self.integrated
    }

    pub fn reset(&mut self) {
        self.integrated = [0, 0];
    }

    /// Sensor counts that `integrate` turns into `displacement`, rounded to
    /// whole counts. `None` when the calibration cannot be inverted.
    pub fn counts_for(&self, displacement: Vec2f) -> Option<[i64; 2]> {
        let [a0, a1] = self.calibration.alpha;
        let det = a0 * a0 + a1 * a1;
        let [sx, sy] = self.calibration.scale;
        if det <= f32::EPSILON || sx == 0.0 || sy == 0.0 {
            return None;
        }

        let inverse = [a0 / det, -a1 / det, a1 / det, a0 / det];
        let scaled = math::mul_mat(&inverse, displacement);
        let mut counts = [
            (scaled[0] / sx).round() as i64,
            (scaled[1] / sy).round() as i64,
        ];
        if self.flip_x {
            counts[0] = -counts[0];
        }
        if self.flip_y {
            counts[1] = -counts[1];
        }
        Some(counts)
    }

    pub fn calibration_start(&mut self) {
        self.reset();
    }

    /// Finish the horizontal stroke: the integrated direction defines the
    /// mounting rotation and its length the X scale.
    pub fn calibration_finish_x(&mut self) {
        let measured = [self.integrated[0] as f32, self.integrated[1] as f32];
        match math::normalized(measured) {
            Some(direction) => {
                let unit_x = [1.0, 0.0];
                self.calibration.alpha = [math::dot(unit_x, direction), math::cross(unit_x, direction)];
                self.correction = self.calibration.correction();
                self.calibration.scale[0] =
                    self.correction[0] * self.target[0] / math::len(measured);
                debug!(alpha = ?self.calibration.alpha, scale_x = self.calibration.scale[0], "Calibrated X axis");
            }
            None => warn!("No motion recorded during X calibration, keeping previous values"),
        }
        self.reset();
    }

    /// Finish the vertical stroke: its length defines the Y scale.
    pub fn calibration_finish_y(&mut self) {
        let measured = [self.integrated[0] as f32, self.integrated[1] as f32];
        let length = math::len(measured);
        if length > f32::EPSILON {
            self.calibration.scale[1] = self.correction[0] * self.target[1] / length;
            debug!(scale_y = self.calibration.scale[1], "Calibrated Y axis");
        } else {
            warn!("No motion recorded during Y calibration, keeping previous values");
        }
        self.reset();
    }
}
