//! Planar vector returned by position queries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for [f32; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Vec2({},{})>", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_of_3_4_is_5() {
        let v = Vec2::new(3.0, 4.0);
        assert!((v.length() - 5.0).abs() < f32::EPSILON);
        assert!((v.length_squared() - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_length() {
        assert!(Vec2::ZERO.length().abs() < f32::EPSILON);
        assert_eq!(Vec2::default(), Vec2::ZERO);
    }

    #[test]
    fn display_format() {
        assert_eq!(Vec2::new(0.5, -1.0).to_string(), "<Vec2(0.5,-1)>");
    }

    #[test]
    fn from_array() {
        let v = Vec2::from([1.0, 2.0]);
        assert_eq!(<[f32; 2]>::from(v), [1.0, 2.0]);
    }
}
