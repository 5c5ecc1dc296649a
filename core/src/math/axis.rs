//! Axis

use std::ops::Add;

/// Axis enumeration
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Axis {
    #[default]
    X = 0,
    Y = 1,
    Z = 2,
}

impl From<usize> for Axis {
    fn from(i: usize) -> Self {
        match i {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => panic!("invalid axis value"),
        }
    }
}

impl From<u8> for Axis {
    fn from(i: u8) -> Self {
        Axis::from(i as usize)
    }
}

impl From<Axis> for u8 {
    fn from(axis: Axis) -> Self {
        axis as u8
    }
}

impl From<Axis> for usize {
    fn from(axis: Axis) -> usize {
        axis as usize
    }
}

impl Add<usize> for Axis {
    type Output = Axis;
    fn add(self, i: usize) -> Self::Output {
        Axis::from((self as usize + i) % 3)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_around_z() {
        assert_eq!(Axis::Z + 1, Axis::X);
        assert_eq!(Axis::Y + 2, Axis::X);
        assert_eq!(Axis::X + 1, Axis::Y);
    }

    #[test]
    fn conversions_round_trip() {
        for i in 0..3_usize {
            assert_eq!(usize::from(Axis::from(i)), i);
            assert_eq!(u8::from(Axis::from(i as u8)), i as u8);
        }
    }

    #[test]
    #[should_panic]
    #[allow(unused)]
    fn invalid_axis_panics() {
        let a = Axis::from(3_usize);
    }
}
