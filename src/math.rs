use std::{
    array,
    ops::{Add, Neg, Sub},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Vec<T, const N: usize>([T; N]);

pub type Vec2<T> = Vec<T, 2>;
pub type Vec2f = Vec2<f32>;
/// Pixel coordinates. May lie outside the surface.
pub type Vec2i = Vec2<i32>;

impl<T: Copy> Vec2<T> {
    pub fn x(self) -> T {
        self.0[0]
    }

    pub fn y(self) -> T {
        self.0[1]
    }
}

impl<const N: usize> Vec<f32, N> {
    pub fn dist(self, other: Self) -> f32 {
        let mut sum = 0.0;
        for (&a, &b) in self.0.iter().zip(&other.0) {
            let diff = b - a;
            sum += diff * diff;
        }
        sum.sqrt()
    }
}

impl Vec2i {
    pub fn as_f32(self) -> Vec2f {
        Vec(self.0.map(|c| c as f32))
    }

    /// Euclidean distance rounded to the nearest pixel, saturating at `i32::MAX`.
    pub fn round_dist(self, other: Self) -> i32 {
        let dx = f64::from(self.x()) - f64::from(other.x());
        let dy = f64::from(self.y()) - f64::from(other.y());
        dx.hypot(dy).round() as i32
    }

    pub fn abs(self) -> Self {
        Vec(self.0.map(i32::abs))
    }
}

impl<T, const N: usize> From<[T; N]> for Vec<T, N> {
    fn from(value: [T; N]) -> Self {
        Self(value)
    }
}

impl<T, const N: usize> From<Vec<T, N>> for [T; N] {
    fn from(value: Vec<T, N>) -> Self {
        value.0
    }
}

impl<T, const N: usize> Add<Vec<T, N>> for Vec<T, N>
where
    T: Add<Output = T> + Copy,
{
    type Output = Vec<T, N>;

    fn add(self, rhs: Vec<T, N>) -> Self::Output {
        Vec(array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<T, const N: usize> Sub<Vec<T, N>> for Vec<T, N>
where
    T: Sub<Output = T> + Copy,
{
    type Output = Vec<T, N>;

    fn sub(self, rhs: Vec<T, N>) -> Self::Output {
        Vec(array::from_fn(|i| self.0[i] - rhs.0[i]))
    }
}

impl<T, const N: usize> Neg for Vec<T, N>
where
    T: Neg<Output = T> + Copy,
{
    type Output = Vec<T, N>;

    fn neg(self) -> Self::Output {
        Vec(self.0.map(|c| -c))
    }
}

pub fn vec2<T>(x: T, y: T) -> Vec2<T> {
    Vec([x, y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_dist() {
        assert_eq!(vec2(100, 100).round_dist(vec2(103, 104)), 5);
        assert_eq!(vec2(0, 0).round_dist(vec2(1, 1)), 1);
        assert_eq!(vec2(0, 0).round_dist(vec2(2, 2)), 3);
        assert_eq!(vec2(7, -3).round_dist(vec2(7, -3)), 0);
        assert_eq!(vec2(i32::MIN, 0).round_dist(vec2(i32::MAX, 0)), i32::MAX);
    }

    #[test]
    fn arithmetic() {
        let a = vec2(3, -4);
        let b = vec2(-1, 2);
        assert_eq!(a + b, vec2(2, -2));
        assert_eq!(a - b, vec2(4, -6));
        assert_eq!(-a, vec2(-3, 4));
        assert_eq!(a.abs(), vec2(3, 4));
        assert_eq!((a.x(), a.y()), (3, -4));
    }
}
