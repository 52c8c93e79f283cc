// SPDX-License-Identifier: GPL-3.0-or-later
use crate::{
    error::{Error, Result},
    library::PointInfo,
};
use serde::Deserialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn check(self, what: &str) -> Result<Self> {
        if self.x.is_finite() && self.y.is_finite() {
            Ok(self)
        } else {
            Err(Error::invalid(format!(
                "{what} must be finite, not ({}, {})",
                self.x, self.y
            )))
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self {
            x: f64::from(x),
            y: f64::from(y),
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Coordinates flattened into the contiguous `x0, y0, x1, y1, ...` layout
/// that the polygon, polyline and bezier entry points read as `PointInfo`s.
#[derive(Clone, Debug, PartialEq)]
pub struct PointArray {
    coords: Vec<f64>,
}

impl PointArray {
    pub fn new<I, P>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        let points = points.into_iter();
        let mut coords = Vec::with_capacity(points.size_hint().0 * 2);
        for point in points {
            let Point { x, y } = point.into().check("point")?;
            coords.push(x);
            coords.push(y);
        }
        Ok(Self { coords })
    }

    /// Number of points, which is half the number of coordinates.
    pub fn len(&self) -> usize {
        self.coords.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub(crate) fn as_ptr(&self) -> *const PointInfo {
        self.coords.as_ptr().cast()
    }
}
