// SPDX-License-Identifier: GPL-3.0-or-later
use super::{
    drawing::{finite, non_negative},
    shapes::point,
    Drawing,
};
use crate::{
    common::Point,
    error::{Error, Result},
    library::from_bool,
};
use tracing::trace;

/// Control points of a cubic bezier path segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CurveControls {
    /// Only the control point at the end. The one at the start is the
    /// reflection of the previous segment's second control point.
    Smooth(Point),
    /// Control points at the start and at the end.
    Full(Point, Point),
}

// Path operators add to the path held in the native wand. They must be
// bracketed by path_start and path_finish, the native side reports misuse.
impl Drawing {
    pub fn path_start(&mut self) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        trace!("Path start");
        unsafe { (self.api().draw_path_start)(raw) };
        self.handle().check()?;
        Ok(self)
    }

    pub fn path_finish(&mut self) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        trace!("Path finish");
        unsafe { (self.api().draw_path_finish)(raw) };
        self.handle().check()?;
        Ok(self)
    }

    /// Closes the current subpath with a line back to its start.
    pub fn path_close(&mut self) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        trace!("Path close");
        unsafe { (self.api().draw_path_close)(raw) };
        self.handle().check()?;
        Ok(self)
    }

    /// Starts a new subpath at `to`.
    pub fn path_move(&mut self, to: impl Into<Point>, relative: bool) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let to = point("path move target", to)?;
        trace!("Path move {to:?} relative={relative}");
        let api = self.api();
        let move_to = if relative {
            api.draw_path_move_to_relative
        } else {
            api.draw_path_move_to_absolute
        };
        unsafe { move_to(raw, to.x, to.y) };
        self.handle().check()?;
        Ok(self)
    }

    pub fn path_line(&mut self, to: impl Into<Point>, relative: bool) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let to = point("path line target", to)?;
        trace!("Path line {to:?} relative={relative}");
        let api = self.api();
        let line_to = if relative {
            api.draw_path_line_to_relative
        } else {
            api.draw_path_line_to_absolute
        };
        unsafe { line_to(raw, to.x, to.y) };
        self.handle().check()?;
        Ok(self)
    }

    pub fn path_horizontal_line(&mut self, x: f64, relative: bool) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let x = finite("path line target", x)?;
        trace!("Path horizontal line {x} relative={relative}");
        let api = self.api();
        let line_to = if relative {
            api.draw_path_line_to_horizontal_relative
        } else {
            api.draw_path_line_to_horizontal_absolute
        };
        unsafe { line_to(raw, x) };
        self.handle().check()?;
        Ok(self)
    }

    pub fn path_vertical_line(&mut self, y: f64, relative: bool) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let y = finite("path line target", y)?;
        trace!("Path vertical line {y} relative={relative}");
        let api = self.api();
        let line_to = if relative {
            api.draw_path_line_to_vertical_relative
        } else {
            api.draw_path_line_to_vertical_absolute
        };
        unsafe { line_to(raw, y) };
        self.handle().check()?;
        Ok(self)
    }

    /// Adds a cubic bezier segment ending at `to`.
    pub fn path_curve(
        &mut self,
        to: impl Into<Point>,
        controls: CurveControls,
        relative: bool,
    ) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let to = point("path curve target", to)?;
        let api = self.api();
        match controls {
            CurveControls::Smooth(c2) => {
                let c2 = c2.check("path curve control")?;
                trace!("Path smooth curve {c2:?} {to:?} relative={relative}");
                let curve_to = if relative {
                    api.draw_path_curve_to_smooth_relative
                } else {
                    api.draw_path_curve_to_smooth_absolute
                };
                unsafe { curve_to(raw, c2.x, c2.y, to.x, to.y) };
            }
            CurveControls::Full(c1, c2) => {
                let c1 = c1.check("path curve control")?;
                let c2 = c2.check("path curve control")?;
                trace!("Path curve {c1:?} {c2:?} {to:?} relative={relative}");
                let curve_to = if relative {
                    api.draw_path_curve_to_relative
                } else {
                    api.draw_path_curve_to_absolute
                };
                unsafe { curve_to(raw, c1.x, c1.y, c2.x, c2.y, to.x, to.y) };
            }
        }
        self.handle().check()?;
        Ok(self)
    }

    /// Adds a quadratic bezier segment ending at `to`. A smooth segment
    /// reflects the previous segment's control point and ignores `control`,
    /// otherwise `control` is required.
    pub fn path_quadratic(
        &mut self,
        to: impl Into<Point>,
        control: Option<Point>,
        smooth: bool,
        relative: bool,
    ) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let to = point("path curve target", to)?;
        let api = self.api();
        if smooth {
            trace!("Path smooth quadratic {to:?} relative={relative}");
            let curve_to = if relative {
                api.draw_path_curve_to_quadratic_bezier_smooth_relative
            } else {
                api.draw_path_curve_to_quadratic_bezier_smooth_absolute
            };
            unsafe { curve_to(raw, to.x, to.y) };
        } else {
            let control = control
                .ok_or(Error::MissingArgument("control"))?
                .check("path curve control")?;
            trace!("Path quadratic {control:?} {to:?} relative={relative}");
            let curve_to = if relative {
                api.draw_path_curve_to_quadratic_bezier_relative
            } else {
                api.draw_path_curve_to_quadratic_bezier_absolute
            };
            unsafe { curve_to(raw, control.x, control.y, to.x, to.y) };
        }
        self.handle().check()?;
        Ok(self)
    }

    /// Adds an elliptical arc ending at `to`. `rotation` is the angle of the
    /// ellipse's x axis in degrees. `large_arc` and `clockwise` pick one of
    /// the four arcs that fit.
    pub fn path_elliptic_arc(
        &mut self,
        to: impl Into<Point>,
        radius: impl Into<Point>,
        rotation: f64,
        large_arc: bool,
        clockwise: bool,
        relative: bool,
    ) -> Result<&mut Self> {
        let raw = self.as_ptr()?;
        let to = point("path arc target", to)?;
        let radius = point("path arc radius", radius)?;
        non_negative("path arc radius", radius.x)?;
        non_negative("path arc radius", radius.y)?;
        let rotation = finite("path arc rotation", rotation)?;
        trace!(
            "Path elliptic arc {radius:?} {rotation} large_arc={large_arc} \
            clockwise={clockwise} {to:?} relative={relative}"
        );
        let api = self.api();
        let arc_to = if relative {
            api.draw_path_elliptic_arc_relative
        } else {
            api.draw_path_elliptic_arc_absolute
        };
        unsafe {
            arc_to(
                raw,
                radius.x,
                radius.y,
                rotation,
                from_bool(large_arc),
                from_bool(clockwise),
                to.x,
                to.y,
            )
        };
        self.handle().check()?;
        Ok(self)
    }
}
