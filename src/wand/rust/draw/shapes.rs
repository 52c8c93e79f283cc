// SPDX-License-Identifier: GPL-3.0-or-later
use super::{
    drawing::{encode_text, finite, non_negative},
    types::NativeCode,
    Drawing, PaintMethod,
};
use crate::{
    common::{Point, PointArray},
    error::{Error, Result},
    library::{to_bool, DrawingWand, PointInfo},
};
use std::ffi::CString;
use tracing::trace;

/// Rectangle geometry. Each axis takes exactly one of an end coordinate or
/// a length.
///
/// ```
/// use wand::Rect;
///
/// let by_corner = Rect::new(0.0, 0.0).right(10.0).bottom(20.0);
/// let by_size = Rect::new(0.0, 0.0).width(10.0).height(20.0);
/// assert_eq!(by_corner.bounds().unwrap(), by_size.bounds().unwrap());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    left: Option<f64>,
    top: Option<f64>,
    right: Option<f64>,
    bottom: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

impl Rect {
    pub fn new(left: f64, top: f64) -> Self {
        Self::default().left(left).top(top)
    }

    pub fn left(mut self, left: f64) -> Self {
        self.left = Some(left);
        self
    }

    pub fn top(mut self, top: f64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn right(mut self, right: f64) -> Self {
        self.right = Some(right);
        self
    }

    pub fn bottom(mut self, bottom: f64) -> Self {
        self.bottom = Some(bottom);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    // Names are (start, end, length, missing).
    fn span(
        start: f64,
        end: Option<f64>,
        length: Option<f64>,
        names: (&str, &'static str, &'static str, &'static str),
    ) -> Result<f64> {
        let (start_name, end_name, length_name, missing) = names;
        let end = match (end, length) {
            (Some(_), Some(_)) => return Err(Error::ExclusiveArguments(end_name, length_name)),
            (None, None) => return Err(Error::MissingArgument(missing)),
            (Some(end), None) => finite(end_name, end)?,
            (None, Some(length)) => {
                finite(end_name, start + non_negative(length_name, length)?)?
            }
        };
        if end < start {
            Err(Error::invalid(format!(
                "{end_name} must be greater than or equal to {start_name}, \
                but {end} < {start}"
            )))
        } else {
            Ok(end)
        }
    }

    /// Resolves the rectangle to `(left, top, right, bottom)`.
    pub fn bounds(&self) -> Result<(f64, f64, f64, f64)> {
        let left = finite("left", self.left.ok_or(Error::MissingArgument("left"))?)?;
        let top = finite("top", self.top.ok_or(Error::MissingArgument("top"))?)?;
        let right = Self::span(
            left,
            self.right,
            self.width,
            ("left", "right", "width", "right or width"),
        )?;
        let bottom = Self::span(
            top,
            self.bottom,
            self.height,
            ("top", "bottom", "height", "bottom or height"),
        )?;
        Ok((left, top, right, bottom))
    }
}

pub(super) fn point(what: &str, point: impl Into<Point>) -> Result<Point> {
    point.into().check(what)
}

impl Drawing {
    /// Draws an arc within the bounding box from `start` to `end`, between
    /// the given angles in degrees.
    pub fn arc(
        &mut self,
        start: impl Into<Point>,
        end: impl Into<Point>,
        degrees: (f64, f64),
    ) -> Result<()> {
        let raw = self.as_ptr()?;
        let start = point("arc start", start)?;
        let end = point("arc end", end)?;
        let degrees = point("arc degrees", degrees)?;
        trace!("Arc {start:?} {end:?} {degrees:?}");
        unsafe {
            (self.api().draw_arc)(raw, start.x, start.y, end.x, end.y, degrees.x, degrees.y)
        };
        self.handle().check()
    }

    /// Draws a circle around `origin` that passes through `perimeter`.
    pub fn circle(&mut self, origin: impl Into<Point>, perimeter: impl Into<Point>) -> Result<()> {
        let raw = self.as_ptr()?;
        let origin = point("circle origin", origin)?;
        let perimeter = point("circle perimeter", perimeter)?;
        trace!("Circle {origin:?} {perimeter:?}");
        unsafe { (self.api().draw_circle)(raw, origin.x, origin.y, perimeter.x, perimeter.y) };
        self.handle().check()
    }

    /// Draws the part of an ellipse between the angles in `rotation`, given
    /// in degrees.
    pub fn ellipse(
        &mut self,
        origin: impl Into<Point>,
        radius: impl Into<Point>,
        rotation: (f64, f64),
    ) -> Result<()> {
        let raw = self.as_ptr()?;
        let origin = point("ellipse origin", origin)?;
        let radius = point("ellipse radius", radius)?;
        non_negative("ellipse radius", radius.x)?;
        non_negative("ellipse radius", radius.y)?;
        let rotation = point("ellipse rotation", rotation)?;
        trace!("Ellipse {origin:?} {radius:?} {rotation:?}");
        unsafe {
            (self.api().draw_ellipse)(
                raw, origin.x, origin.y, radius.x, radius.y, rotation.x, rotation.y,
            )
        };
        self.handle().check()
    }

    pub fn ellipse_full(
        &mut self,
        origin: impl Into<Point>,
        radius: impl Into<Point>,
    ) -> Result<()> {
        self.ellipse(origin, radius, (0.0, 360.0))
    }

    pub fn line(&mut self, start: impl Into<Point>, end: impl Into<Point>) -> Result<()> {
        let raw = self.as_ptr()?;
        let start = point("line start", start)?;
        let end = point("line end", end)?;
        trace!("Line {start:?} {end:?}");
        unsafe { (self.api().draw_line)(raw, start.x, start.y, end.x, end.y) };
        self.handle().check()
    }

    pub fn point(&mut self, x: f64, y: f64) -> Result<()> {
        let raw = self.as_ptr()?;
        let at = point("point", (x, y))?;
        trace!("Point {at:?}");
        unsafe { (self.api().draw_point)(raw, at.x, at.y) };
        self.handle().check()
    }

    /// Paints with the fill color, starting at `at`. Which pixels are
    /// affected depends on `method`.
    pub fn color(&mut self, at: impl Into<Point>, method: PaintMethod) -> Result<()> {
        let raw = self.as_ptr()?;
        let at = point("color position", at)?;
        trace!("Color {at:?} {method}");
        unsafe { (self.api().draw_color)(raw, at.x, at.y, method.code()) };
        self.handle().check()
    }

    /// Like [`color`](Self::color), but paints the alpha channel only.
    pub fn matte(&mut self, at: impl Into<Point>, method: PaintMethod) -> Result<()> {
        let api = self.api();
        let matte = api
            .draw_alpha
            .or(api.draw_matte)
            .ok_or(Error::Unsupported { feature: "matte" })?;
        let raw = self.as_ptr()?;
        let at = point("matte position", at)?;
        trace!("Matte {at:?} {method}");
        unsafe { matte(raw, at.x, at.y, method.code()) };
        self.handle().check()
    }

    pub fn rectangle(&mut self, rect: Rect) -> Result<()> {
        let raw = self.as_ptr()?;
        let (left, top, right, bottom) = rect.bounds()?;
        trace!("Rectangle {left} {top} {right} {bottom}");
        unsafe { (self.api().draw_rectangle)(raw, left, top, right, bottom) };
        self.handle().check()
    }

    fn points<I, P>(
        &mut self,
        what: &str,
        points: I,
        draw: unsafe extern "C" fn(*mut DrawingWand, usize, *const PointInfo),
    ) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        let raw = self.as_ptr()?;
        let points = PointArray::new(points)?;
        if points.is_empty() {
            return Err(Error::invalid(format!("{what} needs at least one point")));
        }
        trace!("{what} {:?}", points.coords());
        unsafe { draw(raw, points.len(), points.as_ptr()) };
        self.handle().check()
    }

    /// Draws a closed shape through the given points.
    pub fn polygon<I, P>(&mut self, points: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        self.points("polygon", points, self.api().draw_polygon)
    }

    /// Draws an open line through the given points.
    pub fn polyline<I, P>(&mut self, points: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        self.points("polyline", points, self.api().draw_polyline)
    }

    /// Draws a bezier curve. The first and last points are the curve's ends,
    /// the ones in between are its control points.
    pub fn bezier<I, P>(&mut self, points: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Point>,
    {
        self.points("bezier", points, self.api().draw_bezier)
    }

    /// Writes text with its baseline starting at `(x, y)`. The text is
    /// converted to the drawing's text encoding, which is set to UTF-8 first
    /// if none is configured.
    pub fn text(&mut self, x: f64, y: f64, body: &str) -> Result<()> {
        let raw = self.as_ptr()?;
        let at = point("text position", (x, y))?;
        if body.is_empty() {
            return Err(Error::MissingArgument("text body"));
        }
        let encoding = match self.text_encoding()? {
            Some(encoding) => encoding,
            None => {
                self.set_text_encoding(Some("UTF-8"))?;
                "UTF-8".to_owned()
            }
        };
        let cbody = encode_text(Some(&encoding), body)?;
        trace!("Text {at:?} {body:?}");
        unsafe { (self.api().draw_annotation)(raw, at.x, at.y, cbody.as_ptr().cast()) };
        self.handle().check()
    }

    pub fn rotate(&mut self, degrees: f64) -> Result<()> {
        let raw = self.as_ptr()?;
        let degrees = finite("rotation", degrees)?;
        trace!("Rotate {degrees}");
        unsafe { (self.api().draw_rotate)(raw, degrees) };
        self.handle().check()
    }

    /// Skews the coordinate system horizontally by `x` and vertically by `y`
    /// degrees. Axes given as `None` are left alone.
    pub fn skew(&mut self, x: Option<f64>, y: Option<f64>) -> Result<()> {
        let raw = self.as_ptr()?;
        let x = x.map(|x| finite("horizontal skew", x)).transpose()?;
        let y = y.map(|y| finite("vertical skew", y)).transpose()?;
        if let Some(x) = x {
            trace!("Skew x {x}");
            unsafe { (self.api().draw_skew_x)(raw, x) };
            self.handle().check()?;
        }
        if let Some(y) = y {
            trace!("Skew y {y}");
            unsafe { (self.api().draw_skew_y)(raw, y) };
            self.handle().check()?;
        }
        Ok(())
    }

    pub fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        let raw = self.as_ptr()?;
        let by = point("translation", (x, y))?;
        trace!("Translate {by:?}");
        unsafe { (self.api().draw_translate)(raw, by.x, by.y) };
        self.handle().check()
    }

    pub fn scale(&mut self, x: f64, y: f64) -> Result<()> {
        let raw = self.as_ptr()?;
        let by = point("scale", (x, y))?;
        trace!("Scale {by:?}");
        unsafe { (self.api().draw_scale)(raw, by.x, by.y) };
        self.handle().check()
    }

    /// Sets the canvas size recorded with the vector data, used when it's
    /// exported as SVG or MVG.
    pub fn viewbox(&mut self, left: isize, top: isize, right: isize, bottom: isize) -> Result<()> {
        let raw = self.as_ptr()?;
        trace!("Viewbox {left} {top} {right} {bottom}");
        // ImageMagick 7 changed the parameters from ssize_t to double.
        if self.library().major_version() >= 7 {
            unsafe {
                (self.api().draw_set_viewbox_real)(
                    raw,
                    left as f64,
                    top as f64,
                    right as f64,
                    bottom as f64,
                )
            };
        } else {
            unsafe { (self.api().draw_set_viewbox_integer)(raw, left, top, right, bottom) };
        }
        self.handle().check()
    }

    /// Saves the current settings, to be restored by [`pop`](Self::pop).
    pub fn push(&mut self) -> Result<()> {
        let raw = self.as_ptr()?;
        trace!("Push");
        if to_bool(unsafe { (self.api().push_drawing_wand)(raw) }) {
            self.handle().check()
        } else {
            Err(self.handle().error("failed to push drawing settings"))
        }
    }

    pub fn pop(&mut self) -> Result<()> {
        let raw = self.as_ptr()?;
        trace!("Pop");
        if to_bool(unsafe { (self.api().pop_drawing_wand)(raw) }) {
            self.handle().check()
        } else {
            Err(self.handle().error("no drawing settings to pop"))
        }
    }

    /// Starts the definition of the clip path `id`. Instructions up to
    /// [`pop_clip_path`](Self::pop_clip_path) make up its shape.
    pub fn push_clip_path(&mut self, id: &str) -> Result<()> {
        let raw = self.as_ptr()?;
        let cid = CString::new(id)?;
        trace!("Push clip path {id}");
        unsafe { (self.api().draw_push_clip_path)(raw, cid.as_ptr()) };
        self.handle().check()
    }

    pub fn pop_clip_path(&mut self) -> Result<()> {
        let raw = self.as_ptr()?;
        trace!("Pop clip path");
        unsafe { (self.api().draw_pop_clip_path)(raw) };
        self.handle().check()
    }
}
