// SPDX-License-Identifier: GPL-3.0-or-later
//! Bindings to the vector drawing part of ImageMagick's MagickWand library.
//!
//! The native library is loaded at runtime, see [`Library`]. A [`Drawing`]
//! accumulates drawing instructions and settings inside a native drawing
//! wand and renders them onto an [`Image`] when [`Drawing::draw`] is called.
//!
//! ```no_run
//! use wand::{Color, Drawing, Image, Library, Rect};
//!
//! # fn main() -> wand::Result<()> {
//! let lib = Library::global()?;
//! let image = Image::new(lib.clone(), 100, 100, &Color::WHITE)?;
//! let mut drawing = Drawing::new(lib)?;
//! drawing.set_fill_color(&"#ff0000".parse()?)?;
//! drawing.rectangle(Rect::new(10.0, 10.0).width(50.0).height(20.0))?;
//! drawing.draw(&image)?;
//! image.save("out.png")?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod draw;
mod error;
pub mod image;
mod library;

#[cfg(test)]
mod fake;

pub use common::{Point, PointArray};
pub use draw::{
    ClipPathUnits, CurveControls, Drawing, FillRule, FontMetrics, Gravity, LineCap, LineJoin,
    PaintMethod, Rect, TextAlign, TextDecoration, TextDirection,
};
pub use error::{Error, Result, Severity};
pub use image::{Color, Image};
pub use library::{Library, LIBRARY_ENV};
