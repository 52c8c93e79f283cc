// SPDX-License-Identifier: GPL-3.0-or-later

mod handle;
mod memory;
mod points;

pub(crate) use handle::{DrawingKind, Handle, ImageKind, PixelKind};
pub(crate) use memory::{MagickDoubles, MagickString};
pub use points::{Point, PointArray};
