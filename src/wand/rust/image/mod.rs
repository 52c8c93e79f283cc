// SPDX-License-Identifier: GPL-3.0-or-later

mod color;
#[allow(clippy::module_inception)]
mod image;

pub(crate) use color::Pixel;
pub use color::Color;
pub use image::Image;
