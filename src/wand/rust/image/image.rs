// SPDX-License-Identifier: GPL-3.0-or-later
use super::{color::Pixel, Color};
use crate::{
    common::{Handle, ImageKind},
    error::{Error, Result},
    library::{to_bool, Library, MagickWand},
};
use std::{ffi::CString, sync::Arc};
use tracing::debug;

/// An image held by a native magick wand. It is the render target of
/// [`Drawing::draw`](crate::Drawing::draw).
pub struct Image {
    handle: Handle<ImageKind>,
}

impl Image {
    fn alloc(lib: Arc<Library>) -> Result<Self> {
        let raw = unsafe { (lib.api().new_magick_wand)() };
        Ok(Self {
            handle: Handle::new(lib, raw)?,
        })
    }

    /// Creates a blank image filled with `background`.
    pub fn new(lib: Arc<Library>, width: usize, height: usize, background: &Color) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!(
                "image size must be positive, not {width}x{height}"
            )));
        }
        let pixel = Pixel::from_color(&lib, background)?;
        let img = Self::alloc(lib)?;
        let raw = img.as_ptr()?;
        if to_bool(unsafe {
            (img.handle.api().magick_new_image)(raw, width, height, pixel.as_ptr()?)
        }) {
            debug!("Created {width}x{height} image");
            Ok(img)
        } else {
            Err(img.handle.error("failed to create image"))
        }
    }

    /// Reads an image from a file.
    pub fn open(lib: Arc<Library>, path: &str) -> Result<Self> {
        let cpath = CString::new(path)?;
        let img = Self::alloc(lib)?;
        let raw = img.as_ptr()?;
        if to_bool(unsafe { (img.handle.api().magick_read_image)(raw, cpath.as_ptr()) }) {
            debug!("Read image {path}");
            Ok(img)
        } else {
            Err(img.handle.error(&format!("failed to read image {path}")))
        }
    }

    /// Independent copy with its own native wand.
    pub fn try_clone(&self) -> Result<Self> {
        let raw = unsafe { (self.handle.api().clone_magick_wand)(self.as_ptr()?) };
        Ok(Self {
            handle: Handle::new(self.handle.library().clone(), raw)?,
        })
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let cpath = CString::new(path)?;
        let raw = self.as_ptr()?;
        if to_bool(unsafe { (self.handle.api().magick_write_image)(raw, cpath.as_ptr()) }) {
            debug!("Wrote image {path}");
            Ok(())
        } else {
            Err(self.handle.error(&format!("failed to write image {path}")))
        }
    }

    pub fn width(&self) -> Result<usize> {
        let raw = self.as_ptr()?;
        let width = unsafe { (self.handle.api().magick_get_image_width)(raw) };
        self.handle.check()?;
        Ok(width)
    }

    pub fn height(&self) -> Result<usize> {
        let raw = self.as_ptr()?;
        let height = unsafe { (self.handle.api().magick_get_image_height)(raw) };
        self.handle.check()?;
        Ok(height)
    }

    pub fn size(&self) -> Result<(usize, usize)> {
        Ok((self.width()?, self.height()?))
    }

    /// Color of the pixel at the given position.
    pub fn pixel(&self, x: isize, y: isize) -> Result<Color> {
        let raw = self.as_ptr()?;
        let pixel = Pixel::new(self.handle.library())?;
        if to_bool(unsafe {
            (self.handle.api().magick_get_image_pixel_color)(raw, x, y, pixel.as_ptr()?)
        }) {
            pixel.color()
        } else {
            Err(self
                .handle
                .error(&format!("failed to get pixel at {x},{y}")))
        }
    }

    pub fn library(&self) -> &Arc<Library> {
        self.handle.library()
    }

    /// Releases the native wand. Using the image afterwards fails with
    /// [`Error::Closed`].
    pub fn destroy(&mut self) {
        self.handle.destroy();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    pub(crate) fn as_ptr(&self) -> Result<*mut MagickWand> {
        self.handle.as_ptr()
    }

    pub(crate) fn handle(&self) -> &Handle<ImageKind> {
        &self.handle
    }
}
