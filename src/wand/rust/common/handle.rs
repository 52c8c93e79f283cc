// SPDX-License-Identifier: GPL-3.0-or-later
use super::MagickString;
use crate::{
    error::{Error, Result, Severity},
    library::{to_bool, Api, DrawingWand, ExceptionType, Library, MagickWand, PixelWand},
};
use std::{ffi::c_char, ptr, sync::Arc};
use tracing::{trace, warn};

/// A kind of native wand and the entry points that manage its lifetime and
/// its exception channel.
pub(crate) trait HandleKind {
    type Raw;

    /// Used in [`Error::Closed`].
    const NAME: &'static str;

    unsafe fn destroy(api: &Api, raw: *mut Self::Raw);
    unsafe fn is_valid(api: &Api, raw: *mut Self::Raw) -> bool;
    unsafe fn exception(
        api: &Api,
        raw: *mut Self::Raw,
        severity: &mut ExceptionType,
    ) -> *mut c_char;
    unsafe fn clear_exception(api: &Api, raw: *mut Self::Raw);
}

pub(crate) enum DrawingKind {}

impl HandleKind for DrawingKind {
    type Raw = DrawingWand;
    const NAME: &'static str = "drawing";

    unsafe fn destroy(api: &Api, raw: *mut DrawingWand) {
        (api.destroy_drawing_wand)(raw);
    }

    unsafe fn is_valid(api: &Api, raw: *mut DrawingWand) -> bool {
        to_bool((api.is_drawing_wand)(raw))
    }

    unsafe fn exception(
        api: &Api,
        raw: *mut DrawingWand,
        severity: &mut ExceptionType,
    ) -> *mut c_char {
        (api.draw_get_exception)(raw, severity)
    }

    unsafe fn clear_exception(api: &Api, raw: *mut DrawingWand) {
        (api.draw_clear_exception)(raw);
    }
}

pub(crate) enum ImageKind {}

impl HandleKind for ImageKind {
    type Raw = MagickWand;
    const NAME: &'static str = "image";

    unsafe fn destroy(api: &Api, raw: *mut MagickWand) {
        (api.destroy_magick_wand)(raw);
    }

    unsafe fn is_valid(api: &Api, raw: *mut MagickWand) -> bool {
        to_bool((api.is_magick_wand)(raw))
    }

    unsafe fn exception(
        api: &Api,
        raw: *mut MagickWand,
        severity: &mut ExceptionType,
    ) -> *mut c_char {
        (api.magick_get_exception)(raw, severity)
    }

    unsafe fn clear_exception(api: &Api, raw: *mut MagickWand) {
        (api.magick_clear_exception)(raw);
    }
}

pub(crate) enum PixelKind {}

impl HandleKind for PixelKind {
    type Raw = PixelWand;
    const NAME: &'static str = "color";

    unsafe fn destroy(api: &Api, raw: *mut PixelWand) {
        (api.destroy_pixel_wand)(raw);
    }

    unsafe fn is_valid(api: &Api, raw: *mut PixelWand) -> bool {
        to_bool((api.is_pixel_wand)(raw))
    }

    unsafe fn exception(
        api: &Api,
        raw: *mut PixelWand,
        severity: &mut ExceptionType,
    ) -> *mut c_char {
        (api.pixel_get_exception)(raw, severity)
    }

    unsafe fn clear_exception(api: &Api, raw: *mut PixelWand) {
        (api.pixel_clear_exception)(raw);
    }
}

/// Exclusive owner of one native wand.
///
/// The pointer is null exactly when the wand has been destroyed, after which
/// every accessor fails with [`Error::Closed`].
pub(crate) struct Handle<K: HandleKind> {
    lib: Arc<Library>,
    raw: *mut K::Raw,
}

impl<K: HandleKind> Handle<K> {
    /// Takes ownership of a freshly allocated wand. A null pointer means the
    /// allocation failed and no handle is created.
    pub fn new(lib: Arc<Library>, raw: *mut K::Raw) -> Result<Self> {
        if raw.is_null() {
            Err(Error::native(format!("failed to allocate {} wand", K::NAME)))
        } else {
            trace!("Allocated {} wand {:p}", K::NAME, raw);
            Ok(Self { lib, raw })
        }
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.lib
    }

    pub fn api(&self) -> &Api {
        self.lib.api()
    }

    pub fn as_ptr(&self) -> Result<*mut K::Raw> {
        if self.raw.is_null() {
            Err(Error::Closed(K::NAME))
        } else {
            debug_assert!(self.is_valid(), "{} wand {:p} is invalid", K::NAME, self.raw);
            Ok(self.raw)
        }
    }

    pub fn is_closed(&self) -> bool {
        self.raw.is_null()
    }

    /// Asks the native library whether the pointer still refers to a live
    /// wand of this kind.
    pub fn is_valid(&self) -> bool {
        !self.raw.is_null() && unsafe { K::is_valid(self.api(), self.raw) }
    }

    /// Frees the wand. Subsequent calls do nothing.
    pub fn destroy(&mut self) {
        let raw = self.raw;
        if !raw.is_null() {
            self.raw = ptr::null_mut();
            trace!("Destroying {} wand {:p}", K::NAME, raw);
            unsafe { K::destroy(self.lib.api(), raw) }
        }
    }

    /// Reads and clears the wand's pending exception, if any.
    pub fn take_exception(&self) -> Option<(Severity, String)> {
        if self.raw.is_null() {
            return None;
        }
        let api = self.api();
        let mut code: ExceptionType = 0;
        let message = unsafe { K::exception(api, self.raw, &mut code) };
        let message = MagickString::new(&self.lib, message)
            .map(|s| s.to_string())
            .unwrap_or_default();
        let severity = Severity::from_code(code)?;
        unsafe { K::clear_exception(api, self.raw) };
        Some((severity, message))
    }

    /// Turns a pending native error into an `Err`. Warnings are logged and
    /// cleared.
    pub fn check(&self) -> Result<()> {
        match self.take_exception() {
            Some((Severity::Warning, message)) => {
                warn!("{}: {}", K::NAME, message);
                Ok(())
            }
            Some((severity, message)) => Err(Error::Native { severity, message }),
            None => Ok(()),
        }
    }

    /// The error to report after a native call signalled failure. Uses the
    /// wand's pending exception if there is one, `fallback` otherwise.
    pub fn error(&self, fallback: &str) -> Error {
        match self.take_exception() {
            Some((Severity::Warning, message)) => {
                warn!("{}: {}", K::NAME, message);
                Error::native(fallback)
            }
            Some((severity, message)) => Error::Native { severity, message },
            None => Error::native(fallback),
        }
    }
}

impl<K: HandleKind> Drop for Handle<K> {
    fn drop(&mut self) {
        self.destroy();
    }
}
