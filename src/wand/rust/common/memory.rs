// SPDX-License-Identifier: GPL-3.0-or-later
use crate::library::Library;
use std::{
    ffi::{c_char, CStr},
    fmt::Display,
    ptr::NonNull,
    slice,
};

/// A string allocated by the native library, released with
/// `MagickRelinquishMemory`.
pub(crate) struct MagickString<'a> {
    lib: &'a Library,
    raw: NonNull<c_char>,
}

impl<'a> MagickString<'a> {
    pub fn new(lib: &'a Library, raw: *mut c_char) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { lib, raw })
    }

    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_ptr(self.raw.as_ptr()) }
    }
}

impl Display for MagickString<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_c_str().to_string_lossy())
    }
}

impl Drop for MagickString<'_> {
    fn drop(&mut self) {
        unsafe { (self.lib.api().magick_relinquish_memory)(self.raw.as_ptr().cast()) };
    }
}

/// An array of doubles allocated by the native library.
pub(crate) struct MagickDoubles<'a> {
    lib: &'a Library,
    raw: NonNull<f64>,
    len: usize,
}

impl<'a> MagickDoubles<'a> {
    pub fn new(lib: &'a Library, raw: *mut f64, len: usize) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { lib, raw, len })
    }

    pub fn as_slice(&self) -> &[f64] {
        unsafe { slice::from_raw_parts(self.raw.as_ptr(), self.len) }
    }
}

impl Drop for MagickDoubles<'_> {
    fn drop(&mut self) {
        unsafe { (self.lib.api().magick_relinquish_memory)(self.raw.as_ptr().cast()) };
    }
}
