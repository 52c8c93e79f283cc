// SPDX-License-Identifier: GPL-3.0-or-later
use super::types::{
    ClipPathUnits, FillRule, Gravity, LineCap, LineJoin, NativeCode, TextAlign, TextDecoration,
    TextDirection,
};
use crate::{
    common::{DrawingKind, Handle, MagickDoubles, MagickString},
    error::{Error, Result, Severity},
    image::{Color, Image, Pixel},
    library::{from_bool, to_bool, Api, DrawingWand, Library, PixelWand},
};
use encoding_rs::Encoding;
use std::{
    ffi::{c_char, c_int, CString},
    ptr,
    sync::Arc,
};
use tracing::{debug, warn};

type GetOption = unsafe extern "C" fn(*const DrawingWand) -> c_int;
type SetOption = unsafe extern "C" fn(*mut DrawingWand, c_int);
type GetReal = unsafe extern "C" fn(*const DrawingWand) -> f64;
type SetReal = unsafe extern "C" fn(*mut DrawingWand, f64);
type GetColor = unsafe extern "C" fn(*const DrawingWand, *mut PixelWand);
type SetColor = unsafe extern "C" fn(*mut DrawingWand, *const PixelWand);
type GetString = unsafe extern "C" fn(*const DrawingWand) -> *mut c_char;

pub(crate) fn finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid(format!("{what} must be finite, not {value}")))
    }
}

pub(crate) fn non_negative(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid(format!(
            "{what} must be a non-negative number, not {value}"
        )))
    }
}

fn opacity(what: &str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::invalid(format!(
            "{what} must be between 0.0 and 1.0, not {value}"
        )))
    }
}

/// Transcodes text into a NUL-terminated byte string in the given encoding,
/// UTF-8 if none is given.
pub(crate) fn encode_text(encoding: Option<&str>, text: &str) -> Result<CString> {
    let label = encoding.unwrap_or("UTF-8");
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::Encoding(format!("unknown text encoding '{label}'")))?;
    // UTF-16 and "replacement" would silently encode as UTF-8.
    if encoding.output_encoding() != encoding {
        return Err(Error::Encoding(format!(
            "{} can't be used for NUL-terminated text",
            encoding.name()
        )));
    }
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(Error::Encoding(format!(
            "'{text}' can't be represented in {}",
            encoding.name()
        )));
    }
    Ok(CString::new(bytes.into_owned())?)
}

/// A set of drawing instructions and the settings they're drawn with, held
/// in a native drawing wand.
///
/// Nothing is cached on the Rust side: getters query the native wand and
/// setters validate their argument, then change the native wand right away.
/// Once [`destroy`](Self::destroy)ed, every method fails with
/// [`Error::Closed`].
pub struct Drawing {
    handle: Handle<DrawingKind>,
}

impl Drawing {
    pub fn new(lib: Arc<Library>) -> Result<Self> {
        let raw = unsafe { (lib.api().new_drawing_wand)() };
        let handle = Handle::new(lib, raw)?;
        debug!("Created drawing {:p}", raw);
        Ok(Self { handle })
    }

    /// Creates a drawing with the process-wide [`Library::global`].
    pub fn new_global() -> Result<Self> {
        Self::new(Library::global()?)
    }

    /// Creates an independent copy of this drawing, including its pending
    /// instructions. Changes to one never affect the other.
    pub fn try_clone(&self) -> Result<Self> {
        let raw = unsafe { (self.api().clone_drawing_wand)(self.as_ptr()?) };
        let handle = Handle::new(self.handle.library().clone(), raw)?;
        debug!("Cloned drawing {:p} into {:p}", self.handle.as_ptr()?, raw);
        Ok(Self { handle })
    }

    pub fn library(&self) -> &Arc<Library> {
        self.handle.library()
    }

    /// Releases the native wand. Calling this again does nothing.
    pub fn destroy(&mut self) {
        if !self.handle.is_closed() {
            debug!("Destroying drawing");
            self.handle.destroy();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Resets all settings and drops all pending instructions.
    pub fn clear(&mut self) -> Result<()> {
        let raw = self.as_ptr()?;
        unsafe { (self.api().clear_drawing_wand)(raw) };
        self.handle.check()
    }

    /// Renders the pending instructions onto the image.
    pub fn draw(&self, image: &Image) -> Result<()> {
        let raw = self.as_ptr()?;
        let target = image.as_ptr()?;
        if to_bool(unsafe { (self.api().magick_draw_image)(target, raw) }) {
            image.handle().check()
        } else {
            match self.handle.take_exception() {
                Some((Severity::Warning, message)) => warn!("drawing: {message}"),
                Some((severity, message)) => return Err(Error::Native { severity, message }),
                None => (),
            }
            Err(image.handle().error("failed to draw on image"))
        }
    }

    pub(crate) fn as_ptr(&self) -> Result<*mut DrawingWand> {
        self.handle.as_ptr()
    }

    pub(crate) fn api(&self) -> &Api {
        self.handle.api()
    }

    pub(crate) fn handle(&self) -> &Handle<DrawingKind> {
        &self.handle
    }

    fn get_option<T: NativeCode>(&self, get: GetOption) -> Result<T> {
        let raw = self.as_ptr()?;
        let code = unsafe { get(raw) };
        self.handle.check()?;
        // Zero is a valid code for every option, only unknown codes are errors.
        T::from_code(code)
            .ok_or_else(|| Error::native(format!("unexpected {} code {code}", T::KIND)))
    }

    fn set_option<T: NativeCode>(&mut self, set: SetOption, value: T) -> Result<()> {
        let raw = self.as_ptr()?;
        unsafe { set(raw, value.code()) };
        self.handle.check()
    }

    fn get_real(&self, get: GetReal) -> Result<f64> {
        let raw = self.as_ptr()?;
        let value = unsafe { get(raw) };
        self.handle.check()?;
        Ok(value)
    }

    fn set_real(&mut self, set: SetReal, value: impl FnOnce() -> Result<f64>) -> Result<()> {
        let raw = self.as_ptr()?;
        let value = value()?;
        unsafe { set(raw, value) };
        self.handle.check()
    }

    fn get_color(&self, get: GetColor) -> Result<Color> {
        let raw = self.as_ptr()?;
        let pixel = Pixel::new(self.library())?;
        unsafe { get(raw, pixel.as_ptr()?) };
        self.handle.check()?;
        pixel.color()
    }

    fn set_color(&mut self, set: SetColor, color: &Color) -> Result<()> {
        let raw = self.as_ptr()?;
        let pixel = Pixel::from_color(self.library(), color)?;
        unsafe { set(raw, pixel.as_ptr()?) };
        self.handle.check()
    }

    fn get_string(&self, get: GetString) -> Result<Option<String>> {
        let raw = self.as_ptr()?;
        let value = unsafe { get(raw) };
        let value = MagickString::new(self.library(), value).map(|s| s.to_string());
        self.handle.check()?;
        Ok(value.filter(|s| !s.is_empty()))
    }

    /// Id of the clip path applied to subsequent instructions, if any.
    pub fn clip_path(&self) -> Result<Option<String>> {
        self.get_string(self.api().draw_get_clip_path)
    }

    pub fn set_clip_path(&mut self, id: &str) -> Result<()> {
        let raw = self.as_ptr()?;
        let cid = CString::new(id)?;
        if to_bool(unsafe { (self.api().draw_set_clip_path)(raw, cid.as_ptr()) }) {
            self.handle.check()
        } else {
            Err(self.handle.error("clip path not understood"))
        }
    }

    pub fn clip_rule(&self) -> Result<FillRule> {
        self.get_option(self.api().draw_get_clip_rule)
    }

    pub fn set_clip_rule(&mut self, rule: FillRule) -> Result<()> {
        self.set_option(self.api().draw_set_clip_rule, rule)
    }

    pub fn clip_units(&self) -> Result<ClipPathUnits> {
        self.get_option(self.api().draw_get_clip_units)
    }

    pub fn set_clip_units(&mut self, units: ClipPathUnits) -> Result<()> {
        self.set_option(self.api().draw_set_clip_units, units)
    }

    /// Font name or path used for text, if one is set.
    pub fn font(&self) -> Result<Option<String>> {
        self.get_string(self.api().draw_get_font)
    }

    pub fn set_font(&mut self, font: &str) -> Result<()> {
        let raw = self.as_ptr()?;
        let cfont = CString::new(font)?;
        if to_bool(unsafe { (self.api().draw_set_font)(raw, cfont.as_ptr()) }) {
            self.handle.check()
        } else {
            Err(self.handle.error(&format!("failed to set font '{font}'")))
        }
    }

    pub fn font_size(&self) -> Result<f64> {
        self.get_real(self.api().draw_get_font_size)
    }

    pub fn set_font_size(&mut self, size: f64) -> Result<()> {
        self.set_real(self.api().draw_set_font_size, || non_negative("font size", size))
    }

    pub fn fill_color(&self) -> Result<Color> {
        self.get_color(self.api().draw_get_fill_color)
    }

    pub fn set_fill_color(&mut self, color: &Color) -> Result<()> {
        self.set_color(self.api().draw_set_fill_color, color)
    }

    pub fn fill_opacity(&self) -> Result<f64> {
        self.get_real(self.api().draw_get_fill_opacity)
    }

    pub fn set_fill_opacity(&mut self, value: f64) -> Result<()> {
        self.set_real(self.api().draw_set_fill_opacity, || opacity("fill opacity", value))
    }

    pub fn fill_rule(&self) -> Result<FillRule> {
        self.get_option(self.api().draw_get_fill_rule)
    }

    pub fn set_fill_rule(&mut self, rule: FillRule) -> Result<()> {
        self.set_option(self.api().draw_set_fill_rule, rule)
    }

    pub fn gravity(&self) -> Result<Gravity> {
        self.get_option(self.api().draw_get_gravity)
    }

    pub fn set_gravity(&mut self, gravity: Gravity) -> Result<()> {
        self.set_option(self.api().draw_set_gravity, gravity)
    }

    pub fn stroke_antialias(&self) -> Result<bool> {
        let raw = self.as_ptr()?;
        let value = unsafe { (self.api().draw_get_stroke_antialias)(raw) };
        self.handle.check()?;
        Ok(to_bool(value))
    }

    pub fn set_stroke_antialias(&mut self, antialias: bool) -> Result<()> {
        let raw = self.as_ptr()?;
        unsafe { (self.api().draw_set_stroke_antialias)(raw, from_bool(antialias)) };
        self.handle.check()
    }

    pub fn stroke_color(&self) -> Result<Color> {
        self.get_color(self.api().draw_get_stroke_color)
    }

    pub fn set_stroke_color(&mut self, color: &Color) -> Result<()> {
        self.set_color(self.api().draw_set_stroke_color, color)
    }

    /// Alternating dash and gap lengths. Empty means a solid line.
    pub fn stroke_dash_array(&self) -> Result<Vec<f64>> {
        let raw = self.as_ptr()?;
        let mut len = 0_usize;
        let dashes = unsafe { (self.api().draw_get_stroke_dash_array)(raw, &mut len) };
        let dashes = MagickDoubles::new(self.library(), dashes, len)
            .map(|d| d.as_slice().to_vec())
            .unwrap_or_default();
        self.handle.check()?;
        Ok(dashes)
    }

    pub fn set_stroke_dash_array(&mut self, dashes: &[f64]) -> Result<()> {
        let raw = self.as_ptr()?;
        for dash in dashes {
            non_negative("stroke dash length", *dash)?;
        }
        let ptr = if dashes.is_empty() {
            ptr::null()
        } else {
            dashes.as_ptr()
        };
        if to_bool(unsafe { (self.api().draw_set_stroke_dash_array)(raw, dashes.len(), ptr) }) {
            self.handle.check()
        } else {
            Err(self.handle.error("failed to set stroke dash array"))
        }
    }

    pub fn stroke_dash_offset(&self) -> Result<f64> {
        self.get_real(self.api().draw_get_stroke_dash_offset)
    }

    pub fn set_stroke_dash_offset(&mut self, offset: f64) -> Result<()> {
        self.set_real(self.api().draw_set_stroke_dash_offset, || {
            finite("stroke dash offset", offset)
        })
    }

    pub fn stroke_line_cap(&self) -> Result<LineCap> {
        self.get_option(self.api().draw_get_stroke_line_cap)
    }

    pub fn set_stroke_line_cap(&mut self, cap: LineCap) -> Result<()> {
        self.set_option(self.api().draw_set_stroke_line_cap, cap)
    }

    pub fn stroke_line_join(&self) -> Result<LineJoin> {
        self.get_option(self.api().draw_get_stroke_line_join)
    }

    pub fn set_stroke_line_join(&mut self, join: LineJoin) -> Result<()> {
        self.set_option(self.api().draw_set_stroke_line_join, join)
    }

    pub fn stroke_miter_limit(&self) -> Result<usize> {
        let raw = self.as_ptr()?;
        let limit = unsafe { (self.api().draw_get_stroke_miter_limit)(raw) };
        self.handle.check()?;
        Ok(limit)
    }

    pub fn set_stroke_miter_limit(&mut self, limit: usize) -> Result<()> {
        let raw = self.as_ptr()?;
        unsafe { (self.api().draw_set_stroke_miter_limit)(raw, limit) };
        self.handle.check()
    }

    pub fn stroke_opacity(&self) -> Result<f64> {
        self.get_real(self.api().draw_get_stroke_opacity)
    }

    pub fn set_stroke_opacity(&mut self, value: f64) -> Result<()> {
        self.set_real(self.api().draw_set_stroke_opacity, || opacity("stroke opacity", value))
    }

    pub fn stroke_width(&self) -> Result<f64> {
        self.get_real(self.api().draw_get_stroke_width)
    }

    pub fn set_stroke_width(&mut self, width: f64) -> Result<()> {
        self.set_real(self.api().draw_set_stroke_width, || non_negative("stroke width", width))
    }

    pub fn text_alignment(&self) -> Result<TextAlign> {
        self.get_option(self.api().draw_get_text_alignment)
    }

    pub fn set_text_alignment(&mut self, align: TextAlign) -> Result<()> {
        self.set_option(self.api().draw_set_text_alignment, align)
    }

    pub fn text_antialias(&self) -> Result<bool> {
        let raw = self.as_ptr()?;
        let value = unsafe { (self.api().draw_get_text_antialias)(raw) };
        self.handle.check()?;
        Ok(to_bool(value))
    }

    pub fn set_text_antialias(&mut self, antialias: bool) -> Result<()> {
        let raw = self.as_ptr()?;
        unsafe { (self.api().draw_set_text_antialias)(raw, from_bool(antialias)) };
        self.handle.check()
    }

    pub fn text_decoration(&self) -> Result<TextDecoration> {
        self.get_option(self.api().draw_get_text_decoration)
    }

    pub fn set_text_decoration(&mut self, decoration: TextDecoration) -> Result<()> {
        self.set_option(self.api().draw_set_text_decoration, decoration)
    }

    pub fn text_direction(&self) -> Result<TextDirection> {
        self.get_option(self.api().draw_get_text_direction)
    }

    pub fn set_text_direction(&mut self, direction: TextDirection) -> Result<()> {
        self.set_option(self.api().draw_set_text_direction, direction)
    }

    /// Encoding text is converted to before it's handed to the native
    /// library. `None` means the system default.
    pub fn text_encoding(&self) -> Result<Option<String>> {
        self.get_string(self.api().draw_get_text_encoding)
    }

    pub fn set_text_encoding(&mut self, encoding: Option<&str>) -> Result<()> {
        let raw = self.as_ptr()?;
        let cencoding = CString::new(encoding.unwrap_or(""))?;
        unsafe { (self.api().draw_set_text_encoding)(raw, cencoding.as_ptr()) };
        self.handle.check()
    }

    pub fn text_interline_spacing(&self) -> Result<f64> {
        let get = self
            .api()
            .draw_get_text_interline_spacing
            .ok_or(Error::Unsupported {
                feature: "text interline spacing",
            })?;
        let raw = self.as_ptr()?;
        let spacing = unsafe { get(raw) };
        self.handle.check()?;
        Ok(spacing)
    }

    pub fn set_text_interline_spacing(&mut self, spacing: f64) -> Result<()> {
        let set = self
            .api()
            .draw_set_text_interline_spacing
            .ok_or(Error::Unsupported {
                feature: "text interline spacing",
            })?;
        self.set_real(set, || finite("text interline spacing", spacing))
    }

    pub fn text_interword_spacing(&self) -> Result<f64> {
        let raw = self.as_ptr()?;
        let spacing = unsafe { (self.api().draw_get_text_interword_spacing)(raw) };
        self.handle.check()?;
        Ok(spacing)
    }

    pub fn set_text_interword_spacing(&mut self, spacing: f64) -> Result<()> {
        self.set_real(self.api().draw_set_text_interword_spacing, || {
            finite("text interword spacing", spacing)
        })
    }

    pub fn text_kerning(&self) -> Result<f64> {
        let raw = self.as_ptr()?;
        let kerning = unsafe { (self.api().draw_get_text_kerning)(raw) };
        self.handle.check()?;
        Ok(kerning)
    }

    pub fn set_text_kerning(&mut self, kerning: f64) -> Result<()> {
        self.set_real(self.api().draw_set_text_kerning, || finite("text kerning", kerning))
    }

    pub fn text_under_color(&self) -> Result<Color> {
        self.get_color(self.api().draw_get_text_under_color)
    }

    pub fn set_text_under_color(&mut self, color: &Color) -> Result<()> {
        self.set_color(self.api().draw_set_text_under_color, color)
    }

    /// The drawing's settings and instructions as drawing-wand XML. The
    /// format is experimental on the native side and subject to change.
    pub fn vector_graphics(&self) -> Result<String> {
        let raw = self.as_ptr()?;
        let xml = unsafe { (self.api().draw_get_vector_graphics)(raw) };
        match MagickString::new(self.library(), xml) {
            Some(xml) => Ok(format!("<drawing-wand>{xml}</drawing-wand>")),
            None => Err(self.handle.error("failed to export vector graphics")),
        }
    }

    /// Replaces the drawing's settings and instructions with the given
    /// drawing-wand XML. `None` resets everything to the defaults.
    pub fn set_vector_graphics(&mut self, xml: Option<&str>) -> Result<()> {
        let raw = self.as_ptr()?;
        match xml {
            Some(xml) => {
                let cxml = CString::new(xml)?;
                if to_bool(unsafe { (self.api().draw_set_vector_graphics)(raw, cxml.as_ptr()) }) {
                    self.handle.check()
                } else {
                    Err(self.handle.error("vector graphics not understood"))
                }
            }
            None => {
                unsafe { (self.api().draw_reset_vector_graphics)(raw) };
                self.handle.check()
            }
        }
    }
}
