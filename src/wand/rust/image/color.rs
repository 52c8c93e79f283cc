// SPDX-License-Identifier: GPL-3.0-or-later
use crate::{
    common::{Handle, PixelKind},
    error::{Error, Result},
    library::{self, to_bool, Library},
};
use serde::Deserialize;
use std::{ffi::CString, fmt::Display, str::FromStr, sync::Arc};

/// An RGBA color with channels in `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn rgba8(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self::rgba(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
            f64::from(alpha) / 255.0,
        )
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            channel(self.red),
            channel(self.green),
            channel(self.blue),
            channel(self.alpha),
        ]
    }

    /// Resolves any color specification the native library understands,
    /// such as `"red"`, `"rgb(0,128,255)"` or `"#0080ff"`.
    pub fn parse(lib: &Arc<Library>, spec: &str) -> Result<Self> {
        let mut pixel = Pixel::new(lib)?;
        pixel.set_spec(spec)?;
        pixel.color()
    }

    pub(crate) fn check(&self) -> Result<()> {
        let channels = [self.red, self.green, self.blue, self.alpha];
        if channels.iter().all(|c| (0.0..=1.0).contains(c)) {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "color channels must be between 0.0 and 1.0, not {channels:?}"
            )))
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::invalid(format!(
                "invalid color '{s}', must be given as #rgb, #rgba, #rrggbb or #rrggbbaa"
            ))
        };
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|n| n * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16);
        let channels = match hex.len() {
            3 => [nibble(0), nibble(1), nibble(2), Ok(255)],
            4 => [nibble(0), nibble(1), nibble(2), nibble(3)],
            6 => [byte(0), byte(1), byte(2), Ok(255)],
            8 => [byte(0), byte(1), byte(2), byte(3)],
            _ => return Err(invalid()),
        };
        match channels {
            [Ok(r), Ok(g), Ok(b), Ok(a)] => Ok(Self::rgba8(r, g, b, a)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A native pixel wand holding one color for the duration of a call.
pub(crate) struct Pixel {
    handle: Handle<PixelKind>,
}

impl Pixel {
    pub fn new(lib: &Arc<Library>) -> Result<Self> {
        let raw = unsafe { (lib.api().new_pixel_wand)() };
        Ok(Self {
            handle: Handle::new(lib.clone(), raw)?,
        })
    }

    pub fn from_color(lib: &Arc<Library>, color: &Color) -> Result<Self> {
        color.check()?;
        let pixel = Self::new(lib)?;
        let raw = pixel.as_ptr()?;
        let api = pixel.handle.api();
        unsafe {
            (api.pixel_set_red)(raw, color.red);
            (api.pixel_set_green)(raw, color.green);
            (api.pixel_set_blue)(raw, color.blue);
            (api.pixel_set_alpha)(raw, color.alpha);
        }
        Ok(pixel)
    }

    pub fn set_spec(&mut self, spec: &str) -> Result<()> {
        let cspec = CString::new(spec)?;
        let raw = self.as_ptr()?;
        if to_bool(unsafe { (self.handle.api().pixel_set_color)(raw, cspec.as_ptr()) }) {
            Ok(())
        } else {
            Err(self.handle.error(&format!("unrecognized color '{spec}'")))
        }
    }

    pub fn color(&self) -> Result<Color> {
        let raw = self.as_ptr()?;
        let api = self.handle.api();
        Ok(unsafe {
            Color::rgba(
                (api.pixel_get_red)(raw),
                (api.pixel_get_green)(raw),
                (api.pixel_get_blue)(raw),
                (api.pixel_get_alpha)(raw),
            )
        })
    }

    pub fn as_ptr(&self) -> Result<*mut library::PixelWand> {
        self.handle.as_ptr()
    }
}
