// SPDX-License-Identifier: GPL-3.0-or-later
use crate::error::{Error, Result};
use std::{
    collections::HashMap,
    env,
    ffi::{c_char, c_int, c_uchar, c_uint, c_void, CStr, OsStr},
    fmt,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::debug;

/// Environment variable naming the MagickWand shared library to load.
pub const LIBRARY_ENV: &str = "MAGICK_WAND_LIBRARY";

const CANDIDATES: &[&str] = &[
    "libMagickWand-7.Q16HDRI.so.10",
    "libMagickWand-7.Q16HDRI.so",
    "libMagickWand-7.Q16.so.10",
    "libMagickWand-7.Q16.so",
    "libMagickWand-6.Q16.so.7",
    "libMagickWand-6.Q16.so.6",
    "libMagickWand-6.Q16.so",
    "libMagickWand.so",
    "libMagickWand-7.Q16HDRI.dylib",
    "libMagickWand-6.Q16.dylib",
    "libMagickWand.dylib",
    "CORE_RL_MagickWand_.dll",
];

#[repr(C)]
pub struct DrawingWand {
    _private: [u8; 0],
}

#[repr(C)]
pub struct MagickWand {
    _private: [u8; 0],
}

#[repr(C)]
pub struct PixelWand {
    _private: [u8; 0],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointInfo {
    pub x: f64,
    pub y: f64,
}

pub type MagickBooleanType = c_uint;
pub type ExceptionType = c_int;

pub const MAGICK_FALSE: MagickBooleanType = 0;
pub const MAGICK_TRUE: MagickBooleanType = 1;

pub(crate) fn to_bool(value: MagickBooleanType) -> bool {
    value != MAGICK_FALSE
}

pub(crate) fn from_bool(value: bool) -> MagickBooleanType {
    if value {
        MAGICK_TRUE
    } else {
        MAGICK_FALSE
    }
}

macro_rules! api {
    (
        required {
            $($name:ident = $sym:literal: fn($($arg:ty),*) $(-> $ret:ty)?;)*
        }
        optional {
            $($oname:ident = $osym:literal: fn($($oarg:ty),*) $(-> $oret:ty)?;)*
        }
    ) => {
        /// Entry points resolved from the MagickWand library.
        #[derive(Copy, Clone)]
        pub(crate) struct Api {
            $(pub(crate) $name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
            $(pub(crate) $oname: Option<unsafe extern "C" fn($($oarg),*) $(-> $oret)?>,)*
        }

        impl Api {
            unsafe fn resolve(library: &libloading::Library) -> Result<Self> {
                Ok(Self {
                    $($name: *library
                        .get::<unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                            concat!($sym, "\0").as_bytes(),
                        )
                        .map_err(|e| Error::Load(format!("{}: {e}", $sym)))?,)*
                    $($oname: library
                        .get::<unsafe extern "C" fn($($oarg),*) $(-> $oret)?>(
                            concat!($osym, "\0").as_bytes(),
                        )
                        .ok()
                        .map(|symbol| *symbol),)*
                })
            }
        }
    };
}

api! {
    required {
        magick_wand_genesis = "MagickWandGenesis": fn();
        magick_wand_terminus = "MagickWandTerminus": fn();
        is_magick_wand_instantiated = "IsMagickWandInstantiated": fn() -> MagickBooleanType;
        magick_get_version = "MagickGetVersion": fn(*mut usize) -> *const c_char;
        magick_relinquish_memory = "MagickRelinquishMemory": fn(*mut c_void) -> *mut c_void;

        new_drawing_wand = "NewDrawingWand": fn() -> *mut DrawingWand;
        clone_drawing_wand = "CloneDrawingWand": fn(*const DrawingWand) -> *mut DrawingWand;
        destroy_drawing_wand = "DestroyDrawingWand": fn(*mut DrawingWand) -> *mut DrawingWand;
        is_drawing_wand = "IsDrawingWand": fn(*const DrawingWand) -> MagickBooleanType;
        clear_drawing_wand = "ClearDrawingWand": fn(*mut DrawingWand);
        draw_get_exception = "DrawGetException": fn(*const DrawingWand, *mut ExceptionType) -> *mut c_char;
        draw_clear_exception = "DrawClearException": fn(*mut DrawingWand) -> MagickBooleanType;
        push_drawing_wand = "PushDrawingWand": fn(*mut DrawingWand) -> MagickBooleanType;
        pop_drawing_wand = "PopDrawingWand": fn(*mut DrawingWand) -> MagickBooleanType;

        draw_get_clip_path = "DrawGetClipPath": fn(*const DrawingWand) -> *mut c_char;
        draw_set_clip_path = "DrawSetClipPath": fn(*mut DrawingWand, *const c_char) -> MagickBooleanType;
        draw_get_clip_rule = "DrawGetClipRule": fn(*const DrawingWand) -> c_int;
        draw_set_clip_rule = "DrawSetClipRule": fn(*mut DrawingWand, c_int);
        draw_get_clip_units = "DrawGetClipUnits": fn(*const DrawingWand) -> c_int;
        draw_set_clip_units = "DrawSetClipUnits": fn(*mut DrawingWand, c_int);
        draw_push_clip_path = "DrawPushClipPath": fn(*mut DrawingWand, *const c_char);
        draw_pop_clip_path = "DrawPopClipPath": fn(*mut DrawingWand);
        draw_get_font = "DrawGetFont": fn(*const DrawingWand) -> *mut c_char;
        draw_set_font = "DrawSetFont": fn(*mut DrawingWand, *const c_char) -> MagickBooleanType;
        draw_get_font_size = "DrawGetFontSize": fn(*const DrawingWand) -> f64;
        draw_set_font_size = "DrawSetFontSize": fn(*mut DrawingWand, f64);
        draw_get_fill_color = "DrawGetFillColor": fn(*const DrawingWand, *mut PixelWand);
        draw_set_fill_color = "DrawSetFillColor": fn(*mut DrawingWand, *const PixelWand);
        draw_get_fill_opacity = "DrawGetFillOpacity": fn(*const DrawingWand) -> f64;
        draw_set_fill_opacity = "DrawSetFillOpacity": fn(*mut DrawingWand, f64);
        draw_get_fill_rule = "DrawGetFillRule": fn(*const DrawingWand) -> c_int;
        draw_set_fill_rule = "DrawSetFillRule": fn(*mut DrawingWand, c_int);
        draw_get_gravity = "DrawGetGravity": fn(*const DrawingWand) -> c_int;
        draw_set_gravity = "DrawSetGravity": fn(*mut DrawingWand, c_int);
        draw_get_stroke_antialias = "DrawGetStrokeAntialias": fn(*const DrawingWand) -> MagickBooleanType;
        draw_set_stroke_antialias = "DrawSetStrokeAntialias": fn(*mut DrawingWand, MagickBooleanType);
        draw_get_stroke_color = "DrawGetStrokeColor": fn(*const DrawingWand, *mut PixelWand);
        draw_set_stroke_color = "DrawSetStrokeColor": fn(*mut DrawingWand, *const PixelWand);
        draw_get_stroke_dash_array = "DrawGetStrokeDashArray": fn(*const DrawingWand, *mut usize) -> *mut f64;
        draw_set_stroke_dash_array = "DrawSetStrokeDashArray": fn(*mut DrawingWand, usize, *const f64) -> MagickBooleanType;
        draw_get_stroke_dash_offset = "DrawGetStrokeDashOffset": fn(*const DrawingWand) -> f64;
        draw_set_stroke_dash_offset = "DrawSetStrokeDashOffset": fn(*mut DrawingWand, f64);
        draw_get_stroke_line_cap = "DrawGetStrokeLineCap": fn(*const DrawingWand) -> c_int;
        draw_set_stroke_line_cap = "DrawSetStrokeLineCap": fn(*mut DrawingWand, c_int);
        draw_get_stroke_line_join = "DrawGetStrokeLineJoin": fn(*const DrawingWand) -> c_int;
        draw_set_stroke_line_join = "DrawSetStrokeLineJoin": fn(*mut DrawingWand, c_int);
        draw_get_stroke_miter_limit = "DrawGetStrokeMiterLimit": fn(*const DrawingWand) -> usize;
        draw_set_stroke_miter_limit = "DrawSetStrokeMiterLimit": fn(*mut DrawingWand, usize);
        draw_get_stroke_opacity = "DrawGetStrokeOpacity": fn(*const DrawingWand) -> f64;
        draw_set_stroke_opacity = "DrawSetStrokeOpacity": fn(*mut DrawingWand, f64);
        draw_get_stroke_width = "DrawGetStrokeWidth": fn(*const DrawingWand) -> f64;
        draw_set_stroke_width = "DrawSetStrokeWidth": fn(*mut DrawingWand, f64);
        draw_get_text_alignment = "DrawGetTextAlignment": fn(*const DrawingWand) -> c_int;
        draw_set_text_alignment = "DrawSetTextAlignment": fn(*mut DrawingWand, c_int);
        draw_get_text_antialias = "DrawGetTextAntialias": fn(*const DrawingWand) -> MagickBooleanType;
        draw_set_text_antialias = "DrawSetTextAntialias": fn(*mut DrawingWand, MagickBooleanType);
        draw_get_text_decoration = "DrawGetTextDecoration": fn(*const DrawingWand) -> c_int;
        draw_set_text_decoration = "DrawSetTextDecoration": fn(*mut DrawingWand, c_int);
        draw_get_text_direction = "DrawGetTextDirection": fn(*const DrawingWand) -> c_int;
        draw_set_text_direction = "DrawSetTextDirection": fn(*mut DrawingWand, c_int);
        draw_get_text_encoding = "DrawGetTextEncoding": fn(*const DrawingWand) -> *mut c_char;
        draw_set_text_encoding = "DrawSetTextEncoding": fn(*mut DrawingWand, *const c_char);
        draw_get_text_interword_spacing = "DrawGetTextInterwordSpacing": fn(*mut DrawingWand) -> f64;
        draw_set_text_interword_spacing = "DrawSetTextInterwordSpacing": fn(*mut DrawingWand, f64);
        draw_get_text_kerning = "DrawGetTextKerning": fn(*mut DrawingWand) -> f64;
        draw_set_text_kerning = "DrawSetTextKerning": fn(*mut DrawingWand, f64);
        draw_get_text_under_color = "DrawGetTextUnderColor": fn(*const DrawingWand, *mut PixelWand);
        draw_set_text_under_color = "DrawSetTextUnderColor": fn(*mut DrawingWand, *const PixelWand);
        draw_get_vector_graphics = "DrawGetVectorGraphics": fn(*mut DrawingWand) -> *mut c_char;
        draw_set_vector_graphics = "DrawSetVectorGraphics": fn(*mut DrawingWand, *const c_char) -> MagickBooleanType;
        draw_reset_vector_graphics = "DrawResetVectorGraphics": fn(*mut DrawingWand);
        draw_set_viewbox_integer = "DrawSetViewbox": fn(*mut DrawingWand, isize, isize, isize, isize);
        draw_set_viewbox_real = "DrawSetViewbox": fn(*mut DrawingWand, f64, f64, f64, f64);

        draw_annotation = "DrawAnnotation": fn(*mut DrawingWand, f64, f64, *const c_uchar);
        draw_arc = "DrawArc": fn(*mut DrawingWand, f64, f64, f64, f64, f64, f64);
        draw_bezier = "DrawBezier": fn(*mut DrawingWand, usize, *const PointInfo);
        draw_circle = "DrawCircle": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_color = "DrawColor": fn(*mut DrawingWand, f64, f64, c_int);
        draw_ellipse = "DrawEllipse": fn(*mut DrawingWand, f64, f64, f64, f64, f64, f64);
        draw_line = "DrawLine": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_point = "DrawPoint": fn(*mut DrawingWand, f64, f64);
        draw_polygon = "DrawPolygon": fn(*mut DrawingWand, usize, *const PointInfo);
        draw_polyline = "DrawPolyline": fn(*mut DrawingWand, usize, *const PointInfo);
        draw_rectangle = "DrawRectangle": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_rotate = "DrawRotate": fn(*mut DrawingWand, f64);
        draw_scale = "DrawScale": fn(*mut DrawingWand, f64, f64);
        draw_skew_x = "DrawSkewX": fn(*mut DrawingWand, f64);
        draw_skew_y = "DrawSkewY": fn(*mut DrawingWand, f64);
        draw_translate = "DrawTranslate": fn(*mut DrawingWand, f64, f64);

        draw_path_start = "DrawPathStart": fn(*mut DrawingWand);
        draw_path_finish = "DrawPathFinish": fn(*mut DrawingWand);
        draw_path_close = "DrawPathClose": fn(*mut DrawingWand);
        draw_path_curve_to_absolute = "DrawPathCurveToAbsolute": fn(*mut DrawingWand, f64, f64, f64, f64, f64, f64);
        draw_path_curve_to_relative = "DrawPathCurveToRelative": fn(*mut DrawingWand, f64, f64, f64, f64, f64, f64);
        draw_path_curve_to_smooth_absolute = "DrawPathCurveToSmoothAbsolute": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_path_curve_to_smooth_relative = "DrawPathCurveToSmoothRelative": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_path_curve_to_quadratic_bezier_absolute = "DrawPathCurveToQuadraticBezierAbsolute": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_path_curve_to_quadratic_bezier_relative = "DrawPathCurveToQuadraticBezierRelative": fn(*mut DrawingWand, f64, f64, f64, f64);
        draw_path_curve_to_quadratic_bezier_smooth_absolute = "DrawPathCurveToQuadraticBezierSmoothAbsolute": fn(*mut DrawingWand, f64, f64);
        draw_path_curve_to_quadratic_bezier_smooth_relative = "DrawPathCurveToQuadraticBezierSmoothRelative": fn(*mut DrawingWand, f64, f64);
        draw_path_elliptic_arc_absolute = "DrawPathEllipticArcAbsolute": fn(*mut DrawingWand, f64, f64, f64, MagickBooleanType, MagickBooleanType, f64, f64);
        draw_path_elliptic_arc_relative = "DrawPathEllipticArcRelative": fn(*mut DrawingWand, f64, f64, f64, MagickBooleanType, MagickBooleanType, f64, f64);
        draw_path_line_to_absolute = "DrawPathLineToAbsolute": fn(*mut DrawingWand, f64, f64);
        draw_path_line_to_relative = "DrawPathLineToRelative": fn(*mut DrawingWand, f64, f64);
        draw_path_line_to_horizontal_absolute = "DrawPathLineToHorizontalAbsolute": fn(*mut DrawingWand, f64);
        draw_path_line_to_horizontal_relative = "DrawPathLineToHorizontalRelative": fn(*mut DrawingWand, f64);
        draw_path_line_to_vertical_absolute = "DrawPathLineToVerticalAbsolute": fn(*mut DrawingWand, f64);
        draw_path_line_to_vertical_relative = "DrawPathLineToVerticalRelative": fn(*mut DrawingWand, f64);
        draw_path_move_to_absolute = "DrawPathMoveToAbsolute": fn(*mut DrawingWand, f64, f64);
        draw_path_move_to_relative = "DrawPathMoveToRelative": fn(*mut DrawingWand, f64, f64);

        new_magick_wand = "NewMagickWand": fn() -> *mut MagickWand;
        clone_magick_wand = "CloneMagickWand": fn(*const MagickWand) -> *mut MagickWand;
        destroy_magick_wand = "DestroyMagickWand": fn(*mut MagickWand) -> *mut MagickWand;
        is_magick_wand = "IsMagickWand": fn(*const MagickWand) -> MagickBooleanType;
        magick_get_exception = "MagickGetException": fn(*const MagickWand, *mut ExceptionType) -> *mut c_char;
        magick_clear_exception = "MagickClearException": fn(*mut MagickWand) -> MagickBooleanType;
        magick_read_image = "MagickReadImage": fn(*mut MagickWand, *const c_char) -> MagickBooleanType;
        magick_write_image = "MagickWriteImage": fn(*mut MagickWand, *const c_char) -> MagickBooleanType;
        magick_new_image = "MagickNewImage": fn(*mut MagickWand, usize, usize, *const PixelWand) -> MagickBooleanType;
        magick_get_image_width = "MagickGetImageWidth": fn(*mut MagickWand) -> usize;
        magick_get_image_height = "MagickGetImageHeight": fn(*mut MagickWand) -> usize;
        magick_get_image_pixel_color = "MagickGetImagePixelColor": fn(*mut MagickWand, isize, isize, *mut PixelWand) -> MagickBooleanType;
        magick_draw_image = "MagickDrawImage": fn(*mut MagickWand, *const DrawingWand) -> MagickBooleanType;
        magick_query_font_metrics = "MagickQueryFontMetrics": fn(*mut MagickWand, *const DrawingWand, *const c_char) -> *mut f64;
        magick_query_multiline_font_metrics = "MagickQueryMultilineFontMetrics": fn(*mut MagickWand, *const DrawingWand, *const c_char) -> *mut f64;

        new_pixel_wand = "NewPixelWand": fn() -> *mut PixelWand;
        destroy_pixel_wand = "DestroyPixelWand": fn(*mut PixelWand) -> *mut PixelWand;
        is_pixel_wand = "IsPixelWand": fn(*const PixelWand) -> MagickBooleanType;
        pixel_get_exception = "PixelGetException": fn(*const PixelWand, *mut ExceptionType) -> *mut c_char;
        pixel_clear_exception = "PixelClearException": fn(*mut PixelWand) -> MagickBooleanType;
        pixel_set_color = "PixelSetColor": fn(*mut PixelWand, *const c_char) -> MagickBooleanType;
        pixel_get_red = "PixelGetRed": fn(*const PixelWand) -> f64;
        pixel_get_green = "PixelGetGreen": fn(*const PixelWand) -> f64;
        pixel_get_blue = "PixelGetBlue": fn(*const PixelWand) -> f64;
        pixel_get_alpha = "PixelGetAlpha": fn(*const PixelWand) -> f64;
        pixel_set_red = "PixelSetRed": fn(*mut PixelWand, f64);
        pixel_set_green = "PixelSetGreen": fn(*mut PixelWand, f64);
        pixel_set_blue = "PixelSetBlue": fn(*mut PixelWand, f64);
        pixel_set_alpha = "PixelSetAlpha": fn(*mut PixelWand, f64);
    }
    optional {
        // Missing from older ImageMagick 6 releases.
        draw_get_text_interline_spacing = "DrawGetTextInterlineSpacing": fn(*mut DrawingWand) -> f64;
        draw_set_text_interline_spacing = "DrawSetTextInterlineSpacing": fn(*mut DrawingWand, f64);
        // ImageMagick 6 calls it matte, 7 calls it alpha.
        draw_matte = "DrawMatte": fn(*mut DrawingWand, f64, f64, c_int);
        draw_alpha = "DrawAlpha": fn(*mut DrawingWand, f64, f64, c_int);
    }
}

/// A loaded MagickWand library.
///
/// All handles created from a library keep it alive through an [`Arc`], so
/// the shared object is never unloaded while a wand still points into it.
pub struct Library {
    api: Api,
    version: String,
    version_number: usize,
    counted: bool,
    _library: Option<libloading::Library>,
}

impl Library {
    /// Loads the library from the given path or soname.
    pub fn open(path: impl AsRef<OsStr>) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let library = unsafe { libloading::Library::new(path) }
            .map_err(|e| Error::Load(format!("{}: {e}", path.to_string_lossy())))?;
        let api = unsafe { Api::resolve(&library) }?;
        let lib = Self::init(api, Some(library));
        debug!(
            "Loaded {} from {} (ABI {})",
            lib.version,
            path.to_string_lossy(),
            lib.major_version()
        );
        Ok(Arc::new(lib))
    }

    /// Loads the library named by [`LIBRARY_ENV`] or, if that isn't set, the
    /// first one of the usual library names that can be found.
    pub fn load() -> Result<Arc<Self>> {
        if let Some(path) = env::var_os(LIBRARY_ENV) {
            return Self::open(path);
        }

        let mut errors = Vec::new();
        for candidate in CANDIDATES {
            match Self::open(candidate) {
                Ok(lib) => return Ok(lib),
                Err(e) => errors.push(e.to_string()),
            }
        }
        Err(Error::Load(format!(
            "no MagickWand library found, set {LIBRARY_ENV} to its path ({})",
            errors.join("; ")
        )))
    }

    /// Process-wide library, loaded on first use. Failed loads are retried
    /// on the next call.
    pub fn global() -> Result<Arc<Self>> {
        static GLOBAL: OnceLock<Arc<Library>> = OnceLock::new();
        if let Some(lib) = GLOBAL.get() {
            return Ok(lib.clone());
        }
        let lib = Self::load()?;
        Ok(GLOBAL.get_or_init(|| lib).clone())
    }

    #[cfg(test)]
    pub(crate) fn from_api(api: Api) -> Arc<Self> {
        Arc::new(Self::init(api, None))
    }

    fn init(api: Api, library: Option<libloading::Library>) -> Self {
        let counted = {
            let mut users = genesis_users();
            let key = api.magick_wand_terminus as usize;
            match users.get_mut(&key) {
                Some(count) => {
                    *count += 1;
                    true
                }
                None if !to_bool(unsafe { (api.is_magick_wand_instantiated)() }) => {
                    unsafe { (api.magick_wand_genesis)() };
                    users.insert(key, 1);
                    true
                }
                // Set up by the host application.
                None => false,
            }
        };

        let mut version_number = 0_usize;
        let version = unsafe { (api.magick_get_version)(&mut version_number) };
        let version = if version.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(version) }
                .to_string_lossy()
                .into_owned()
        };

        Self {
            api,
            version,
            version_number,
            counted,
            _library: library,
        }
    }

    pub(crate) fn api(&self) -> &Api {
        &self.api
    }

    /// Version string, e.g. `ImageMagick 6.9.11-60 Q16 x86_64`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Packed version number, e.g. `0x69b`.
    pub fn version_number(&self) -> usize {
        self.version_number
    }

    pub fn major_version(&self) -> usize {
        self.version_number >> 8
    }

    pub fn supports_interline_spacing(&self) -> bool {
        self.api.draw_get_text_interline_spacing.is_some()
            && self.api.draw_set_text_interline_spacing.is_some()
    }

    pub fn supports_matte(&self) -> bool {
        self.api.draw_matte.is_some() || self.api.draw_alpha.is_some()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("version", &self.version)
            .field("version_number", &format_args!("{:#x}", self.version_number))
            .finish_non_exhaustive()
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if !self.counted {
            return;
        }
        let mut users = genesis_users();
        let key = self.api.magick_wand_terminus as usize;
        if let Some(count) = users.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                users.remove(&key);
                debug!("Terminating {}", self.version);
                unsafe { (self.api.magick_wand_terminus)() }
            }
        }
    }
}

/// Live libraries per loaded MagickWand instance, keyed by its terminus entry
/// point. Opening the same shared object twice yields the same instance, so
/// genesis and terminus are shared by everyone holding it.
fn genesis_users() -> MutexGuard<'static, HashMap<usize, usize>> {
    static USERS: OnceLock<Mutex<HashMap<usize, usize>>> = OnceLock::new();
    USERS
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}
