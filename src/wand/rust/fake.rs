// SPDX-License-Identifier: GPL-3.0-or-later
//! In-memory stand-in for the MagickWand library.
//!
//! Drawing wands record every call that changes them, so tests can check
//! exactly what reached the native side. All bookkeeping is thread-local,
//! wands must stay on the thread that created them.
use crate::{
    image::Color,
    library::{
        Api, DrawingWand, ExceptionType, Library, MagickBooleanType, MagickWand, PixelWand,
        PointInfo, MAGICK_FALSE, MAGICK_TRUE,
    },
};
use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    ffi::{c_char, c_int, c_uchar, c_void, CStr, CString},
    fmt::Display,
    path::Path,
    ptr, slice,
    sync::Arc,
};

macro_rules! version_7 {
    () => {
        "ImageMagick 7.1.1-15 Q16-HDRI x86_64 21298 https://imagemagick.org"
    };
}

macro_rules! version_6 {
    () => {
        "ImageMagick 6.9.11-60 Q16 x86_64 2021-01-25 https://imagemagick.org"
    };
}

pub(crate) const VERSION: &str = version_7!();

thread_local! {
    static ALLOCATIONS: RefCell<HashMap<usize, Box<dyn Any>>> = RefCell::default();
    static WANDS: RefCell<HashSet<usize>> = RefCell::default();
    static DESTROYED_DRAWING_WANDS: Cell<usize> = Cell::new(0);
    static LIVE_PIXEL_WANDS: Cell<usize> = Cell::new(0);
    static LAST_TEXT: RefCell<Vec<u8>> = RefCell::default();
}

type Exception = Option<(ExceptionType, String)>;

pub(crate) fn library() -> Arc<Library> {
    Library::from_api(api())
}

/// A library whose entry points were altered by `f`.
pub(crate) fn library_with(f: impl FnOnce(&mut Api)) -> Arc<Library> {
    let mut api = api();
    f(&mut api);
    Library::from_api(api)
}

pub(crate) fn alloc_string(s: &str) -> *mut c_char {
    let s = CString::new(s).unwrap();
    let raw = s.as_ptr().cast_mut();
    ALLOCATIONS.with(|a| a.borrow_mut().insert(raw as usize, Box::new(s)));
    raw
}

pub(crate) fn alloc_doubles(values: &[f64]) -> *mut f64 {
    let mut values = values.to_vec();
    let raw = values.as_mut_ptr();
    ALLOCATIONS.with(|a| a.borrow_mut().insert(raw as usize, Box::new(values)));
    raw
}

/// Number of strings and arrays handed out and not yet relinquished.
pub(crate) fn live_allocations() -> usize {
    ALLOCATIONS.with(|a| a.borrow().len())
}

pub(crate) fn destroyed_drawing_wands() -> usize {
    DESTROYED_DRAWING_WANDS.with(Cell::get)
}

pub(crate) fn live_pixel_wands() -> usize {
    LIVE_PIXEL_WANDS.with(Cell::get)
}

/// Bytes of the last text annotated or measured.
pub(crate) fn last_text() -> Vec<u8> {
    LAST_TEXT.with(|t| t.borrow().clone())
}

fn set_last_text(text: *const c_char) -> Vec<u8> {
    let bytes = unsafe { CStr::from_ptr(text) }.to_bytes().to_vec();
    LAST_TEXT.with(|t| *t.borrow_mut() = bytes.clone());
    bytes
}

unsafe fn get_exception(exception: &Exception, severity: *mut ExceptionType) -> *mut c_char {
    let (code, message) = exception.clone().unwrap_or((0, String::new()));
    *severity = code;
    alloc_string(&message)
}

fn is_error(exception: &Exception) -> bool {
    matches!(exception, Some((code, _)) if *code >= 400)
}

fn register<T>(wand: Box<T>) -> *mut T {
    let raw = Box::into_raw(wand);
    WANDS.with(|w| w.borrow_mut().insert(raw as usize));
    raw
}

unsafe fn unregister<T>(raw: *mut T) {
    if !raw.is_null() && WANDS.with(|w| w.borrow_mut().remove(&(raw as usize))) {
        drop(Box::from_raw(raw));
    }
}

fn is_registered<T>(raw: *const T) -> MagickBooleanType {
    if WANDS.with(|w| w.borrow().contains(&(raw as usize))) {
        MAGICK_TRUE
    } else {
        MAGICK_FALSE
    }
}

unsafe fn c_str(s: *const c_char) -> String {
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

unsafe extern "C" fn magick_wand_genesis() {}

unsafe extern "C" fn magick_wand_terminus() {}

unsafe extern "C" fn is_magick_wand_instantiated() -> MagickBooleanType {
    MAGICK_FALSE
}

unsafe extern "C" fn magick_get_version(number: *mut usize) -> *const c_char {
    *number = 0x711;
    concat!(version_7!(), "\0").as_ptr().cast()
}

pub(crate) unsafe extern "C" fn magick_get_version_6(number: *mut usize) -> *const c_char {
    *number = 0x69b;
    concat!(version_6!(), "\0").as_ptr().cast()
}

unsafe extern "C" fn magick_relinquish_memory(memory: *mut c_void) -> *mut c_void {
    ALLOCATIONS.with(|a| a.borrow_mut().remove(&(memory as usize)));
    ptr::null_mut()
}

// Drawing wands

#[derive(Clone)]
pub(crate) struct State {
    pub clip_path: Option<String>,
    pub clip_rule: c_int,
    pub clip_units: c_int,
    pub font: Option<String>,
    pub font_size: f64,
    pub fill_color: [f64; 4],
    pub fill_opacity: f64,
    pub fill_rule: c_int,
    pub gravity: c_int,
    pub stroke_antialias: MagickBooleanType,
    pub stroke_color: [f64; 4],
    pub dash_array: Vec<f64>,
    pub dash_offset: f64,
    pub line_cap: c_int,
    pub line_join: c_int,
    pub miter_limit: usize,
    pub stroke_opacity: f64,
    pub stroke_width: f64,
    pub text_alignment: c_int,
    pub text_antialias: MagickBooleanType,
    pub text_decoration: c_int,
    pub text_direction: c_int,
    pub text_encoding: Option<String>,
    pub interline_spacing: f64,
    pub interword_spacing: f64,
    pub kerning: f64,
    pub under_color: [f64; 4],
    pub vector_graphics: String,
}

impl Default for State {
    fn default() -> Self {
        Self {
            clip_path: None,
            clip_rule: 0,
            clip_units: 0,
            font: None,
            font_size: 12.0,
            fill_color: [0.0, 0.0, 0.0, 1.0],
            fill_opacity: 1.0,
            fill_rule: 0,
            gravity: 0,
            stroke_antialias: MAGICK_TRUE,
            stroke_color: [0.0, 0.0, 0.0, 0.0],
            dash_array: Vec::new(),
            dash_offset: 0.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            text_alignment: 0,
            text_antialias: MAGICK_TRUE,
            text_decoration: 0,
            text_direction: 0,
            text_encoding: None,
            interline_spacing: 0.0,
            interword_spacing: 0.0,
            kerning: 0.0,
            under_color: [0.0, 0.0, 0.0, 0.0],
            vector_graphics: String::new(),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct FakeDrawing {
    pub state: State,
    stack: Vec<State>,
    calls: Vec<String>,
    exception: Exception,
}

impl FakeDrawing {
    fn record(&mut self, name: &str, args: &[&dyn Display]) {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        self.calls.push(format!("{name}({})", args.join(", ")));
    }
}

unsafe fn drawing<'a>(wand: *const DrawingWand) -> &'a mut FakeDrawing {
    &mut *(wand as *mut FakeDrawing)
}

pub(crate) fn with_drawing(wand: *mut DrawingWand, f: impl FnOnce(&mut FakeDrawing)) {
    f(unsafe { drawing(wand) })
}

pub(crate) fn drawing_calls(wand: *mut DrawingWand) -> Vec<String> {
    unsafe { drawing(wand) }.calls.clone()
}

pub(crate) fn raise_drawing_exception(wand: *mut DrawingWand, code: ExceptionType, message: &str) {
    unsafe { drawing(wand) }.exception = Some((code, message.to_owned()));
}

pub(crate) unsafe extern "C" fn null_drawing_wand() -> *mut DrawingWand {
    ptr::null_mut()
}

unsafe extern "C" fn new_drawing_wand() -> *mut DrawingWand {
    register(Box::<FakeDrawing>::default()).cast()
}

unsafe extern "C" fn clone_drawing_wand(wand: *const DrawingWand) -> *mut DrawingWand {
    register(Box::new(drawing(wand).clone())).cast()
}

unsafe extern "C" fn destroy_drawing_wand(wand: *mut DrawingWand) -> *mut DrawingWand {
    unregister(wand.cast::<FakeDrawing>());
    DESTROYED_DRAWING_WANDS.with(|n| n.set(n.get() + 1));
    ptr::null_mut()
}

unsafe extern "C" fn is_drawing_wand(wand: *const DrawingWand) -> MagickBooleanType {
    is_registered(wand)
}

unsafe extern "C" fn clear_drawing_wand(wand: *mut DrawingWand) {
    let d = drawing(wand);
    *d = FakeDrawing::default();
    d.record("ClearDrawingWand", &[]);
}

unsafe extern "C" fn draw_get_exception(
    wand: *const DrawingWand,
    severity: *mut ExceptionType,
) -> *mut c_char {
    get_exception(&drawing(wand).exception, severity)
}

unsafe extern "C" fn draw_clear_exception(wand: *mut DrawingWand) -> MagickBooleanType {
    drawing(wand).exception = None;
    MAGICK_TRUE
}

unsafe extern "C" fn push_drawing_wand(wand: *mut DrawingWand) -> MagickBooleanType {
    let d = drawing(wand);
    d.stack.push(d.state.clone());
    d.record("PushDrawingWand", &[]);
    MAGICK_TRUE
}

unsafe extern "C" fn pop_drawing_wand(wand: *mut DrawingWand) -> MagickBooleanType {
    let d = drawing(wand);
    match d.stack.pop() {
        Some(state) => {
            d.state = state;
            d.record("PopDrawingWand", &[]);
            MAGICK_TRUE
        }
        None => {
            d.exception = Some((460, "unbalanced graphic context push/pop".to_owned()));
            MAGICK_FALSE
        }
    }
}

macro_rules! property {
    ($get:ident($ptr:ty), $set:ident, $name:literal, $field:ident: $ty:ty) => {
        unsafe extern "C" fn $get(wand: $ptr) -> $ty {
            drawing(wand).state.$field
        }

        unsafe extern "C" fn $set(wand: *mut DrawingWand, value: $ty) {
            let d = drawing(wand);
            d.state.$field = value;
            d.record($name, &[&value]);
        }
    };
}

property!(draw_get_clip_rule(*const DrawingWand), draw_set_clip_rule, "DrawSetClipRule", clip_rule: c_int);
property!(draw_get_clip_units(*const DrawingWand), draw_set_clip_units, "DrawSetClipUnits", clip_units: c_int);
property!(draw_get_font_size(*const DrawingWand), draw_set_font_size, "DrawSetFontSize", font_size: f64);
property!(draw_get_fill_opacity(*const DrawingWand), draw_set_fill_opacity, "DrawSetFillOpacity", fill_opacity: f64);
property!(draw_get_fill_rule(*const DrawingWand), draw_set_fill_rule, "DrawSetFillRule", fill_rule: c_int);
property!(draw_get_gravity(*const DrawingWand), draw_set_gravity, "DrawSetGravity", gravity: c_int);
property!(draw_get_stroke_antialias(*const DrawingWand), draw_set_stroke_antialias, "DrawSetStrokeAntialias", stroke_antialias: MagickBooleanType);
property!(draw_get_stroke_dash_offset(*const DrawingWand), draw_set_stroke_dash_offset, "DrawSetStrokeDashOffset", dash_offset: f64);
property!(draw_get_stroke_line_cap(*const DrawingWand), draw_set_stroke_line_cap, "DrawSetStrokeLineCap", line_cap: c_int);
property!(draw_get_stroke_line_join(*const DrawingWand), draw_set_stroke_line_join, "DrawSetStrokeLineJoin", line_join: c_int);
property!(draw_get_stroke_miter_limit(*const DrawingWand), draw_set_stroke_miter_limit, "DrawSetStrokeMiterLimit", miter_limit: usize);
property!(draw_get_stroke_opacity(*const DrawingWand), draw_set_stroke_opacity, "DrawSetStrokeOpacity", stroke_opacity: f64);
property!(draw_get_stroke_width(*const DrawingWand), draw_set_stroke_width, "DrawSetStrokeWidth", stroke_width: f64);
property!(draw_get_text_alignment(*const DrawingWand), draw_set_text_alignment, "DrawSetTextAlignment", text_alignment: c_int);
property!(draw_get_text_antialias(*const DrawingWand), draw_set_text_antialias, "DrawSetTextAntialias", text_antialias: MagickBooleanType);
property!(draw_get_text_decoration(*const DrawingWand), draw_set_text_decoration, "DrawSetTextDecoration", text_decoration: c_int);
property!(draw_get_text_direction(*const DrawingWand), draw_set_text_direction, "DrawSetTextDirection", text_direction: c_int);
property!(draw_get_text_interline_spacing(*mut DrawingWand), draw_set_text_interline_spacing, "DrawSetTextInterlineSpacing", interline_spacing: f64);
property!(draw_get_text_interword_spacing(*mut DrawingWand), draw_set_text_interword_spacing, "DrawSetTextInterwordSpacing", interword_spacing: f64);
property!(draw_get_text_kerning(*mut DrawingWand), draw_set_text_kerning, "DrawSetTextKerning", kerning: f64);

macro_rules! color_property {
    ($get:ident, $set:ident, $name:literal, $field:ident) => {
        unsafe extern "C" fn $get(wand: *const DrawingWand, pixel_wand: *mut PixelWand) {
            pixel(pixel_wand).color = drawing(wand).state.$field;
        }

        unsafe extern "C" fn $set(wand: *mut DrawingWand, pixel_wand: *const PixelWand) {
            let color = pixel(pixel_wand).color;
            let d = drawing(wand);
            d.state.$field = color;
            d.record($name, &[&format!("{color:?}")]);
        }
    };
}

color_property!(draw_get_fill_color, draw_set_fill_color, "DrawSetFillColor", fill_color);
color_property!(draw_get_stroke_color, draw_set_stroke_color, "DrawSetStrokeColor", stroke_color);
color_property!(draw_get_text_under_color, draw_set_text_under_color, "DrawSetTextUnderColor", under_color);

fn alloc_optional(s: &Option<String>) -> *mut c_char {
    s.as_deref().map_or(ptr::null_mut(), alloc_string)
}

unsafe extern "C" fn draw_get_clip_path(wand: *const DrawingWand) -> *mut c_char {
    alloc_optional(&drawing(wand).state.clip_path)
}

unsafe extern "C" fn draw_set_clip_path(
    wand: *mut DrawingWand,
    id: *const c_char,
) -> MagickBooleanType {
    let id = c_str(id);
    if id.is_empty() || id.contains(char::is_whitespace) {
        return MAGICK_FALSE;
    }
    let d = drawing(wand);
    d.record("DrawSetClipPath", &[&id]);
    d.state.clip_path = Some(id);
    MAGICK_TRUE
}

unsafe extern "C" fn draw_push_clip_path(wand: *mut DrawingWand, id: *const c_char) {
    drawing(wand).record("DrawPushClipPath", &[&c_str(id)]);
}

unsafe extern "C" fn draw_pop_clip_path(wand: *mut DrawingWand) {
    drawing(wand).record("DrawPopClipPath", &[]);
}

unsafe extern "C" fn draw_get_font(wand: *const DrawingWand) -> *mut c_char {
    alloc_optional(&drawing(wand).state.font)
}

unsafe extern "C" fn draw_set_font(wand: *mut DrawingWand, font: *const c_char) -> MagickBooleanType {
    let font = c_str(font);
    let d = drawing(wand);
    d.record("DrawSetFont", &[&font]);
    d.state.font = Some(font);
    MAGICK_TRUE
}

unsafe extern "C" fn draw_get_stroke_dash_array(
    wand: *const DrawingWand,
    len: *mut usize,
) -> *mut f64 {
    let dashes = &drawing(wand).state.dash_array;
    *len = dashes.len();
    if dashes.is_empty() {
        ptr::null_mut()
    } else {
        alloc_doubles(dashes)
    }
}

unsafe extern "C" fn draw_set_stroke_dash_array(
    wand: *mut DrawingWand,
    len: usize,
    dashes: *const f64,
) -> MagickBooleanType {
    let d = drawing(wand);
    d.state.dash_array = if len == 0 || dashes.is_null() {
        Vec::new()
    } else {
        slice::from_raw_parts(dashes, len).to_vec()
    };
    d.record("DrawSetStrokeDashArray", &[&len]);
    MAGICK_TRUE
}

unsafe extern "C" fn draw_get_text_encoding(wand: *const DrawingWand) -> *mut c_char {
    alloc_optional(&drawing(wand).state.text_encoding)
}

unsafe extern "C" fn draw_set_text_encoding(wand: *mut DrawingWand, encoding: *const c_char) {
    let encoding = c_str(encoding);
    let d = drawing(wand);
    d.record("DrawSetTextEncoding", &[&encoding]);
    d.state.text_encoding = Some(encoding);
}

unsafe extern "C" fn draw_get_vector_graphics(wand: *mut DrawingWand) -> *mut c_char {
    alloc_string(&drawing(wand).state.vector_graphics)
}

unsafe extern "C" fn draw_set_vector_graphics(
    wand: *mut DrawingWand,
    xml: *const c_char,
) -> MagickBooleanType {
    let xml = c_str(xml);
    if !xml.starts_with('<') {
        return MAGICK_FALSE;
    }
    let d = drawing(wand);
    d.record("DrawSetVectorGraphics", &[&xml]);
    d.state.vector_graphics = xml;
    MAGICK_TRUE
}

unsafe extern "C" fn draw_reset_vector_graphics(wand: *mut DrawingWand) {
    let d = drawing(wand);
    d.state = State::default();
    d.record("DrawResetVectorGraphics", &[]);
}

unsafe extern "C" fn draw_set_viewbox_integer(
    wand: *mut DrawingWand,
    left: isize,
    top: isize,
    right: isize,
    bottom: isize,
) {
    drawing(wand).record("DrawSetViewbox", &[&left, &top, &right, &bottom]);
}

unsafe extern "C" fn draw_set_viewbox_real(
    wand: *mut DrawingWand,
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
) {
    let args = format!("{left:?}, {top:?}, {right:?}, {bottom:?}");
    drawing(wand).record("DrawSetViewbox", &[&args]);
}

unsafe extern "C" fn draw_annotation(wand: *mut DrawingWand, x: f64, y: f64, text: *const c_uchar) {
    let text = set_last_text(text.cast());
    drawing(wand).record("DrawAnnotation", &[&x, &y, &String::from_utf8_lossy(&text)]);
}

macro_rules! instruction {
    ($fn:ident, $name:literal $(, $arg:ident: $ty:ty)*) => {
        unsafe extern "C" fn $fn(wand: *mut DrawingWand $(, $arg: $ty)*) {
            drawing(wand).record($name, &[$(&$arg),*]);
        }
    };
}

instruction!(draw_arc, "DrawArc", sx: f64, sy: f64, ex: f64, ey: f64, sd: f64, ed: f64);
instruction!(draw_circle, "DrawCircle", ox: f64, oy: f64, px: f64, py: f64);
instruction!(draw_color, "DrawColor", x: f64, y: f64, method: c_int);
instruction!(draw_ellipse, "DrawEllipse", ox: f64, oy: f64, rx: f64, ry: f64, start: f64, end: f64);
instruction!(draw_line, "DrawLine", sx: f64, sy: f64, ex: f64, ey: f64);
instruction!(draw_point, "DrawPoint", x: f64, y: f64);
instruction!(draw_rectangle, "DrawRectangle", x1: f64, y1: f64, x2: f64, y2: f64);
instruction!(draw_rotate, "DrawRotate", degrees: f64);
instruction!(draw_scale, "DrawScale", x: f64, y: f64);
instruction!(draw_skew_x, "DrawSkewX", degrees: f64);
instruction!(draw_skew_y, "DrawSkewY", degrees: f64);
instruction!(draw_translate, "DrawTranslate", x: f64, y: f64);
instruction!(draw_matte, "DrawMatte", x: f64, y: f64, method: c_int);
instruction!(draw_alpha, "DrawAlpha", x: f64, y: f64, method: c_int);
instruction!(draw_path_start, "DrawPathStart");
instruction!(draw_path_finish, "DrawPathFinish");
instruction!(draw_path_close, "DrawPathClose");
instruction!(draw_path_curve_to_absolute, "DrawPathCurveToAbsolute", x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64);
instruction!(draw_path_curve_to_relative, "DrawPathCurveToRelative", x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64);
instruction!(draw_path_curve_to_smooth_absolute, "DrawPathCurveToSmoothAbsolute", x2: f64, y2: f64, x: f64, y: f64);
instruction!(draw_path_curve_to_smooth_relative, "DrawPathCurveToSmoothRelative", x2: f64, y2: f64, x: f64, y: f64);
instruction!(draw_path_curve_to_quadratic_bezier_absolute, "DrawPathCurveToQuadraticBezierAbsolute", x1: f64, y1: f64, x: f64, y: f64);
instruction!(draw_path_curve_to_quadratic_bezier_relative, "DrawPathCurveToQuadraticBezierRelative", x1: f64, y1: f64, x: f64, y: f64);
instruction!(draw_path_curve_to_quadratic_bezier_smooth_absolute, "DrawPathCurveToQuadraticBezierSmoothAbsolute", x: f64, y: f64);
instruction!(draw_path_curve_to_quadratic_bezier_smooth_relative, "DrawPathCurveToQuadraticBezierSmoothRelative", x: f64, y: f64);
instruction!(draw_path_elliptic_arc_absolute, "DrawPathEllipticArcAbsolute", rx: f64, ry: f64, rotation: f64, large_arc: MagickBooleanType, sweep: MagickBooleanType, x: f64, y: f64);
instruction!(draw_path_elliptic_arc_relative, "DrawPathEllipticArcRelative", rx: f64, ry: f64, rotation: f64, large_arc: MagickBooleanType, sweep: MagickBooleanType, x: f64, y: f64);
instruction!(draw_path_line_to_absolute, "DrawPathLineToAbsolute", x: f64, y: f64);
instruction!(draw_path_line_to_relative, "DrawPathLineToRelative", x: f64, y: f64);
instruction!(draw_path_line_to_horizontal_absolute, "DrawPathLineToHorizontalAbsolute", x: f64);
instruction!(draw_path_line_to_horizontal_relative, "DrawPathLineToHorizontalRelative", x: f64);
instruction!(draw_path_line_to_vertical_absolute, "DrawPathLineToVerticalAbsolute", y: f64);
instruction!(draw_path_line_to_vertical_relative, "DrawPathLineToVerticalRelative", y: f64);
instruction!(draw_path_move_to_absolute, "DrawPathMoveToAbsolute", x: f64, y: f64);
instruction!(draw_path_move_to_relative, "DrawPathMoveToRelative", x: f64, y: f64);

macro_rules! point_instruction {
    ($fn:ident, $name:literal) => {
        unsafe extern "C" fn $fn(wand: *mut DrawingWand, len: usize, points: *const PointInfo) {
            let coords: Vec<String> = slice::from_raw_parts(points, len)
                .iter()
                .flat_map(|p| [p.x.to_string(), p.y.to_string()])
                .collect();
            let coords = format!("[{}]", coords.join(", "));
            drawing(wand).record($name, &[&len, &coords]);
        }
    };
}

point_instruction!(draw_bezier, "DrawBezier");
point_instruction!(draw_polygon, "DrawPolygon");
point_instruction!(draw_polyline, "DrawPolyline");

// Magick wands

#[derive(Clone, Default)]
struct FakeImage {
    width: usize,
    height: usize,
    background: [f64; 4],
    drawn: Vec<Vec<String>>,
    exception: Exception,
}

unsafe fn image<'a>(wand: *const MagickWand) -> &'a mut FakeImage {
    &mut *(wand as *mut FakeImage)
}

/// Calls recorded by each drawing drawn onto the image, in order.
pub(crate) fn drawn(wand: *mut MagickWand) -> Vec<Vec<String>> {
    unsafe { image(wand) }.drawn.clone()
}

pub(crate) fn raise_image_exception(wand: *mut MagickWand, code: ExceptionType, message: &str) {
    unsafe { image(wand) }.exception = Some((code, message.to_owned()));
}

unsafe extern "C" fn new_magick_wand() -> *mut MagickWand {
    register(Box::<FakeImage>::default()).cast()
}

unsafe extern "C" fn clone_magick_wand(wand: *const MagickWand) -> *mut MagickWand {
    register(Box::new(image(wand).clone())).cast()
}

unsafe extern "C" fn destroy_magick_wand(wand: *mut MagickWand) -> *mut MagickWand {
    unregister(wand.cast::<FakeImage>());
    ptr::null_mut()
}

unsafe extern "C" fn is_magick_wand(wand: *const MagickWand) -> MagickBooleanType {
    is_registered(wand)
}

unsafe extern "C" fn magick_get_exception(
    wand: *const MagickWand,
    severity: *mut ExceptionType,
) -> *mut c_char {
    get_exception(&image(wand).exception, severity)
}

unsafe extern "C" fn magick_clear_exception(wand: *mut MagickWand) -> MagickBooleanType {
    image(wand).exception = None;
    MAGICK_TRUE
}

unsafe extern "C" fn magick_read_image(wand: *mut MagickWand, path: *const c_char) -> MagickBooleanType {
    let path = c_str(path);
    let img = image(wand);
    if Path::new(&path).is_file() {
        img.width = 16;
        img.height = 16;
        img.background = [1.0, 1.0, 1.0, 1.0];
        MAGICK_TRUE
    } else {
        img.exception = Some((
            435,
            format!("unable to open image `{path}': No such file or directory"),
        ));
        MAGICK_FALSE
    }
}

unsafe extern "C" fn magick_write_image(wand: *mut MagickWand, path: *const c_char) -> MagickBooleanType {
    let path = c_str(path);
    let img = image(wand);
    let parent = Path::new(&path).parent().filter(|p| !p.as_os_str().is_empty());
    if img.width == 0 {
        img.exception = Some((410, format!("no images defined `{path}'")));
        MAGICK_FALSE
    } else if parent.map_or(false, |p| !p.is_dir()) {
        img.exception = Some((
            435,
            format!("unable to open image `{path}': No such file or directory"),
        ));
        MAGICK_FALSE
    } else {
        MAGICK_TRUE
    }
}

unsafe extern "C" fn magick_new_image(
    wand: *mut MagickWand,
    width: usize,
    height: usize,
    background: *const PixelWand,
) -> MagickBooleanType {
    let img = image(wand);
    img.width = width;
    img.height = height;
    img.background = pixel(background).color;
    MAGICK_TRUE
}

unsafe extern "C" fn magick_get_image_width(wand: *mut MagickWand) -> usize {
    image(wand).width
}

unsafe extern "C" fn magick_get_image_height(wand: *mut MagickWand) -> usize {
    image(wand).height
}

unsafe extern "C" fn magick_get_image_pixel_color(
    wand: *mut MagickWand,
    x: isize,
    y: isize,
    pixel_wand: *mut PixelWand,
) -> MagickBooleanType {
    let img = image(wand);
    let inside = usize::try_from(x).map_or(false, |x| x < img.width)
        && usize::try_from(y).map_or(false, |y| y < img.height);
    if inside {
        pixel(pixel_wand).color = img.background;
        MAGICK_TRUE
    } else {
        img.exception = Some((410, format!("pixel {x},{y} is outside the image")));
        MAGICK_FALSE
    }
}

unsafe extern "C" fn magick_draw_image(
    wand: *mut MagickWand,
    drawing_wand: *const DrawingWand,
) -> MagickBooleanType {
    let img = image(wand);
    let d = drawing(drawing_wand);
    if is_error(&img.exception) || is_error(&d.exception) {
        MAGICK_FALSE
    } else {
        img.drawn.push(d.calls.clone());
        MAGICK_TRUE
    }
}

unsafe fn font_metrics(
    wand: *mut MagickWand,
    drawing_wand: *const DrawingWand,
    text: *const c_char,
    multiline: bool,
) -> *mut f64 {
    let text = set_last_text(text);
    let state = &drawing(drawing_wand).state;
    if let Some(font) = state.font.as_deref().filter(|f| *f == "missing") {
        image(wand).exception = Some((450, format!("unable to read font `{font}'")));
        return ptr::null_mut();
    }

    let size = state.font_size;
    let (columns, lines) = if multiline {
        let lines: Vec<&[u8]> = text.split(|b| *b == b'\n').collect();
        let columns = lines.iter().map(|l| l.len()).max().unwrap_or(0);
        (columns, lines.len())
    } else {
        (text.len(), 1)
    };
    let width = columns as f64 * size / 2.0;
    let height = lines as f64 * size;
    let ascender = size * 0.75;
    let descender = -size * 0.25;
    alloc_doubles(&[
        size / 2.0,
        size,
        ascender,
        descender,
        width,
        height,
        size / 2.0,
        0.0,
        descender,
        width,
        ascender,
        width,
        0.0,
    ])
}

unsafe extern "C" fn magick_query_font_metrics(
    wand: *mut MagickWand,
    drawing_wand: *const DrawingWand,
    text: *const c_char,
) -> *mut f64 {
    font_metrics(wand, drawing_wand, text, false)
}

unsafe extern "C" fn magick_query_multiline_font_metrics(
    wand: *mut MagickWand,
    drawing_wand: *const DrawingWand,
    text: *const c_char,
) -> *mut f64 {
    font_metrics(wand, drawing_wand, text, true)
}

// Pixel wands

#[derive(Default)]
struct FakePixel {
    color: [f64; 4],
    exception: Exception,
}

unsafe fn pixel<'a>(wand: *const PixelWand) -> &'a mut FakePixel {
    &mut *(wand as *mut FakePixel)
}

unsafe extern "C" fn new_pixel_wand() -> *mut PixelWand {
    LIVE_PIXEL_WANDS.with(|n| n.set(n.get() + 1));
    register(Box::<FakePixel>::default()).cast()
}

unsafe extern "C" fn destroy_pixel_wand(wand: *mut PixelWand) -> *mut PixelWand {
    LIVE_PIXEL_WANDS.with(|n| n.set(n.get() - 1));
    unregister(wand.cast::<FakePixel>());
    ptr::null_mut()
}

unsafe extern "C" fn is_pixel_wand(wand: *const PixelWand) -> MagickBooleanType {
    is_registered(wand)
}

unsafe extern "C" fn pixel_get_exception(
    wand: *const PixelWand,
    severity: *mut ExceptionType,
) -> *mut c_char {
    get_exception(&pixel(wand).exception, severity)
}

unsafe extern "C" fn pixel_clear_exception(wand: *mut PixelWand) -> MagickBooleanType {
    pixel(wand).exception = None;
    MAGICK_TRUE
}

unsafe extern "C" fn pixel_set_color(wand: *mut PixelWand, spec: *const c_char) -> MagickBooleanType {
    let spec = c_str(spec);
    let color = match spec.as_str() {
        "red" => Some(Color::rgb(1.0, 0.0, 0.0)),
        "blue" => Some(Color::rgb(0.0, 0.0, 1.0)),
        "white" => Some(Color::WHITE),
        "black" => Some(Color::BLACK),
        "none" | "transparent" => Some(Color::TRANSPARENT),
        hex => hex.parse().ok(),
    };
    let p = pixel(wand);
    match color {
        Some(c) => {
            p.color = [c.red, c.green, c.blue, c.alpha];
            MAGICK_TRUE
        }
        None => {
            p.exception = Some((410, format!("unrecognized color `{spec}'")));
            MAGICK_FALSE
        }
    }
}

macro_rules! channel {
    ($get:ident, $set:ident, $index:literal) => {
        unsafe extern "C" fn $get(wand: *const PixelWand) -> f64 {
            pixel(wand).color[$index]
        }

        unsafe extern "C" fn $set(wand: *mut PixelWand, value: f64) {
            pixel(wand).color[$index] = value;
        }
    };
}

channel!(pixel_get_red, pixel_set_red, 0);
channel!(pixel_get_green, pixel_set_green, 1);
channel!(pixel_get_blue, pixel_set_blue, 2);
channel!(pixel_get_alpha, pixel_set_alpha, 3);

fn api() -> Api {
    Api {
        magick_wand_genesis,
        magick_wand_terminus,
        is_magick_wand_instantiated,
        magick_get_version,
        magick_relinquish_memory,

        new_drawing_wand,
        clone_drawing_wand,
        destroy_drawing_wand,
        is_drawing_wand,
        clear_drawing_wand,
        draw_get_exception,
        draw_clear_exception,
        push_drawing_wand,
        pop_drawing_wand,

        draw_get_clip_path,
        draw_set_clip_path,
        draw_get_clip_rule,
        draw_set_clip_rule,
        draw_get_clip_units,
        draw_set_clip_units,
        draw_push_clip_path,
        draw_pop_clip_path,
        draw_get_font,
        draw_set_font,
        draw_get_font_size,
        draw_set_font_size,
        draw_get_fill_color,
        draw_set_fill_color,
        draw_get_fill_opacity,
        draw_set_fill_opacity,
        draw_get_fill_rule,
        draw_set_fill_rule,
        draw_get_gravity,
        draw_set_gravity,
        draw_get_stroke_antialias,
        draw_set_stroke_antialias,
        draw_get_stroke_color,
        draw_set_stroke_color,
        draw_get_stroke_dash_array,
        draw_set_stroke_dash_array,
        draw_get_stroke_dash_offset,
        draw_set_stroke_dash_offset,
        draw_get_stroke_line_cap,
        draw_set_stroke_line_cap,
        draw_get_stroke_line_join,
        draw_set_stroke_line_join,
        draw_get_stroke_miter_limit,
        draw_set_stroke_miter_limit,
        draw_get_stroke_opacity,
        draw_set_stroke_opacity,
        draw_get_stroke_width,
        draw_set_stroke_width,
        draw_get_text_alignment,
        draw_set_text_alignment,
        draw_get_text_antialias,
        draw_set_text_antialias,
        draw_get_text_decoration,
        draw_set_text_decoration,
        draw_get_text_direction,
        draw_set_text_direction,
        draw_get_text_encoding,
        draw_set_text_encoding,
        draw_get_text_interword_spacing,
        draw_set_text_interword_spacing,
        draw_get_text_kerning,
        draw_set_text_kerning,
        draw_get_text_under_color,
        draw_set_text_under_color,
        draw_get_vector_graphics,
        draw_set_vector_graphics,
        draw_reset_vector_graphics,
        draw_set_viewbox_integer,
        draw_set_viewbox_real,

        draw_annotation,
        draw_arc,
        draw_bezier,
        draw_circle,
        draw_color,
        draw_ellipse,
        draw_line,
        draw_point,
        draw_polygon,
        draw_polyline,
        draw_rectangle,
        draw_rotate,
        draw_scale,
        draw_skew_x,
        draw_skew_y,
        draw_translate,

        draw_path_start,
        draw_path_finish,
        draw_path_close,
        draw_path_curve_to_absolute,
        draw_path_curve_to_relative,
        draw_path_curve_to_smooth_absolute,
        draw_path_curve_to_smooth_relative,
        draw_path_curve_to_quadratic_bezier_absolute,
        draw_path_curve_to_quadratic_bezier_relative,
        draw_path_curve_to_quadratic_bezier_smooth_absolute,
        draw_path_curve_to_quadratic_bezier_smooth_relative,
        draw_path_elliptic_arc_absolute,
        draw_path_elliptic_arc_relative,
        draw_path_line_to_absolute,
        draw_path_line_to_relative,
        draw_path_line_to_horizontal_absolute,
        draw_path_line_to_horizontal_relative,
        draw_path_line_to_vertical_absolute,
        draw_path_line_to_vertical_relative,
        draw_path_move_to_absolute,
        draw_path_move_to_relative,

        new_magick_wand,
        clone_magick_wand,
        destroy_magick_wand,
        is_magick_wand,
        magick_get_exception,
        magick_clear_exception,
        magick_read_image,
        magick_write_image,
        magick_new_image,
        magick_get_image_width,
        magick_get_image_height,
        magick_get_image_pixel_color,
        magick_draw_image,
        magick_query_font_metrics,
        magick_query_multiline_font_metrics,

        new_pixel_wand,
        destroy_pixel_wand,
        is_pixel_wand,
        pixel_get_exception,
        pixel_clear_exception,
        pixel_set_color,
        pixel_get_red,
        pixel_get_green,
        pixel_get_blue,
        pixel_get_alpha,
        pixel_set_red,
        pixel_set_green,
        pixel_set_blue,
        pixel_set_alpha,

        draw_get_text_interline_spacing: Some(draw_get_text_interline_spacing),
        draw_set_text_interline_spacing: Some(draw_set_text_interline_spacing),
        draw_matte: Some(draw_matte),
        draw_alpha: Some(draw_alpha),
    }
}
