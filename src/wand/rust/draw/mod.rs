// SPDX-License-Identifier: GPL-3.0-or-later

mod drawing;
mod metrics;
mod path;
mod shapes;
mod types;

pub use drawing::Drawing;
pub use metrics::FontMetrics;
pub use path::CurveControls;
pub use shapes::Rect;
pub use types::{
    ClipPathUnits, FillRule, Gravity, LineCap, LineJoin, PaintMethod, TextAlign, TextDecoration,
    TextDirection,
};
