// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};
use tracing::debug;
use wand::{Color, Drawing, Gravity, LineCap, LineJoin, TextAlign};

/// Drawing settings read from a TOML file. Anything left out keeps the
/// native default.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
    pub dash_array: Option<Vec<f64>>,
    pub font: Option<String>,
    pub font_size: Option<f64>,
    pub gravity: Option<Gravity>,
    pub text_alignment: Option<TextAlign>,
    pub text_encoding: Option<String>,
    pub stroke_antialias: Option<bool>,
    pub text_antialias: Option<bool>,
}

impl Style {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Can't read style '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid style '{}'", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply(&self, drawing: &mut Drawing) -> wand::Result<()> {
        debug!("Applying style {self:?}");
        if let Some(color) = &self.fill {
            drawing.set_fill_color(color)?;
        }
        if let Some(color) = &self.stroke {
            drawing.set_stroke_color(color)?;
        }
        if let Some(width) = self.stroke_width {
            drawing.set_stroke_width(width)?;
        }
        if let Some(cap) = self.line_cap {
            drawing.set_stroke_line_cap(cap)?;
        }
        if let Some(join) = self.line_join {
            drawing.set_stroke_line_join(join)?;
        }
        if let Some(dashes) = &self.dash_array {
            drawing.set_stroke_dash_array(dashes)?;
        }
        if let Some(font) = &self.font {
            drawing.set_font(font)?;
        }
        if let Some(size) = self.font_size {
            drawing.set_font_size(size)?;
        }
        if let Some(gravity) = self.gravity {
            drawing.set_gravity(gravity)?;
        }
        if let Some(align) = self.text_alignment {
            drawing.set_text_alignment(align)?;
        }
        if let Some(encoding) = &self.text_encoding {
            drawing.set_text_encoding(Some(encoding))?;
        }
        if let Some(antialias) = self.stroke_antialias {
            drawing.set_stroke_antialias(antialias)?;
        }
        if let Some(antialias) = self.text_antialias {
            drawing.set_text_antialias(antialias)?;
        }
        Ok(())
    }
}
