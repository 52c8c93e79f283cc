// SPDX-License-Identifier: GPL-3.0-or-later
use super::{drawing::encode_text, Drawing};
use crate::{common::MagickDoubles, error::Result, image::Image};
use tracing::debug;

const FIELD_COUNT: usize = 13;

/// Measurements of a piece of text as it would be drawn with a drawing's
/// current font settings.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub character_width: f64,
    pub character_height: f64,
    pub ascender: f64,
    pub descender: f64,
    pub text_width: f64,
    pub text_height: f64,
    pub maximum_horizontal_advance: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x: f64,
    pub y: f64,
}

impl FontMetrics {
    fn from_slice(values: &[f64; FIELD_COUNT]) -> Self {
        Self {
            character_width: values[0],
            character_height: values[1],
            ascender: values[2],
            descender: values[3],
            text_width: values[4],
            text_height: values[5],
            maximum_horizontal_advance: values[6],
            x1: values[7],
            y1: values[8],
            x2: values[9],
            y2: values[10],
            x: values[11],
            y: values[12],
        }
    }
}

impl Drawing {
    /// Measures `text` as it would be drawn onto `image`. With `multiline`,
    /// newlines in the text start a new line instead of being drawn.
    pub fn font_metrics(
        &self,
        image: &Image,
        text: &str,
        multiline: bool,
    ) -> Result<FontMetrics> {
        let raw = self.as_ptr()?;
        let target = image.as_ptr()?;
        let encoding = self.text_encoding()?;
        let ctext = encode_text(encoding.as_deref(), text)?;
        let api = self.api();
        let query = if multiline {
            api.magick_query_multiline_font_metrics
        } else {
            api.magick_query_font_metrics
        };
        let values = unsafe { query(target, raw, ctext.as_ptr()) };
        match MagickDoubles::new(self.library(), values, FIELD_COUNT) {
            Some(values) => {
                let mut fields = [0.0; FIELD_COUNT];
                fields.copy_from_slice(values.as_slice());
                let metrics = FontMetrics::from_slice(&fields);
                debug!("Font metrics for {text:?}: {metrics:?}");
                Ok(metrics)
            }
            None => Err(image.handle().error("failed to query font metrics")),
        }
    }
}
