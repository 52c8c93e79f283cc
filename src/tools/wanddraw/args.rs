// SPDX-License-Identifier: GPL-3.0-or-later
use regex::Regex;
use std::str::FromStr;
use wand::{Point, Rect};

const NUMBER: &str = r"[-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)";

fn numbers(s: &str, count: usize, what: &str) -> Result<Vec<f64>, String> {
    let pattern = format!(r"\A\s*{NUMBER}\s*(?:,\s*{NUMBER}\s*){{{}}}\z", count - 1);
    let re = Regex::new(&pattern).map_err(|e| e.to_string())?;
    if !re.is_match(s) {
        return Err(format!(
            "Invalid {what} '{s}', must be given as {count} comma-separated numbers"
        ));
    }
    s.split(',')
        .map(|n| n.trim().parse::<f64>().map_err(|e| format!("{n}: {e}")))
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"(?i)\A([0-9]+)x([0-9]+)\z").map_err(|e| e.to_string())?;
        if let Some(caps) = re.captures(s) {
            let width: usize = caps[1].parse().unwrap_or(0);
            let height: usize = caps[2].parse().unwrap_or(0);
            if width != 0 && height != 0 {
                return Ok(ImageSize { width, height });
            }
        }
        Err(format!(
            "Invalid image size '{s}', must be given as WIDTHxHEIGHT"
        ))
    }
}

/// Two points given as `x1,y1,x2,y2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment(pub Point, pub Point);

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = numbers(s, 4, "coordinates")?;
        Ok(Segment(Point::new(n[0], n[1]), Point::new(n[2], n[3])))
    }
}

impl Segment {
    pub fn to_rect(self) -> Rect {
        let Segment(a, b) = self;
        Rect::new(a.x, a.y).right(b.x).bottom(b.y)
    }
}

/// Points given as `x,y x,y ...`.
#[derive(Clone, Debug, PartialEq)]
pub struct PointList(pub Vec<Point>);

impl FromStr for PointList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let points = s
            .split_whitespace()
            .map(|pair| {
                let n = numbers(pair, 2, "point")?;
                Ok(Point::new(n[0], n[1]))
            })
            .collect::<Result<Vec<_>, String>>()?;
        if points.is_empty() {
            Err("Point list is empty, must be given as 'x,y x,y ...'".to_owned())
        } else {
            Ok(PointList(points))
        }
    }
}

/// Text annotation given as `x,y,body`. The body may contain commas.
#[derive(Clone, Debug, PartialEq)]
pub struct TextArg {
    pub x: f64,
    pub y: f64,
    pub body: String,
}

impl FromStr for TextArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern = format!(r"(?s)\A\s*({NUMBER})\s*,\s*({NUMBER})\s*,(.+)\z");
        let re = Regex::new(&pattern).map_err(|e| e.to_string())?;
        match re.captures(s) {
            Some(caps) => Ok(TextArg {
                x: caps[1].parse().map_err(|e| format!("{}: {e}", &caps[1]))?,
                y: caps[2].parse().map_err(|e| format!("{}: {e}", &caps[2]))?,
                body: caps[3].to_owned(),
            }),
            None => Err(format!(
                "Invalid text '{s}', must be given as x,y,body"
            )),
        }
    }
}
