// SPDX-License-Identifier: GPL-3.0-or-later
use crate::error::Error;
use serde::Deserialize;
use std::{ffi::c_int, fmt::Display, str::FromStr};

fn expected_tokens(tokens: &[&str]) -> String {
    match tokens {
        [] => String::new(),
        [only] => format!("'{only}'"),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(|t| format!("'{t}'")).collect();
            format!("{} or '{last}'", init.join(", "))
        }
    }
}

/// Mapping between an option enum and the native integer code of each
/// variant.
pub(crate) trait NativeCode: Copy {
    const KIND: &'static str;

    fn code(self) -> c_int;
    fn from_code(code: c_int) -> Option<Self>;
}

// Variants are declared in native order, so a variant's discriminant is its
// native code and its index in both ALL and TOKENS.
macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($kind:literal) {
            $($variant:ident => $token:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
        #[serde(try_from = "String")]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];
            pub const TOKENS: &'static [&'static str] = &[$($token,)*];

            pub fn token(self) -> &'static str {
                Self::TOKENS[self as usize]
            }
        }

        impl NativeCode for $name {
            const KIND: &'static str = $kind;

            fn code(self) -> c_int {
                self as c_int
            }

            fn from_code(code: c_int) -> Option<Self> {
                usize::try_from(code)
                    .ok()
                    .and_then(|index| Self::ALL.get(index).copied())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.token())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::TOKENS
                    .iter()
                    .position(|token| *token == s)
                    .map(|index| Self::ALL[index])
                    .ok_or_else(|| Error::UnknownToken {
                        kind: $kind,
                        token: s.to_owned(),
                        expected: expected_tokens(Self::TOKENS),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

option_enum! {
    /// How the inside of a shape is determined, used for both filling and
    /// clipping.
    pub enum FillRule ("fill rule") {
        Undefined => "undefined",
        EvenOdd => "evenodd",
        NonZero => "nonzero",
    }
}

option_enum! {
    pub enum LineCap ("line cap") {
        Undefined => "undefined",
        Butt => "butt",
        Round => "round",
        Square => "square",
    }
}

option_enum! {
    pub enum LineJoin ("line join") {
        Undefined => "undefined",
        Miter => "miter",
        Round => "round",
        Bevel => "bevel",
    }
}

option_enum! {
    pub enum TextAlign ("text alignment") {
        Undefined => "undefined",
        Left => "left",
        Center => "center",
        Right => "right",
    }
}

option_enum! {
    pub enum TextDecoration ("text decoration") {
        Undefined => "undefined",
        No => "no",
        Underline => "underline",
        Overline => "overline",
        LineThrough => "line_through",
    }
}

option_enum! {
    pub enum TextDirection ("text direction") {
        Undefined => "undefined",
        RightToLeft => "right_to_left",
        LeftToRight => "left_to_right",
    }
}

option_enum! {
    /// Text placement used when annotating.
    pub enum Gravity ("gravity") {
        Forget => "forget",
        NorthWest => "north_west",
        North => "north",
        NorthEast => "north_east",
        West => "west",
        Center => "center",
        East => "east",
        SouthWest => "south_west",
        South => "south",
        SouthEast => "south_east",
        Static => "static",
    }
}

option_enum! {
    /// Which pixels a color or matte operation affects.
    pub enum PaintMethod ("paint method") {
        Undefined => "undefined",
        Point => "point",
        Replace => "replace",
        FloodFill => "floodfill",
        FillToBorder => "filltoborder",
        Reset => "reset",
    }
}

option_enum! {
    pub enum ClipPathUnits ("clip path units") {
        Undefined => "undefined_path_units",
        UserSpace => "user_space",
        UserSpaceOnUse => "user_space_on_use",
        ObjectBoundingBox => "object_bounding_box",
    }
}
