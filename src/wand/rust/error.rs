// SPDX-License-Identifier: GPL-3.0-or-later
use std::{
    ffi::{c_int, NulError},
    fmt::Display,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("arguments {0} and {1} are mutually exclusive, use one at a time")]
    ExclusiveArguments(&'static str, &'static str),
    #[error("invalid {kind} '{token}', should be one of {expected}")]
    UnknownToken {
        kind: &'static str,
        token: String,
        expected: String,
    },
    #[error("{severity}: {message}")]
    Native { severity: Severity, message: String },
    #[error("{0} is already closed")]
    Closed(&'static str),
    #[error("the installed version of ImageMagick does not support {feature}")]
    Unsupported { feature: &'static str },
    #[error("failed to load MagickWand library: {0}")]
    Load(String),
    #[error("string contains a NUL byte: {0}")]
    Nul(#[from] NulError),
    #[error("text encoding: {0}")]
    Encoding(String),
}

impl Error {
    pub(crate) fn native(message: impl Into<String>) -> Self {
        Self::Native {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Errors detected before any native call was made.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::MissingArgument(_)
                | Self::ExclusiveArguments(..)
                | Self::UnknownToken { .. }
                | Self::Nul(_)
                | Self::Encoding(_)
        )
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Severity class of a native `ExceptionType` code.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub(crate) fn from_code(code: c_int) -> Option<Self> {
        match code {
            c if c <= 0 => None,
            c if c < 400 => Some(Self::Warning),
            c if c < 700 => Some(Self::Error),
            _ => Some(Self::Fatal),
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Warning => "warning",
                Self::Error => "error",
                Self::Fatal => "fatal error",
            }
        )
    }
}
