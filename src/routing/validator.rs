//! Raw route validation.
//!
//! # Responsibilities
//! - Reject traversal (`..`, `.`), absolute prefixes, NUL bytes, backslashes
//! - Reject double encoding and characters outside the route alphabet
//! - Collapse duplicate and trailing slashes
//! - Enforce length and depth limits

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::config::ValidationConfig;
use crate::routing::path::SanitizedPath;

/// Why a raw route was refused. Detail stays in server logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathRejection {
    #[error("empty path")]
    Empty,
    #[error("path is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("path contains a NUL byte")]
    NullByte,
    #[error("path is not valid percent-encoded UTF-8")]
    InvalidEncoding,
    #[error("path contains a backslash")]
    Backslash,
    #[error("absolute paths are not allowed")]
    Absolute,
    #[error("path traversal segment {0:?}")]
    Traversal(String),
    #[error("hidden segment {0:?}")]
    HiddenSegment(String),
    #[error("invalid character {ch:?} in segment {segment:?}")]
    InvalidCharacter { ch: char, segment: String },
    #[error("path has {depth} segments, limit is {max}")]
    TooDeep { depth: usize, max: usize },
}

/// Turns an untrusted route fragment into a [`SanitizedPath`].
pub trait PathValidator: Send + Sync {
    fn validate(&self, raw_path: &str) -> Result<SanitizedPath, PathRejection>;
}

/// Default validator for API routes.
#[derive(Debug, Clone)]
pub struct RoutePathValidator {
    max_path_length: usize,
    max_segments: usize,
}

impl RoutePathValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            max_path_length: config.max_path_length,
            max_segments: config.max_segments,
        }
    }
}

impl Default for RoutePathValidator {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

impl PathValidator for RoutePathValidator {
    fn validate(&self, raw_path: &str) -> Result<SanitizedPath, PathRejection> {
        if raw_path.len() > self.max_path_length {
            return Err(PathRejection::TooLong {
                len: raw_path.len(),
                max: self.max_path_length,
            });
        }
        if raw_path.as_bytes().contains(&0) {
            return Err(PathRejection::NullByte);
        }

        // Decode once. Anything still encoded after this is an attempt to
        // smuggle a second round past us.
        let decoded = percent_decode_str(raw_path)
            .decode_utf8()
            .map_err(|_| PathRejection::InvalidEncoding)?;

        if decoded.contains('\0') {
            return Err(PathRejection::NullByte);
        }
        if decoded.contains('%') {
            return Err(PathRejection::InvalidEncoding);
        }
        if decoded.contains('\\') {
            return Err(PathRejection::Backslash);
        }
        if decoded.starts_with('/') {
            return Err(PathRejection::Absolute);
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" => continue,
                "." | ".." => return Err(PathRejection::Traversal(segment.to_string())),
                s if s.starts_with('.') => {
                    return Err(PathRejection::HiddenSegment(s.to_string()));
                }
                s => {
                    if let Some(ch) = s.chars().find(|c| !is_route_char(*c)) {
                        return Err(PathRejection::InvalidCharacter {
                            ch,
                            segment: s.to_string(),
                        });
                    }
                    segments.push(s);
                }
            }
        }

        if segments.is_empty() {
            return Err(PathRejection::Empty);
        }
        if segments.len() > self.max_segments {
            return Err(PathRejection::TooDeep {
                depth: segments.len(),
                max: self.max_segments,
            });
        }

        Ok(SanitizedPath::new(segments.join("/")))
    }
}

fn is_route_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
