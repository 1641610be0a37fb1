//! Style blocks, resolved into renderer-agnostic descriptors.

pub mod color;
pub mod identifier;

pub use color::normalize_color;
pub use identifier::to_identifier;

use crate::block::{Argument, CodeBlock};
use crate::command::Command;
use crate::error::{Error, ErrorKind, Result};

pub const DEFAULT_COLOR: &str = "000000";
/// Half-points (12pt).
pub const DEFAULT_SIZE: u32 = 24;
pub const FALLBACK_FONT: &str = "Aptos";

/// A named paragraph/text style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDescriptor {
    /// Pascal-case identifier derived from `name`.
    pub id: String,
    /// Display name as written in the sheet.
    pub name: String,
    /// Identifier of the style this one inherits from.
    pub parent: Option<String>,
    /// Six hex digits.
    pub color: String,
    pub font: String,
    /// Half-points.
    pub size: u32,
}

impl StyleDescriptor {
    /// Build a descriptor from parts that are already validated. The identifier is
    /// derived from `name`.
    pub fn new(
        name: impl Into<String>,
        parent: Option<String>,
        color: impl Into<String>,
        font: impl Into<String>,
        size: u32,
    ) -> Self {
        let name = name.into();
        StyleDescriptor {
            id: to_identifier(&name),
            name,
            parent,
            color: color.into(),
            font: font.into(),
            size,
        }
    }

    /// Resolve a Style block. Errors are located at the offending argument, or at
    /// the command cell when `name` is missing.
    pub fn from_block(block: &CodeBlock) -> Result<StyleDescriptor> {
        debug_assert_eq!(block.command, Command::Style);
        StyleDescriptor::from_arguments(&block.arguments).map_err(|mut err| {
            if err.origin.is_none() {
                err.origin = block.origin.clone();
            }
            err
        })
    }

    /// Translate a Style argument list. For repeated names the last one wins.
    pub fn from_arguments(arguments: &[Argument]) -> Result<StyleDescriptor> {
        let mut name = None;
        let mut parent = None;
        let mut color = None;
        let mut size = None;
        let mut font = None;

        for arg in arguments {
            match arg.name.as_str() {
                "name" => name = Some(arg),
                "parent" => parent = Some(arg),
                "color" => color = Some(arg),
                "size" => size = Some(arg),
                "font" => font = Some(arg),
                _ => {}
            }
        }

        let name = name.ok_or_else(|| Error::new(ErrorKind::MissingStyleName, None))?;

        let parent = parent
            .map(|arg| to_identifier(&arg.value))
            .filter(|id| !id.is_empty());

        let color = match color {
            Some(arg) => normalize_color(&arg.value).map_err(|kind| located(kind, arg))?,
            None => DEFAULT_COLOR.to_string(),
        };

        let size = match size {
            Some(arg) => parse_size(&arg.value).map_err(|kind| located(kind, arg))?,
            None => DEFAULT_SIZE,
        };

        let font = match font {
            Some(arg) if !arg.value.is_empty() => arg.value.clone(),
            _ => FALLBACK_FONT.to_string(),
        };

        if to_identifier(&name.value).is_empty() {
            return Err(located(
                ErrorKind::InvalidStyleName(name.value.clone()),
                name,
            ));
        }

        Ok(StyleDescriptor::new(
            name.value.clone(),
            parent,
            color,
            font,
            size,
        ))
    }
}

/// Parse a point size and convert it to half-points.
pub fn parse_size(value: &str) -> std::result::Result<u32, ErrorKind> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|points| points.checked_mul(2))
        .ok_or_else(|| ErrorKind::InvalidSize(value.to_string()))
}

fn located(kind: ErrorKind, arg: &Argument) -> Error {
    Error::new(kind, arg.origin.clone())
}
