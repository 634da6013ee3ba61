//! Shorthand mapping strings used throughout compose documents.
//!
//! Ports (`8080:80/udp`), volumes (`./data:/var/lib/data:ro`) and links
//! (`db:database`) all share the same colon/slash mini-grammar, parsed
//! here into a [`Mapping`] triple.

use composeviz_common::error::{ComposeVizError, Result};

/// A parsed `first[:second][/third]` shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Host side (link target, host path or volume name, host port).
    pub first: String,
    /// Container side. Equals `first` when the shorthand has no colon.
    pub second: String,
    /// Qualifier: a protocol after `/`, or a mount mode after a second colon.
    pub third: Option<String>,
}

/// Parses a shorthand mapping string.
///
/// The second part defaults to the first. It is then split on `/`,
/// ignoring empty segments. Up to two segments are read as
/// `value/qualifier`; more than two means the part is a path, in which
/// case it is kept whole and the qualifier comes from a third colon
/// segment instead.
pub fn parse_mapping(input: &str) -> Mapping {
    let parts: Vec<&str> = input.split(':').collect();
    let first = parts[0];
    let second = parts.get(1).copied().unwrap_or(first);

    let segments: Vec<&str> = second.split('/').filter(|s| !s.is_empty()).collect();

    let (second, third) = if segments.len() > 2 {
        (second, parts.get(2).copied())
    } else {
        (
            segments.first().copied().unwrap_or_default(),
            segments.get(1).copied(),
        )
    };

    Mapping {
        first: first.to_owned(),
        second: second.to_owned(),
        third: third.map(str::to_owned),
    }
}

/// Coerces a host port to a number from its leading digits.
///
/// `"8080"` gives 8080 and a range such as `"8000-8010"` gives its lower
/// bound.
///
/// # Errors
///
/// Returns [`ComposeVizError::InvalidPort`] when the value has no leading
/// digits or does not fit a port number.
pub fn coerce_port(value: &str) -> Result<u16> {
    let trimmed = value.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    trimmed[..end]
        .parse::<u16>()
        .map_err(|_| ComposeVizError::InvalidPort {
            value: value.to_owned(),
        })
}
