//! Dependency descriptors and token parsing.
//!
//! A dependency is named by an opaque, case-sensitive id. In token form a
//! trailing `?` marks the dependency optional: `"db"` is required, `"db?"`
//! resolves to the undefined model instead of blocking when `db` is absent.
//! Callers who already hold a structured [`Descriptor`] can pass it directly,
//! bypassing parsing.

use crate::core::{LazybindError, Result};

/// Trailing marker that flags a token's dependency as optional.
pub const OPTIONAL_MARKER: char = '?';

/// Empty dependency list, for defining models with no dependencies.
///
/// A bare `[]` cannot infer the token type, so `define("id", NO_DEPS, ..)`
/// is the spelling for dependency-free definitions.
pub const NO_DEPS: [DepToken; 0] = [];

/// A parsed dependency: an id plus whether its absence blocks resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// Opaque, case-sensitive id of the depended-on model.
    pub id: String,
    /// Whether the dependency must be defined before the dependent can build.
    pub required: bool,
}

impl Descriptor {
    /// Create a required dependency on `id`.
    pub fn required(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            required: true,
        }
    }

    /// Create an optional dependency on `id`.
    pub fn optional(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            required: false,
        }
    }

    /// Parse a raw token.
    ///
    /// Only the trailing [`OPTIONAL_MARKER`] carries meaning; the rest of the
    /// id is opaque and no character-set validation is applied. An empty id
    /// (empty token or a bare `"?"`) is rejected.
    pub fn parse(token: &str) -> Result<Self> {
        if let Some(id) = token.strip_suffix(OPTIONAL_MARKER) {
            if id.is_empty() {
                return Err(LazybindError::invalid_argument(format!(
                    "dependency token '{token}' has an empty id"
                )));
            }
            Ok(Self::optional(id))
        } else if token.is_empty() {
            Err(LazybindError::invalid_argument(
                "dependency token must not be empty",
            ))
        } else {
            Ok(Self::required(token))
        }
    }
}

/// A dependency token as accepted by `define` and `require`.
///
/// Either a raw string in the `id[?]` grammar or an already-structured
/// [`Descriptor`].
#[derive(Debug, Clone)]
pub enum DepToken {
    /// Raw token, parsed by [`Descriptor::parse`].
    Raw(String),
    /// Pre-built descriptor, accepted as-is (id must be non-empty).
    Parsed(Descriptor),
}

impl DepToken {
    pub(crate) fn into_descriptor(self) -> Result<Descriptor> {
        match self {
            Self::Raw(token) => Descriptor::parse(&token),
            Self::Parsed(descriptor) => {
                if descriptor.id.is_empty() {
                    return Err(LazybindError::invalid_argument(
                        "dependency descriptor has an empty id",
                    ));
                }
                Ok(descriptor)
            }
        }
    }
}

impl From<&str> for DepToken {
    fn from(token: &str) -> Self {
        Self::Raw(token.to_string())
    }
}

impl From<String> for DepToken {
    fn from(token: String) -> Self {
        Self::Raw(token)
    }
}

impl From<Descriptor> for DepToken {
    fn from(descriptor: Descriptor) -> Self {
        Self::Parsed(descriptor)
    }
}

/// Convert a list of tokens, rejecting the whole list on the first malformed
/// entry.
pub(crate) fn parse_tokens<D, T>(tokens: D) -> Result<Vec<Descriptor>>
where
    D: IntoIterator<Item = T>,
    T: Into<DepToken>,
{
    tokens
        .into_iter()
        .map(|token| token.into().into_descriptor())
        .collect()
}
