//! Component and dataset type tokens.
//!
//! Both token kinds compare, hash and order exactly like their string names, so
//! `ComponentType::NODE == "node"` and a `HashMap<ComponentType, _>` can be
//! queried with a plain `&str`.

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Identifier of a grid component category (`node`, `line`, ...).
///
/// The set is open: constants cover the components known to the calculation
/// engine, and any other name can be built with [`ComponentType::new`].
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentType(Cow<'static, str>);

macro_rules! component_types {
    ($($konst:ident => $name:literal),* $(,)?) => {
        impl ComponentType {
            $(
                #[doc = concat!("The `", $name, "` component.")]
                pub const $konst: ComponentType = ComponentType(Cow::Borrowed($name));
            )*

            /// Every component known to the calculation engine.
            pub const KNOWN: &'static [ComponentType] = &[$(ComponentType::$konst),*];
        }
    };
}

component_types! {
    NODE => "node",
    LINE => "line",
    ASYM_LINE => "asym_line",
    LINK => "link",
    GENERIC_BRANCH => "generic_branch",
    TRANSFORMER => "transformer",
    TRANSFORMER_TAP_REGULATOR => "transformer_tap_regulator",
    THREE_WINDING_TRANSFORMER => "three_winding_transformer",
    SYM_LOAD => "sym_load",
    SYM_GEN => "sym_gen",
    ASYM_LOAD => "asym_load",
    ASYM_GEN => "asym_gen",
    SHUNT => "shunt",
    SOURCE => "source",
    SYM_VOLTAGE_SENSOR => "sym_voltage_sensor",
    ASYM_VOLTAGE_SENSOR => "asym_voltage_sensor",
    SYM_POWER_SENSOR => "sym_power_sensor",
    ASYM_POWER_SENSOR => "asym_power_sensor",
    FAULT => "fault",
}

impl ComponentType {
    /// Build a token from any name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The token's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is one of the [`KNOWN`](Self::KNOWN) components.
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for ComponentType {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for ComponentType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for ComponentType {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ComponentType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&ComponentType> for ComponentType {
    fn from(token: &ComponentType) -> Self {
        token.clone()
    }
}

impl PartialEq<str> for ComponentType {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ComponentType {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<ComponentType> for &str {
    fn eq(&self, other: &ComponentType) -> bool {
        *self == other.as_str()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ComponentType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Kind of dataset exchanged with the calculation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetType {
    /// Model input.
    Input,
    /// Symmetric calculation output.
    SymOutput,
    /// Asymmetric calculation output.
    AsymOutput,
    /// Batch update.
    Update,
    /// Short-circuit calculation output.
    ScOutput,
}

impl DatasetType {
    /// All dataset types.
    pub const ALL: [DatasetType; 5] = [
        DatasetType::Input,
        DatasetType::SymOutput,
        DatasetType::AsymOutput,
        DatasetType::Update,
        DatasetType::ScOutput,
    ];

    /// The dataset type's name.
    pub const fn as_str(self) -> &'static str {
        match self {
            DatasetType::Input => "input",
            DatasetType::SymOutput => "sym_output",
            DatasetType::AsymOutput => "asym_output",
            DatasetType::Update => "update",
            DatasetType::ScOutput => "sc_output",
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown dataset type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dataset type '{0}'")]
pub struct UnknownDatasetType(pub String);

impl FromStr for DatasetType {
    type Err = UnknownDatasetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownDatasetType(s.to_string()))
    }
}

impl PartialEq<str> for DatasetType {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for DatasetType {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DatasetType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
