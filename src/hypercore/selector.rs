//! Selectors
//!
//! Typed replacements for the string "kind"/"method" arguments the API helpers
//! take. Each parses from its string form and rejects anything it does not
//! recognise with [`Error::InvalidArgument`].

use super::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Kind of resource an identifier refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Virtual machine, identified by name (case-insensitive)
    Vm,
    /// Physical node, identified by LAN IP
    Node,
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vm" => Ok(Self::Vm),
            "node" => Ok(Self::Node),
            other => Err(Error::InvalidArgument(format!(
                "unknown resource kind '{}', expected vm or node",
                other
            ))),
        }
    }
}

/// Selects a single virtual machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmSelector {
    Uuid(String),
    Name(String),
}

impl VmSelector {
    /// Classify a free-form identifier: anything that parses as a UUID is
    /// used directly, everything else is treated as a VM name
    pub fn detect(identifier: &str) -> Self {
        if uuid::Uuid::parse_str(identifier).is_ok() {
            Self::Uuid(identifier.to_string())
        } else {
            Self::Name(identifier.to_string())
        }
    }
}

impl fmt::Display for VmSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => write!(f, "uuid {}", uuid),
            Self::Name(name) => write!(f, "name {}", name),
        }
    }
}

/// Selects the virtual machines a snapshot is taken of
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotTarget {
    Uuid(String),
    Name(String),
    /// Every VM whose tag list contains this tag
    Tag(String),
}

impl SnapshotTarget {
    /// Build a target from a kind string (`uuid`, `name`, `tag`) and its value
    pub fn parse(kind: &str, value: &str) -> Result<Self> {
        match kind.to_lowercase().as_str() {
            "uuid" => Ok(Self::Uuid(value.to_string())),
            "name" => Ok(Self::Name(value.to_string())),
            "tag" => Ok(Self::Tag(value.to_string())),
            other => Err(Error::InvalidArgument(format!(
                "unknown snapshot selector '{}', expected uuid, name or tag",
                other
            ))),
        }
    }
}

/// How a VM's tag list is changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMethod {
    /// Append the tag
    Add,
    /// Remove the tag; fails when it is absent
    Remove,
    /// Move (or insert) the tag to the front of the list
    Group,
    /// Replace the whole list verbatim
    Manual,
}

impl FromStr for TagMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "group" => Ok(Self::Group),
            "manual" => Ok(Self::Manual),
            other => Err(Error::InvalidArgument(format!(
                "unknown tag method '{}', expected add, remove, group or manual",
                other
            ))),
        }
    }
}
