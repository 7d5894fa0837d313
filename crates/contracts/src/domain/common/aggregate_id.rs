use serde::{de::DeserializeOwned, Serialize};
use std::hash::Hash;

/// Identifier types of aggregates persisted as text keys
pub trait AggregateId:
    Clone + Copy + PartialEq + Eq + Hash + Serialize + DeserializeOwned + std::fmt::Debug
{
    /// Storage representation of the id
    fn as_string(&self) -> String;

    /// Parse an id read back from storage or from a request path
    fn from_string(s: &str) -> Result<Self, String>;
}
