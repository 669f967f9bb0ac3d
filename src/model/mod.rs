//! Pure data structures shared by the registry, the catalog client and the session.
//!
//! Nothing in here talks to the network or the store. The types define the wire and
//! storage shape (camelCase JSON) and the normalization rules applied when a record
//! enters the registry.

pub mod product;
pub mod user;
pub mod validation;

pub use product::*;
pub use user::*;
pub use validation::*;

use serde::{Deserialize, Deserializer};

/// Accepts either a JSON string or a JSON number and yields its string form.
///
/// The demo API hands out numeric ids while locally generated ids are strings, so every
/// identifier type funnels through this.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
