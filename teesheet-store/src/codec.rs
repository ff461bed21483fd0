//! Conversions between domain values and their column representations.
//! Enums are stored as the same SCREAMING_SNAKE_CASE text they use on the wire.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use teesheet_core::BoxError;

pub(crate) fn enum_to_text<T: Serialize>(value: &T) -> Result<String, BoxError> {
    match serde_json::to_value(value)? {
        Value::String(text) => Ok(text),
        other => Err(format!("expected a unit variant, got {}", other).into()),
    }
}

pub(crate) fn enum_from_text<T: DeserializeOwned>(text: &str) -> Result<T, BoxError> {
    Ok(serde_json::from_value(Value::String(text.to_string()))?)
}

/// Narrows an integer column into the domain's unsigned width.
pub(crate) fn narrow<T, S>(column: &str, value: S) -> Result<T, BoxError>
where
    T: TryFrom<S>,
    S: Copy + std::fmt::Display,
{
    T::try_from(value).map_err(|_| format!("{} out of range: {}", column, value).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teesheet_core::models::CartRequest;
    use teesheet_core::{PlayFormat, PlayerType};

    #[test]
    fn test_enum_text() {
        assert_eq!(enum_to_text(&PlayFormat::Crossover).unwrap(), "CROSSOVER");
        assert_eq!(enum_to_text(&PlayerType::WalkUp).unwrap(), "WALK_UP");
        assert_eq!(enum_from_text::<CartRequest>("SHARED").unwrap(), CartRequest::Shared);
        assert!(enum_from_text::<PlayFormat>("LOOP").is_err());
    }

    #[test]
    fn test_narrow() {
        assert_eq!(narrow::<u16, i32>("interval", 10).unwrap(), 10);
        assert!(narrow::<u16, i32>("interval", -1).is_err());
        assert!(narrow::<u8, i16>("position", 300).is_err());
    }
}
