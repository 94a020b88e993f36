//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::{EntityId, Error};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidId,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidId => "invalid_id",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    Error::invalid_request(format!("{} is required", field.as_str())).with_details(json!({
        "field": field.as_str(),
        "code": ErrorCode::MissingField.as_str(),
    }))
}

/// Parse a path or body identifier, rejecting malformed and nil values.
pub(crate) fn parse_entity_id(value: &str, field: FieldName) -> Result<EntityId, Error> {
    let invalid = || {
        Error::invalid_request(format!("{} must be a valid identifier", field.as_str()))
            .with_details(json!({
                "field": field.as_str(),
                "value": value,
                "code": ErrorCode::InvalidId.as_str(),
            }))
    };
    let id = EntityId::parse(value).map_err(|_| invalid())?;
    if id.is_nil() {
        return Err(invalid());
    }
    Ok(id)
}

/// Return the trimmed value, or a missing-field error when blank or absent.
pub(crate) fn require_text(value: Option<&str>, field: FieldName) -> Result<String, Error> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| missing_field_error(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ID: FieldName = FieldName::new("id");

    #[rstest]
    #[case("not-an-id")]
    #[case("")]
    #[case("00000000-0000-0000-0000-000000000000")]
    fn invalid_identifiers_carry_field_details(#[case] value: &str) {
        let err = parse_entity_id(value, ID).expect_err("invalid id");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "id");
        assert_eq!(details["code"], "invalid_id");
    }

    #[rstest]
    fn valid_identifier_parses() {
        let id = EntityId::generate();
        assert_eq!(parse_entity_id(&id.to_string(), ID).expect("valid"), id);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   "))]
    fn blank_text_is_missing(#[case] value: Option<&str>) {
        let err = require_text(value, FieldName::new("q")).expect_err("missing");
        assert_eq!(err.details().expect("details")["code"], "missing_field");
    }
}
