use uuid::Uuid;

/// Store-assigned record identifier. Serialized as its hyphenated string form.
pub type Id = Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} is not a valid identifier: '{value}'")]
pub struct IdentifierError {
    pub field: &'static str,
    pub value: String,
}

/// Every identifier accepted from a client goes through here.
pub fn parse_identifier(field: &'static str, raw: &str) -> Result<Id, IdentifierError> {
    Uuid::parse_str(raw.trim()).map_err(|_| IdentifierError {
        field,
        value: raw.to_string(),
    })
}

pub fn new_identifier() -> Id {
    Uuid::new_v4()
}
