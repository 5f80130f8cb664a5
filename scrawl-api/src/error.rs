use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Record not found {0}")]
    NotFound(Uuid),

    #[error("Text is empty")]
    EmptyText,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid character in name {0:?}")]
    InvalidName(String),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),

    #[error("Uuid already used {0}")]
    UuidAlreadyUsed(Uuid),

    #[error("Invalid Proof of Work")]
    InvalidPow,

    #[error("Reaction {0:?} cannot be used on a comment")]
    ReactionNotForComments(crate::ReactionType),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyText => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidName(_) => StatusCode::BAD_REQUEST,
            Error::NameAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::UuidAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::InvalidPow => StatusCode::BAD_REQUEST,
            Error::ReactionNotForComments(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound(id) => json!({
                "message": "record not found",
                "type": "not-found",
                "id": id,
            }),
            Error::EmptyText => json!({
                "message": "submitted text is empty",
                "type": "empty-text",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidName(n) => json!({
                "message": "there was an invalid character in a user name",
                "type": "invalid-name",
                "name": n,
            }),
            Error::NameAlreadyUsed(n) => json!({
                "message": "name already used",
                "type": "conflict-name",
                "name": n,
            }),
            Error::UuidAlreadyUsed(u) => json!({
                "message": "uuid conflict",
                "type": "conflict-uuid",
                "uuid": u,
            }),
            Error::InvalidPow => json!({
                "message": "invalid proof-of-work",
                "type": "invalid-pow",
            }),
            Error::ReactionNotForComments(r) => json!({
                "message": "this reaction type is not available on comments",
                "type": "reaction-not-for-comments",
                "reaction": r,
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let str_field = |field: &str| {
            data.get(field)
                .and_then(|f| f.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("error contents has no string field {field:?}"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or("")
                        .to_string(),
                ),
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(
                    str_field("id").and_then(|id| Ok(Uuid::from_str(&id)?))?,
                ),
                "empty-text" => Error::EmptyText,
                "null-byte" => Error::NullByteInString(str_field("string")?),
                "invalid-name" => Error::InvalidName(str_field("name")?),
                "conflict-name" => Error::NameAlreadyUsed(str_field("name")?),
                "conflict-uuid" => Error::UuidAlreadyUsed(
                    str_field("uuid").and_then(|u| Ok(Uuid::from_str(&u)?))?,
                ),
                "invalid-pow" => Error::InvalidPow,
                "reaction-not-for-comments" => Error::ReactionNotForComments(
                    serde_json::from_value(
                        data.get("reaction")
                            .ok_or_else(|| anyhow!("error contents has no reaction field"))?
                            .clone(),
                    )
                    .context("parsing reaction type")?,
                ),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
