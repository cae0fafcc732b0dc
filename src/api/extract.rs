//! Extractors that validate path, query and body input.
//!
//! Every rejection is a 400 whose message names the part of the request that
//! failed ("Param", "Query" or "Body") followed by the issues, each rendered
//! as `field → message` and separated by `; `.

use {
    crate::{Error, is_valid_id},
    axum::{
        Json,
        extract::{FromRequest, FromRequestParts, Path, Query, Request},
    },
    http::request::Parts,
    serde::de::DeserializeOwned,
    std::fmt,
};

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Offending field, `None` for problems spanning the whole input.
    pub field: Option<&'static str>,
    pub message: String,
}

impl Issue {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Issue {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Issue {
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field} → {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Input types that can check their own invariants after deserialization.
pub trait Validate {
    fn validate(&self) -> Vec<Issue>;
}

/// Where an input came from, used as the prefix of validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Param,
    Query,
    Body,
}

impl Source {
    /// Builds the 400 returned for `issues`.
    pub fn reject<I, T>(self, issues: I) -> Error
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        let joined = issues
            .into_iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Error::bad_request(format!("{self} validation failed: {joined}"))
    }

    fn check<T: Validate>(self, value: &T) -> Result<(), Error> {
        let issues = value.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(self.reject(issues))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Param => "Param",
            Source::Query => "Query",
            Source::Body => "Body",
        })
    }
}

/// JSON body deserialized into `T` and validated.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Source::Body.reject([rejection.body_text()]))?;
        Source::Body.check(&value)?;
        Ok(ValidJson(value))
    }
}

/// Query string deserialized into `T` and validated.
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::try_from_uri(&parts.uri)
            .map_err(|rejection| Source::Query.reject([rejection.body_text()]))?;
        Source::Query.check(&value)?;
        Ok(ValidQuery(value))
    }
}

/// The `{id}` path segment, checked against the item identifier format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemId(pub String);

impl<S> FromRequestParts<S> for ItemId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Source::Param.reject([rejection.body_text()]))?;

        if !is_valid_id(&id) {
            return Err(Source::Param.reject(["Invalid ID format"]));
        }
        Ok(ItemId(id))
    }
}
