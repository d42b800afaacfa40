//! JSON method dispatcher.
//!
//! # Responsibility
//! - Route `<variant>.<operation>` method names to [`BookingRpc`] calls.
//! - Wrap results in the `{ok, result, error}` response envelope.
//! - Map domain errors to stable status codes.
//!
//! # Invariants
//! - Dispatch never panics; every input yields one response envelope.

use crate::api::BookingRpc;
use booking_core::{BookingRepository, BookingVariant, CommitProducer, RepoError, RepoResult};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

const SERIALIZE_FAILURE_RESPONSE: &str =
    r#"{"ok":false,"result":null,"error":{"code":"internal","message":"failed to serialize response"}}"#;

/// Booking operation names as they appear in method strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    GetAllByUserId,
    GetAllByProviderId,
    List,
    ListDeleted,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Create,
        Operation::GetAllByUserId,
        Operation::GetAllByProviderId,
        Operation::List,
        Operation::ListDeleted,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::GetAllByUserId => "get_all_by_user_id",
            Self::GetAllByProviderId => "get_all_by_provider_id",
            Self::List => "list",
            Self::ListDeleted => "list_deleted",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.name() == value)
    }
}

/// Splits `hotel.create` into its variant and operation.
pub fn parse_method(method: &str) -> Option<(BookingVariant, Operation)> {
    let (variant, operation) = method.trim().split_once('.')?;
    Some((
        BookingVariant::from_label(variant)?,
        Operation::from_name(operation)?,
    ))
}

/// Stable status code carried by error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    AlreadyDeleted,
    NoRowsAffected,
    UnknownMethod,
    Internal,
}

impl StatusCode {
    pub fn of(err: &RepoError) -> Self {
        match err {
            RepoError::InvalidArgument(_) | RepoError::Validation(_) => Self::InvalidArgument,
            RepoError::NotFound { .. } => Self::NotFound,
            RepoError::AlreadyDeleted { .. } => Self::AlreadyDeleted,
            RepoError::NoRowsAffected { .. } => Self::NoRowsAffected,
            _ => Self::Internal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::AlreadyDeleted => "already_deleted",
            Self::NoRowsAffected => "no_rows_affected",
            Self::UnknownMethod => "unknown_method",
            Self::Internal => "internal",
        }
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: StatusCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RepoError> for RpcError {
    fn from(err: RepoError) -> Self {
        Self::new(StatusCode::of(&err), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub ok: bool,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: RpcError) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

impl<R: BookingRepository, P: CommitProducer> BookingRpc<R, P> {
    /// Runs one method call with JSON params.
    pub fn dispatch(&self, method: &str, params: Value) -> RpcResponse {
        let Some((variant, operation)) = parse_method(method) else {
            warn!(
                "event=rpc_dispatch module=rpc status=error error_code=unknown_method method={}",
                method.escape_debug()
            );
            return RpcResponse::failure(RpcError::new(
                StatusCode::UnknownMethod,
                format!("unknown method `{method}`"),
            ));
        };

        match self.route(variant, operation, params) {
            Ok(result) => RpcResponse::success(result),
            Err(err) => RpcResponse::failure(err),
        }
    }

    /// Handles one line-delimited JSON request and renders the response line.
    pub fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.dispatch(&request.method, request.params),
            Err(err) => RpcResponse::failure(RpcError::new(
                StatusCode::InvalidArgument,
                format!("malformed request: {err}"),
            )),
        };
        serde_json::to_string(&response).unwrap_or_else(|err| {
            warn!("event=rpc_dispatch module=rpc status=error error_code=internal error={err}");
            SERIALIZE_FAILURE_RESPONSE.to_string()
        })
    }

    fn route(
        &self,
        variant: BookingVariant,
        operation: Operation,
        params: Value,
    ) -> Result<Value, RpcError> {
        match operation {
            Operation::Create => encode(self.create(variant, &decode(params)?)),
            Operation::GetAllByUserId => {
                encode(self.get_all_by_user_id(variant, &decode(params)?))
            }
            Operation::GetAllByProviderId => {
                encode(self.get_all_by_provider_id(variant, &decode(params)?))
            }
            Operation::List => encode(self.list(variant, &decode(params)?)),
            Operation::ListDeleted => encode(self.list_deleted(variant, &decode(params)?)),
            Operation::Update => encode(self.update(variant, &decode(params)?)),
            Operation::Delete => encode(self.delete(variant, &decode(params)?)),
        }
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|err| RpcError::new(StatusCode::InvalidArgument, format!("invalid params: {err}")))
}

fn encode<T: Serialize>(result: RepoResult<T>) -> Result<Value, RpcError> {
    let value = result?;
    serde_json::to_value(value).map_err(|err| RpcError::new(StatusCode::Internal, err.to_string()))
}
