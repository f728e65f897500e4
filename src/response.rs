use serde_json::Value;

use crate::call::{as_integer, RpcResponse};
use crate::error::{ClientError, Error, ProtocolViolation, CLIENT_ERROR_CODE_NONE};
use crate::Result;

const ERROR_LEVEL_NO_ERROR: i64 = 0;
const ERROR_LEVEL_CLIENT: i64 = 1;
const ERROR_LEVEL_PHYLUM: i64 = 2;

/// Result of a call that reached the smart contract.
///
/// Business rejections come back as [`CallOutcome::Failure`] rather than as an
/// [`Error`]; client and protocol failures are always errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            CallOutcome::Success(resp) => Some(resp.transaction_id()),
            CallOutcome::Failure(_) => None,
        }
    }

    /// Empty on failure.
    pub fn result_json(&self) -> &[u8] {
        match self {
            CallOutcome::Success(resp) => resp.result_json(),
            CallOutcome::Failure(_) => &[],
        }
    }

    pub fn unmarshal<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        match self {
            CallOutcome::Success(resp) => resp.unmarshal(),
            CallOutcome::Failure(_) => Err(Error::InvalidArgument(
                "can't unmarshal the result if the RPC call failed".to_string(),
            )),
        }
    }

    pub fn error(&self) -> Option<&FailureResponse> {
        match self {
            CallOutcome::Success(_) => None,
            CallOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> std::result::Result<SuccessResponse, FailureResponse> {
        match self {
            CallOutcome::Success(resp) => Ok(resp),
            CallOutcome::Failure(failure) => Err(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessResponse {
    transaction_id: String,
    result: Vec<u8>,
}

impl SuccessResponse {
    pub fn new(transaction_id: impl Into<String>, result: Vec<u8>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            result,
        }
    }

    pub fn unmarshal<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.result).map_err(Error::Decode)
    }

    pub fn result_json(&self) -> &[u8] {
        &self.result
    }

    /// Empty when the gateway did not commit a transaction.
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }
}

/// Phylum (smart contract) level rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureResponse {
    code: i64,
    message: String,
    data: Vec<u8>,
}

impl FailureResponse {
    pub fn new(code: i64, message: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data_json(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl std::fmt::Display for FailureResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "phylum error {}: {}", self.code, self.message)
    }
}
impl std::error::Error for FailureResponse {}

fn encode_value(value: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::Encode)
}

/// Dispatches on the envelope error level.
pub fn classify(resp: RpcResponse) -> Result<CallOutcome> {
    match resp.error_level {
        ERROR_LEVEL_NO_ERROR => Ok(CallOutcome::Success(SuccessResponse::new(
            resp.commit_tx_id,
            encode_value(&resp.result)?,
        ))),
        ERROR_LEVEL_CLIENT => {
            let message = match resp.message {
                Value::String(message) => message,
                _ => {
                    return Err(ProtocolViolation::WrongType {
                        field: "result.message",
                        expected: "a string",
                    }
                    .into())
                }
            };
            let code = resp.code.as_i64().unwrap_or(CLIENT_ERROR_CODE_NONE);
            Err(ClientError::new(message, code).into())
        }
        ERROR_LEVEL_PHYLUM => {
            let code = as_integer(&resp.code).ok_or(ProtocolViolation::WrongType {
                field: "result.code",
                expected: "a numeric",
            })?;
            let message = match resp.message {
                Value::String(message) => message,
                _ => {
                    return Err(ProtocolViolation::WrongType {
                        field: "result.message",
                        expected: "a string",
                    }
                    .into())
                }
            };
            let data = match resp.data {
                Value::Null => Vec::new(),
                ref data => encode_value(data)?,
            };
            Ok(CallOutcome::Failure(FailureResponse::new(code, message, data)))
        }
        level => Err(ProtocolViolation::UnexpectedErrorLevel(level).into()),
    }
}
