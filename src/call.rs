use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value};
use serde_with::{hex::Hex, serde_as};

use crate::error::{Error, ProtocolViolation};
use crate::jsonrpc;
use crate::options::CallConfig;
use crate::Result;

/// The single JSON-RPC method the gateway exposes; the contract method travels in params.
pub const METHOD_CALL: &str = "Call";

const TIMESTAMP_OVERRIDE: &str = "timestamp_override";

fn is_empty_str(s: &&str) -> bool {
    s.is_empty()
}

fn is_empty_slice(s: &&[String]) -> bool {
    s.is_empty()
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// `params` of the gateway `Call` request.
///
/// `cc_fetchurl_downgrade` and `cc_fetchurl_proxy` are always sent, even when
/// unset, while the other optional fields are omitted at their defaults.
#[serde_as]
#[derive(serde::Serialize, Debug)]
pub struct CallParams<'a> {
    method: &'a str,
    params: Option<&'a Value>,
    #[serde_as(as = "BTreeMap<_, Hex>")]
    transient: BTreeMap<&'a str, Cow<'a, [u8]>>,
    #[serde(skip_serializing_if = "is_empty_str")]
    dependent_txid: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    disable_write_polling: bool,
    cc_fetchurl_downgrade: bool,
    cc_fetchurl_proxy: &'a str,
    #[serde(skip_serializing_if = "is_empty_slice")]
    msp_filter: &'a [String],
    #[serde(skip_serializing_if = "is_zero")]
    min_endorsers: u32,
    #[serde(skip_serializing_if = "is_empty_str")]
    creator_msp_id: &'a str,
}

impl<'a> CallParams<'a> {
    /// Invokes the configured timestamp generator, if any.
    pub fn new(method: &'a str, config: &'a CallConfig) -> Self {
        let mut transient: BTreeMap<&str, Cow<[u8]>> = config
            .transient_data
            .iter()
            .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_slice())))
            .collect();
        if let Some(ref generator) = config.timestamp_generator {
            transient.insert(TIMESTAMP_OVERRIDE, Cow::Owned(generator.make().into_bytes()));
        }

        Self {
            method,
            params: config.params.as_ref(),
            transient,
            dependent_txid: &config.dependent_tx_id,
            disable_write_polling: config.disable_write_polling,
            cc_fetchurl_downgrade: config.cc_fetch_url_downgrade,
            cc_fetchurl_proxy: &config.cc_fetch_url_proxy,
            msp_filter: &config.msp_filter,
            min_endorsers: config.min_endorsers,
            creator_msp_id: &config.creator,
        }
    }
}

/// Serializes the full `Call` envelope for `method` under `config`.
pub fn encode_request(method: &str, config: &CallConfig) -> Result<Vec<u8>> {
    let rpc_req = jsonrpc::Request {
        jsonrpc: jsonrpc::VERSION,
        id: &config.id,
        method: METHOD_CALL,
        params: CallParams::new(method, config),
    };
    serde_json::to_vec(&rpc_req).map_err(Error::Encode)
}

/// Validated view of the gateway response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub error_level: i64,
    pub result: Value,
    pub code: Value,
    pub message: Value,
    pub data: Value,
    pub commit_tx_id: String,
}

pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

impl RpcResponse {
    /// Parses `body` and checks the envelope fields in wire order, reporting the first violation.
    pub fn from_body(body: &[u8]) -> std::result::Result<Self, ProtocolViolation> {
        let mut envelope: Map<String, Value> =
            serde_json::from_slice(body).map_err(ProtocolViolation::MalformedBody)?;

        match envelope.get("jsonrpc") {
            None => return Err(ProtocolViolation::MissingField("jsonrpc")),
            Some(Value::String(version)) if version == jsonrpc::VERSION => {}
            Some(Value::String(version)) => {
                return Err(ProtocolViolation::UnsupportedVersion(version.clone()))
            }
            Some(_) => {
                return Err(ProtocolViolation::WrongType {
                    field: "jsonrpc",
                    expected: "a string",
                })
            }
        }

        let mut result = match envelope.remove("result") {
            None => return Err(ProtocolViolation::MissingField("result")),
            Some(Value::Object(result)) => result,
            Some(_) => {
                return Err(ProtocolViolation::WrongType {
                    field: "result",
                    expected: "an object",
                })
            }
        };

        let error_level = result
            .get("error_level")
            .ok_or(ProtocolViolation::MissingField("result.error_level"))
            .and_then(|level| {
                as_integer(level).ok_or(ProtocolViolation::WrongType {
                    field: "result.error_level",
                    expected: "a numeric",
                })
            })?;

        let mut take = |key: &str, field: &'static str| {
            result
                .remove(key)
                .ok_or(ProtocolViolation::MissingField(field))
        };
        let inner_result = take("result", "result.result")?;
        let code = take("code", "result.code")?;
        let message = take("message", "result.message")?;
        let data = take("data", "result.data")?;

        let commit_tx_id = match envelope.remove("$commit_tx_id") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(tx_id)) => tx_id,
            Some(_) => {
                return Err(ProtocolViolation::WrongType {
                    field: "$commit_tx_id",
                    expected: "a string",
                })
            }
        };

        Ok(Self {
            error_level,
            result: inner_result,
            code,
            message,
            data,
            commit_tx_id,
        })
    }
}
