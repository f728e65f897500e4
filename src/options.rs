use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Error;
use crate::Result;

/// Produces the `timestamp_override` transient value, invoked once per call.
#[derive(Clone)]
pub struct TimestampGenerator(Arc<dyn Fn() -> String + Send + Sync>);

impl TimestampGenerator {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self(Arc::new(make))
    }

    pub fn make(&self) -> String {
        (self.0)()
    }
}

impl std::fmt::Debug for TimestampGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TimestampGenerator")
    }
}

/// One configuration delta. Options are folded in order into a [`CallConfig`],
/// later scalars replacing earlier ones, headers and transient data merging by key.
#[derive(Debug, Clone)]
pub enum CallOption {
    Endpoint(String),
    Header(String, String),
    Id(String),
    Params(serde_json::Value),
    AuthToken(String),
    TimestampGenerator(TimestampGenerator),
    TransientData(String, Vec<u8>),
    TransientDataMap(BTreeMap<String, Vec<u8>>),
    MspFilter(Vec<String>),
    MinEndorsers(u32),
    Creator(String),
    DependentTxId(String),
    DisableWritePolling(bool),
    CcFetchUrlDowngrade(bool),
    CcFetchUrlProxy(String),
}

pub fn with_endpoint(endpoint: impl Into<String>) -> CallOption {
    CallOption::Endpoint(endpoint.into())
}

pub fn with_header(key: impl Into<String>, value: impl Into<String>) -> CallOption {
    CallOption::Header(key.into(), value.into())
}

pub fn with_id(id: impl Into<String>) -> CallOption {
    CallOption::Id(id.into())
}

pub fn with_params(params: impl Into<serde_json::Value>) -> CallOption {
    CallOption::Params(params.into())
}

/// Serializes `params` up front, so that applying the option cannot fail.
pub fn try_with_params<T: serde::Serialize>(params: &T) -> Result<CallOption> {
    serde_json::to_value(params)
        .map(CallOption::Params)
        .map_err(Error::Encode)
}

pub fn with_auth_token(token: impl Into<String>) -> CallOption {
    CallOption::AuthToken(token.into())
}

pub fn with_timestamp_generator<F>(make: F) -> CallOption
where
    F: Fn() -> String + Send + Sync + 'static,
{
    CallOption::TimestampGenerator(TimestampGenerator::new(make))
}

pub fn with_transient_data(key: impl Into<String>, value: impl Into<Vec<u8>>) -> CallOption {
    CallOption::TransientData(key.into(), value.into())
}

pub fn with_transient_data_map<K, V>(data: impl IntoIterator<Item = (K, V)>) -> CallOption
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    CallOption::TransientDataMap(
        data.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

pub fn with_msp_filter<S: Into<String>>(msp_filter: impl IntoIterator<Item = S>) -> CallOption {
    CallOption::MspFilter(msp_filter.into_iter().map(Into::into).collect())
}

pub fn with_min_endorsers(min_endorsers: u32) -> CallOption {
    CallOption::MinEndorsers(min_endorsers)
}

pub fn with_creator(creator: impl Into<String>) -> CallOption {
    CallOption::Creator(creator.into())
}

pub fn with_dependent_tx_id(tx_id: impl Into<String>) -> CallOption {
    CallOption::DependentTxId(tx_id.into())
}

pub fn with_disable_write_polling(disable: bool) -> CallOption {
    CallOption::DisableWritePolling(disable)
}

pub fn with_cc_fetch_url_downgrade(downgrade: bool) -> CallOption {
    CallOption::CcFetchUrlDowngrade(downgrade)
}

pub fn with_cc_fetch_url_proxy(proxy: impl Into<String>) -> CallOption {
    CallOption::CcFetchUrlProxy(proxy.into())
}

/// Per-call configuration, built fresh for every call.
#[derive(Debug, Clone, Default)]
pub struct CallConfig {
    pub id: String,
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub auth_token: String,
    pub params: Option<serde_json::Value>,
    pub transient_data: BTreeMap<String, Vec<u8>>,
    pub msp_filter: Vec<String>,
    pub min_endorsers: u32,
    pub creator: String,
    pub dependent_tx_id: String,
    pub disable_write_polling: bool,
    pub cc_fetch_url_downgrade: bool,
    pub cc_fetch_url_proxy: String,
    pub timestamp_generator: Option<TimestampGenerator>,
}

impl CallConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Seeds a fresh uuid, then folds `base` followed by `call`.
    pub fn merge(base: &[CallOption], call: &[CallOption]) -> Self {
        Self::merge_with_id(uuid::Uuid::new_v4().to_string(), base, call)
    }

    pub fn merge_with_id(id: impl Into<String>, base: &[CallOption], call: &[CallOption]) -> Self {
        base.iter()
            .chain(call)
            .fold(Self::new(id), |config, opt| config.apply(opt))
    }

    pub fn apply(mut self, opt: &CallOption) -> Self {
        match opt {
            CallOption::Endpoint(endpoint) => self.endpoint = endpoint.clone(),
            // HTTP header names are case-insensitive
            CallOption::Header(key, value) => {
                self.headers.insert(key.to_ascii_lowercase(), value.clone());
            }
            CallOption::Id(id) => self.id = id.clone(),
            CallOption::Params(params) => self.params = Some(params.clone()),
            CallOption::AuthToken(token) => self.auth_token = token.clone(),
            CallOption::TimestampGenerator(generator) => {
                self.timestamp_generator = Some(generator.clone())
            }
            CallOption::TransientData(key, value) => {
                self.transient_data.insert(key.clone(), value.clone());
            }
            CallOption::TransientDataMap(data) => self
                .transient_data
                .extend(data.iter().map(|(k, v)| (k.clone(), v.clone()))),
            CallOption::MspFilter(msp_filter) => self.msp_filter = msp_filter.clone(),
            CallOption::MinEndorsers(n) => self.min_endorsers = *n,
            CallOption::Creator(creator) => self.creator = creator.clone(),
            CallOption::DependentTxId(tx_id) => self.dependent_tx_id = tx_id.clone(),
            CallOption::DisableWritePolling(disable) => self.disable_write_polling = *disable,
            CallOption::CcFetchUrlDowngrade(downgrade) => {
                self.cc_fetch_url_downgrade = *downgrade
            }
            CallOption::CcFetchUrlProxy(proxy) => self.cc_fetch_url_proxy = proxy.clone(),
        }
        self
    }
}
