pub mod call;
mod error;
mod http;
pub mod options;
mod response;

/// https://www.jsonrpc.org/specification
mod jsonrpc {
    pub const VERSION: &str = "2.0";

    #[derive(serde::Serialize, Debug)]
    pub struct Request<'a, P> {
        pub jsonrpc: &'a str, // jsonrpc must be "2.0"
        pub id: &'a str,      // correlation id, a uuid unless overridden
        pub method: &'a str,  // the gateway only exposes "Call"
        pub params: P,        // the contract method, its params and transient data
    }
}

pub use call::RpcResponse;
pub use error::{
    is_timeout_error, ClientError, Error, ProtocolViolation, CLIENT_ERROR_CODE_NONE,
    CLIENT_ERROR_CODE_TIMEOUT,
};
pub use http::{Client, ClientInner, HttpRequest, HttpResponse, HttpTransport, Transport};
pub use options::{CallConfig, CallOption, TimestampGenerator};
pub use response::{classify, CallOutcome, FailureResponse, SuccessResponse};

pub type Result<T> = std::result::Result<T, Error>;
