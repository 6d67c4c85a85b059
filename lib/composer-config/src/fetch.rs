use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the upstream service is reached for queries and mutations.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// The endpoint of the upstream GraphQL service.
    pub url: String,
    /// The HTTP method used for the upstream request.
    ///
    /// Default: `POST`.
    #[serde(default = "default_fetch_method")]
    pub method: String,
    /// Static headers attached to every upstream request, as a map of header name to values.
    #[serde(default)]
    pub header: BTreeMap<String, Vec<String>>,
}

fn default_fetch_method() -> String {
    "POST".to_string()
}

/// How the upstream service is reached for subscriptions.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionConfig {
    /// The endpoint used to start subscriptions. Usually a `ws://` or `http://` URL.
    pub url: String,
    /// Use Server-Sent Events instead of WebSockets.
    #[serde(default)]
    pub use_sse: bool,
    /// When `use_sse` is enabled, start the stream with a POST request instead of a GET request.
    #[serde(default)]
    pub sse_method_post: bool,
    /// Client headers forwarded to the upstream when the subscription starts.
    #[serde(default)]
    pub forwarded_client_headers: Vec<String>,
    /// Regular expressions matched against client header names.
    /// Every matching header is forwarded to the upstream when the subscription starts.
    #[serde(default)]
    pub forwarded_client_header_regex_patterns: Vec<String>,
    /// The WebSocket sub-protocol spoken with the upstream.
    #[serde(default)]
    pub ws_subprotocol: WsSubProtocol,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Copy, Default, PartialEq, Eq)]
pub enum WsSubProtocol {
    /// Negotiate the protocol with the upstream.
    #[default]
    #[serde(rename = "auto")]
    Auto,
    /// The legacy `subscriptions-transport-ws` protocol.
    #[serde(rename = "graphql-ws")]
    GraphQLWs,
    /// The `graphql-ws` library protocol.
    #[serde(rename = "graphql-transport-ws")]
    GraphQLTransportWs,
}

impl WsSubProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsSubProtocol::Auto => "auto",
            WsSubProtocol::GraphQLWs => "graphql-ws",
            WsSubProtocol::GraphQLTransportWs => "graphql-transport-ws",
        }
    }
}
