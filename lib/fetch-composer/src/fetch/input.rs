use std::collections::BTreeMap;

use hive_router_composer_config::fetch::SubscriptionConfig;

use crate::{
    utils::json_writer::{write_and_escape_string, write_key},
    variables::UpstreamVariables,
};

/// What the transport needs to issue one upstream request.
pub struct FetchInput<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub header: &'a BTreeMap<String, Vec<String>>,
    pub query: &'a str,
    pub variables: &'a UpstreamVariables,
    /// Null variables are stripped from `body.variables` before sending.
    pub unnull_variables: bool,
}

fn write_string_list(out: &mut String, values: &[String]) {
    out.push('[');
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_and_escape_string(out, value);
    }
    out.push(']');
}

fn write_header(out: &mut String, header: &BTreeMap<String, Vec<String>>) {
    out.push('{');
    for (i, (name, values)) in header.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_key(out, name);
        write_string_list(out, values);
    }
    out.push('}');
}

/// Writes `{"query":..,"variables":{..}}`. Variable values are raw JSON and may hold
/// placeholders the execution engine substitutes.
fn write_body(out: &mut String, query: &str, variables: &UpstreamVariables) {
    out.push('{');
    write_key(out, "query");
    write_and_escape_string(out, query);
    out.push(',');
    write_key(out, "variables");
    out.push('{');
    for (i, (name, raw_json)) in variables.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_key(out, name);
        out.push_str(raw_json);
    }
    out.push('}');
    out.push('}');
}

pub fn write_fetch_input(input: &FetchInput, out: &mut String) {
    out.push('{');
    write_key(out, "method");
    write_and_escape_string(out, input.method);
    out.push(',');
    write_key(out, "url");
    write_and_escape_string(out, input.url);
    if !input.header.is_empty() {
        out.push(',');
        write_key(out, "header");
        write_header(out, input.header);
    }
    out.push(',');
    write_key(out, "body");
    write_body(out, input.query, input.variables);
    if input.unnull_variables {
        out.push(',');
        write_key(out, "unnull_variables");
        out.push_str("true");
    }
    out.push('}');
}

/// Writes the payload that starts an upstream subscription.
pub fn write_subscription_input(
    subscription: &SubscriptionConfig,
    header: &BTreeMap<String, Vec<String>>,
    query: &str,
    variables: &UpstreamVariables,
    out: &mut String,
) {
    out.push('{');
    write_key(out, "url");
    write_and_escape_string(out, &subscription.url);
    if !header.is_empty() {
        out.push(',');
        write_key(out, "header");
        write_header(out, header);
    }
    out.push(',');
    write_key(out, "body");
    write_body(out, query, variables);
    if subscription.use_sse {
        out.push(',');
        write_key(out, "use_sse");
        out.push_str("true");
        if subscription.sse_method_post {
            out.push(',');
            write_key(out, "sse_method_post");
            out.push_str("true");
        }
    }
    if !subscription.forwarded_client_headers.is_empty() {
        out.push(',');
        write_key(out, "forwarded_client_headers");
        write_string_list(out, &subscription.forwarded_client_headers);
    }
    if !subscription.forwarded_client_header_regex_patterns.is_empty() {
        out.push(',');
        write_key(out, "forwarded_client_header_regex_patterns");
        write_string_list(out, &subscription.forwarded_client_header_regex_patterns);
    }
    out.push(',');
    write_key(out, "ws_sub_protocol");
    write_and_escape_string(out, subscription.ws_subprotocol.as_str());
    out.push('}');
}
