//! JSON-RPC 2.0 request encoding and response classification.

use serde::Serialize;
use serde_json::{Map, Value};

/// Protocol version carried by every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request as written to the socket.
///
/// `params` is skipped entirely when absent; some engines reject an empty
/// `params` member, so callers never send `{}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    jsonrpc: &'static str,
    method: String,
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Map<String, Value>>,
}

impl Request {
    /// Builds a request, dropping `params` when it holds no members.
    #[must_use]
    pub fn new(method: impl Into<String>, id: u64, params: Option<Map<String, Value>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            id,
            params: params.filter(|params| !params.is_empty()),
        }
    }

    /// Method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request id used for correlation.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Parameters sent with the request, if any.
    #[must_use]
    pub const fn params(&self) -> Option<&Map<String, Value>> {
        self.params.as_ref()
    }

    /// The request as a JSON value, for diagnostics and verbose output.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert(String::from("jsonrpc"), Value::from(self.jsonrpc));
        object.insert(String::from("method"), Value::from(self.method.as_str()));
        object.insert(String::from("id"), Value::from(self.id));
        if let Some(params) = &self.params {
            object.insert(String::from("params"), Value::Object(params.clone()));
        }
        Value::Object(object)
    }

    /// Serialises the request to its wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Classification of a decoded response document.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The call succeeded with the given value, which may be `null`.
    Result(Value),
    /// The engine reported a failure; the error object is kept verbatim.
    Error(Value),
    /// The document carried neither member.
    Malformed(&'static str),
}

impl Response {
    /// Classifies a response document. `error` wins when both are present.
    #[must_use]
    pub fn classify(document: Value) -> Self {
        let Value::Object(mut object) = document else {
            return Self::Malformed("response is not a JSON object");
        };
        if let Some(error) = object.remove("error") {
            return Self::Error(error);
        }
        match object.remove("result") {
            Some(result) => Self::Result(result),
            None => Self::Malformed("response missing both result and error"),
        }
    }
}

/// Reads the `id` member of a response, when it is an unsigned integer.
pub(crate) fn response_id(document: &Value) -> Option<u64> {
    document.get("id").and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Option<Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    #[test]
    fn request_without_params_omits_member() {
        let request = Request::new("spdk_get_version", 1, None);
        let wire = String::from_utf8(request.to_bytes().expect("serialise")).expect("utf8");
        assert_eq!(wire, r#"{"jsonrpc":"2.0","method":"spdk_get_version","id":1}"#);
    }

    #[test]
    fn empty_params_are_not_sent() {
        let request = Request::new("bdev_get_bdevs", 3, params(json!({})));
        assert_eq!(request.params(), None);
        assert_eq!(
            request.to_value(),
            json!({"jsonrpc": "2.0", "method": "bdev_get_bdevs", "id": 3})
        );
    }

    #[test]
    fn params_are_sent_when_present() {
        let request = Request::new("bdev_get_bdevs", 2, params(json!({"name": "Malloc0"})));
        assert_eq!(
            request.to_value(),
            json!({
                "jsonrpc": "2.0",
                "method": "bdev_get_bdevs",
                "id": 2,
                "params": {"name": "Malloc0"}
            })
        );
    }

    #[rstest]
    #[case(json!(null))]
    #[case(json!({}))]
    #[case(json!([]))]
    #[case(json!(true))]
    #[case(json!([{"name": "Malloc0"}]))]
    fn result_values_are_returned_verbatim(#[case] value: Value) {
        let response = Response::classify(json!({"id": 1, "result": value.clone()}));
        assert_eq!(response, Response::Result(value));
    }

    #[test]
    fn error_objects_are_kept_verbatim() {
        let response =
            Response::classify(json!({"id": 1, "error": {"code": -1, "message": "m"}}));
        assert_eq!(
            response,
            Response::Error(json!({"code": -1, "message": "m"}))
        );
    }

    #[rstest]
    #[case(json!({"id": 1}))]
    #[case(json!([1, 2]))]
    #[case(json!("result"))]
    fn documents_without_outcome_are_malformed(#[case] document: Value) {
        assert!(matches!(
            Response::classify(document),
            Response::Malformed(_)
        ));
    }
}
