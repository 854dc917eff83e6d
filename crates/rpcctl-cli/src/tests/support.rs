//! Test doubles shared by the CLI unit tests.

use std::collections::VecDeque;
use std::io::{BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use rpcctl_client::{CallOptions, Outcome, RpcCall, RpcClientError};
use serde_json::{Map, Value};

/// Records every call and answers from a queue of canned replies.
///
/// An empty queue answers `null`.
#[derive(Default)]
pub(crate) struct StubCall {
    pub(crate) calls: Vec<(String, Option<Value>)>,
    replies: VecDeque<Result<Outcome, RpcClientError>>,
}

impl StubCall {
    pub(crate) fn replying(replies: impl IntoIterator<Item = Result<Outcome, RpcClientError>>) -> Self {
        Self {
            calls: Vec::new(),
            replies: replies.into_iter().collect(),
        }
    }
}

impl RpcCall for StubCall {
    fn call_with(
        &mut self,
        method: &str,
        params: Option<Map<String, Value>>,
        _options: CallOptions,
    ) -> Result<Outcome, RpcClientError> {
        self.calls.push((method.to_owned(), params.map(Value::Object)));
        self.replies
            .pop_front()
            .unwrap_or(Ok(Outcome::Value(Value::Null)))
    }
}

/// Engine stand-in that answers each request with the next canned reply.
///
/// Requests are read one JSON document at a time. A `null` reply closes the
/// connection after reading the request, as the engine does when killed;
/// when the replies run out the connection is closed as well.
pub(crate) struct FakeEngine {
    pub(crate) port: u16,
    handle: Option<JoinHandle<Vec<Value>>>,
}

impl FakeEngine {
    pub(crate) fn spawn(replies: Vec<Value>) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind fake engine");
        let port = listener.local_addr().expect("local addr").port();
        let handle = thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return Vec::new();
            };
            let mut writer = stream.try_clone().expect("clone stream");
            let reader = BufReader::new(stream);
            serve(reader, &mut writer, replies)
        });
        Self {
            port,
            handle: Some(handle),
        }
    }

    /// Waits for the engine thread and returns the requests it received.
    pub(crate) fn requests(mut self) -> Vec<Value> {
        self.handle
            .take()
            .map(|handle| handle.join().expect("fake engine thread"))
            .unwrap_or_default()
    }
}

fn serve<R: Read, W: Write>(reader: R, writer: &mut W, replies: Vec<Value>) -> Vec<Value> {
    let mut requests = Vec::new();
    let mut documents = serde_json::Deserializer::from_reader(reader).into_iter::<Value>();
    for mut reply in replies {
        let Some(Ok(request)) = documents.next() else {
            break;
        };
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        requests.push(request);
        let Some(object) = reply.as_object_mut() else {
            break;
        };
        object.insert(String::from("id"), id);
        if writer
            .write_all(reply.to_string().as_bytes())
            .and_then(|()| writer.flush())
            .is_err()
        {
            break;
        }
    }
    requests
}
