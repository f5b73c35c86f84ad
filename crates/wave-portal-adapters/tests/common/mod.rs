#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::Address;
use serde_json::{json, Value};
use tiny_http::{Response, Server};

use wave_portal_adapters::JsonRpcTransport;

pub type RpcCalls = Arc<Mutex<Vec<(String, Value)>>>;

/// JSON-RPC reply: `Ok(result)` or `Err((code, message))`.
pub type RpcReply = Result<Value, (i64, String)>;

/// Mock JSON-RPC endpoint. `handler` gets the method and params of every
/// call; all calls are recorded in order.
pub fn spawn_rpc_server<F>(handler: F) -> (String, RpcCalls)
where
    F: Fn(&str, &Value) -> RpcReply + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let url = format!("http://{}", server.server_addr());
    let calls: RpcCalls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    thread::spawn(move || {
        while let Ok(mut req) = server.recv() {
            let mut body = String::new();
            if req.as_reader().read_to_string(&mut body).is_err() {
                continue;
            }
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = request["method"].as_str().unwrap_or_default().to_owned();
            let params = request["params"].clone();
            if let Ok(mut g) = recorded.lock() {
                g.push((method.clone(), params.clone()));
            }

            let payload = match handler(&method, &params) {
                Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
                Err((code, message)) => json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": {"code": code, "message": message},
                }),
            };
            let _ = req.respond(Response::from_string(payload.to_string()));
        }
    });

    (url, calls)
}

pub fn transport(url: &str) -> JsonRpcTransport {
    JsonRpcTransport::new(url, 5_000).expect("transport")
}

pub fn methods(calls: &RpcCalls) -> Vec<String> {
    calls
        .lock()
        .expect("calls")
        .iter()
        .map(|(m, _)| m.clone())
        .collect()
}

pub fn account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid account")
}

pub fn contract() -> Address {
    "0x6909e506FBEc9F2738226b0b73eC2AAee7de6489"
        .parse()
        .expect("valid contract")
}

pub fn waver() -> Address {
    "0x000000000000000000000000000000000000ABCD"
        .parse()
        .expect("valid waver")
}
