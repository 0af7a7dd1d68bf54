//! Realtime channel probe.
//!
//! The realtime service speaks Phoenix channels over a websocket: join a
//! topic with `phx_join`, wait for the matching `phx_reply`, then leave.
//! Only diagnostics use this; the served pages never subscribe.

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use super::error::BackendError;

const JOIN_REF: &str = "1";
const LEAVE_REF: &str = "2";

/// Websocket endpoint for a service base URL (`https` becomes `wss`).
pub fn socket_url(base_url: &str, anon_key: &str) -> Result<String, BackendError> {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(BackendError::Realtime(format!("unsupported base url: {base_url}")));
    };

    let url = reqwest::Url::parse_with_params(
        &format!("{ws_base}/realtime/v1/websocket"),
        &[("apikey", anon_key), ("vsn", "1.0.0")],
    )
    .map_err(|e| BackendError::Realtime(e.to_string()))?;
    Ok(url.into())
}

#[must_use]
pub fn join_frame(channel: &str, join_ref: &str) -> String {
    serde_json::json!({
        "topic": format!("realtime:{channel}"),
        "event": "phx_join",
        "payload": { "config": { "broadcast": { "self": false }, "presence": { "key": "" } } },
        "ref": join_ref,
    })
    .to_string()
}

#[must_use]
pub fn leave_frame(channel: &str, leave_ref: &str) -> String {
    serde_json::json!({
        "topic": format!("realtime:{channel}"),
        "event": "phx_leave",
        "payload": {},
        "ref": leave_ref,
    })
    .to_string()
}

/// Interpret an incoming frame: `Some(ok)` for the reply to our join,
/// `None` for anything else (heartbeats, presence, other refs).
#[must_use]
pub fn join_reply(text: &str, join_ref: &str) -> Option<bool> {
    let frame: serde_json::Value = serde_json::from_str(text).ok()?;
    if frame.get("event").and_then(serde_json::Value::as_str) != Some("phx_reply") {
        return None;
    }
    if frame.get("ref").and_then(serde_json::Value::as_str) != Some(join_ref) {
        return None;
    }
    let status = frame
        .get("payload")
        .and_then(|p| p.get("status"))
        .and_then(serde_json::Value::as_str);
    Some(status == Some("ok"))
}

/// Join `channel` and report whether the join was acknowledged within `wait`.
pub async fn probe(base_url: &str, anon_key: &str, channel: &str, wait: Duration) -> Result<bool, BackendError> {
    let url = socket_url(base_url, anon_key)?;
    let (mut ws, _) = connect_async(url.as_str())
        .await
        .map_err(|e| BackendError::Realtime(e.to_string()))?;

    ws.send(Message::Text(join_frame(channel, JOIN_REF).into()))
        .await
        .map_err(|e| BackendError::Realtime(e.to_string()))?;

    let joined = match tokio::time::timeout(wait, wait_for_join(&mut ws)).await {
        Ok(result) => result?,
        Err(_) => false,
    };

    let _ = ws
        .send(Message::Text(leave_frame(channel, LEAVE_REF).into()))
        .await;
    let _ = ws.close(None).await;
    Ok(joined)
}

async fn wait_for_join<S>(ws: &mut S) -> Result<bool, BackendError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(ok) = join_reply(text.as_str(), JOIN_REF) {
                    return Ok(ok);
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => return Err(BackendError::Realtime(e.to_string())),
        }
    }
    Ok(false)
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;
