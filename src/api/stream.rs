use futures_util::StreamExt;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{DashboardError, Result};

pub const DEFAULT_WS_URL: &str = "ws://localhost:8080";

/// Connects to the update feed and forwards every JSON text frame.
///
/// The receiver closes when the server closes the socket or the connection fails.
pub async fn connect_updates(url: &str) -> Result<(JoinHandle<()>, mpsc::Receiver<Value>)> {
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        return Err(DashboardError::InvalidConfig(format!(
            "update url must be ws(s): {url}"
        )));
    }

    let (socket, _) = connect_async(url).await?;
    info!("update stream connected to {url}");

    let (_write, mut read) = socket.split();
    let (tx, rx) = mpsc::channel(64);

    let task = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if let Some(value) = parse_frame(text.as_str()) {
                        if tx.send(value).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("update stream closed by server");
                    break;
                }
                Ok(other) => debug!("ignoring frame {other:?}"),
                Err(e) => {
                    warn!("update stream failed: {e}");
                    break;
                }
            }
        }
    });

    Ok((task, rx))
}

pub fn parse_frame(text: &str) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("skipping unparsable update frame: {e}");
            None
        }
    }
}
