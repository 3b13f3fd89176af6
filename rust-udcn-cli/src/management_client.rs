//! Unix-socket client for the daemon's management listener: sends one
//! `ManagementRequest` per line, reads back one `ControlResponse`.

use anyhow::{bail, Context, Result};
use rust_udcn_rib::management::{ControlResponse, ManagementRequest};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

pub async fn send(socket_path: &Path, request: ManagementRequest) -> Result<ControlResponse> {
    let stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("connecting to management socket {}", socket_path.display()))?;
    let (reader, mut writer) = stream.into_split();

    let mut encoded = serde_json::to_string(&request).context("encoding management request")?;
    encoded.push('\n');
    writer.write_all(encoded.as_bytes()).await.context("sending management request")?;

    let mut lines = BufReader::new(reader).lines();
    match lines.next_line().await.context("reading management response")? {
        Some(line) => serde_json::from_str(&line).context("decoding management response"),
        None => bail!("daemon closed the management connection without responding"),
    }
}
