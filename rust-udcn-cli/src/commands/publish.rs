//! Data publishing command implementation for the µDCN CLI.
//!
//! Runs a minimal in-process producer: a QUIC server face accepts
//! connections, and any Interest matching the published name is answered
//! with the Data given on the command line. This bypasses the daemon's
//! Forwarder entirely — it is meant for quick manual testing, not as a
//! long-running producer application.

use anyhow::{Context, Result};
use bytes::Bytes;
use log::info;
use rust_udcn_common::ndn::{Data, Name};
use rust_udcn_quic::{FaceEvent, NdnQuicServer, ServerOptions};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

pub async fn publish_data(name_str: String, content: String, ttl: u32, listen_addr: String, cert_path: PathBuf, key_path: PathBuf) -> Result<()> {
    info!("Publishing data: name={}, content_len={}, ttl={}ms", name_str, content.len(), ttl);

    let name = Name::from_string(&name_str);
    let data = Arc::new(Data::new(name.clone(), Bytes::from(content.clone())).with_freshness_period(ttl));

    println!("Publishing Data:");
    println!(
        "  Content ({}): {}",
        content.len(),
        if content.len() > 32 { format!("{}...", &content[..30]) } else { content.clone() }
    );
    println!("  TTL: {ttl}ms");

    let server_options = ServerOptions { listen_addr, cert_path, key_path, ..Default::default() };
    let server = Arc::new(NdnQuicServer::new(server_options).await.context("failed to start QUIC server")?);
    server.run().await.context("failed to accept QUIC connections")?;

    println!("Listening on {}", server.address());
    println!("Serving Data for: {name}");
    println!("Press Ctrl+C to stop");

    let mut seen = HashSet::new();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("Shutting down...");
                break;
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                for face in server.get_faces().await {
                    if seen.insert(face.conn_id().to_string()) {
                        tokio::spawn(serve_face(face, Arc::clone(&data), name.clone()));
                    }
                }
            }
        }
    }

    Ok(())
}

async fn serve_face(face: Arc<rust_udcn_quic::Face>, data: Arc<Data>, name: Name) {
    while let Some(event) = face.next_event().await {
        match event {
            FaceEvent::InterestReceived(interest) if interest.name == name || name.is_prefix_of(&interest.name) => {
                let _ = face.send_data(&data).await;
            }
            FaceEvent::Closed => break,
            _ => {}
        }
    }
}
