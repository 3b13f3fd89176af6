//! Interest sending command implementation for the µDCN CLI

use anyhow::{Context, Result};
use log::info;
use rust_udcn_common::ndn::{Interest, Name};
use rust_udcn_quic::{ClientOptions, InterestOutcome, NdnQuicTransport, TransportConfig, TransportMode};
use tokio::time::timeout;

/// Send an Interest and print the Data or Nack response
pub async fn send_interest(name_str: String, timeout_ms: u64, router: String) -> Result<()> {
    info!("Sending Interest: name={}, timeout={}ms", name_str, timeout_ms);

    let name = Name::from_string(&name_str);
    let interest = Interest::new(name).with_can_be_prefix(false).with_must_be_fresh(true);

    println!("Sending Interest: {}", name_str);
    println!("Timeout: {}ms", timeout_ms);

    let config = TransportConfig {
        mode: TransportMode::Client,
        client_options: ClientOptions {
            verify_certificate: false,
            ..Default::default()
        },
        interest_timeout_ms: timeout_ms,
        ..Default::default()
    };

    let transport = NdnQuicTransport::new(config).await.context("failed to create QUIC transport")?;

    println!("Connecting to {router}...");
    let face = transport.connect(router.as_str()).await.context("failed to connect to NDN router")?;
    let face_id = face.conn_id().to_string();

    println!("Connected. Sending Interest...");
    match timeout(std::time::Duration::from_millis(timeout_ms), transport.express_interest(interest, Some(&face_id), None)).await {
        Ok(Ok(InterestOutcome::Data(data))) => {
            println!("\nReceived Data:");
            println!("  Name: {}", data.name);
            println!("  Freshness period: {:?} ms", data.freshness_period_ms);
            if data.content.len() <= 100 {
                println!("  Content: {:?}", data.content);
                if let Ok(text) = std::str::from_utf8(&data.content) {
                    println!("  Content (as text): {text}");
                }
            } else {
                println!("  Content: {} bytes", data.content.len());
                println!("  Content (first 100 bytes): {:?}", &data.content[..100]);
            }
        }
        Ok(Ok(InterestOutcome::Nack(nack))) => {
            println!("Received Nack: {:?}", nack.reason);
        }
        Ok(Ok(InterestOutcome::Closed)) => {
            println!("Face closed before a response arrived");
        }
        Ok(Err(err)) => {
            println!("Error retrieving data: {err}");
        }
        Err(_) => {
            println!("Timeout after {timeout_ms}ms");
        }
    }

    transport.close().await?;
    Ok(())
}
