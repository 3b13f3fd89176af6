//! FIB management command implementation for the µDCN CLI

use anyhow::{bail, Result};
use clap::Subcommand;
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use rust_udcn_rib::management::{code, ManagementRequest};
use std::path::Path;

use crate::management_client;

#[derive(Subcommand)]
pub enum FibCommands {
    /// Add a next hop to a FIB entry
    AddNextHop {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Next-hop face ID
        face: u16,

        /// Route cost/metric
        #[clap(short, long, default_value = "10")]
        cost: u64,
    },

    /// Remove a next hop from a FIB entry
    RemoveNextHop {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Next-hop face ID
        face: u16,
    },

    /// List all FIB entries
    List,
}

pub async fn handle_command(socket: &Path, cmd: FibCommands) -> Result<()> {
    let request = match cmd {
        FibCommands::AddNextHop { prefix, face, cost } => ManagementRequest::FibAddNextHop {
            name: Name::from_string(&prefix),
            face_id: FaceId(face),
            cost,
        },
        FibCommands::RemoveNextHop { prefix, face } => ManagementRequest::FibRemoveNextHop {
            name: Name::from_string(&prefix),
            face_id: FaceId(face),
        },
        FibCommands::List => ManagementRequest::FibList,
    };

    let response = management_client::send(socket, request).await?;
    if response.code != code::OK {
        bail!("{}", response.text);
    }
    println!("{}", response.text);
    if let Some(body) = response.body {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}
