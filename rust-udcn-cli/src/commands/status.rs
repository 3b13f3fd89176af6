//! General status, content-store, strategy-choice, and face listing
//! commands for the µDCN CLI — thin wrappers over the management socket.

use anyhow::{bail, Result};
use clap::Subcommand;
use rust_udcn_common::ndn::Name;
use rust_udcn_rib::management::{code, ManagementRequest};
use std::path::Path;

use crate::management_client;

#[derive(Subcommand)]
pub enum CsCommands {
    /// Reconfigure the content store
    Config {
        /// New capacity (entry count)
        #[clap(short, long)]
        capacity: Option<usize>,

        /// Enable/disable admission of new entries
        #[clap(long)]
        admit: Option<bool>,

        /// Enable/disable serving from the content store
        #[clap(long)]
        serve: Option<bool>,
    },

    /// Erase entries matching a name prefix
    Erase {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Maximum number of entries to erase
        #[clap(short, long)]
        count: Option<usize>,
    },

    /// Show content store capacity and occupancy
    Info,
}

#[derive(Subcommand)]
pub enum StrategyChoiceCommands {
    /// Set the forwarding strategy for a prefix
    Set {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Strategy name (e.g. "best-route", "multicast", "access")
        strategy: String,
    },

    /// Unset a prefix's explicit strategy, falling back to its ancestor's
    Unset {
        /// Name prefix (NDN URI format)
        prefix: String,
    },

    /// List all explicit strategy choice entries
    List,
}

async fn run(socket: &Path, request: ManagementRequest) -> Result<()> {
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

pub async fn show_status(socket: &Path) -> Result<()> {
    run(socket, ManagementRequest::StatusGeneral).await
}

pub async fn show_faces(socket: &Path) -> Result<()> {
    run(socket, ManagementRequest::FacesList).await
}

pub async fn handle_cs_command(socket: &Path, cmd: CsCommands) -> Result<()> {
    let request = match cmd {
        CsCommands::Config { capacity, admit, serve } => ManagementRequest::CsConfig { capacity, admit, serve },
        CsCommands::Erase { prefix, count } => ManagementRequest::CsErase { name: Name::from_string(&prefix), count },
        CsCommands::Info => ManagementRequest::CsInfo,
    };
    run(socket, request).await
}

pub async fn handle_strategy_choice_command(socket: &Path, cmd: StrategyChoiceCommands) -> Result<()> {
    let request = match cmd {
        StrategyChoiceCommands::Set { prefix, strategy } => {
            ManagementRequest::StrategyChoiceSet { name: Name::from_string(&prefix), strategy }
        }
        StrategyChoiceCommands::Unset { prefix } => {
            ManagementRequest::StrategyChoiceUnset { name: Name::from_string(&prefix) }
        }
        StrategyChoiceCommands::List => ManagementRequest::StrategyChoiceList,
    };
    run(socket, request).await
}
