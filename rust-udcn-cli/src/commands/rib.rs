//! RIB management command implementation for the µDCN CLI

use anyhow::{bail, Result};
use clap::{Subcommand, ValueEnum};
use rust_udcn_common::ndn::Name;
use rust_udcn_common::types::FaceId;
use rust_udcn_rib::management::{code, ManagementRequest, PrefixAnnouncement};
use rust_udcn_rib::{RouteFlags, RouteOrigin};
use std::path::Path;

use crate::management_client;

#[derive(Clone, Copy, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum Origin {
    App,
    Static,
    Nlsr,
    Client,
    Autoconf,
}

impl From<Origin> for RouteOrigin {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::App => RouteOrigin::App,
            Origin::Static => RouteOrigin::Static,
            Origin::Nlsr => RouteOrigin::Nlsr,
            Origin::Client => RouteOrigin::Client,
            Origin::Autoconf => RouteOrigin::Autoconf,
        }
    }
}

#[derive(Subcommand)]
pub enum RibCommands {
    /// Register a route
    Register {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Next-hop face ID (0 requests self-registration, rejected over this transport)
        face: u16,

        /// Route origin
        #[clap(short, long, value_enum, default_value = "static")]
        origin: Origin,

        /// Route cost/metric
        #[clap(short, long, default_value = "0")]
        cost: u64,

        /// Inherit this route to more specific names
        #[clap(long)]
        child_inherit: bool,

        /// Capture this prefix, shadowing inherited routes below it
        #[clap(long)]
        capture: bool,

        /// Expire the route after this many milliseconds
        #[clap(short, long)]
        expires_ms: Option<u64>,
    },

    /// Unregister a route
    Unregister {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Next-hop face ID
        face: u16,

        /// Route origin
        #[clap(short, long, value_enum, default_value = "static")]
        origin: Origin,
    },

    /// Announce a self-certified prefix (rejected: signature validation is out of scope)
    Announce {
        /// Name prefix (NDN URI format)
        prefix: String,

        /// Expiration period in milliseconds
        #[clap(short, long, default_value = "3600000")]
        expires_ms: u64,
    },

    /// List all RIB entries
    List,
}

pub async fn handle_command(socket: &Path, cmd: RibCommands) -> Result<()> {
    let request = match cmd {
        RibCommands::Register { prefix, face, origin, cost, child_inherit, capture, expires_ms } => {
            ManagementRequest::RibRegister {
                name: Name::from_string(&prefix),
                face_id: FaceId(face),
                origin: origin.into(),
                cost,
                flags: RouteFlags::new(child_inherit, capture),
                expiration_period_ms: expires_ms,
            }
        }
        RibCommands::Unregister { prefix, face, origin } => ManagementRequest::RibUnregister {
            name: Name::from_string(&prefix),
            face_id: FaceId(face),
            origin: origin.into(),
        },
        RibCommands::Announce { prefix, expires_ms } => ManagementRequest::RibAnnounce {
            announcement: PrefixAnnouncement { name: Name::from_string(&prefix), expiration_period_ms: expires_ms },
        },
        RibCommands::List => ManagementRequest::RibList,
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
