//! `udcnd`: the NDN forwarding daemon. Hosts a single-threaded `Forwarder`
//! event loop (spec.md §5 "no internal locking"), a RIB + `FibUpdater`
//! feeding it FIB commands, a QUIC listener accepting remote faces, and a
//! Unix-socket management endpoint — all on one `LocalSet` so the
//! Forwarder's `Rc`-based tables never have to cross a thread boundary.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use rust_udcn_core::strategy::{AccessStrategy, BestRouteStrategy, MulticastStrategy};
use rust_udcn_core::{Forwarder, ForwarderHandle};
use rust_udcn_rib::{FibUpdater, Rib};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

mod config;
mod fib_sink;
mod management;
mod quic_face;

use config::DaemonConfig;
use fib_sink::ForwarderFibSink;
use quic_face::{spawn_accept_poller, spawn_event_forwarder, QuicFaceEvent, QuicFaceHandle};

/// µDCN forwarding daemon
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to a TOML configuration file (see `DaemonConfig`)
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let cfg = DaemonConfig::load(cli.config.as_deref())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building daemon runtime")?;

    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(cfg))
}

fn default_strategy_for(name: &str) -> Box<dyn rust_udcn_core::strategy::Strategy> {
    match name {
        "multicast" => Box::new(MulticastStrategy::default()),
        "access" => Box::new(AccessStrategy::default()),
        _ => Box::new(BestRouteStrategy::default()),
    }
}

async fn run(cfg: DaemonConfig) -> Result<()> {
    let forwarder: ForwarderHandle = Forwarder::new_handle(
        cfg.cs.capacity,
        default_strategy_for(&cfg.tables.strategy_choice.default),
    );
    {
        let mut fwd = forwarder.borrow_mut();
        fwd.cs_mut().enable_admit(cfg.cs.admit);
        fwd.cs_mut().enable_serve(cfg.cs.serve);
        if cfg.tables.strategy_choice.default != "multicast" {
            fwd.register_strategy(Box::new(MulticastStrategy::default()));
        }
        if cfg.tables.strategy_choice.default != "access" {
            fwd.register_strategy(Box::new(AccessStrategy::default()));
        }
        if cfg.tables.strategy_choice.default != "best-route" {
            fwd.register_strategy(Box::new(BestRouteStrategy::default()));
        }
    }

    let rib: management::SharedRib = Rc::new(RefCell::new(Rib::new()));
    let updater: management::SharedUpdater = Rc::new(RefCell::new(FibUpdater::new(ForwarderFibSink::new(forwarder.clone()))));

    let server_options = rust_udcn_quic::ServerOptions {
        listen_addr: cfg.quic.listen_addr.clone(),
        cert_path: cfg.quic.cert_path.clone(),
        key_path: cfg.quic.key_path.clone(),
        ..Default::default()
    };
    let server = Arc::new(rust_udcn_quic::NdnQuicServer::new(server_options).await.context("starting QUIC listener")?);
    server.run().await.context("accepting QUIC connections")?;
    info!("listening for QUIC faces on {}", server.address());

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<QuicFaceEvent>();
    spawn_accept_poller(Arc::clone(&server), events_tx.clone());

    let listener = management::bind(&cfg.management.socket_path)?;
    info!("management socket listening on {}", cfg.management.socket_path.display());
    {
        let forwarder = forwarder.clone();
        let rib = Rc::clone(&rib);
        let updater = Rc::clone(&updater);
        tokio::task::spawn_local(management::run(listener, forwarder, rib, updater));
    }

    let mut tick = tokio::time::interval(std::time::Duration::from_millis(20));
    let mut last_marker = Instant::now();
    let mut last_adjust = Instant::now();

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                handle_quic_event(event, &forwarder, &rib, events_tx.clone());
            }
            _ = tick.tick() => {
                let now = Instant::now();
                forwarder.borrow_mut().run_due_timers(now);

                loop {
                    let mut rib_mut = rib.borrow_mut();
                    let mut updater_mut = updater.borrow_mut();
                    match updater_mut.drain_one(&mut rib_mut) {
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => {
                            warn!("fib update failed: {err}");
                            break;
                        }
                        None => break,
                    }
                }

                let (mark_interval, adjust_interval) = {
                    let fwd = forwarder.borrow();
                    (fwd.dnl().mark_insertion_interval(), fwd.dnl().capacity_adjustment_interval())
                };
                if now.duration_since(last_marker) >= mark_interval {
                    forwarder.borrow_mut().dnl_mut().insert_marker();
                    last_marker = now;
                }
                if now.duration_since(last_adjust) >= adjust_interval {
                    forwarder.borrow_mut().dnl_mut().adjust_capacity();
                    last_adjust = now;
                }
            }
        }
    }
}

fn handle_quic_event(event: QuicFaceEvent, forwarder: &ForwarderHandle, rib: &management::SharedRib, events_tx: mpsc::UnboundedSender<QuicFaceEvent>) {
    match event {
        QuicFaceEvent::Accepted(face) => {
            let face_id = rust_udcn_core::face::Face::id(&*face);
            debug!("registering QUIC face {} ({})", face_id, face.conn_id());
            spawn_event_forwarder(Arc::clone(&face), events_tx);
            forwarder.borrow_mut().faces_mut().add(Rc::new(QuicFaceHandle(face)));
        }
        QuicFaceEvent::Interest { face_id, interest } => {
            Forwarder::incoming_interest(forwarder, face_id, interest);
        }
        QuicFaceEvent::Data { face_id, data } => {
            Forwarder::incoming_data(forwarder, face_id, data);
        }
        QuicFaceEvent::Nack { face_id, nack } => {
            Forwarder::incoming_nack(forwarder, face_id, nack);
        }
        QuicFaceEvent::Closed { face_id } => {
            debug!("face {} closed", face_id);
            forwarder.borrow_mut().faces_mut().remove(face_id);
            forwarder.borrow_mut().fib_mut().remove_next_hop_from_all_entries(face_id);
            rib.borrow_mut().begin_remove_face(face_id);
        }
    }
}
