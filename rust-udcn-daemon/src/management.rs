//! Unix-domain-socket management listener (spec.md §6.2): one JSON
//! `ManagementRequest` per line in, one JSON `ControlResponse` per line out.
//! The real system speaks signed Interests over `/localhost/nfd`; that wire
//! encoding and the command-authentication layer are explicit Non-goals
//! (see `rust_udcn_rib::management`'s module doc), so this listener is the
//! whole command-authentication boundary this build ships.

use anyhow::{Context, Result};
use log::{info, warn};
use rust_udcn_common::types::FaceId;
use rust_udcn_core::ForwarderHandle;
use rust_udcn_rib::management::{check_name_depth, code, resolve_self_registration, ControlResponse, ManagementRequest};
use rust_udcn_rib::{FibUpdater, Rib, RibUpdate};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::fib_sink::ForwarderFibSink;

pub type SharedRib = Rc<RefCell<Rib>>;
pub type SharedUpdater = Rc<RefCell<FibUpdater<ForwarderFibSink>>>;

/// Binds the management socket, removing a stale file left by a previous
/// run (a fresh bind on a live socket fails with `AddrInUse`, so this is
/// safe: a listener is still holding the old path only if it's still
/// running, in which case the bind below fails anyway).
pub fn bind(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("removing stale socket {}", path.display()))?;
    }
    UnixListener::bind(path).with_context(|| format!("binding management socket {}", path.display()))
}

/// Handles one connection to completion: requests are processed one at a
/// time, in order, matching spec.md §6.2's synchronous command model.
pub async fn handle_connection(stream: UnixStream, forwarder: ForwarderHandle, rib: SharedRib, updater: SharedUpdater) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(err) => {
                warn!("management connection read error: {err}");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ManagementRequest>(&line) {
            Ok(request) => dispatch(request, &forwarder, &rib, &updater),
            Err(err) => ControlResponse::error(code::MALFORMED, format!("malformed request: {err}")),
        };

        let Ok(mut encoded) = serde_json::to_string(&response) else {
            warn!("failed to encode management response");
            return;
        };
        encoded.push('\n');
        if writer.write_all(encoded.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Drains every batch the `FibUpdater` can currently process, applying RIB
/// mutations synchronously so a single request's response reflects its own
/// effect (spec.md §6.2 commands are synchronous from the client's view).
fn drain_fib_updates(rib: &SharedRib, updater: &SharedUpdater) -> Result<(), String> {
    loop {
        let mut rib_mut = rib.borrow_mut();
        let mut updater_mut = updater.borrow_mut();
        match updater_mut.drain_one(&mut rib_mut) {
            None => return Ok(()),
            Some(Ok(_events)) => continue,
            Some(Err(err)) => return Err(err.to_string()),
        }
    }
}

fn dispatch(request: ManagementRequest, forwarder: &ForwarderHandle, rib: &SharedRib, updater: &SharedUpdater) -> ControlResponse {
    match request {
        ManagementRequest::FibAddNextHop { name, face_id, cost } => {
            if let Err(resp) = check_name_depth(&name) {
                return resp;
            }
            forwarder.borrow_mut().fib_mut().add_next_hop(&name, face_id, cost);
            ControlResponse::ok(format!("added next hop {face_id} to {name}"))
        }
        ManagementRequest::FibRemoveNextHop { name, face_id } => {
            forwarder.borrow_mut().fib_mut().remove_next_hop(&name, face_id);
            ControlResponse::ok(format!("removed next hop {face_id} from {name}"))
        }
        ManagementRequest::CsConfig { capacity, admit, serve } => {
            let mut fwd = forwarder.borrow_mut();
            if let Some(capacity) = capacity {
                fwd.cs_mut().set_limit(capacity);
            }
            if let Some(admit) = admit {
                fwd.cs_mut().enable_admit(admit);
            }
            if let Some(serve) = serve {
                fwd.cs_mut().enable_serve(serve);
            }
            ControlResponse::ok("content store reconfigured")
        }
        ManagementRequest::CsErase { name, count } => {
            let (erased, more_remain) = forwarder.borrow_mut().cs_mut().erase(&name, count);
            ControlResponse::ok_with_body(
                format!("erased {erased} entries"),
                serde_json::json!({ "erased": erased, "more_remain": more_remain }),
            )
        }
        ManagementRequest::StrategyChoiceSet { name, strategy } => {
            forwarder
                .borrow_mut()
                .strategy_choice_mut()
                .insert(&name, rust_udcn_core::strategy_choice::StrategyId::new(strategy));
            ControlResponse::ok(format!("strategy set for {name}"))
        }
        ManagementRequest::StrategyChoiceUnset { name } => {
            forwarder.borrow_mut().strategy_choice_mut().erase(&name);
            ControlResponse::ok(format!("strategy unset for {name}"))
        }
        ManagementRequest::RibRegister { name, face_id, origin, cost, flags, expiration_period_ms } => {
            if let Err(resp) = check_name_depth(&name) {
                return resp;
            }
            // `0` (self-registration) can't be resolved without the face the
            // command arrived on; this in-process listener has no concept of
            // "the face the command Interest arrived on" (there is no
            // command Interest), so self-registration is rejected here
            // rather than silently resolved to the wrong face.
            let face_id = resolve_self_registration(face_id, FaceId::INVALID);
            if !face_id.is_valid() {
                return ControlResponse::error(code::MALFORMED, "self-registration (face_id 0) requires a face context");
            }
            let mut route = rust_udcn_rib::Route::new(face_id, origin, cost, flags);
            if let Some(ms) = expiration_period_ms {
                route = route.with_expires(std::time::Instant::now() + std::time::Duration::from_millis(ms));
            }
            rib.borrow_mut().begin_apply_update(RibUpdate::register(name.clone(), route));
            match drain_fib_updates(rib, updater) {
                Ok(()) => ControlResponse::ok(format!("registered route to {name}")),
                Err(err) => ControlResponse::error(code::MALFORMED, err),
            }
        }
        ManagementRequest::RibUnregister { name, face_id, origin } => {
            let route = rust_udcn_rib::Route::new(face_id, origin, 0, rust_udcn_rib::RouteFlags::default());
            rib.borrow_mut().begin_apply_update(RibUpdate::unregister(name.clone(), route));
            match drain_fib_updates(rib, updater) {
                Ok(()) => ControlResponse::ok(format!("unregistered route from {name}")),
                Err(err) => ControlResponse::error(code::MALFORMED, err),
            }
        }
        ManagementRequest::RibAnnounce { announcement } => match announcement.validate() {
            Ok((name, _expiration_ms)) => {
                ControlResponse::error(code::UNAUTHORIZED, format!("announcement validation for {name} requires the out-of-scope signature layer"))
            }
            Err(err) => ControlResponse::error(code::MALFORMED, err),
        },
        ManagementRequest::StatusGeneral => {
            let fwd = forwarder.borrow();
            let counters = fwd.counters().snapshot();
            ControlResponse::ok_with_body(
                "status",
                serde_json::json!({
                    "n_in_interests": counters.n_in_interests,
                    "n_out_interests": counters.n_out_interests,
                    "n_in_data": counters.n_in_data,
                    "n_out_data": counters.n_out_data,
                    "n_in_nacks": counters.n_in_nacks,
                    "n_out_nacks": counters.n_out_nacks,
                    "n_satisfied_interests": counters.n_satisfied_interests,
                    "n_unsatisfied_interests": counters.n_unsatisfied_interests,
                    "n_faces": fwd.faces().len(),
                    "n_fib_entries": fwd.fib().len(),
                    "n_cs_entries": fwd.cs().size(),
                }),
            )
        }
        ManagementRequest::FibList => {
            let fwd = forwarder.borrow();
            let entries: Vec<_> = fwd
                .fib()
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "prefix": entry.prefix.to_string(),
                        "next_hops": entry.next_hops.iter().map(|h| serde_json::json!({"face": h.face.0, "cost": h.cost})).collect::<Vec<_>>(),
                    })
                })
                .collect();
            ControlResponse::ok_with_body(format!("{} fib entries", entries.len()), serde_json::json!(entries))
        }
        ManagementRequest::CsInfo => {
            let fwd = forwarder.borrow();
            ControlResponse::ok_with_body(
                "cs info",
                serde_json::json!({ "capacity": fwd.cs().limit(), "size": fwd.cs().size() }),
            )
        }
        ManagementRequest::StrategyChoiceList => {
            let fwd = forwarder.borrow();
            let entries: Vec<_> = fwd
                .strategy_choice()
                .entries()
                .into_iter()
                .map(|(name, strategy)| serde_json::json!({ "prefix": name.to_string(), "strategy": strategy.0 }))
                .collect();
            ControlResponse::ok_with_body(format!("{} strategy choice entries", entries.len()), serde_json::json!(entries))
        }
        ManagementRequest::RibList => {
            let rib = rib.borrow();
            let entries: Vec<_> = rib
                .iter()
                .map(|(name, entry)| {
                    serde_json::json!({
                        "prefix": name.to_string(),
                        "routes": entry.routes.iter().map(|r| serde_json::json!({
                            "face_id": r.face_id.0,
                            "origin": format!("{:?}", r.origin),
                            "cost": r.cost,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            ControlResponse::ok_with_body(format!("{} rib entries", entries.len()), serde_json::json!(entries))
        }
        ManagementRequest::FacesList => {
            let fwd = forwarder.borrow();
            let entries: Vec<_> = fwd
                .faces()
                .iter()
                .map(|face| {
                    serde_json::json!({
                        "face_id": rust_udcn_core::face::Face::id(face.as_ref()).0,
                        "remote_uri": face.remote_uri(),
                        "state": format!("{:?}", face.state()),
                    })
                })
                .collect();
            ControlResponse::ok_with_body(format!("{} faces", entries.len()), serde_json::json!(entries))
        }
    }
}

pub async fn run(listener: UnixListener, forwarder: ForwarderHandle, rib: SharedRib, updater: SharedUpdater) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                info!("management connection accepted");
                let forwarder = forwarder.clone();
                let rib = Rc::clone(&rib);
                let updater = Rc::clone(&updater);
                tokio::task::spawn_local(async move {
                    handle_connection(stream, forwarder, rib, updater).await;
                });
            }
            Err(err) => {
                warn!("management accept error: {err}");
            }
        }
    }
}
