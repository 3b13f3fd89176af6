//! Wires `rust-udcn-quic` connections into the Forwarder's `FaceTable`.
//!
//! `rust_udcn_quic::Face` already implements `rust_udcn_core::face::Face`
//! directly, but it lives behind an `Arc` inside `NdnQuicServer` (its
//! internals use `tokio::sync::Mutex`/`mpsc`, built for sharing across
//! ordinary `Send` tasks). The `FaceTable` wants `Rc<dyn Face>` since the
//! Forwarder's event loop is single-threaded and non-`Send`. `QuicFaceHandle`
//! bridges the two: an `Rc`-friendly newtype around the `Arc` that delegates
//! every trait method explicitly.

use async_trait::async_trait;
use rust_udcn_common::error::Error;
use rust_udcn_common::ndn::{Data, Interest, Nack};
use rust_udcn_common::types::FaceId;
use rust_udcn_core::face::{Face, FaceCounters, FaceScope, FaceState, LinkType, Persistency};
use std::sync::Arc;

pub struct QuicFaceHandle(pub Arc<rust_udcn_quic::Face>);

#[async_trait(?Send)]
impl Face for QuicFaceHandle {
    fn id(&self) -> FaceId {
        Face::id(&*self.0)
    }

    fn scope(&self) -> FaceScope {
        Face::scope(&*self.0)
    }

    fn link_type(&self) -> LinkType {
        Face::link_type(&*self.0)
    }

    fn persistency(&self) -> Persistency {
        Face::persistency(&*self.0)
    }

    fn state(&self) -> FaceState {
        Face::state(&*self.0)
    }

    fn remote_uri(&self) -> String {
        Face::remote_uri(&*self.0)
    }

    fn local_uri(&self) -> String {
        Face::local_uri(&*self.0)
    }

    fn counters(&self) -> &FaceCounters {
        Face::counters(&*self.0)
    }

    async fn send_interest(&self, interest: &Interest) -> Result<(), Error> {
        Face::send_interest(&*self.0, interest).await
    }

    async fn send_data(&self, data: &Data) -> Result<(), Error> {
        Face::send_data(&*self.0, data).await
    }

    async fn send_nack(&self, nack: &Nack) -> Result<(), Error> {
        Face::send_nack(&*self.0, nack).await
    }

    async fn close(&self) -> Result<(), Error> {
        Face::close(&*self.0).await
    }
}

/// Events produced by QUIC connection/stream activity, delivered to the
/// daemon's single-threaded main loop over an `mpsc` channel so the
/// Forwarder is only ever touched from that one task.
pub enum QuicFaceEvent {
    Accepted(Arc<rust_udcn_quic::Face>),
    Interest { face_id: FaceId, interest: Interest },
    Data { face_id: FaceId, data: Data },
    Nack { face_id: FaceId, nack: Nack },
    Closed { face_id: FaceId },
}

/// Spawns a task that forwards one face's events onto `tx`, tagging them
/// with its numeric `FaceId`. One of these runs per accepted connection.
pub fn spawn_event_forwarder(face: Arc<rust_udcn_quic::Face>, tx: tokio::sync::mpsc::UnboundedSender<QuicFaceEvent>) {
    tokio::spawn(async move {
        let face_id = Face::id(&*face);
        while let Some(event) = face.next_event().await {
            let forwarded = match event {
                rust_udcn_quic::FaceEvent::InterestReceived(interest) => {
                    QuicFaceEvent::Interest { face_id, interest }
                }
                rust_udcn_quic::FaceEvent::DataReceived(data) => QuicFaceEvent::Data { face_id, data },
                rust_udcn_quic::FaceEvent::NackReceived(nack) => QuicFaceEvent::Nack { face_id, nack },
                rust_udcn_quic::FaceEvent::Closed => {
                    let _ = tx.send(QuicFaceEvent::Closed { face_id });
                    break;
                }
                rust_udcn_quic::FaceEvent::Error(_) => continue,
            };
            if tx.send(forwarded).is_err() {
                break;
            }
        }
    });
}

/// Polls the server's connected-face snapshot for faces not yet seen and
/// reports each one once via `tx`. `rust-udcn-quic` has no accept
/// notification channel of its own, so the daemon diffs snapshots instead.
pub fn spawn_accept_poller(server: Arc<rust_udcn_quic::NdnQuicServer>, tx: tokio::sync::mpsc::UnboundedSender<QuicFaceEvent>) {
    tokio::spawn(async move {
        let mut seen = std::collections::HashSet::new();
        loop {
            for face in server.get_faces().await {
                if seen.insert(face.conn_id().to_string()) {
                    if tx.send(QuicFaceEvent::Accepted(Arc::clone(&face))).is_err() {
                        return;
                    }
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    });
}
