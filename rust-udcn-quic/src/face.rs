//! NDN face implementation over QUIC transport.
//!
//! This module provides an implementation of NDN faces that operate over QUIC connections,
//! and adapts that implementation to `rust_udcn_core::face::Face` so a `Forwarder` can treat
//! a QUIC connection like any other face.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use log::{debug, warn};
use quinn::{Connection, RecvStream, SendStream};
use rust_udcn_common::{
    error::Error as CommonError,
    metrics::UdcnMetrics,
    ndn::{Data, Interest, Nack},
};
use rust_udcn_core::face::{FaceCounters, FaceScope, FaceState, LinkType, Persistency};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    time::timeout,
};

use crate::{
    fragmentation::{assemble_fragments, fragment_packet},
    packet::NdnPacket,
    DEFAULT_FRAGMENT_SIZE, DEFAULT_INTEREST_TIMEOUT_MS,
};

/// Outcome of an outstanding `express_interest` call, reported over the
/// face's internal pending-interest channel.
#[derive(Debug, Clone)]
pub enum InterestOutcome {
    Data(Data),
    Nack(Nack),
    Closed,
}

/// Events emitted by a Face
#[derive(Debug, Clone)]
pub enum FaceEvent {
    /// A new Interest was received
    InterestReceived(Interest),

    /// A new Data packet was received (and had no matching pending Interest)
    DataReceived(Data),

    /// A new Nack was received (and had no matching pending Interest)
    NackReceived(Nack),

    /// The face was closed
    Closed,

    /// An error occurred on the face
    Error(String),
}

fn state_to_u8(state: FaceState) -> u8 {
    match state {
        FaceState::Up => 0,
        FaceState::Down => 1,
        FaceState::Closing => 2,
        FaceState::Failed => 3,
        FaceState::Closed => 4,
    }
}

fn u8_to_state(value: u8) -> FaceState {
    match value {
        0 => FaceState::Up,
        1 => FaceState::Down,
        2 => FaceState::Closing,
        3 => FaceState::Failed,
        _ => FaceState::Closed,
    }
}

/// An NDN face over QUIC transport
#[derive(Debug)]
pub struct Face {
    /// Numeric face identifier, assigned by the caller (the daemon's
    /// `FaceTable`) when the face is registered.
    face_id: rust_udcn_common::types::FaceId,

    /// Connection-level identifier (`"quic:<addr>"`), used by `lib.rs`/
    /// `transport.rs` to key faces in their connection maps.
    conn_id: String,

    /// QUIC connection
    connection: Connection,

    /// Current face lifecycle state, readable synchronously per
    /// `rust_udcn_core::face::Face::state`.
    state: AtomicU8,

    /// Pending Interests waiting for Data/Nack, keyed by name.
    pending_interests: Arc<Mutex<HashMap<String, oneshot::Sender<InterestOutcome>>>>,

    /// Receiver for face events
    event_receiver: Arc<Mutex<Option<mpsc::Receiver<FaceEvent>>>>,

    /// Sender for face events
    event_sender: Arc<Mutex<mpsc::Sender<FaceEvent>>>,

    /// Per-face packet counters, exposed through the core `Face` trait.
    counters: FaceCounters,

    /// Metrics for this face
    metrics: Arc<UdcnMetrics>,
}

impl Face {
    /// Create a new face from a QUIC connection. `face_id` is the numeric
    /// id the caller's `FaceTable` allocated for it.
    pub fn new_from_connection(
        face_id: rust_udcn_common::types::FaceId,
        conn_id: String,
        connection: Connection,
        metrics: Arc<UdcnMetrics>,
    ) -> Self {
        let (event_sender, event_receiver) = mpsc::channel(100);

        let face = Self {
            face_id,
            conn_id,
            connection,
            state: AtomicU8::new(state_to_u8(FaceState::Up)),
            pending_interests: Arc::new(Mutex::new(HashMap::new())),
            event_receiver: Arc::new(Mutex::new(Some(event_receiver))),
            event_sender: Arc::new(Mutex::new(event_sender)),
            counters: FaceCounters::default(),
            metrics,
        };

        // Start processing incoming streams
        face.process_incoming_streams();

        face
    }

    /// Get the connection-level id (`"quic:<addr>"`), used by the
    /// transport layer's face maps. Distinct from the core `Face` trait's
    /// `id()`, which returns the numeric `FaceId` assigned by the
    /// forwarder's face table.
    pub fn conn_id(&self) -> &str {
        &self.conn_id
    }

    fn is_closed(&self) -> bool {
        u8_to_state(self.state.load(Ordering::Acquire)) == FaceState::Closed
    }

    /// Send an Interest and wait for Data or a Nack
    pub async fn express_interest(
        &self,
        interest: Interest,
        timeout_ms: u64,
    ) -> Result<InterestOutcome> {
        if self.is_closed() {
            return Err(anyhow!("Face is closed"));
        }

        let name = interest.name.to_string();
        debug!("[Face {}] Express Interest: {}", self.conn_id, name);

        let (sender, receiver) = oneshot::channel();
        self.pending_interests.lock().await.insert(name.clone(), sender);

        let start = Instant::now();
        self.send_packet(NdnPacket::Interest(interest.clone())).await?;
        self.metrics.interests_sent.increment();
        self.counters.n_out_interests.fetch_add(1, Ordering::Relaxed);

        let result = match timeout(Duration::from_millis(timeout_ms), receiver).await {
            Ok(Ok(outcome @ InterestOutcome::Data(_))) => {
                let rtt = start.elapsed().as_micros() as u64;
                debug!("[Face {}] Received Data for {}, RTT: {}us", self.conn_id, name, rtt);
                self.metrics.interest_processing_time.histogram().observe(rtt);
                self.metrics.interests_satisfied.increment();
                Ok(outcome)
            }
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => {
                debug!("[Face {}] Channel closed for Interest {}", self.conn_id, name);
                Err(anyhow!("Channel closed"))
            }
            Err(_) => {
                debug!("[Face {}] Interest timed out: {}", self.conn_id, name);
                self.pending_interests.lock().await.remove(&name);
                self.metrics.interests_timed_out.increment();
                Err(anyhow!("Interest timed out"))
            }
        };

        if result.is_err() {
            self.pending_interests.lock().await.remove(&name);
        }

        result
    }

    /// Send a Data packet
    pub async fn send_data(&self, data: &Data) -> Result<()> {
        debug!("[Face {}] Send Data: {}", self.conn_id, data.name);
        self.send_packet(NdnPacket::Data(data.clone())).await?;
        self.metrics.data_sent.increment();
        self.counters.n_out_data.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Send a Nack
    pub async fn send_nack(&self, nack: &Nack) -> Result<()> {
        debug!("[Face {}] Send Nack: {}", self.conn_id, nack.interest.name);
        self.send_packet(NdnPacket::Nack(nack.clone())).await?;
        self.counters.n_out_nacks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Get the next event from this face
    pub async fn next_event(&self) -> Option<FaceEvent> {
        let mut receiver_guard = self.event_receiver.lock().await;
        let receiver = receiver_guard.as_mut()?;
        receiver.recv().await
    }

    /// Close the face
    pub async fn close(&self) {
        let previous = self.state.swap(state_to_u8(FaceState::Closed), Ordering::AcqRel);
        if u8_to_state(previous) == FaceState::Closed {
            return;
        }

        debug!("[Face {}] Closing", self.conn_id);
        self.connection.close(0u32.into(), b"Face closed");

        let mut pending = self.pending_interests.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(InterestOutcome::Closed);
        }

        let _ = self.event_sender.lock().await.send(FaceEvent::Closed).await;
    }

    /// Process incoming streams from the QUIC connection
    fn process_incoming_streams(&self) {
        let connection = self.connection.clone();
        let pending_interests = Arc::clone(&self.pending_interests);
        let event_sender = Arc::clone(&self.event_sender);
        let metrics = Arc::clone(&self.metrics);
        let conn_id = self.conn_id.clone();

        tokio::spawn(async move {
            debug!("[Face {}] Starting to process incoming streams", conn_id);

            while let Ok(Some((send, recv))) = connection.accept_bi().await {
                let stream_id = send.id();
                debug!("[Face {}] Accepted bi-directional stream {}", conn_id, stream_id);

                let stream_pending_interests = Arc::clone(&pending_interests);
                let stream_event_sender = Arc::clone(&event_sender);
                let stream_metrics = Arc::clone(&metrics);
                let stream_conn_id = conn_id.clone();

                tokio::spawn(async move {
                    if let Err(e) = process_stream(
                        stream_conn_id.clone(),
                        stream_id,
                        send,
                        recv,
                        stream_pending_interests,
                        stream_event_sender,
                        stream_metrics,
                    )
                    .await
                    {
                        warn!("[Face {}] Error processing stream {}: {}", stream_conn_id, stream_id, e);
                    }
                });
            }

            debug!("[Face {}] Stopped processing incoming streams", conn_id);

            let mut pending = pending_interests.lock().await;
            for (_, sender) in pending.drain() {
                let _ = sender.send(InterestOutcome::Closed);
            }
            let _ = event_sender.lock().await.send(FaceEvent::Closed).await;
        });
    }

    /// Send a packet over the face
    async fn send_packet(&self, packet: NdnPacket) -> Result<()> {
        if self.is_closed() {
            return Err(anyhow!("Face is closed"));
        }

        let bytes = packet.to_bytes()?;
        self.metrics.bytes_sent.add(bytes.len() as u64);

        let (mut send, _recv) = self.connection.open_bi().await?;

        if bytes.len() > DEFAULT_FRAGMENT_SIZE {
            debug!(
                "[Face {}] Fragmenting packet of size {} into chunks of {}",
                self.conn_id,
                bytes.len(),
                DEFAULT_FRAGMENT_SIZE
            );
            let fragments = fragment_packet(&bytes, DEFAULT_FRAGMENT_SIZE);
            for fragment in fragments {
                send.write_all(&fragment).await?;
            }
        } else {
            send.write_all(&bytes).await?;
        }

        send.finish().await?;
        Ok(())
    }
}

/// Adapts the connection-level [`Face`] to the forwarder-facing
/// [`rust_udcn_core::face::Face`] trait. `scope`/`link_type`/`persistency`
/// are fixed for a QUIC face: remote, point-to-point, on-demand, matching
/// spec.md's treatment of dynamically dialed faces.
#[async_trait::async_trait(?Send)]
impl rust_udcn_core::face::Face for Face {
    fn id(&self) -> rust_udcn_common::types::FaceId {
        self.face_id
    }

    fn scope(&self) -> FaceScope {
        FaceScope::NonLocal
    }

    fn link_type(&self) -> LinkType {
        LinkType::PointToPoint
    }

    fn persistency(&self) -> Persistency {
        Persistency::OnDemand
    }

    fn state(&self) -> FaceState {
        u8_to_state(self.state.load(Ordering::Acquire))
    }

    fn remote_uri(&self) -> String {
        self.conn_id.clone()
    }

    fn local_uri(&self) -> String {
        "quic://0.0.0.0".to_string()
    }

    fn counters(&self) -> &FaceCounters {
        &self.counters
    }

    async fn send_interest(&self, interest: &Interest) -> std::result::Result<(), CommonError> {
        self.send_packet(NdnPacket::Interest(interest.clone()))
            .await
            .map_err(|e| CommonError::QuicTransport(e.to_string()))?;
        self.counters.n_out_interests.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn send_data(&self, data: &Data) -> std::result::Result<(), CommonError> {
        Face::send_data(self, data).await.map_err(|e| CommonError::QuicTransport(e.to_string()))
    }

    async fn send_nack(&self, nack: &Nack) -> std::result::Result<(), CommonError> {
        Face::send_nack(self, nack).await.map_err(|e| CommonError::QuicTransport(e.to_string()))
    }

    async fn close(&self) -> std::result::Result<(), CommonError> {
        Face::close(self).await;
        Ok(())
    }
}

/// Process a QUIC stream
async fn process_stream(
    conn_id: String,
    stream_id: u64,
    _send: SendStream,
    mut recv: RecvStream,
    pending_interests: Arc<Mutex<HashMap<String, oneshot::Sender<InterestOutcome>>>>,
    event_sender: Arc<Mutex<mpsc::Sender<FaceEvent>>>,
    metrics: Arc<UdcnMetrics>,
) -> Result<()> {
    let mut fragments: VecDeque<Bytes> = VecDeque::new();

    while let Some(chunk) = recv.read_chunk(1024, false).await? {
        metrics.bytes_received.add(chunk.bytes.len() as u64);
        fragments.push_back(chunk.bytes);
    }

    let packet_bytes = assemble_fragments(fragments)?;
    let packet = NdnPacket::from_bytes(&packet_bytes)?;

    match packet {
        NdnPacket::Interest(interest) => {
            debug!("[Face {}] Received Interest on stream {}: {}", conn_id, stream_id, interest.name);
            metrics.interests_received.increment();
            let event = FaceEvent::InterestReceived(interest);
            event_sender.lock().await.send(event).await?;
        }
        NdnPacket::Data(data) => {
            let name = data.name.to_string();
            debug!("[Face {}] Received Data on stream {}: {}", conn_id, stream_id, name);
            metrics.data_received.increment();

            let mut pending = pending_interests.lock().await;
            if let Some(sender) = pending.remove(&name) {
                if sender.send(InterestOutcome::Data(data)).is_err() {
                    debug!("[Face {}] Failed to deliver Data to pending Interest", conn_id);
                }
            } else {
                drop(pending);
                let event = FaceEvent::DataReceived(data);
                event_sender.lock().await.send(event).await?;
            }
        }
        NdnPacket::Nack(nack) => {
            let name = nack.interest.name.to_string();
            debug!("[Face {}] Received Nack on stream {}: {}", conn_id, stream_id, name);

            let mut pending = pending_interests.lock().await;
            if let Some(sender) = pending.remove(&name) {
                if sender.send(InterestOutcome::Nack(nack)).is_err() {
                    debug!("[Face {}] Failed to deliver Nack to pending Interest", conn_id);
                }
            } else {
                drop(pending);
                let event = FaceEvent::NackReceived(nack);
                event_sender.lock().await.send(event).await?;
            }
        }
    }

    Ok(())
}
