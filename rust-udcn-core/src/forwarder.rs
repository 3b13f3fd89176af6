//! The Forwarder: owns every table and drives the twelve named pipelines
//! that make up the forwarding logic (spec.md §4.8). Runs entirely on one
//! thread — tables are `Rc`/plain fields, not `Arc`/`Mutex` (spec.md §5).

use crate::cs::ContentStore;
use crate::dead_nonce_list::DeadNonceList;
use crate::face::{Face, FaceScope, LinkType};
use crate::face_table::FaceTable;
use crate::fib::{Fib, FibEntry};
use crate::measurements::Measurements;
use crate::name_tree::NameTree;
use crate::pit::{Pit, PitKey};
use crate::scheduler::Scheduler;
use crate::scope;
use crate::strategy::{Strategy, StrategyActions};
use crate::strategy_choice::{StrategyChoice, StrategyId};
use crate::counters::ForwarderCounters;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_udcn_common::ndn::{Data, Interest, Nack, NackReason};
use rust_udcn_common::types::FaceId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

const STRAGGLER_TIMER: Duration = Duration::from_millis(100);

pub struct Forwarder {
    name_tree: crate::name_tree::NameTreeHandle,
    fib: Fib,
    cs: ContentStore,
    pit: Pit,
    dnl: DeadNonceList,
    strategy_choice: StrategyChoice,
    measurements: Measurements,
    face_table: FaceTable,
    scheduler: Scheduler,
    counters: ForwarderCounters,
    strategies: HashMap<StrategyId, Box<dyn Strategy>>,
    rng: StdRng,
    /// Producer region names for forwarding-hint resolution (spec.md
    /// §4.8.1). Empty means "no region configured" — every hint is treated
    /// as foreign, matching the third (iterate-delegations) branch.
    network_region: Vec<rust_udcn_common::ndn::Name>,
    self_weak: Weak<RefCell<Forwarder>>,
}

pub type ForwarderHandle = Rc<RefCell<Forwarder>>;

impl Forwarder {
    /// Builds a Forwarder with `default_strategy` installed at `/`
    /// (spec.md §4.5 "A default strategy must be registered at
    /// construction and installed at name `/`").
    pub fn new_handle(cs_capacity: usize, default_strategy: Box<dyn Strategy>) -> ForwarderHandle {
        let name_tree = NameTree::new_handle();
        let default_id = StrategyId::new(default_strategy.name().to_string());

        let mut strategies: HashMap<StrategyId, Box<dyn Strategy>> = HashMap::new();
        strategies.insert(default_id.clone(), default_strategy);

        let mut strategy_choice = StrategyChoice::new(Rc::clone(&name_tree), default_id.clone());
        strategy_choice.insert(&rust_udcn_common::ndn::Name::new(), default_id);

        let forwarder = Forwarder {
            fib: Fib::new(Rc::clone(&name_tree)),
            cs: ContentStore::new(cs_capacity),
            pit: Pit::new(),
            dnl: DeadNonceList::new(),
            strategy_choice,
            measurements: Measurements::new(Rc::clone(&name_tree)),
            face_table: FaceTable::new(),
            scheduler: Scheduler::new(),
            counters: ForwarderCounters::new(),
            strategies,
            rng: StdRng::from_entropy(),
            network_region: Vec::new(),
            name_tree,
            self_weak: Weak::new(),
        };

        let handle = Rc::new(RefCell::new(forwarder));
        handle.borrow_mut().self_weak = Rc::downgrade(&handle);
        handle
    }

    pub fn register_strategy(&mut self, strategy: Box<dyn Strategy>) {
        let id = StrategyId::new(strategy.name().to_string());
        self.strategies.insert(id, strategy);
    }

    pub fn faces(&self) -> &FaceTable {
        &self.face_table
    }

    pub fn faces_mut(&mut self) -> &mut FaceTable {
        &mut self.face_table
    }

    pub fn fib(&self) -> &Fib {
        &self.fib
    }

    pub fn fib_mut(&mut self) -> &mut Fib {
        &mut self.fib
    }

    pub fn cs(&self) -> &ContentStore {
        &self.cs
    }

    pub fn cs_mut(&mut self) -> &mut ContentStore {
        &mut self.cs
    }

    pub fn strategy_choice(&self) -> &StrategyChoice {
        &self.strategy_choice
    }

    pub fn strategy_choice_mut(&mut self) -> &mut StrategyChoice {
        &mut self.strategy_choice
    }

    pub fn dnl(&self) -> &DeadNonceList {
        &self.dnl
    }

    pub fn dnl_mut(&mut self) -> &mut DeadNonceList {
        &mut self.dnl
    }

    pub fn measurements_mut(&mut self) -> &mut Measurements {
        &mut self.measurements
    }

    pub fn counters(&self) -> &ForwarderCounters {
        &self.counters
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn run_due_timers(&mut self, now: Instant) {
        self.scheduler.run_due(now);
    }

    fn face_scope(&self, id: FaceId) -> FaceScope {
        self.face_table.get(id).map(|f| f.scope()).unwrap_or(FaceScope::NonLocal)
    }

    fn face_link_type(&self, id: FaceId) -> LinkType {
        self.face_table
            .get(id)
            .map(|f| f.link_type())
            .unwrap_or(LinkType::PointToPoint)
    }

    /* ------------------------------------------------------------ *
     * Pipeline 1: Incoming Interest
     * ------------------------------------------------------------ */

    pub fn incoming_interest(handle: &ForwarderHandle, in_face: FaceId, mut interest: Interest) {
        {
            let mut fwd = handle.borrow_mut();
            fwd.counters.n_in_interests.increment();
            interest.incoming_face_id = Some(in_face.0);

            if fwd.face_scope(in_face) != FaceScope::Local && scope::is_localhost(&interest.name) {
                debug!("dropping /localhost interest {} from non-local face {:?}", interest.name, in_face);
                return; // step 2: drop
            }

            if fwd.dnl.has(&interest.name, interest.nonce) {
                trace!("interest {} nonce {} found in dead nonce list", interest.name, interest.nonce);
                drop(fwd);
                Self::interest_loop(handle, in_face, interest);
                return;
            }
        }

        let (pit_key, is_new) = {
            let mut fwd = handle.borrow_mut();
            fwd.pit.insert(&interest)
        };

        let duplicate_nonce = {
            let fwd = handle.borrow();
            fwd.pit
                .get(pit_key)
                .map(|e| e.has_nonce(interest.nonce) && !is_new)
                .unwrap_or(false)
        };
        if duplicate_nonce {
            trace!("interest {} nonce {} duplicates an existing record", interest.name, interest.nonce);
            Self::interest_loop(handle, in_face, interest);
            return;
        }

        {
            let mut fwd = handle.borrow_mut();
            if let Some(entry) = fwd.pit.get_mut(pit_key) {
                if let Some(id) = entry.unsatisfy_timer.take() {
                    fwd.scheduler.cancel(id);
                }
                if let Some(id) = entry.straggler_timer.take() {
                    fwd.scheduler.cancel(id);
                }
            }
        }

        let has_in_records = {
            let fwd = handle.borrow();
            fwd.pit.get(pit_key).map(|e| !e.in_records.is_empty()).unwrap_or(false)
        };

        if !has_in_records {
            let hit = {
                let fwd = handle.borrow();
                fwd.cs.find(&interest).cloned()
            };
            match hit {
                Some(data) => Self::cs_hit(handle, in_face, pit_key, data),
                None => Self::cs_miss(handle, in_face, pit_key, interest),
            }
        } else {
            Self::cs_miss(handle, in_face, pit_key, interest);
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 2: CS-Hit
     * ------------------------------------------------------------ */

    fn cs_hit(handle: &ForwarderHandle, in_face: FaceId, pit_key: PitKey, data: Data) {
        let straggler = data.freshness_period_ms.map(|ms| Duration::from_millis(ms as u64)).unwrap_or(STRAGGLER_TIMER);
        {
            let mut fwd = handle.borrow_mut();
            let weak = fwd.self_weak.clone();
            let id = fwd.scheduler.schedule(straggler, move || {
                if let Some(handle) = weak.upgrade() {
                    Forwarder::interest_finalize(&handle, pit_key, true);
                }
            });
            if let Some(entry) = fwd.pit.get_mut(pit_key) {
                entry.straggler_timer = Some(id);
                entry.is_satisfied = true;
            } else {
                fwd.scheduler.cancel(id);
            }
        }
        Self::outgoing_data(handle, in_face, data);
    }

    /* ------------------------------------------------------------ *
     * Pipeline 3: CS-Miss
     * ------------------------------------------------------------ */

    fn cs_miss(handle: &ForwarderHandle, in_face: FaceId, pit_key: PitKey, interest: Interest) {
        let now = Instant::now();
        let lifetime = interest.lifetime();
        {
            let mut fwd = handle.borrow_mut();
            if let Some(entry) = fwd.pit.get_mut(pit_key) {
                entry.insert_or_update_in_record(in_face, interest.nonce, now, lifetime);
                if let Some(old) = entry.unsatisfy_timer.take() {
                    let id = old;
                    fwd.scheduler.cancel(id);
                }
            }

            let entry_expiry = fwd.pit.get(pit_key).and_then(|e| e.expiry());
            if let Some(expiry) = entry_expiry {
                let weak = fwd.self_weak.clone();
                let delay = expiry.saturating_duration_since(now);
                let id = fwd.scheduler.schedule(delay, move || {
                    if let Some(handle) = weak.upgrade() {
                        Forwarder::interest_unsatisfied(&handle, pit_key);
                    }
                });
                if let Some(entry) = fwd.pit.get_mut(pit_key) {
                    entry.unsatisfy_timer = Some(id);
                }
            }
        }

        // FIB resolution (spec.md §4.8.1) is carried out by the strategy
        // via `StrategyActions::lookup_fib` when it needs the next-hop set;
        // doing it here as well would be redundant work on every miss.
        Self::dispatch_after_receive_interest(handle, in_face, pit_key, &interest);
    }

    /// Forwarding hint resolution (spec.md §4.8.1), applied against a PIT
    /// entry's name and the forwarding hint it was created with.
    fn resolve_fib_for_name_and_hint(&self, name: &rust_udcn_common::ndn::Name, hint: &[rust_udcn_common::ndn::Delegation]) -> FibEntry {
        if hint.is_empty() {
            return self.fib.find_longest_prefix_match(name);
        }

        let producer_region_hit = hint.iter().any(|d| self.network_region.iter().any(|r| r == &d.name));
        if producer_region_hit {
            return self.fib.find_longest_prefix_match(name);
        }

        let first = &hint[0];
        let first_entry = self.fib.find_longest_prefix_match(&first.name);
        if first_entry.prefix.is_empty() {
            return first_entry; // default-free zone: root entry stands
        }
        for delegation in hint {
            let entry = self.fib.find_longest_prefix_match(&delegation.name);
            if !entry.next_hops.is_empty() {
                return entry;
            }
        }
        first_entry
    }

    fn dispatch_after_receive_interest(handle: &ForwarderHandle, in_face: FaceId, pit_key: PitKey, interest: &Interest) {
        let strategy_id = {
            let fwd = handle.borrow();
            fwd.strategy_choice.find_effective_strategy(&interest.name)
        };
        Self::with_strategy(handle, &strategy_id, |strategy, actions| {
            strategy.after_receive_interest(actions, in_face, pit_key);
        });
    }

    /// Runs `body` with the named strategy temporarily removed from the
    /// map (so it can be called with `&mut Forwarder` via
    /// [`StrategyActions`] without aliasing `self.strategies`), then puts
    /// it back.
    fn with_strategy(handle: &ForwarderHandle, id: &StrategyId, body: impl FnOnce(&mut dyn Strategy, &mut dyn StrategyActions)) {
        let taken = {
            let mut fwd = handle.borrow_mut();
            fwd.strategies.remove(id)
        };
        let Some(mut strategy) = taken else { return };
        {
            let mut fwd = handle.borrow_mut();
            let mut actions = ForwarderActions { handle: handle.clone(), fwd: &mut fwd };
            body(strategy.as_mut(), &mut actions);
        }
        handle.borrow_mut().strategies.insert(id.clone(), strategy);
    }

    /* ------------------------------------------------------------ *
     * Pipeline 4: Interest-Loop
     * ------------------------------------------------------------ */

    fn interest_loop(handle: &ForwarderHandle, in_face: FaceId, interest: Interest) {
        let link_type = handle.borrow().face_link_type(in_face);
        if link_type == LinkType::MultiAccess {
            return; // drop
        }
        debug!("interest loop detected for {} on face {:?}, sending duplicate nack", interest.name, in_face);
        let face = handle.borrow().face_table.get(in_face);
        if let Some(face) = face {
            let nack = Nack::new(interest, NackReason::Duplicate);
            spawn_send_nack(face, nack);
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 5: Outgoing Interest
     * ------------------------------------------------------------ */

    fn outgoing_interest(handle: &ForwarderHandle, pit_key: PitKey, out_face: FaceId, want_new_nonce: bool) {
        if !out_face.is_valid() {
            return;
        }
        let mut fwd = handle.borrow_mut();
        if fwd.face_table.get(out_face).map(|f| scope::violates_scope(&fwd.pit.get(pit_key).map(|e| e.name.clone()).unwrap_or_default(), f.scope())).unwrap_or(false) {
            debug!("outgoing interest on face {:?} blocked by scope policy", out_face);
            return;
        }

        let now = Instant::now();
        let (name, mut nonce, lifetime) = match fwd.pit.get(pit_key) {
            Some(entry) => {
                let in_record = entry
                    .in_records
                    .iter()
                    .filter(|r| r.face != out_face)
                    .max_by_key(|r| r.last_renewed)
                    .or_else(|| entry.in_records.iter().max_by_key(|r| r.last_renewed));
                let Some(in_record) = in_record else { return };
                (entry.name.clone(), in_record.nonce, Duration::from_millis(4000).max(in_record.expiry.saturating_duration_since(now)))
            }
            None => return,
        };

        if want_new_nonce {
            nonce = fwd.rng.gen();
        }

        if let Some(entry) = fwd.pit.get_mut(pit_key) {
            entry.insert_or_update_out_record(out_face, nonce, now, lifetime);
        }
        fwd.counters.n_out_interests.increment();

        let face = fwd.face_table.get(out_face);
        drop(fwd);
        if let Some(face) = face {
            let interest = Interest::new(name).with_nonce(nonce);
            spawn_send_interest(face, interest);
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 6: Interest-Reject
     * ------------------------------------------------------------ */

    fn interest_reject(handle: &ForwarderHandle, pit_key: PitKey) {
        let mut fwd = handle.borrow_mut();
        let has_pending_out = fwd.pit.get(pit_key).map(|e| e.out_records.iter().any(|r| r.expiry > Instant::now())).unwrap_or(false);
        if has_pending_out {
            return;
        }
        debug!("rejecting pending interest {:?}, no remaining out-records", pit_key);
        let old_timer = fwd.pit.get_mut(pit_key).and_then(|e| e.unsatisfy_timer.take());
        if let Some(id) = old_timer {
            fwd.scheduler.cancel(id);
        }
        let weak = fwd.self_weak.clone();
        let id = fwd.scheduler.schedule(STRAGGLER_TIMER, move || {
            if let Some(handle) = weak.upgrade() {
                Forwarder::interest_unsatisfied(&handle, pit_key);
            }
        });
        if let Some(entry) = fwd.pit.get_mut(pit_key) {
            entry.straggler_timer = Some(id);
            entry.is_satisfied = false;
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 7: Interest-Unsatisfied
     * ------------------------------------------------------------ */

    fn interest_unsatisfied(handle: &ForwarderHandle, pit_key: PitKey) {
        trace!("interest {:?} unsatisfied, finalizing", pit_key);
        let strategy_id = {
            let fwd = handle.borrow();
            fwd.pit.get(pit_key).map(|e| fwd.strategy_choice.find_effective_strategy(&e.name))
        };
        if let Some(strategy_id) = strategy_id {
            Self::with_strategy(handle, &strategy_id, |strategy, actions| {
                strategy.before_expire_pending_interest(actions, pit_key);
            });
        }
        Self::interest_finalize(handle, pit_key, false);
    }

    /* ------------------------------------------------------------ *
     * Pipeline 8: Interest-Finalize
     * ------------------------------------------------------------ */

    fn interest_finalize(handle: &ForwarderHandle, pit_key: PitKey, satisfied: bool) {
        let mut fwd = handle.borrow_mut();
        if let Some(entry) = fwd.pit.get(pit_key) {
            // DeadNonceList insertion (spec.md §4.8.2): unsatisfied/rejected
            // entries always insert all out-nonces.
            if !satisfied {
                let name = entry.name.clone();
                let nonces: Vec<u32> = entry.out_records.iter().map(|r| r.nonce).collect();
                for nonce in nonces {
                    fwd.dnl.add(&name, nonce);
                }
            }
        }
        if let Some(entry) = fwd.pit.get_mut(pit_key) {
            if let Some(id) = entry.unsatisfy_timer.take() {
                fwd.scheduler.cancel(id);
            }
            if let Some(id) = entry.straggler_timer.take() {
                fwd.scheduler.cancel(id);
            }
        }
        fwd.pit.erase(pit_key);
    }

    /* ------------------------------------------------------------ *
     * Pipeline 9: Incoming Data
     * ------------------------------------------------------------ */

    pub fn incoming_data(handle: &ForwarderHandle, in_face: FaceId, data: Data) {
        {
            let mut fwd = handle.borrow_mut();
            fwd.counters.n_in_data.increment();
            if fwd.face_scope(in_face) != FaceScope::Local && scope::is_localhost(&data.name) {
                debug!("dropping /localhost data {} from non-local face {:?}", data.name, in_face);
                return;
            }
        }

        let matches = {
            let fwd = handle.borrow();
            fwd.pit.find_all_data_matches(&data.name)
        };
        if matches.is_empty() {
            trace!("data {} is unsolicited, no matching pit entries", data.name);
            Self::data_unsolicited(handle, in_face, data);
            return;
        }

        {
            let mut fwd = handle.borrow_mut();
            fwd.cs.insert(data.clone(), false);
        }

        let mut pending_downstreams: Vec<(PitKey, Vec<FaceId>)> = Vec::new();
        let now = Instant::now();

        for pit_key in matches {
            let must_be_fresh_satisfaction_eligible = {
                let mut fwd = handle.borrow_mut();
                let weak = fwd.self_weak.clone();
                let out_nonces_for_dnl = if let Some(entry) = fwd.pit.get(pit_key) {
                    let want_dnl = entry.selectors.must_be_fresh
                        && data
                            .freshness_period_ms
                            .map(|fp| Duration::from_millis(fp as u64) < fwd.dnl.lifetime())
                            .unwrap_or(false);
                    if want_dnl {
                        entry.out_records.iter().map(|r| r.nonce).collect::<Vec<_>>()
                    } else {
                        Vec::new()
                    }
                } else {
                    Vec::new()
                };

                if let Some(entry) = fwd.pit.get_mut(pit_key) {
                    if let Some(id) = entry.unsatisfy_timer.take() {
                        fwd.scheduler.cancel(id);
                    }
                    if let Some(id) = entry.straggler_timer.take() {
                        fwd.scheduler.cancel(id);
                    }
                }

                let downstreams: Vec<FaceId> = fwd
                    .pit
                    .get(pit_key)
                    .map(|e| e.in_records.iter().filter(|r| r.expiry > now).map(|r| r.face).collect())
                    .unwrap_or_default();
                pending_downstreams.push((pit_key, downstreams));

                let name = fwd.pit.get(pit_key).map(|e| e.name.clone()).unwrap_or_default();
                for nonce in out_nonces_for_dnl {
                    fwd.dnl.add(&name, nonce);
                }

                if let Some(entry) = fwd.pit.get_mut(pit_key) {
                    entry.in_records.clear();
                    entry.delete_out_record(in_face);
                    entry.is_satisfied = true;
                }

                let straggler = data.freshness_period_ms.map(|ms| Duration::from_millis(ms as u64)).unwrap_or(STRAGGLER_TIMER);
                let id = fwd.scheduler.schedule(straggler, move || {
                    if let Some(handle) = weak.upgrade() {
                        Forwarder::interest_finalize(&handle, pit_key, true);
                    }
                });
                if let Some(entry) = fwd.pit.get_mut(pit_key) {
                    entry.straggler_timer = Some(id);
                }
                true
            };

            let strategy_id = {
                let fwd = handle.borrow();
                fwd.pit.get(pit_key).map(|e| fwd.strategy_choice.find_effective_strategy(&e.name))
            };
            if let Some(strategy_id) = strategy_id {
                let data_for_trigger = data.clone();
                Self::with_strategy(handle, &strategy_id, |strategy, actions| {
                    strategy.before_satisfy_interest(actions, pit_key, in_face, &data_for_trigger);
                });
            }
            let _ = must_be_fresh_satisfaction_eligible;
        }

        for (_pit_key, downstreams) in pending_downstreams {
            for face in downstreams {
                if face != in_face {
                    Self::outgoing_data(handle, face, data.clone());
                }
            }
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 10: Data-Unsolicited
     * ------------------------------------------------------------ */

    fn data_unsolicited(handle: &ForwarderHandle, in_face: FaceId, data: Data) {
        let mut fwd = handle.borrow_mut();
        if fwd.face_scope(in_face) == FaceScope::Local {
            fwd.cs.insert(data, true);
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 11: Outgoing Data
     * ------------------------------------------------------------ */

    fn outgoing_data(handle: &ForwarderHandle, out_face: FaceId, data: Data) {
        if !out_face.is_valid() {
            return;
        }
        let mut fwd = handle.borrow_mut();
        if let Some(face) = fwd.face_table.get(out_face) {
            if scope::violates_scope(&data.name, face.scope()) {
                return;
            }
            fwd.counters.n_out_data.increment();
            drop(fwd);
            spawn_send_data(face, data);
        }
    }

    /* ------------------------------------------------------------ *
     * Pipeline 12: Incoming Nack / Outgoing Nack
     * ------------------------------------------------------------ */

    pub fn incoming_nack(handle: &ForwarderHandle, in_face: FaceId, nack: Nack) {
        let mut fwd = handle.borrow_mut();
        fwd.counters.n_in_nacks.increment();
        if fwd.face_link_type(in_face) == LinkType::MultiAccess {
            return;
        }
        let Some(pit_key) = fwd.pit.find(&nack.interest) else {
            trace!("nack for {} has no matching pit entry", nack.interest.name);
            return;
        };
        let nonce_matches = fwd
            .pit
            .get(pit_key)
            .and_then(|e| e.find_out_record(in_face))
            .map(|r| r.nonce == nack.interest.nonce)
            .unwrap_or(false);
        if !nonce_matches {
            trace!("nack for {} on face {:?} has no matching out-record nonce", nack.interest.name, in_face);
            return;
        }
        if let Some(entry) = fwd.pit.get_mut(pit_key) {
            if let Some(rec) = entry.find_out_record_mut(in_face) {
                rec.nack_reason = Some(nack.reason);
            }
        }
        drop(fwd);

        let strategy_id = {
            let fwd = handle.borrow();
            fwd.pit.get(pit_key).map(|e| fwd.strategy_choice.find_effective_strategy(&e.name))
        };
        if let Some(strategy_id) = strategy_id {
            Self::with_strategy(handle, &strategy_id, |strategy, actions| {
                strategy.after_receive_nack(actions, in_face, &nack, pit_key);
            });
        }
    }

    fn outgoing_nack(handle: &ForwarderHandle, out_face: FaceId, pit_key: PitKey, reason: NackReason) {
        if !out_face.is_valid() {
            return;
        }
        let mut fwd = handle.borrow_mut();
        if fwd.face_link_type(out_face) == LinkType::MultiAccess {
            return;
        }
        let interest = {
            let Some(entry) = fwd.pit.get_mut(pit_key) else { return };
            let Some(in_record) = entry.find_in_record(out_face) else { return };
            let interest = Interest::new(entry.name.clone()).with_nonce(in_record.nonce);
            entry.delete_in_record(out_face);
            interest
        };
        fwd.counters.n_out_nacks.increment();
        let face = fwd.face_table.get(out_face);
        drop(fwd);
        if let Some(face) = face {
            spawn_send_nack(face, Nack::new(interest, reason));
        }
    }
}

fn spawn_send_interest(face: Rc<dyn Face>, interest: Interest) {
    tokio::task::spawn_local(async move {
        let _ = face.send_interest(&interest).await;
    });
}

fn spawn_send_data(face: Rc<dyn Face>, data: Data) {
    tokio::task::spawn_local(async move {
        let _ = face.send_data(&data).await;
    });
}

fn spawn_send_nack(face: Rc<dyn Face>, nack: Nack) {
    tokio::task::spawn_local(async move {
        let _ = face.send_nack(&nack).await;
    });
}

/// [`StrategyActions`] implementation handed to the active strategy for
/// the duration of one trigger call.
struct ForwarderActions<'a> {
    handle: ForwarderHandle,
    fwd: &'a mut Forwarder,
}

impl<'a> StrategyActions for ForwarderActions<'a> {
    fn send_interest(&mut self, pit_entry: PitKey, out_face: FaceId, want_new_nonce: bool) {
        let _ = &mut self.fwd;
        Forwarder::outgoing_interest(&self.handle, pit_entry, out_face, want_new_nonce);
    }

    fn send_data(&mut self, pit_entry: PitKey, data: &Data, out_face: FaceId) {
        let _ = pit_entry;
        Forwarder::outgoing_data(&self.handle, out_face, data.clone());
    }

    fn send_nack(&mut self, pit_entry: PitKey, out_face: FaceId, reason: NackReason) {
        Forwarder::outgoing_nack(&self.handle, out_face, pit_entry, reason);
    }

    fn send_nacks(&mut self, pit_entry: PitKey, reason: NackReason, except: &[FaceId]) {
        let downstreams: Vec<FaceId> = self
            .fwd
            .pit
            .get(pit_entry)
            .map(|e| e.in_records.iter().map(|r| r.face).collect())
            .unwrap_or_default();
        for face in downstreams {
            if !except.contains(&face) {
                Forwarder::outgoing_nack(&self.handle, face, pit_entry, reason);
            }
        }
    }

    fn reject_pending_interest(&mut self, pit_entry: PitKey) {
        Forwarder::interest_reject(&self.handle, pit_entry);
    }

    fn lookup_fib(&self, pit_entry: PitKey) -> FibEntry {
        match self.fwd.pit.get(pit_entry) {
            Some(entry) => self.fwd.resolve_fib_for_name_and_hint(&entry.name, &entry.forwarding_hint),
            None => FibEntry::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::BestRouteStrategy;

    #[test]
    fn default_strategy_installed_at_root() {
        let handle = Forwarder::new_handle(100, Box::new(BestRouteStrategy));
        let fwd = handle.borrow();
        assert_eq!(
            fwd.strategy_choice.find_effective_strategy(&rust_udcn_common::ndn::Name::from_string("/a")),
            StrategyId::new("best-route")
        );
    }

    #[test]
    fn register_strategy_adds_to_map() {
        let handle = Forwarder::new_handle(100, Box::new(BestRouteStrategy));
        handle.borrow_mut().register_strategy(Box::new(crate::strategy::MulticastStrategy));
        handle
            .borrow_mut()
            .strategy_choice_mut()
            .insert(&rust_udcn_common::ndn::Name::from_string("/m"), StrategyId::new("multicast"));
        let fwd = handle.borrow();
        assert_eq!(
            fwd.strategy_choice.find_effective_strategy(&rust_udcn_common::ndn::Name::from_string("/m/x")),
            StrategyId::new("multicast")
        );
    }
}
