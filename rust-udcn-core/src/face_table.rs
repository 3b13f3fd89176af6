//! FaceTable: FaceId allocator and face lifecycle bookkeeping (spec.md
//! §4.11).

use crate::face::Face;
use rust_udcn_common::types::FaceId;
use std::collections::HashMap;
use std::rc::Rc;

/// First dynamically-assigned face id; 1..=255 are reserved (spec.md §3).
const FIRST_DYNAMIC_ID: u16 = 256;

pub struct FaceTable {
    faces: HashMap<FaceId, Rc<dyn Face>>,
    next_dynamic_id: u16,
}

impl Default for FaceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceTable {
    pub fn new() -> Self {
        Self {
            faces: HashMap::new(),
            next_dynamic_id: FIRST_DYNAMIC_ID,
        }
    }

    /// `add(face)`: assign the next free dynamic id. The face implementation
    /// is expected to already carry that id by the time it's added here — in
    /// this design ids are allocated first via [`FaceTable::allocate_id`],
    /// then handed to the face constructor, then registered.
    pub fn add(&mut self, face: Rc<dyn Face>) {
        self.faces.insert(face.id(), face);
    }

    /// Reserve the next dynamic id (spec.md §4.11 `add`).
    pub fn allocate_id(&mut self) -> FaceId {
        let id = FaceId(self.next_dynamic_id);
        self.next_dynamic_id += 1;
        id
    }

    /// `addReserved(face, id)` for ids in `1..=255`.
    pub fn add_reserved(&mut self, id: FaceId, face: Rc<dyn Face>) {
        debug_assert!(id.is_reserved());
        self.faces.insert(id, face);
    }

    pub fn get(&self, id: FaceId) -> Option<Rc<dyn Face>> {
        self.faces.get(&id).cloned()
    }

    /// Remove a face from the table. Returns the removed face so the
    /// caller (the Forwarder) can run `FIB.removeNextHopFromAllEntries` and
    /// signal `beforeRemoveFace` (spec.md §4.11 "On remove").
    pub fn remove(&mut self, id: FaceId) -> Option<Rc<dyn Face>> {
        self.faces.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn Face>> {
        self.faces.values()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }
}
