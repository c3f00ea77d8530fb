//! Capability store with whole-value, last-write-wins slots and the
//! one-way preload latch.

use crate::slots::CapabilitySlot;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

/// Process-wide store of capability facts reported by the HMI.
///
/// Values are opaque; validation belongs to the reporting command.
#[derive(Debug)]
pub struct CapabilityRegistry {
    slots: RwLock<BTreeMap<CapabilitySlot, Value>>,
    preloaded: AtomicBool,
    updates: AtomicU64,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry {
    /// Empty registry with the preload latch set.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
            preloaded: AtomicBool::new(true),
            updates: AtomicU64::new(0),
        }
    }

    /// Replace the slot's value unconditionally.
    pub fn update(&self, slot: CapabilitySlot, value: Value) {
        self.slots.write().insert(slot, value);
        self.updates.fetch_add(1, Ordering::Relaxed);
        debug!(slot = %slot, "Capability updated");
    }

    /// Current value, or `None` if the slot was never reported.
    pub fn read(&self, slot: CapabilitySlot) -> Option<Value> {
        self.slots.read().get(&slot).cloned()
    }

    pub fn is_set(&self, slot: CapabilitySlot) -> bool {
        self.slots.read().contains_key(&slot)
    }

    /// Boolean view of a flag slot.
    pub fn flag(&self, slot: CapabilitySlot) -> Option<bool> {
        self.slots.read().get(&slot).and_then(Value::as_bool)
    }

    /// String view of a text slot.
    pub fn text(&self, slot: CapabilitySlot) -> Option<String> {
        self.slots
            .read()
            .get(&slot)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    pub fn set_ccpu_version(&self, version: impl Into<String>) {
        self.update(CapabilitySlot::CcpuVersion, Value::String(version.into()));
    }

    pub fn ccpu_version(&self) -> Option<String> {
        self.text(CapabilitySlot::CcpuVersion)
    }

    /// Copy of every set slot.
    pub fn snapshot(&self) -> BTreeMap<CapabilitySlot, Value> {
        self.slots.read().clone()
    }

    /// Whether the HMI has not yet answered a capability-style request.
    pub fn is_preloaded(&self) -> bool {
        self.preloaded.load(Ordering::Acquire)
    }

    /// Clear the preload latch. Returns `true` only for the call that
    /// flipped it; there is no way to set it again.
    pub fn clear_preloaded(&self) -> bool {
        let flipped = self
            .preloaded
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if flipped {
            info!("Capability preload latch cleared");
        }
        flipped
    }

    /// Total number of `update` calls.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}
