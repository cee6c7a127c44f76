//! Last-known address tracking
//!
//! Holds the last address successfully pushed for each family. Both start
//! empty, so the first resolved address always counts as a change. Nothing
//! is persisted across restarts.

use tracing::info;

use crate::traits::AddressFamily;

/// In-memory record of the last address pushed per family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeDetector {
    last_ipv4: String,
    last_ipv6: String,
}

impl ChangeDetector {
    /// Create a detector with no known addresses
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare a freshly resolved address against the stored one
    ///
    /// Pure comparison: the stored value is only advanced by [`record`](Self::record).
    pub fn has_changed(&self, family: AddressFamily, address: &str) -> bool {
        let changed = address != self.last_known(family);
        info!("{} is {} changed={}", family, address, changed);
        changed
    }

    /// Store `address` as pushed for `family`
    ///
    /// Call only after the provider accepted the update.
    pub fn record(&mut self, family: AddressFamily, address: impl Into<String>) {
        *self.slot_mut(family) = address.into();
    }

    /// Last address pushed for `family`, empty if none yet
    pub fn last_known(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.last_ipv4,
            AddressFamily::V6 => &self.last_ipv6,
        }
    }

    fn slot_mut(&mut self, family: AddressFamily) -> &mut String {
        match family {
            AddressFamily::V4 => &mut self.last_ipv4,
            AddressFamily::V6 => &mut self.last_ipv6,
        }
    }
}
