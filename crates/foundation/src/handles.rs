use serde::Serialize;

/// Identifier of a resource tracked by the engine's registry.
///
/// Ids are allocated monotonically and never reused, so a stale id can only
/// ever miss (releasing it is a no-op).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn new(n: u64) -> Self {
        ResourceId(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Renderer-side handle of a marker or popup.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OverlayHandle(pub u64);

/// Monotonic id allocator.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_resource(&mut self) -> ResourceId {
        self.next = self.next.wrapping_add(1);
        ResourceId(self.next)
    }
}
