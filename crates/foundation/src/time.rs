use serde::Serialize;

/// Engine timestamp in milliseconds.
///
/// The engine never reads a wall clock; the host passes the current time into
/// every entry point, which keeps timer behaviour replayable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Millis(pub u64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub fn after(self, delay_ms: u64) -> Millis {
        Millis(self.0.saturating_add(delay_ms))
    }

    /// Elapsed time since `earlier`, zero if `earlier` is in the future.
    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Millis;

    #[test]
    fn since_saturates() {
        assert_eq!(Millis(100).since(Millis(40)), 60);
        assert_eq!(Millis(40).since(Millis(100)), 0);
        assert_eq!(Millis(5).after(10), Millis(15));
    }
}
