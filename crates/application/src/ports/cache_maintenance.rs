/// Port for periodic cache housekeeping, driven by the jobs crate.
pub trait CacheMaintenance: Send + Sync {
    /// Drop expired state. Returns how many entries were cleared;
    /// running it on an already-clean cache is a no-op returning 0.
    fn sweep(&self) -> usize;
}
