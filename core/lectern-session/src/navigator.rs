//! Navigation seam used for the login redirect.

/// Host navigation.
///
/// Implementations should treat `redirect` as idempotent; the controller
/// already calls it at most once per logout.
pub trait Navigator: Send + Sync {
    /// Replaces the current view with `target` (a path with query string).
    fn redirect(&self, target: &str);
}
