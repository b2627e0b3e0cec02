//! Service context bundling all port trait objects.

use crate::ports::clock::Clock;
use crate::ports::filesystem::FileSystem;
use crate::ports::tree::TreeWalker;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. The whole run reads
/// through this context so every piece of disk access goes through the same
/// seam.
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Filesystem for file I/O.
    pub fs: Box<dyn FileSystem>,
    /// Project-tree enumeration.
    pub tree: Box<dyn TreeWalker>,
}

impl ServiceContext {
    /// Creates a live context with real adapters for clock, filesystem, and
    /// tree walking.
    #[must_use]
    pub fn live() -> Self {
        use crate::adapters::live::clock::LiveClock;
        use crate::adapters::live::filesystem::LiveFileSystem;
        use crate::adapters::live::tree::LiveTreeWalker;

        Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            tree: Box::new(LiveTreeWalker),
        }
    }

    /// Creates a context from explicit adapters.
    ///
    /// Used by tests to substitute a fixed clock while keeping the live
    /// filesystem against a temp directory.
    #[must_use]
    pub fn with_parts(
        clock: Box<dyn Clock>,
        fs: Box<dyn FileSystem>,
        tree: Box<dyn TreeWalker>,
    ) -> Self {
        Self { clock, fs, tree }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_context_provides_working_ports() {
        let ctx = ServiceContext::live();
        let now = ctx.clock.now();
        assert!(now.timestamp() > 0);
    }

    #[test]
    fn fixed_context_returns_fixed_time() {
        let ctx = testing::fixed_context();
        assert_eq!(ctx.clock.now().to_rfc3339(), "2024-06-15T10:30:00+00:00");
    }
}
