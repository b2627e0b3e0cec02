//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system (time, filesystem, project-tree enumeration).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod filesystem;
pub mod tree;

pub use clock::Clock;
pub use filesystem::{FileSystem, PortError};
pub use tree::{TreeScan, TreeWalker};
