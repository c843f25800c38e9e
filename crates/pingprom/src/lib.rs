//! Top-level facade crate for pingprom.
//!
//! Re-exports core types and the exporter library so users can depend on a single crate.

pub mod core {
    pub use pingprom_core::*;
}

pub mod exporter {
    pub use pingprom_exporter::*;
}
