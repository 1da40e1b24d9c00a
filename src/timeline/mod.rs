//! Length arithmetic over frame sequences: cycle expansion and LCM synchronization.

/// Cycle expansion and frame duplication.
pub mod expand;
/// Pairing two sequences over a common loop length.
pub mod sync;
