//! Gray-code pattern demodulation
//!
//! Turns a captured structured-light sequence into camera to projector pixel
//! correspondences:
//! - Validity mask from the white/blank references (threshold, erosion, crop)
//! - Per-axis bit-plane accumulation from pattern/inverse pairs
//! - Gray to binary conversion and match extraction

/// Per-pixel Gray code accumulators
pub mod bitplane;
/// Gray/binary conversions
pub mod gray_code;
/// Sequence file naming and projector center offsets
pub mod layout;
/// Validity mask construction
pub mod mask;
/// Sequence decoding and match extraction
pub mod sequence;
/// Where pattern rasters come from
pub mod source;
/// Ideal sequences for tests and benchmarks
pub mod synthetic;

pub use bitplane::BitPlane;
pub use gray_code::{binary_to_gray, gray_to_binary};
pub use layout::{Axis, CenterOffsets, SequenceLayout};
pub use mask::build_validity_mask;
pub use sequence::{DecodeOutput, DecodeTelemetry, DecodedMaps, PatternDecoder};
pub use source::{DirectorySource, InMemorySource, PatternSource};
