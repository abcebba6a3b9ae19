//! XML decoding/encoding for the crowd-mechanics CLI, split out as a library
//! target so `cli/tests/` can round-trip fixtures without shelling out to
//! the `throng` binary.

pub mod xml;
