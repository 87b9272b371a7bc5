//! Four API surfaces over the same [`crate::pipeline`] machinery, from the
//! simplest ("junior") to full control over transport and codec selection
//! ("technical diver").
//!
//! Every layer ultimately constructs a [`crate::registry::CodecRegistry`]
//! lookup, a [`sail_common::io::Io`] handle, and a [`crate::pipeline`]
//! session; later layers just hand the caller more of those pieces
//! directly instead of inferring them.

pub mod advanced;
pub mod deep_diver;
pub mod junior;
pub mod technical_diver;

#[cfg(test)]
pub(crate) mod test_support;

pub use advanced::{load_from_file, load_from_memory, probe_file, probe_memory, save_to_file, save_to_memory};
pub use deep_diver::{DeepDiverLoad, DeepDiverSave};
pub use junior::{load, probe, save};
pub use technical_diver::{load_with_codec, save_with_codec};
