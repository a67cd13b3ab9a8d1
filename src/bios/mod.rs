//! # BIOS module
//!
//! Sits between the raw track decoding in `img` and whatever consumes the logical
//! image.  Right now this is only the mapping from physical sectors to logical slots,
//! see `skew`.

pub mod skew;

/// Errors pertaining to sector mapping
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("interleave is not a permutation of the sectors")]
    BadInterleave,
    #[error("unable to access sector")]
    SectorAccess
}
