//! # Disk Image Module
//!
//! This module turns a physical capture of a 5.25 inch disk, i.e., the nibbles exactly as
//! they were written to each track, into a logical image made of 256 byte sectors.
//!
//! ## Pipeline
//!
//! The work proceeds in a single pass, one track at a time:
//! * `v2d` reads the capture container and hands over each track's raw nibbles
//! * `track` drives a small state machine over the nibbles, alternating between
//!   address fields and data fields
//! * `fields` locates the markers and checks the framing of each field
//! * `nibbles` reverses the 4&4 and 6&2 encodings and computes checksums
//! * `assemble` owns the output buffer and places each sector according to the interleave
//!
//! ## Errors
//!
//! There are two classes of error.  An `Error` means the container itself is malformed,
//! decoding is aborted and nothing is returned.  A `NibbleError` is local to one track,
//! it stops decoding of that track but never propagates, it only shows up in the track
//! reports and in the count of good tracks.

pub mod nibbles;
pub mod fields;
pub mod track;
pub mod assemble;
pub mod v2d;

/// Enumerates disk image errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("capture is shorter than its header")]
    HeaderTruncated,
    #[error("capture declares more tracks than it contains")]
    TrackCountMismatch,
    #[error("track record is shorter than its declared length")]
    TrackRecordTruncated,
    #[error("geometric coordinate out of range")]
    GeometryMismatch,
    #[error("metadata mismatch")]
    MetadataMismatch
}

/// Errors pertaining to nibble encoding, these are always local to a track
#[derive(thiserror::Error,Debug,Clone,Copy,PartialEq,Eq)]
pub enum NibbleError {
    #[error("prolog not found")]
    MarkerMismatch,
    #[error("epilog not found")]
    EpilogueMismatch,
    #[error("invalid byte while decoding")]
    InvalidByte,
    #[error("bad checksum found in a sector")]
    BadChecksum,
    #[error("address field is inconsistent")]
    BadAddress,
    #[error("track ended inside a field")]
    Truncated
}
