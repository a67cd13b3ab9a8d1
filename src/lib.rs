//! # `nibkit` main library
//!
//! This library recovers a logical disk image from a physical capture of an Apple II
//! 5.25 inch disk.  The capture holds, for each track, the nibbles exactly as they were
//! written, including sync bytes and field markers.  Sector boundaries are not given,
//! they have to be found by scanning for markers, and every field is validated by its
//! checksum before it is trusted.
//!
//! ## Architecture
//!
//! * `img::v2d` reads the capture container
//! * `img::track` and `img::fields` find and validate the address and data fields
//! * `img::nibbles` reverses the 4&4 and 6&2 encodings
//! * `bios::skew` maps physical sectors to their logical slots
//! * `img::assemble` places the sectors in the flat output buffer
//!
//! The result is a `SectorImage`, which can be handed to anything that understands a
//! sequential sector layout (DO or PO ordering, depending on the interleave).
//!
//! ## Errors
//!
//! Only a malformed container is an error.  Bad tracks are reported through
//! `SectorImage::good_tracks` and `SectorImage::reports`, and leave zeros in the image.

pub mod bios;
pub mod img;
pub mod config;

pub use config::{DecodeOptions,FractionalTracks};
pub use img::assemble::SectorImage;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

pub const KNOWN_FILE_EXTENSIONS: &str = "v2d";

/// Decode a capture held in memory
pub fn decode_capture(buf: &[u8],opts: &DecodeOptions) -> Result<SectorImage,DYNERR> {
    opts.check()?;
    let capture = img::v2d::Capture::from_bytes(buf)?;
    capture.decode(opts)
}

/// Decode a capture file
pub fn decode_capture_file(path: &str,opts: &DecodeOptions) -> Result<SectorImage,DYNERR> {
    let ext = match path.split('.').last() {
        Some(x) => x.to_lowercase(),
        None => "".to_string()
    };
    if !img::v2d::file_extensions().contains(&ext) {
        log::warn!("file extension .{} is not one of {}",ext,KNOWN_FILE_EXTENSIONS);
    }
    opts.check()?;
    let capture = img::v2d::Capture::from_file(path)?;
    capture.decode(opts)
}

/// Save the decoded image (the caller picks the file name, e.g., `.po` or `.do`)
pub fn save_img(img: &SectorImage,img_path: &str) -> STDRESULT {
    std::fs::write(img_path,img.as_bytes())?;
    Ok(())
}
