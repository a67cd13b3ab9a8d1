//! # Decoding options
//!
//! Options can be built in code, or read from a JSON document such as
//! ```json
//! {
//!     "interleave": "dos",
//!     "fractional": "skip",
//!     "max_tracks": 35,
//!     "verify_address_checksum": true
//! }
//! ```
//! The interleave can also be given as a list of 16 slots, indexed by physical sector.

use std::str::FromStr;
use crate::bios::skew::Interleave;
use crate::img;
use crate::DYNERR;

/// Default track capacity, enough for 40 track captures
pub const DEFAULT_MAX_TRACKS: usize = 40;
/// The address field can only express this many tracks
pub const TRACK_LIMIT: usize = 256;

/// What to do with half and quarter track records
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum FractionalTracks {
    /// decode them like any other track
    Decode,
    /// leave them out, they are listed as skipped in the report
    Skip
}

impl FromStr for FractionalTracks {
    type Err = img::Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "decode" => Ok(Self::Decode),
            "skip" => Ok(Self::Skip),
            _ => Err(img::Error::MetadataMismatch)
        }
    }
}

#[derive(Clone,Debug)]
pub struct DecodeOptions {
    pub interleave: Interleave,
    pub fractional: FractionalTracks,
    /// capacity of the output image in tracks
    pub max_tracks: usize,
    /// require volume ^ track ^ sector to match the address checksum
    pub verify_address_checksum: bool
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            interleave: Interleave::prodos(),
            fractional: FractionalTracks::Decode,
            max_tracks: DEFAULT_MAX_TRACKS,
            verify_address_checksum: true
        }
    }
}

fn parse_usize(obj: &json::JsonValue,name: &str) -> Result<usize,DYNERR> {
    if let Some(val) = obj.as_usize() {
        return Ok(val);
    }
    log::error!("{} should be a number",name);
    return Err(Box::new(img::Error::MetadataMismatch));
}

fn parse_str<'a>(obj: &'a json::JsonValue,name: &str) -> Result<&'a str,DYNERR> {
    if let Some(s) = obj.as_str() {
        return Ok(s);
    }
    log::error!("{} should be a string",name);
    return Err(Box::new(img::Error::MetadataMismatch));
}

fn parse_interleave(obj: &json::JsonValue) -> Result<Interleave,DYNERR> {
    if obj.is_array() {
        if obj.len() != 16 {
            log::error!("interleave list should have 16 entries");
            return Err(Box::new(img::Error::MetadataMismatch));
        }
        let mut table = [0;16];
        for (i,slot) in obj.members().enumerate() {
            table[i] = parse_usize(slot,"interleave slot")?;
        }
        return Ok(Interleave::custom(table)?);
    }
    Ok(Interleave::from_str(parse_str(obj,"interleave")?)?)
}

impl DecodeOptions {
    /// Read options from a JSON string, keys that are not given keep their defaults.
    pub fn from_json(json_str: &str) -> Result<Self,DYNERR> {
        let parsed = json::parse(json_str)?;
        if !parsed.is_object() {
            log::error!("decode options should be a JSON object");
            return Err(Box::new(img::Error::MetadataMismatch));
        }
        let mut ans = Self::default();
        for (key,val) in parsed.entries() {
            match key {
                "interleave" => ans.interleave = parse_interleave(val)?,
                "fractional" => ans.fractional = FractionalTracks::from_str(parse_str(val,key)?)?,
                "max_tracks" => ans.max_tracks = parse_usize(val,key)?,
                "verify_address_checksum" => match val.as_bool() {
                    Some(b) => ans.verify_address_checksum = b,
                    None => {
                        log::error!("{} should be true or false",key);
                        return Err(Box::new(img::Error::MetadataMismatch));
                    }
                },
                _ => {
                    log::error!("unknown decode option {}",key);
                    return Err(Box::new(img::Error::MetadataMismatch));
                }
            }
        }
        ans.check()?;
        Ok(ans)
    }
    /// Make sure the track capacity is sensible
    pub fn check(&self) -> Result<(),DYNERR> {
        if self.max_tracks == 0 || self.max_tracks > TRACK_LIMIT {
            log::error!("track capacity must be from 1 to {}",TRACK_LIMIT);
            return Err(Box::new(img::Error::MetadataMismatch));
        }
        Ok(())
    }
}

#[test]
fn options_from_json() {
    let opts = DecodeOptions::from_json("{\"interleave\":\"dos\",\"fractional\":\"skip\",\"max_tracks\":35}").expect("parse failed");
    assert_eq!(opts.interleave,Interleave::dos());
    assert_eq!(opts.fractional,FractionalTracks::Skip);
    assert_eq!(opts.max_tracks,35);
    assert!(opts.verify_address_checksum);
    let opts = DecodeOptions::from_json("{\"verify_address_checksum\":false}").expect("parse failed");
    assert!(!opts.verify_address_checksum);
    assert_eq!(opts.interleave,Interleave::prodos());
    assert!(DecodeOptions::from_json("{\"verify_address_checksum\":\"no\"}").is_err());
}

#[test]
fn options_custom_interleave() {
    let opts = DecodeOptions::from_json("{\"interleave\":[0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15]}").expect("parse failed");
    assert_eq!(opts.interleave.sector_offset(9).unwrap(),9);
    assert!(DecodeOptions::from_json("{\"interleave\":[0,0,2,3,4,5,6,7,8,9,10,11,12,13,14,15]}").is_err());
}

#[test]
fn options_rejected() {
    assert!(DecodeOptions::from_json("{\"skew\":\"dos\"}").is_err());
    assert!(DecodeOptions::from_json("{\"max_tracks\":0}").is_err());
    assert!(DecodeOptions::from_json("{\"fractional\":\"sometimes\"}").is_err());
    assert!(DecodeOptions::from_json("[1,2]").is_err());
}
