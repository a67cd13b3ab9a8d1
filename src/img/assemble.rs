//! ## Disk image assembler
//!
//! Owns the flat sector buffer while decoding is in progress.  The buffer is sized once,
//! from the track capacity requested up front, and is never resized.  Every placement is
//! bounds checked.  When all tracks are in, the assembler is consumed to produce an
//! immutable `SectorImage`.

use std::fmt;
use crate::bios::skew::{Interleave,SECTORS_PER_TRACK};
use crate::img::{Error,NibbleError};
use crate::{STDRESULT,DYNERR};
use crate::config::TRACK_LIMIT;
use super::track::{DecodedSector,TrackDecoder};

pub const SECTOR_SIZE: usize = 256;
pub const TRACK_CAPACITY: usize = SECTOR_SIZE * SECTORS_PER_TRACK;

/// How decoding of a track record ended
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum TrackEnd {
    /// every byte of the track was accounted for
    Complete,
    /// a field failed, sectors before it were kept
    Abandoned(NibbleError),
    /// a sector claimed a track beyond the capacity of the image
    OutOfBounds,
    /// fractional track that was not decoded by request
    Skipped
}

impl fmt::Display for TrackEnd {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f,"complete"),
            Self::Abandoned(e) => write!(f,"abandoned: {}",e),
            Self::OutOfBounds => write!(f,"track out of bounds"),
            Self::Skipped => write!(f,"skipped")
        }
    }
}

/// Outcome of decoding one track record
#[derive(Clone,Debug)]
pub struct TrackReport {
    /// track index in quarter tracks, as stored in the capture
    pub quarter: u16,
    /// count of sectors placed in the image
    pub sectors: usize,
    pub end: TrackEnd
}

impl TrackReport {
    /// logical track derived from the quarter track index
    pub fn track(&self) -> usize {
        self.quarter as usize / 4
    }
    /// true for half and quarter tracks
    pub fn is_fractional(&self) -> bool {
        self.quarter % 4 != 0
    }
}

pub struct Assembler {
    buf: Vec<u8>,
    tracks: usize,
    interleave: Interleave,
    good_tracks: usize,
    reports: Vec<TrackReport>
}

impl Assembler {
    /// Allocate a zeroed image holding `tracks` tracks of 16 sectors.
    pub fn new(tracks: usize,interleave: Interleave) -> Result<Self,DYNERR> {
        let len = match tracks.checked_mul(TRACK_CAPACITY) {
            Some(l) if tracks > 0 && tracks <= TRACK_LIMIT => l,
            _ => {
                log::error!("cannot allocate an image of {} tracks",tracks);
                return Err(Box::new(Error::GeometryMismatch));
            }
        };
        log::debug!("allocate {} tracks, {} interleave",tracks,interleave);
        Ok(Self {
            buf: vec![0;len],
            tracks,
            interleave,
            good_tracks: 0,
            reports: Vec::new()
        })
    }
    /// Byte offset of a sector in the image, or an error if it falls outside.
    pub fn sector_offset(&self,track: usize,psec: usize) -> Result<usize,DYNERR> {
        if track >= self.tracks {
            log::debug!("track {} exceeds capacity of {}",track,self.tracks);
            return Err(Box::new(Error::GeometryMismatch));
        }
        let slot = self.interleave.sector_offset(psec)?;
        Ok(track * TRACK_CAPACITY + slot * SECTOR_SIZE)
    }
    /// Copy a decoded sector into the image.  Last write wins.
    pub fn place(&mut self,sec: &DecodedSector) -> STDRESULT {
        let offset = self.sector_offset(sec.track as usize,sec.sector as usize)?;
        self.buf[offset..offset+SECTOR_SIZE].copy_from_slice(&sec.data);
        Ok(())
    }
    /// Decode the nibbles of one track record and place whatever sectors are found.
    pub fn add_track(&mut self,quarter: u16,nibs: &[u8],verify_addr: bool) -> &TrackReport {
        let mut decoder = TrackDecoder::new(nibs,verify_addr);
        let mut sectors = 0;
        let mut end = TrackEnd::Complete;
        while let Some(sec) = decoder.next() {
            if sec.track as usize != quarter as usize / 4 {
                log::debug!("track {} found on track record {}",sec.track,quarter);
            }
            if self.place(&sec).is_err() {
                log::warn!("track record {}: sector {} of track {} cannot be placed",quarter,sec.sector,sec.track);
                end = TrackEnd::OutOfBounds;
                break;
            }
            sectors += 1;
        }
        if let Some(e) = decoder.failure() {
            end = TrackEnd::Abandoned(e);
        }
        if sectors > 0 {
            self.good_tracks += 1;
        }
        match (sectors,end) {
            (0,TrackEnd::Complete) => log::debug!("track record {} holds no sectors",quarter),
            (0,e) => log::warn!("track record {} failed, {}",quarter,e),
            (n,e) => log::debug!("track record {}: {} sectors, {}",quarter,n,e)
        }
        self.reports.push(TrackReport { quarter, sectors, end });
        &self.reports[self.reports.len()-1]
    }
    /// Record a track that was deliberately not decoded.
    pub fn skip_track(&mut self,quarter: u16) {
        log::debug!("skipping fractional track record {}",quarter);
        self.reports.push(TrackReport { quarter, sectors: 0, end: TrackEnd::Skipped });
    }
    pub fn finish(self) -> SectorImage {
        SectorImage {
            buf: self.buf,
            tracks: self.tracks,
            interleave: self.interleave,
            good_tracks: self.good_tracks,
            reports: self.reports
        }
    }
}

/// The recovered logical image.  Sectors that never decoded are zero.
pub struct SectorImage {
    buf: Vec<u8>,
    tracks: usize,
    interleave: Interleave,
    good_tracks: usize,
    reports: Vec<TrackReport>
}

impl SectorImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
    /// Give up the image buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
    /// capacity of the image in tracks, not necessarily the tracks in the capture
    pub fn track_count(&self) -> usize {
        self.tracks
    }
    /// count of track records that yielded at least one sector
    pub fn good_tracks(&self) -> usize {
        self.good_tracks
    }
    pub fn interleave(&self) -> &Interleave {
        &self.interleave
    }
    pub fn reports(&self) -> &[TrackReport] {
        &self.reports
    }
    /// Get the sector in `slot` of `track`, the slot being the position after interleave.
    pub fn read_sector(&self,track: usize,slot: usize) -> Option<&[u8]> {
        if track >= self.tracks || slot >= SECTORS_PER_TRACK {
            return None;
        }
        let offset = track * TRACK_CAPACITY + slot * SECTOR_SIZE;
        Some(&self.buf[offset..offset+SECTOR_SIZE])
    }
    /// Summarize the decoding in a JSON string, pass `indent` for pretty printing.
    pub fn to_json(&self,indent: Option<u16>) -> Result<String,DYNERR> {
        let mut root = json::JsonValue::new_object();
        root["interleave"] = json::JsonValue::String(self.interleave.to_string());
        let mut slots = json::JsonValue::new_array();
        for slot in self.interleave.table() {
            slots.push(*slot)?;
        }
        root["slots"] = slots;
        root["track_capacity"] = json::JsonValue::Number(self.tracks.into());
        root["good_tracks"] = json::JsonValue::Number(self.good_tracks.into());
        let mut trk_ary = json::JsonValue::new_array();
        for rep in &self.reports {
            let mut trk_obj = json::JsonValue::new_object();
            trk_obj["quarter"] = json::JsonValue::Number(rep.quarter.into());
            trk_obj["track"] = json::JsonValue::Number((rep.quarter as f64 / 4.0).into());
            trk_obj["sectors"] = json::JsonValue::Number(rep.sectors.into());
            trk_obj["status"] = json::JsonValue::String(rep.end.to_string());
            trk_ary.push(trk_obj)?;
        }
        root["tracks"] = trk_ary;
        if let Some(spaces) = indent {
            Ok(json::stringify_pretty(root,spaces))
        } else {
            Ok(json::stringify(root))
        }
    }
}

#[test]
fn offsets_follow_interleave() {
    let asm = Assembler::new(35,Interleave::prodos()).expect("allocation failed");
    assert_eq!(asm.sector_offset(3,5).unwrap(),3*4096 + 10*256);
    assert!(asm.sector_offset(35,0).is_err());
    assert!(asm.sector_offset(0,16).is_err());
    let asm = Assembler::new(35,Interleave::dos()).expect("allocation failed");
    assert_eq!(asm.sector_offset(1,1).unwrap(),4096 + 7*256);
}

#[test]
fn place_and_read_back() {
    let mut asm = Assembler::new(2,Interleave::dos()).expect("allocation failed");
    let sec = DecodedSector { volume: 254, track: 1, sector: 2, data: [0x5a;256] };
    asm.place(&sec).expect("placement failed");
    let bad = DecodedSector { volume: 254, track: 2, sector: 0, data: [0x5a;256] };
    assert!(asm.place(&bad).is_err());
    let img = asm.finish();
    assert_eq!(img.as_bytes().len(),2*TRACK_CAPACITY);
    assert_eq!(img.read_sector(1,14).unwrap(),&[0x5a;256]);
    assert_eq!(img.read_sector(1,2).unwrap(),&[0;256]);
    assert!(img.read_sector(2,0).is_none());
}

#[test]
fn unusable_capacity() {
    assert!(Assembler::new(0,Interleave::prodos()).is_err());
    assert!(Assembler::new(usize::MAX/1000,Interleave::prodos()).is_err());
    assert!(Assembler::new(TRACK_LIMIT,Interleave::prodos()).is_ok());
}
