//! ## Support for V2D captures
//!
//! A V2D file holds the nibbles of every track exactly as they were written.
//! All multi-byte fields are big endian.
//!
//! Offset | Meaning
//! -------|--------
//! 0000   | length of the capture from offset 8 to the end (4 bytes)
//! 0004   | format tag, always `D5NI`
//! 0008   | number of track records (2 bytes)
//! 000A   | track records
//!
//! Each track record is a quarter track index (2 bytes), a length `L` (2 bytes), then `L`
//! nibbles.  The index is the track times 4, so ordinary tracks are 0, 4, 8, etc., and half
//! tracks are 2, 6, etc.
//!
//! The whole capture is read and checked before any track is decoded, so a truncated
//! capture yields an error rather than a partial image.  The `binrw` crate is used to read
//! the structures.

use std::io::Cursor;
use binrw::BinRead;
use crate::img;
use crate::img::assemble::{Assembler,SectorImage};
use crate::config::{DecodeOptions,FractionalTracks};
use crate::DYNERR;

pub const FORMAT_TAG: [u8;4] = *b"D5NI";
/// bytes of the header that are not counted in the capture length
const LENGTH_BASE: u64 = 8;

pub fn file_extensions() -> Vec<String> {
    vec!["v2d".to_string()]
}

#[derive(BinRead,Debug,Clone)]
#[br(big)]
pub struct Header {
    pub length: u32,
    pub tag: [u8;4],
    pub tracks: u16
}

#[derive(BinRead,Debug,Clone)]
#[br(big)]
pub struct TrackRecord {
    /// track index in units of quarter tracks
    pub quarter: u16,
    len: u16,
    #[br(count = len)]
    pub nibs: Vec<u8>
}

impl TrackRecord {
    pub fn track(&self) -> usize {
        self.quarter as usize / 4
    }
    pub fn is_fractional(&self) -> bool {
        self.quarter % 4 != 0
    }
}

pub struct Capture {
    pub header: Header,
    pub records: Vec<TrackRecord>
}

impl Capture {
    /// Read the header and every track record, error if anything declared is missing.
    pub fn from_bytes(buf: &[u8]) -> Result<Self,DYNERR> {
        let mut cursor = Cursor::new(buf);
        let header = match Header::read(&mut cursor) {
            Ok(h) => h,
            Err(e) => {
                log::error!("capture header could not be read: {}",e);
                return Err(Box::new(img::Error::HeaderTruncated));
            }
        };
        if header.tag != FORMAT_TAG {
            log::warn!("unexpected format tag {}",hex::encode(header.tag));
        }
        if header.length as u64 + LENGTH_BASE != buf.len() as u64 {
            log::warn!("capture length is {}, header says {}",buf.len() as u64 - LENGTH_BASE,header.length);
        }
        log::info!("capture declares {} track records",header.tracks);
        let mut records = Vec::new();
        for i in 0..header.tracks {
            if cursor.position() >= buf.len() as u64 {
                log::error!("capture ends after {} of {} track records",i,header.tracks);
                return Err(Box::new(img::Error::TrackCountMismatch));
            }
            match TrackRecord::read(&mut cursor) {
                Ok(rec) => {
                    log::trace!("track record {}: index {}, {} nibbles",i,rec.quarter,rec.nibs.len());
                    records.push(rec);
                },
                Err(e) => {
                    log::error!("track record {} is truncated: {}",i,e);
                    return Err(Box::new(img::Error::TrackRecordTruncated));
                }
            }
        }
        if cursor.position() < buf.len() as u64 {
            log::debug!("ignoring {} bytes after the last track record",buf.len() as u64 - cursor.position());
        }
        Ok(Self { header, records })
    }
    pub fn from_file(path: &str) -> Result<Self,DYNERR> {
        let buf = std::fs::read(path)?;
        Self::from_bytes(&buf)
    }
    /// Decode every track record into a fresh image.  Track failures are recorded
    /// in the image's reports, only unusable options are an error.
    pub fn decode(&self,opts: &DecodeOptions) -> Result<SectorImage,DYNERR> {
        opts.check()?;
        let mut asm = Assembler::new(opts.max_tracks,opts.interleave)?;
        for rec in &self.records {
            if rec.is_fractional() && opts.fractional==FractionalTracks::Skip {
                asm.skip_track(rec.quarter);
                continue;
            }
            asm.add_track(rec.quarter,&rec.nibs,opts.verify_address_checksum);
        }
        let img = asm.finish();
        log::info!("{} of {} track records yielded sectors",img.good_tracks(),self.records.len());
        Ok(img)
    }
}

#[test]
fn header_only() {
    let buf = [0,0,0,2,b'D',b'5',b'N',b'I',0,0];
    let capture = Capture::from_bytes(&buf).expect("could not read header");
    assert_eq!(capture.header.tracks,0);
    assert_eq!(capture.records.len(),0);
    assert!(Capture::from_bytes(&buf[0..9]).is_err());
}

#[test]
fn short_record() {
    let buf = [0,0,0,9,b'D',b'5',b'N',b'I',0,1,0,4,0,3,0xff,0xff];
    match Capture::from_bytes(&buf) {
        Err(e) => assert_eq!(e.to_string(),"track record is shorter than its declared length"),
        Ok(_) => panic!("truncated record was accepted")
    }
}

#[test]
fn decode_checks_options() {
    let buf = [0,0,0,2,b'D',b'5',b'N',b'I',0,0];
    let capture = Capture::from_bytes(&buf).expect("could not read header");
    let mut opts = DecodeOptions::default();
    opts.max_tracks = usize::MAX/1000;
    assert!(capture.decode(&opts).is_err());
    opts.max_tracks = 0;
    assert!(capture.decode(&opts).is_err());
    opts.max_tracks = 35;
    assert_eq!(capture.decode(&opts).expect("decode failed").track_count(),35);
}
