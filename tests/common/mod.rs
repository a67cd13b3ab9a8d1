// Builders for synthetic captures.  Tracks are laid out the way DOS 3.3 INIT
// lays them out: a leading sync run, then address field, short gap, data field,
// longer gap, for each sector.
#![allow(dead_code)]

use nibkit::img::nibbles;
use nibkit::img::fields;

pub fn address_field(vol: u8,trk: u8,sec: u8) -> Vec<u8> {
    let mut ans = fields::ADDR_PROLOG.to_vec();
    for val in [vol,trk,sec,vol^trk^sec] {
        ans.extend_from_slice(&nibbles::encode_44(val));
    }
    ans.extend_from_slice(&fields::EPILOG);
    ans
}

pub fn data_field(dat: &[u8;256]) -> Vec<u8> {
    let mut ans = fields::DATA_PROLOG.to_vec();
    ans.append(&mut nibbles::encode_sector_62(dat));
    ans.extend_from_slice(&fields::EPILOG);
    ans
}

/// One sector with its trailing gap
pub fn sector(vol: u8,trk: u8,sec: u8,dat: &[u8;256]) -> Vec<u8> {
    let mut ans = address_field(vol,trk,sec);
    ans.extend_from_slice(&[0xff;6]);
    ans.append(&mut data_field(dat));
    ans.extend_from_slice(&[0xff;27]);
    ans
}

/// A full 16 sector track, sector `s` is filled with `fill(s)`.
pub fn track(vol: u8,trk: u8,fill: impl Fn(u8) -> u8) -> Vec<u8> {
    let mut ans = vec![0xff;64];
    for s in 0..16 {
        ans.append(&mut sector(vol,trk,s,&[fill(s);256]));
    }
    ans
}

/// Wrap track records as a V2D capture, records are (quarter track, nibbles).
pub fn capture(records: &[(u16,Vec<u8>)]) -> Vec<u8> {
    capture_declaring(records.len() as u16,records)
}

/// Same as `capture` but the header may lie about the record count.
pub fn capture_declaring(declared: u16,records: &[(u16,Vec<u8>)]) -> Vec<u8> {
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(&u16::to_be_bytes(declared));
    for (quarter,nibs) in records {
        body.extend_from_slice(&u16::to_be_bytes(*quarter));
        body.extend_from_slice(&u16::to_be_bytes(nibs.len() as u16));
        body.extend_from_slice(nibs);
    }
    let mut ans = u32::to_be_bytes(body.len() as u32).to_vec();
    ans.extend_from_slice(b"D5NI");
    ans.append(&mut body);
    ans
}
