//! ## Field scanner
//!
//! Locates the address and data fields of a 16 sector track within the raw nibble stream.
//! Fields are framed by fixed prolog and epilog markers and separated by runs of sync bytes.
//! The scanner is stateless: every call starts at a cursor supplied by the caller and
//! reports how far it got, pass or fail, so the caller can always compute the next cursor.
//! Nothing in here panics on malformed tracks.

use crate::img::NibbleError;
use super::nibbles;

pub const ADDR_PROLOG: [u8;3] = [0xd5,0xaa,0x96];
pub const DATA_PROLOG: [u8;3] = [0xd5,0xaa,0xad];
pub const EPILOG: [u8;3] = [0xde,0xaa,0xeb];
/// self-sync filler between fields
pub const SYNC_BYTE: u8 = 0xff;
/// epilog of the address field starts this many bytes after the prolog
pub const ADDR_EPILOG_OFFSET: usize = 11;
/// epilog of the data field starts this many bytes after the prolog
pub const DATA_EPILOG_OFFSET: usize = 346;
pub const ADDR_FIELD_LEN: usize = ADDR_EPILOG_OFFSET + EPILOG.len();
pub const DATA_FIELD_LEN: usize = DATA_EPILOG_OFFSET + EPILOG.len();

/// Outcome of scanning one field.  The cursor for the next scan is the starting cursor
/// plus `consumed`, whether or not the scan succeeded.
pub struct Scan<T> {
    pub consumed: usize,
    pub outcome: Result<T,NibbleError>
}

impl<T> Scan<T> {
    fn fail(consumed: usize,err: NibbleError) -> Self {
        Self { consumed, outcome: Err(err) }
    }
}

/// Decoded contents of an address field
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub struct AddressField {
    pub volume: u8,
    pub track: u8,
    pub sector: u8,
    pub checksum: u8
}

impl AddressField {
    /// the stored checksum is the XOR of the other three values
    pub fn checksum_ok(&self) -> bool {
        self.volume ^ self.track ^ self.sector == self.checksum
    }
}

/// Count the sync bytes starting at `ptr`.
pub fn skip_sync(nibs: &[u8],ptr: usize) -> usize {
    let mut count = 0;
    while ptr + count < nibs.len() && nibs[ptr + count] == SYNC_BYTE {
        count += 1;
    }
    count
}

/// See if `patt` appears at `ptr`, false if the track ends first.
pub fn match_bytes(nibs: &[u8],ptr: usize,patt: &[u8]) -> bool {
    match nibs.get(ptr..ptr + patt.len()) {
        Some(slice) => slice == patt,
        None => false
    }
}

/// Bytes at `ptr` for display, truncated at the end of the track.
fn peek(nibs: &[u8],ptr: usize,len: usize) -> &[u8] {
    let end = usize::min(ptr + len,nibs.len());
    &nibs[usize::min(ptr,end)..end]
}

/// Consumed bytes for a failure past the prolog, never beyond the end of the track.
fn clip(nibs: &[u8],ptr: usize,len: usize) -> usize {
    usize::min(len,nibs.len().saturating_sub(ptr))
}

/// Scan an address field whose prolog is expected at `ptr`.
/// A prolog mismatch consumes one byte, any later failure consumes the whole field.
pub fn scan_address(nibs: &[u8],ptr: usize) -> Scan<AddressField> {
    if !match_bytes(nibs,ptr,&ADDR_PROLOG) {
        log::trace!("no address prolog at {}",ptr);
        return Scan::fail(clip(nibs,ptr,1),NibbleError::MarkerMismatch);
    }
    if ptr + ADDR_FIELD_LEN > nibs.len() {
        return Scan::fail(clip(nibs,ptr,ADDR_FIELD_LEN),NibbleError::Truncated);
    }
    if !match_bytes(nibs,ptr + ADDR_EPILOG_OFFSET,&EPILOG) {
        log::trace!("address epilog mismatch at {}: {}",ptr,hex::encode(&nibs[ptr..ptr+ADDR_FIELD_LEN]));
        return Scan::fail(ADDR_FIELD_LEN,NibbleError::EpilogueMismatch);
    }
    let field = AddressField {
        volume: nibbles::decode_44(nibs,ptr + 3),
        track: nibbles::decode_44(nibs,ptr + 5),
        sector: nibbles::decode_44(nibs,ptr + 7),
        checksum: nibbles::decode_44(nibs,ptr + 9)
    };
    log::trace!("address field at {}: {:?}",ptr,field);
    Scan { consumed: ADDR_FIELD_LEN, outcome: Ok(field) }
}

/// Scan a data field whose prolog is expected at `ptr`, returning the 256 byte payload.
/// A prolog mismatch consumes one byte, any later failure consumes the whole field.
pub fn scan_data(nibs: &[u8],ptr: usize) -> Scan<[u8;256]> {
    if !match_bytes(nibs,ptr,&DATA_PROLOG) {
        log::trace!("no data prolog at {}: {}",ptr,hex::encode(peek(nibs,ptr,3)));
        return Scan::fail(clip(nibs,ptr,1),NibbleError::MarkerMismatch);
    }
    if ptr + DATA_FIELD_LEN > nibs.len() {
        return Scan::fail(clip(nibs,ptr,DATA_FIELD_LEN),NibbleError::Truncated);
    }
    if !match_bytes(nibs,ptr + DATA_EPILOG_OFFSET,&EPILOG) {
        log::trace!("data epilog mismatch at {}: {}",ptr,hex::encode(&nibs[ptr+DATA_EPILOG_OFFSET..ptr+DATA_FIELD_LEN]));
        return Scan::fail(DATA_FIELD_LEN,NibbleError::EpilogueMismatch);
    }
    let (dat,chksum) = match nibbles::decode_sector_62(nibs,ptr + DATA_PROLOG.len()) {
        Ok(res) => res,
        Err(e) => return Scan::fail(DATA_FIELD_LEN,e)
    };
    // the checksum nibble itself must be valid, and must match the chain
    match nibbles::decode_62(nibs[ptr + DATA_EPILOG_OFFSET - 1]) {
        Ok(stored) if stored==chksum => Scan { consumed: DATA_FIELD_LEN, outcome: Ok(dat) },
        Ok(stored) => {
            log::trace!("data checksum at {}: expected {:02X}, found {:02X}",ptr,chksum,stored);
            Scan::fail(DATA_FIELD_LEN,NibbleError::BadChecksum)
        },
        Err(_) => Scan::fail(DATA_FIELD_LEN,NibbleError::BadChecksum)
    }
}

#[cfg(test)]
fn address_bytes(vol: u8,trk: u8,sec: u8) -> Vec<u8> {
    let mut ans = ADDR_PROLOG.to_vec();
    for val in [vol,trk,sec,vol^trk^sec] {
        ans.extend_from_slice(&nibbles::encode_44(val));
    }
    ans.extend_from_slice(&EPILOG);
    ans
}

#[test]
fn sync_run() {
    let buf = [0xff,0xff,0xff,0xd5,0xff];
    assert_eq!(skip_sync(&buf,0),3);
    assert_eq!(skip_sync(&buf,3),0);
    assert_eq!(skip_sync(&buf,4),1);
    assert_eq!(skip_sync(&buf,5),0);
}

#[test]
fn address_ok() {
    let mut buf = vec![0xff;4];
    buf.append(&mut address_bytes(254,17,15));
    let scan = scan_address(&buf,4);
    assert_eq!(scan.consumed,ADDR_FIELD_LEN);
    let addr = scan.outcome.expect("address scan failed");
    assert_eq!([addr.volume,addr.track,addr.sector],[254,17,15]);
    assert!(addr.checksum_ok());
}

#[test]
fn address_prolog_mismatch_advances_one() {
    let buf = address_bytes(254,0,0);
    let scan = scan_address(&buf,1);
    assert_eq!(scan.consumed,1);
    assert!(matches!(scan.outcome,Err(NibbleError::MarkerMismatch)));
}

#[test]
fn address_truncated() {
    let buf = address_bytes(254,0,0);
    let scan = scan_address(&buf[0..10],0);
    assert_eq!(scan.consumed,10);
    assert!(matches!(scan.outcome,Err(NibbleError::Truncated)));
}

#[test]
fn data_ok_and_bad_checksum() {
    let mut buf = DATA_PROLOG.to_vec();
    buf.append(&mut nibbles::encode_sector_62(&[0x42;256]));
    buf.extend_from_slice(&EPILOG);
    let scan = scan_data(&buf,0);
    assert_eq!(scan.consumed,DATA_FIELD_LEN);
    assert_eq!(scan.outcome.expect("data scan failed"),[0x42;256]);
    buf[DATA_EPILOG_OFFSET-1] = match buf[DATA_EPILOG_OFFSET-1] { 0x96 => 0x97, _ => 0x96 };
    let scan = scan_data(&buf,0);
    assert_eq!(scan.consumed,DATA_FIELD_LEN);
    assert!(matches!(scan.outcome,Err(NibbleError::BadChecksum)));
}
