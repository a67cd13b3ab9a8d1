//! ## Track decoder
//!
//! Runs over the nibbles of one track, alternating between seeking an address field and
//! seeking the data field that follows it.  Sectors are yielded as they are found, so that
//! the caller can place them immediately.  Any failure abandons the rest of the track, but
//! sectors already yielded stand.  There is no attempt to resynchronize after a bad field.

use crate::img::NibbleError;
use super::fields;
use super::fields::AddressField;

/// a track begins with this if the capture started just before the end of an epilog
const OVERRUN_BYTE: u8 = 0xeb;

/// A sector whose address field and data field both passed every check.
#[derive(Clone)]
pub struct DecodedSector {
    pub volume: u8,
    pub track: u8,
    /// physical sector as recorded in the address field
    pub sector: u8,
    pub data: [u8;256]
}

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
enum State {
    SeekAddress,
    SeekData(AddressField),
    Halted
}

/// Iterates over the good sectors of a track.  After the iterator is exhausted,
/// `failure` tells whether the whole track was traversed.
pub struct TrackDecoder<'a> {
    nibs: &'a [u8],
    ptr: usize,
    state: State,
    verify_addr: bool,
    failure: Option<NibbleError>
}

impl<'a> TrackDecoder<'a> {
    /// Create a decoder for `nibs`.  If `verify_addr` is true an address field must carry
    /// a consistent checksum to be accepted.
    pub fn new(nibs: &'a [u8],verify_addr: bool) -> Self {
        let mut ptr = 0;
        if nibs.first()==Some(&OVERRUN_BYTE) {
            log::warn!("track begins with overrun byte, skipping");
            ptr += 1;
        }
        Self {
            nibs,
            ptr,
            state: State::SeekAddress,
            verify_addr,
            failure: None
        }
    }
    /// The error that stopped decoding, or None if the track was fully traversed
    /// (or has not been exhausted yet).
    pub fn failure(&self) -> Option<NibbleError> {
        self.failure
    }
    /// Current cursor into the track nibbles
    pub fn position(&self) -> usize {
        self.ptr
    }
    fn abandon(&mut self,err: NibbleError) -> Option<DecodedSector> {
        log::debug!("abandon track at {}: {}",self.ptr,err);
        self.failure = Some(err);
        self.state = State::Halted;
        None
    }
    fn accept_address(&self,addr: &AddressField) -> bool {
        if self.verify_addr && !addr.checksum_ok() {
            log::debug!("address checksum mismatch {:?}",addr);
            return false;
        }
        if addr.sector > 15 {
            log::debug!("sector {} out of range",addr.sector);
            return false;
        }
        true
    }
}

impl<'a> Iterator for TrackDecoder<'a> {
    type Item = DecodedSector;
    fn next(&mut self) -> Option<DecodedSector> {
        loop {
            if self.state==State::Halted {
                return None;
            }
            self.ptr += fields::skip_sync(self.nibs,self.ptr);
            match self.state {
                State::SeekAddress => {
                    if self.ptr >= self.nibs.len() {
                        self.state = State::Halted;
                        return None;
                    }
                    let scan = fields::scan_address(self.nibs,self.ptr);
                    match scan.outcome {
                        Ok(addr) if self.accept_address(&addr) => {
                            self.ptr += scan.consumed;
                            self.state = State::SeekData(addr);
                        },
                        Ok(_) => return self.abandon(NibbleError::BadAddress),
                        Err(e) => return self.abandon(e)
                    }
                },
                State::SeekData(addr) => {
                    let scan = fields::scan_data(self.nibs,self.ptr);
                    match scan.outcome {
                        Ok(data) => {
                            self.ptr += scan.consumed;
                            self.state = State::SeekAddress;
                            log::trace!("found track {} sector {}",addr.track,addr.sector);
                            return Some(DecodedSector {
                                volume: addr.volume,
                                track: addr.track,
                                sector: addr.sector,
                                data
                            });
                        },
                        Err(e) => return self.abandon(e)
                    }
                },
                State::Halted => {}
            }
        }
    }
}

#[cfg(test)]
fn sector_bytes(vol: u8,trk: u8,sec: u8,val: u8) -> Vec<u8> {
    use super::nibbles;
    let mut ans = fields::ADDR_PROLOG.to_vec();
    for x in [vol,trk,sec,vol^trk^sec] {
        ans.extend_from_slice(&nibbles::encode_44(x));
    }
    ans.extend_from_slice(&fields::EPILOG);
    ans.extend_from_slice(&[0xff;6]);
    ans.extend_from_slice(&fields::DATA_PROLOG);
    ans.append(&mut nibbles::encode_sector_62(&[val;256]));
    ans.extend_from_slice(&fields::EPILOG);
    ans.extend_from_slice(&[0xff;20]);
    ans
}

#[test]
fn whole_track() {
    let mut nibs = vec![0xff;48];
    for sec in 0..16 {
        nibs.append(&mut sector_bytes(254,7,sec,sec*3));
    }
    let mut decoder = TrackDecoder::new(&nibs,true);
    let secs: Vec<DecodedSector> = decoder.by_ref().collect();
    assert_eq!(secs.len(),16);
    for (i,sec) in secs.iter().enumerate() {
        assert_eq!(sec.track,7);
        assert_eq!(sec.sector as usize,i);
        assert_eq!(sec.data,[i as u8 * 3;256]);
    }
    assert_eq!(decoder.failure(),None);
    assert_eq!(decoder.position(),nibs.len());
}

#[test]
fn partial_track_keeps_earlier_sectors() {
    let mut nibs = sector_bytes(254,0,0,1);
    let mut bad = sector_bytes(254,0,1,2);
    bad[30] = 0x00;
    nibs.append(&mut bad);
    nibs.append(&mut sector_bytes(254,0,2,3));
    let mut decoder = TrackDecoder::new(&nibs,true);
    let secs: Vec<DecodedSector> = decoder.by_ref().collect();
    assert_eq!(secs.len(),1);
    assert_eq!(secs[0].sector,0);
    assert_eq!(decoder.failure(),Some(NibbleError::InvalidByte));
}

#[test]
fn overrun_and_bad_address_checksum() {
    let mut nibs = vec![0xeb,0xff,0xff];
    let mut sec = sector_bytes(254,0,0,1);
    // corrupt the checksum pair
    sec[9] = 0xaa;
    sec[10] = 0xaa;
    nibs.append(&mut sec);
    let mut decoder = TrackDecoder::new(&nibs,true);
    assert!(decoder.next().is_none());
    assert_eq!(decoder.failure(),Some(NibbleError::BadAddress));
    let mut lenient = TrackDecoder::new(&nibs,false);
    assert!(lenient.next().is_some());
    assert!(lenient.next().is_none());
    assert_eq!(lenient.failure(),None);
}

#[test]
fn orphan_address_at_end_of_track() {
    let nibs = sector_bytes(254,0,0,1);
    let cut = nibs.len() - 200;
    let mut decoder = TrackDecoder::new(&nibs[0..cut],true);
    assert!(decoder.next().is_none());
    assert_eq!(decoder.failure(),Some(NibbleError::Truncated));
}
