//! ## Nibble translator
//!
//! The Disk II cannot store arbitrary bytes, every byte on the track has to have its high
//! bit set and avoid long runs of zeros.  Data is therefore written as "nibbles", bytes
//! drawn from a restricted alphabet.  Two encodings appear on a 16 sector track:
//! * 4&4, each byte of the address field is split over two nibbles, odd bits in the first,
//!   even bits in the second
//! * 6&2, the 256 byte sector is broken into 256 six-bit values and 86 nibbles holding the
//!   leftover pairs of low bits, followed by a checksum nibble
//!
//! The 6&2 routines follow the CiderPress `DecodeNibble62` scheme, with the checksum
//! comparison left to the caller.

use crate::img::NibbleError;

const INVALID_NIB_BYTE: u8 = 0xff;
/// count of auxiliary nibbles holding the low bit pairs
pub const CHUNK62: usize = 0x56;
/// count of nibbles encoding a sector, not including the checksum nibble
pub const SECTOR_NIBS_62: usize = CHUNK62 + 256;

const FWD_62: [u8;64] = [
    0x96, 0x97, 0x9a, 0x9b, 0x9d, 0x9e, 0x9f, 0xa6,
    0xa7, 0xab, 0xac, 0xad, 0xae, 0xaf, 0xb2, 0xb3,
    0xb4, 0xb5, 0xb6, 0xb7, 0xb9, 0xba, 0xbb, 0xbc,
    0xbd, 0xbe, 0xbf, 0xcb, 0xcd, 0xce, 0xcf, 0xd3,
    0xd6, 0xd7, 0xd9, 0xda, 0xdb, 0xdc, 0xdd, 0xde,
    0xdf, 0xe5, 0xe6, 0xe7, 0xe9, 0xea, 0xeb, 0xec,
    0xed, 0xee, 0xef, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6,
    0xf7, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd, 0xfe, 0xff
];

const REV_62: [u8;256] = [
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0x00,0x01,0xFF,0xFF,0x02,0x03,0xFF,0x04,0x05,0x06,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0x07,0x08,0xFF,0xFF,0xFF,0x09,0x0A,0x0B,0x0C,0x0D,
    0xFF,0xFF,0x0E,0x0F,0x10,0x11,0x12,0x13,0xFF,0x14,0x15,0x16,0x17,0x18,0x19,0x1A,
    0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0xFF,0x1B,0xFF,0x1C,0x1D,0x1E,
    0xFF,0xFF,0xFF,0x1F,0xFF,0xFF,0x20,0x21,0xFF,0x22,0x23,0x24,0x25,0x26,0x27,0x28,
    0xFF,0xFF,0xFF,0xFF,0xFF,0x29,0x2A,0x2B,0xFF,0x2C,0x2D,0x2E,0x2F,0x30,0x31,0x32,
    0xFF,0xFF,0x33,0x34,0x35,0x36,0x37,0x38,0xFF,0x39,0x3A,0x3B,0x3C,0x3D,0x3E,0x3F
];

/// encode a normal byte as two 4&4 nibbles
pub fn encode_44(val: u8) -> [u8;2] {
    return [(val >> 1) | 0xaa, val | 0xaa];
}

/// Decode the 4&4 nibble pair starting at `offset`.  There is no failure mode,
/// any pair yields a value, so the surrounding checksum has to vouch for it.
/// Panics if the pair runs past the end of `nibs`, callers check bounds first.
pub fn decode_44(nibs: &[u8],offset: usize) -> u8 {
    ((nibs[offset] << 1) | 0x01) & nibs[offset+1]
}

/// encode a 6-bit value as a 6&2 nibble
pub fn encode_62(val: u8) -> u8 {
    return FWD_62[(val & 0x3f) as usize];
}

/// decode a 6&2 nibble as a 6-bit value, invalid nibble will yield error
pub fn decode_62(nib: u8) -> Result<u8,NibbleError> {
    let ans = REV_62[nib as usize];
    if ans == INVALID_NIB_BYTE {
        Err(NibbleError::InvalidByte)
    } else {
        Ok(ans)
    }
}

/// Encode 256 bytes as 343 nibbles, the last being the checksum.
pub fn encode_sector_62(dat: &[u8;256]) -> Vec<u8> {
    let mut bak_buf: Vec<u8> = Vec::with_capacity(SECTOR_NIBS_62 + 1);
    let mut top: [u8;256] = [0;256];
    let mut twos: [u8;CHUNK62] = [0;CHUNK62];
    let mut two_shift = 0;
    let mut two_pos_n = CHUNK62-1;
    for i in 0..256 {
        let val = dat[i];
        top[i] = val >> 2;
        twos[two_pos_n] |= ((val & 1) << 1 | (val & 2) >> 1) << two_shift;
        if two_pos_n==0 {
            two_pos_n = CHUNK62;
            two_shift += 2;
        }
        two_pos_n -= 1;
    }
    let mut chksum = 0;
    for i in (0..CHUNK62).rev() {
        bak_buf.push(encode_62(twos[i] ^ chksum));
        chksum = twos[i];
    }
    for i in 0..256 {
        bak_buf.push(encode_62(top[i] ^ chksum));
        chksum = top[i];
    }
    bak_buf.push(encode_62(chksum));
    bak_buf
}

/// Decode the 342 nibbles starting at `offset` as 256 bytes.
/// Returns the sector along with the final value of the checksum chain, which the caller
/// compares against the checksum nibble that follows.  A nibble outside the 6&2 alphabet
/// yields `InvalidByte`, running out of nibbles yields `Truncated`.
pub fn decode_sector_62(nibs: &[u8],offset: usize) -> Result<([u8;256],u8),NibbleError> {
    if offset + SECTOR_NIBS_62 > nibs.len() {
        return Err(NibbleError::Truncated);
    }
    let bak_buf = &nibs[offset..offset+SECTOR_NIBS_62];
    let mut ans: [u8;256] = [0;256];
    // the last two entries only exist to absorb the overhang of the third pass
    let mut twos: [u8;CHUNK62*3] = [0;CHUNK62*3];
    let mut chksum: u8 = 0;
    for i in 0..CHUNK62 {
        chksum ^= decode_62(bak_buf[i])?;
        twos[i] = ((chksum & 0x01) << 1) | ((chksum & 0x02) >> 1);
        twos[i + CHUNK62] = ((chksum & 0x04) >> 1) | ((chksum & 0x08) >> 3);
        twos[i + CHUNK62*2] = ((chksum & 0x10) >> 3) | ((chksum & 0x20) >> 5);
    }
    for i in 0..256 {
        chksum ^= decode_62(bak_buf[CHUNK62 + i])?;
        ans[i] = (chksum << 2) | twos[i];
    }
    Ok((ans,chksum))
}

#[test]
fn every_byte_has_a_44_pair() {
    for val in 0..=255u8 {
        let nibs = encode_44(val);
        assert!(nibs[0] >= 0xaa && nibs[1] >= 0xaa);
        assert_eq!(decode_44(&nibs,0),val);
    }
}

#[test]
fn decode_44_at_offset() {
    // volume 254 as it appears on a DOS 3.3 disk
    let buf = [0xd5,0xaa,0x96,0xff,0xfe];
    assert_eq!(decode_44(&buf,3),254);
}

#[test]
fn rev_62_inverts_fwd_62() {
    for val in 0..64u8 {
        assert_eq!(decode_62(encode_62(val)).expect("bad nibble"),val);
    }
    let valid = (0..=255u8).filter(|b| decode_62(*b).is_ok()).count();
    assert_eq!(valid,64);
}

#[test]
fn sector_62_recovers_payload() {
    let mut dat = [0u8;256];
    for i in 0..256 {
        dat[i] = (i * 7 + 3) as u8;
    }
    let nibs = encode_sector_62(&dat);
    assert_eq!(nibs.len(),343);
    assert!(nibs.iter().all(|n| *n >= 0x96));
    let (ans,chksum) = decode_sector_62(&nibs,0).expect("decode failed");
    assert_eq!(ans,dat);
    assert_eq!(decode_62(nibs[342]).expect("bad nibble"),chksum);
}

#[test]
fn sector_62_invalid_nibble() {
    let mut nibs = encode_sector_62(&[0x42;256]);
    nibs[100] = 0xd5;
    match decode_sector_62(&nibs,0) {
        Err(NibbleError::InvalidByte) => {},
        _ => panic!("expected invalid byte")
    }
}

#[test]
fn sector_62_truncated() {
    let nibs = encode_sector_62(&[0;256]);
    match decode_sector_62(&nibs[0..300],0) {
        Err(NibbleError::Truncated) => {},
        _ => panic!("expected truncation")
    }
}
