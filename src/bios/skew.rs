//! ## Sector Skewing Module
//!
//! This contains the sector skew tables for 16 sector tracks, and the `Interleave` object
//! that maps a physical sector (as found in the address field) to its slot in the output
//! track.  The slot determines the byte offset, `slot * 256`, within the track.
//!
//! Two orderings are in common use, and the capture does not tell us which one the
//! consumer expects:
//! * ProDOS order (PO images), physical sectors land in slots `0 8 1 9 2 A 3 B 4 C 5 D 6 E 7 F`
//! * DOS order (DO images), physical sectors land in slots `0 7 E 6 D 5 C 4 B 3 A 2 9 1 8 F`
//!
//! Any other permutation can be supplied as a custom table.

use std::fmt;
use std::str::FromStr;
use super::Error;

pub const SECTORS_PER_TRACK: usize = 16;

/// Translate physical sector to ProDOS ordered slot
pub const PRODOS_PSEC_TO_SLOT: [usize;16] = [0,8,1,9,2,10,3,11,4,12,5,13,6,14,7,15];
/// Translate DOS 3.3 physical sector to logical sector
pub const DOS_PSEC_TO_DOS_LSEC: [usize;16] = [0,7,14,6,13,5,12,4,11,3,10,2,9,1,8,15];
/// Translate DOS 3.3 logical sector to physical sector
#[cfg(test)]
const DOS_LSEC_TO_DOS_PSEC: [usize;16] = [0,13,11,9,7,5,3,1,14,12,10,8,6,4,2,15];

#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub enum SkewKind {
    ProDOS,
    DOS,
    Custom
}

/// Physical to logical sector mapping, guaranteed to be a permutation of 0..16.
#[derive(Clone,Copy,PartialEq,Eq,Debug)]
pub struct Interleave {
    kind: SkewKind,
    table: [usize;16]
}

impl Interleave {
    pub fn prodos() -> Self {
        Self { kind: SkewKind::ProDOS, table: PRODOS_PSEC_TO_SLOT }
    }
    pub fn dos() -> Self {
        Self { kind: SkewKind::DOS, table: DOS_PSEC_TO_DOS_LSEC }
    }
    /// Create from an arbitrary table, which must be a permutation of 0..16.
    pub fn custom(table: [usize;16]) -> Result<Self,Error> {
        let mut seen = [false;SECTORS_PER_TRACK];
        for slot in table {
            if slot >= SECTORS_PER_TRACK || seen[slot] {
                log::error!("interleave table {:?} is not a permutation",table);
                return Err(Error::BadInterleave);
            }
            seen[slot] = true;
        }
        // a custom table that happens to be standard is reported as standard
        let kind = match table {
            PRODOS_PSEC_TO_SLOT => SkewKind::ProDOS,
            DOS_PSEC_TO_DOS_LSEC => SkewKind::DOS,
            _ => SkewKind::Custom
        };
        Ok(Self { kind, table })
    }
    pub fn kind(&self) -> SkewKind {
        self.kind
    }
    pub fn table(&self) -> &[usize;16] {
        &self.table
    }
    /// Slot within the track for physical sector `psec`, always in 0..16.
    pub fn sector_offset(&self,psec: usize) -> Result<usize,Error> {
        match self.table.get(psec) {
            Some(slot) => Ok(*slot),
            None => {
                log::debug!("physical sector {} out of range",psec);
                Err(Error::SectorAccess)
            }
        }
    }
}

impl Default for Interleave {
    fn default() -> Self {
        Self::prodos()
    }
}

impl FromStr for Interleave {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "prodos" | "po" => Ok(Self::prodos()),
            "dos" | "do" => Ok(Self::dos()),
            _ => Err(Error::BadInterleave)
        }
    }
}

impl fmt::Display for Interleave {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SkewKind::ProDOS => write!(f,"prodos"),
            SkewKind::DOS => write!(f,"dos"),
            SkewKind::Custom => write!(f,"custom {:?}",self.table)
        }
    }
}

#[test]
fn standard_tables_are_bijections() {
    for skew in [Interleave::prodos(),Interleave::dos()] {
        let mut slots: Vec<usize> = (0..16).map(|p| skew.sector_offset(p).expect("out of range")).collect();
        slots.sort();
        assert_eq!(slots,(0..16).collect::<Vec<usize>>());
    }
}

#[test]
fn dos_tables_are_inverse() {
    for psec in 0..16 {
        assert_eq!(DOS_LSEC_TO_DOS_PSEC[DOS_PSEC_TO_DOS_LSEC[psec]],psec);
    }
}

#[test]
fn custom_table() {
    let mut table = [0;16];
    for i in 0..16 {
        table[i] = 15 - i;
    }
    let skew = Interleave::custom(table).expect("valid permutation refused");
    assert_eq!(skew.kind(),SkewKind::Custom);
    assert_eq!(skew.sector_offset(0).unwrap(),15);
    table[3] = 0;
    assert!(Interleave::custom(table).is_err());
    assert_eq!(Interleave::custom(DOS_PSEC_TO_DOS_LSEC).unwrap().kind(),SkewKind::DOS);
    assert!(Interleave::prodos().sector_offset(16).is_err());
}
