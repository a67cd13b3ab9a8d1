// test of the V2D decoding pipeline using synthetic captures
mod common;

use nibkit::{DecodeOptions,FractionalTracks};
use nibkit::bios::skew::Interleave;
use nibkit::img;
use nibkit::img::assemble::TrackEnd;
use nibkit::img::fields;

fn one_sector_track() -> Vec<u8> {
    let mut nibs = vec![0xff;40];
    nibs.append(&mut common::sector(254,3,5,&[0x42;256]));
    nibs
}

#[test]
fn single_sector() {
    let buf = common::capture(&[(12,one_sector_track())]);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    let offset = 3*4096 + Interleave::prodos().sector_offset(5).unwrap()*256;
    assert_eq!(offset,3*4096 + 10*256);
    assert_eq!(&disk.as_bytes()[offset..offset+256],&[0x42;256]);
    assert_eq!(disk.good_tracks(),1);
    // nothing else was written
    let nonzero = disk.as_bytes().iter().filter(|b| **b != 0).count();
    assert_eq!(nonzero,256);
    assert_eq!(disk.reports()[0].sectors,1);
    assert_eq!(disk.reports()[0].end,TrackEnd::Complete);
}

#[test]
fn corrupt_address_epilog() {
    let mut nibs = one_sector_track();
    nibs[40 + fields::ADDR_EPILOG_OFFSET + 2] = 0xea;
    let buf = common::capture(&[(12,nibs)]);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.good_tracks(),0);
    assert!(disk.as_bytes().iter().all(|b| *b==0));
    assert_eq!(disk.reports()[0].end,TrackEnd::Abandoned(img::NibbleError::EpilogueMismatch));
}

#[test]
fn corrupt_data_checksum() {
    let mut nibs = one_sector_track();
    let chk_idx = 40 + fields::ADDR_FIELD_LEN + 6 + fields::DATA_EPILOG_OFFSET - 1;
    assert_ne!(nibs[chk_idx],0x96);
    nibs[chk_idx] = 0x96;
    let buf = common::capture(&[(12,nibs)]);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.good_tracks(),0);
    assert!(disk.as_bytes().iter().all(|b| *b==0));
    assert_eq!(disk.reports()[0].end,TrackEnd::Abandoned(img::NibbleError::BadChecksum));
}

#[test]
fn declared_tracks_exceed_capture() {
    let buf = common::capture_declaring(3,&[(0,one_sector_track())]);
    match nibkit::decode_capture(&buf,&DecodeOptions::default()) {
        Ok(_) => panic!("decoded a truncated capture"),
        Err(e) => match e.downcast_ref::<img::Error>() {
            Some(img::Error::TrackCountMismatch) => {},
            _ => panic!("unexpected error {}",e)
        }
    }
}

#[test]
fn truncated_header() {
    let buf = common::capture(&[]);
    assert!(nibkit::decode_capture(&buf[0..6],&DecodeOptions::default()).is_err());
}

#[test]
fn decoding_is_idempotent() {
    let records: Vec<(u16,Vec<u8>)> = (0..35).map(|t| (t*4,common::track(254,t as u8,|s| s ^ t as u8))).collect();
    let buf = common::capture(&records);
    let opts = DecodeOptions::default();
    let first = nibkit::decode_capture(&buf,&opts).expect("decode failed");
    let second = nibkit::decode_capture(&buf,&opts).expect("decode failed");
    assert_eq!(first.as_bytes(),second.as_bytes());
    assert_eq!(first.good_tracks(),35);
    assert_eq!(second.good_tracks(),35);
}

#[test]
fn full_disk_in_both_orders() {
    let records: Vec<(u16,Vec<u8>)> = (0..35).map(|t| (t*4,common::track(254,t as u8,|s| s + 16*(t as u8 % 8)))).collect();
    let buf = common::capture(&records);
    let po = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    let mut opts = DecodeOptions::default();
    opts.interleave = Interleave::dos();
    let dos = nibkit::decode_capture(&buf,&opts).expect("decode failed");
    assert_eq!(po.track_count(),40);
    for t in 0..35 {
        for psec in 0..16 {
            let expected = [psec as u8 + 16*(t as u8 % 8);256];
            let po_slot = Interleave::prodos().sector_offset(psec).unwrap();
            let do_slot = Interleave::dos().sector_offset(psec).unwrap();
            assert_eq!(po.read_sector(t,po_slot).unwrap(),&expected);
            assert_eq!(dos.read_sector(t,do_slot).unwrap(),&expected);
        }
    }
    // tracks past the end of the capture stay empty
    assert!(po.as_bytes()[35*4096..].iter().all(|b| *b==0));
}

#[test]
fn fractional_tracks() {
    let records = vec![
        (0,common::track(254,0,|_| 1)),
        (2,common::track(254,0,|_| 2)),
        (4,common::track(254,1,|_| 3))
    ];
    let buf = common::capture(&records);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    // the half track claims track 0 in its address fields and overwrites it
    assert_eq!(disk.good_tracks(),3);
    assert_eq!(disk.read_sector(0,0).unwrap(),&[2;256]);
    assert!(disk.reports()[1].is_fractional());
    let mut opts = DecodeOptions::default();
    opts.fractional = FractionalTracks::Skip;
    let disk = nibkit::decode_capture(&buf,&opts).expect("decode failed");
    assert_eq!(disk.good_tracks(),2);
    assert_eq!(disk.read_sector(0,0).unwrap(),&[1;256]);
    assert_eq!(disk.reports()[1].end,TrackEnd::Skipped);
    assert_eq!(disk.reports()[2].track(),1);
}

#[test]
fn partial_track_is_kept() {
    let mut nibs = common::track(254,2,|s| s);
    // break the data prolog of the ninth sector
    let sec_len = common::sector(0,0,0,&[0;256]).len();
    let idx = 64 + 8*sec_len + fields::ADDR_FIELD_LEN + 6;
    nibs[idx] = 0xd4;
    let buf = common::capture(&[(8,nibs)]);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.good_tracks(),1);
    assert_eq!(disk.reports()[0].sectors,8);
    assert_eq!(disk.reports()[0].end,TrackEnd::Abandoned(img::NibbleError::MarkerMismatch));
    let skew = Interleave::prodos();
    for psec in 0..16 {
        let slot = skew.sector_offset(psec).unwrap();
        let expected = match psec { p if p < 8 => [p as u8;256], _ => [0;256] };
        assert_eq!(disk.read_sector(2,slot).unwrap(),&expected);
    }
}

#[test]
fn sector_beyond_capacity() {
    let records = vec![(0,common::track(254,0,|_| 7)),(160,common::track(254,40,|_| 9))];
    let buf = common::capture(&records);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.good_tracks(),1);
    assert_eq!(disk.reports()[1].end,TrackEnd::OutOfBounds);
    assert_eq!(disk.as_bytes().len(),40*4096);
}

#[test]
fn overrun_byte_at_track_start() {
    let mut nibs = vec![0xeb];
    nibs.append(&mut one_sector_track());
    let buf = common::capture(&[(12,nibs)]);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.good_tracks(),1);
}

#[test]
fn json_report() {
    let records = vec![(0,common::track(254,0,|_| 1)),(2,vec![0xff;100])];
    let buf = common::capture(&records);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    let report = json::parse(&disk.to_json(None).expect("no json")).expect("bad json");
    assert_eq!(report["interleave"],"prodos");
    assert_eq!(report["slots"][1],8);
    assert_eq!(report["good_tracks"],1);
    assert_eq!(report["tracks"][0]["sectors"],16);
    assert_eq!(report["tracks"][1]["track"],0.5);
    assert_eq!(report["tracks"][1]["status"],"complete");
}

#[test]
fn header_anomalies_are_tolerated() {
    let mut buf = common::capture(&[(12,one_sector_track())]);
    buf[4..8].copy_from_slice(b"XXXX");
    buf[2] ^= 0x10;
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.good_tracks(),1);
    assert_eq!(disk.read_sector(3,10).unwrap(),&[0x42;256]);
}

#[test]
fn bytes_after_last_record() {
    let mut buf = common::capture(&[(12,one_sector_track())]);
    buf.extend_from_slice(&[0x00,0x10,0x01,0x00,0xd5,0xaa,0x96]);
    let disk = nibkit::decode_capture(&buf,&DecodeOptions::default()).expect("decode failed");
    assert_eq!(disk.reports().len(),1);
    assert_eq!(disk.good_tracks(),1);
}

#[test]
fn sector_number_out_of_range() {
    let mut nibs = vec![0xff;40];
    // address checksum is consistent, only the sector is bad
    nibs.append(&mut common::sector(254,3,16,&[0x42;256]));
    let buf = common::capture(&[(12,nibs)]);
    let mut opts = DecodeOptions::default();
    for verify in [true,false] {
        opts.verify_address_checksum = verify;
        let disk = nibkit::decode_capture(&buf,&opts).expect("decode failed");
        assert_eq!(disk.good_tracks(),0);
        assert_eq!(disk.reports()[0].end,TrackEnd::Abandoned(img::NibbleError::BadAddress));
    }
}

#[test]
fn unusable_track_capacity() {
    let buf = common::capture(&[(12,one_sector_track())]);
    let mut opts = DecodeOptions::default();
    opts.max_tracks = usize::MAX/1000;
    assert!(nibkit::decode_capture(&buf,&opts).is_err());
    let capture = img::v2d::Capture::from_bytes(&buf).expect("could not read capture");
    opts.max_tracks = 0;
    assert!(capture.decode(&opts).is_err());
    opts.max_tracks = 4;
    assert_eq!(capture.decode(&opts).expect("decode failed").good_tracks(),1);
}
