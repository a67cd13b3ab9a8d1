// test of the command line interface
mod common;

use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn write_capture(dir: &std::path::Path) -> Result<std::path::PathBuf,Box<dyn std::error::Error>> {
    let records: Vec<(u16,Vec<u8>)> = (0..3).map(|t| (t*4,common::track(254,t as u8,|s| s + 1))).collect();
    let path = dir.join("test.v2d");
    std::fs::write(&path,common::capture(&records))?;
    Ok(path)
}

#[test]
fn decode_to_file() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let v2d_path = write_capture(dir.path())?;
    let po_path = dir.path().join("test.po");
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.arg("decode")
        .arg("-d").arg(&v2d_path)
        .arg("-o").arg(&po_path)
        .arg("--tracks").arg("35")
        .assert()
        .success()
        .stderr(predicate::str::contains("3 track records yielded sectors"));
    let img = std::fs::read(&po_path)?;
    assert_eq!(img.len(),35*4096);
    // physical sector 1 lands in slot 8 under the ProDOS order
    assert_eq!(img[8*256],2);
    assert_eq!(img[4096 + 8*256],2);
    assert_eq!(img[3*4096],0);
    Ok(())
}

#[test]
fn decode_to_stdout_dos_order() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let v2d_path = write_capture(dir.path())?;
    let mut cmd = Command::cargo_bin("nibkit")?;
    let output = cmd.arg("decode")
        .arg("-d").arg(&v2d_path)
        .arg("-s").arg("dos")
        .output()?;
    assert!(output.status.success());
    assert_eq!(output.stdout.len(),40*4096);
    // physical sector 1 lands in slot 7 under the DOS order
    assert_eq!(output.stdout[7*256],2);
    Ok(())
}

#[test]
fn stat_report() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let v2d_path = write_capture(dir.path())?;
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.arg("stat")
        .arg("-d").arg(&v2d_path)
        .arg("--fractional").arg("skip")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"good_tracks\":3"))
        .stdout(predicate::str::contains("\"interleave\":\"prodos\""));
    Ok(())
}

#[test]
fn options_from_config_file() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let v2d_path = write_capture(dir.path())?;
    let cfg_path = dir.path().join("opts.json");
    std::fs::write(&cfg_path,"{\"interleave\": \"dos\", \"max_tracks\": 35}")?;
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.arg("stat")
        .arg("-d").arg(&v2d_path)
        .arg("--config").arg(&cfg_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"interleave\":\"dos\""))
        .stdout(predicate::str::contains("\"track_capacity\":35"));
    Ok(())
}

#[test]
fn truncated_capture_fails() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let v2d_path = dir.path().join("bad.v2d");
    let buf = common::capture_declaring(2,&[(0,common::track(254,0,|s| s))]);
    std::fs::write(&v2d_path,&buf)?;
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.arg("stat")
        .arg("-d").arg(&v2d_path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn invalid_skew() -> STDRESULT {
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.arg("decode")
        .arg("-d").arg("nothing.v2d")
        .arg("-s").arg("cpm")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cpm"));
    Ok(())
}

#[test]
fn subcommand_required() -> STDRESULT {
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.assert().failure();
    Ok(())
}

#[test]
fn missing_capture_is_logged() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("nibkit")?;
    cmd.env("RUST_LOG","warn")
        .arg("stat")
        .arg("-d").arg(dir.path().join("absent.v2d"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR"));
    Ok(())
}
