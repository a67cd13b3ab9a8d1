//! # Command Line Interface
//!
//! Both subcommands decode the capture, they differ only in what they write.

use clap::ArgMatches;
use env_logger;
use std::io::Write;
use std::str::FromStr;
use log::error;
use nibkit::DecodeOptions;
use nibkit::FractionalTracks;
use nibkit::bios::skew::Interleave;

mod cli;

/// Start from the JSON options file if there is one, then apply the flags.
fn decode_options(cmd: &ArgMatches) -> Result<DecodeOptions,Box<dyn std::error::Error>> {
    let mut opts = match cmd.get_one::<String>("config") {
        Some(path) => DecodeOptions::from_json(&std::fs::read_to_string(path)?)?,
        None => DecodeOptions::default()
    };
    if let Some(skew) = cmd.get_one::<String>("skew") {
        opts.interleave = Interleave::from_str(skew)?;
    }
    if let Some(frac) = cmd.get_one::<String>("fractional") {
        opts.fractional = FractionalTracks::from_str(frac)?;
    }
    if let Some(tracks) = cmd.get_one::<u16>("tracks") {
        opts.max_tracks = *tracks as usize;
    }
    if cmd.get_flag("lenient") {
        opts.verify_address_checksum = false;
    }
    opts.check()?;
    Ok(opts)
}

fn run(matches: &ArgMatches) -> Result<(),Box<dyn std::error::Error>> {
    if let Some(cmd) = matches.subcommand_matches("decode") {
        let opts = decode_options(cmd)?;
        let path_to_img = cmd.get_one::<String>("dimg").expect("dimg is required");
        let img = nibkit::decode_capture_file(path_to_img,&opts)?;
        eprintln!("{} track records yielded sectors",img.good_tracks());
        return match cmd.get_one::<String>("output") {
            Some(path) => nibkit::save_img(&img,path),
            None => {
                if atty::is(atty::Stream::Stdout) {
                    error!("refusing to write a binary image to the console, use `--output`");
                    return Err(Box::new(nibkit::img::Error::MetadataMismatch));
                }
                std::io::stdout().write_all(img.as_bytes())?;
                Ok(())
            }
        };
    }

    if let Some(cmd) = matches.subcommand_matches("stat") {
        let opts = decode_options(cmd)?;
        let path_to_img = cmd.get_one::<String>("dimg").expect("dimg is required");
        let img = nibkit::decode_capture_file(path_to_img,&opts)?;
        let indent = cmd.get_one::<u16>("indent").copied();
        println!("{}",img.to_json(indent)?);
        return Ok(());
    }

    error!("no subcommand was given, try `nibkit --help`");
    Err(Box::new(nibkit::img::Error::MetadataMismatch))
}

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let matches = cli::build_cli().get_matches();
    if let Err(e) = run(&matches) {
        error!("{}",e);
        return Err(e);
    }
    Ok(())
}
