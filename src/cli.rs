use clap::{value_parser, crate_version, Arg, ArgAction, Command, ValueHint};

const SKEW_LONG_HELP: &str = "The capture does not say which sector order the consumer expects.
`prodos` produces a PO ordered image, `dos` produces a DO ordered image.
A custom table can be given as a list in a JSON file passed with `--config`.";
const CONFIG_LONG_HELP: &str = "Read decode options from the JSON file at PATH, e.g.,
{\"interleave\": \"dos\", \"fractional\": \"skip\", \"max_tracks\": 35}
Options given on the command line take precedence.";

fn dimg_arg() -> Arg {
    Arg::new("dimg").short('d').long("dimg").help("path to the capture")
        .value_name("PATH")
        .value_hint(ValueHint::FilePath)
        .required(true)
}

fn skew_arg() -> Arg {
    Arg::new("skew").short('s').long("skew").help("sector order of the output")
        .value_name("ORDER")
        .value_parser(["prodos","po","dos","do"])
        .long_help(SKEW_LONG_HELP)
        .required(false)
}

fn fractional_arg() -> Arg {
    Arg::new("fractional").long("fractional").help("handling of half and quarter tracks")
        .value_name("ACTION")
        .value_parser(["decode","skip"])
        .required(false)
}

fn tracks_arg() -> Arg {
    Arg::new("tracks").long("tracks").help("capacity of the output image in tracks")
        .value_name("COUNT")
        .value_parser(value_parser!(u16).range(1..=256))
        .required(false)
}

fn lenient_arg() -> Arg {
    Arg::new("lenient").long("lenient").help("accept address fields with a bad checksum")
        .action(ArgAction::SetTrue)
}

fn config_arg() -> Arg {
    Arg::new("config").long("config").help("read decode options from a JSON file")
        .value_name("PATH")
        .value_hint(ValueHint::FilePath)
        .long_help(CONFIG_LONG_HELP)
        .required(false)
}

fn indent_arg() -> Arg {
    Arg::new("indent").long("indent").help("JSON indentation, omit to minify")
        .value_name("SPACES")
        .value_parser(value_parser!(u16).range(0..16))
        .required(false)
}

pub fn build_cli() -> Command {
    let long_help = "nibkit is always invoked with exactly one of several subcommands.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
recover PO image:      `nibkit decode -d mydisk.v2d -o mydisk.po`
recover DO image:      `nibkit decode -d mydisk.v2d -s dos -o mydisk.do`
pipe to another tool:  `nibkit decode -d mydisk.v2d | a2kit catalog`
track report:          `nibkit stat -d mydisk.v2d --indent 2`";

    let mut main_cmd = Command::new("nibkit")
        .about("Recovers sector images from raw nibble captures of Apple II disks.")
        .after_long_help(long_help)
        .subcommand_required(true)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(
        Command::new("decode")
            .arg(dimg_arg())
            .arg(Arg::new("output").short('o').long("output").help("path of the image to write, omit for stdout")
                .value_name("PATH")
                .value_hint(ValueHint::FilePath)
                .required(false))
            .arg(skew_arg())
            .arg(fractional_arg())
            .arg(tracks_arg())
            .arg(lenient_arg())
            .arg(config_arg())
            .about("decode a capture and write the sector image")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("stat")
            .arg(dimg_arg())
            .arg(skew_arg())
            .arg(fractional_arg())
            .arg(tracks_arg())
            .arg(lenient_arg())
            .arg(config_arg())
            .arg(indent_arg())
            .about("decode a capture and write a JSON track report to stdout")
    );
    main_cmd
}
