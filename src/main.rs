use std::process;

use mdeps::cli::{logging, Args, Command};

fn main() {
    let args = Args::parse_args();

    logging::init(args.verbose, args.log_json);

    let command = Command::from_args(args);
    process::exit(command.run());
}
