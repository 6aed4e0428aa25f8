use clap::Parser;

mod cmd;

fn main() {
    let command = cmd::Cmd::parse();
    cmd::run(command);
}
