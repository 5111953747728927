mod cli;
mod commands;

use clap::Parser;

use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Info { file, json } => commands::info::run(&file, json),
        Command::DexFiles { file, json } => commands::dex_files::run(&file, json),
        Command::Class {
            file,
            dex,
            index,
            method,
            json,
        } => commands::class::run(&file, &dex, index, method, json),
    }
}
