// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Positional argument shared by the lookup subcommands
fn name_arg() -> Arg {
    Arg::new("name").required(true).help("Exact package name")
}

fn build_cli() -> Command {
    Command::new("repomd")
        .version(env!("CARGO_PKG_VERSION"))
        .author("repomd Contributors")
        .about("Query dnf/yum repository metadata")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("filelists")
                .long("filelists")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Also fetch file lists"),
        )
        .arg(
            Arg::new("url")
                .required(true)
                .help("Repository root, mirror list URL, or local path"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("count").about("Print the number of packages"))
        .subcommand(Command::new("list").about("Print the NEVRA of every package"))
        .subcommand(
            Command::new("find")
                .about("Print the NEVRA of the last package with this name")
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("find-all")
                .about("Print the NEVRA of every package with this name")
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("info")
                .about("Show details of the last package with this name")
                .arg(name_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var_os("OUT_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            println!("cargo:warning=OUT_DIR not set, skipping man page");
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    if let Err(e) = fs::write(man_dir.join("repomd.1"), buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
