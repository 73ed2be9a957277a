// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("packwright")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build .deb and .rpm packages from a JSON package description")
        .disable_version_flag(true)
        .arg(
            Arg::new("deb")
                .long("deb")
                .action(ArgAction::SetTrue)
                .help("Build a Debian package"),
        )
        .arg(
            Arg::new("rpm")
                .long("rpm")
                .action(ArgAction::SetTrue)
                .help("Build an RPM package"),
        )
        .arg(
            Arg::new("conf")
                .long("conf")
                .value_name("FILE")
                .default_value("pkg.config.json")
                .help("Package config file"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("DIR")
                .default_value(".")
                .help("Directory the packages are written to"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .value_name("VERSION")
                .help("Override the package version"),
        )
        .arg(
            Arg::new("revision")
                .long("revision")
                .value_name("REVISION")
                .help("Override the package revision"),
        )
        .arg(
            Arg::new("source_date_epoch")
                .long("source-date-epoch")
                .value_name("SECONDS")
                .env("SOURCE_DATE_EPOCH")
                .help("Build timestamp used for reproducible output"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

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

    let man_path = man_dir.join("packwright.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
