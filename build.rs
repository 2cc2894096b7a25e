use clap::CommandFactory;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=crates/wheretopublish-cli/src/lib.rs");

    // Generate manpage using clap_mangen
    let cmd = wheretopublish_cli::Args::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buffer: Vec<u8> = Default::default();
    man.render(&mut buffer)?;

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => return Err(io::Error::new(io::ErrorKind::NotFound, e)),
    };

    fs::write(out_dir.join("wheretopublish.1"), &buffer)?;

    // In release mode, also write next to the binary (OUT_DIR is target/release/build/xxx/out)
    if env::var("PROFILE").unwrap_or_default() == "release" {
        if let Some(release_dir) = out_dir.ancestors().nth(3) {
            fs::write(release_dir.join("wheretopublish.1"), &buffer)?;
        }
    }

    Ok(())
}
