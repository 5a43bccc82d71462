use std::path::PathBuf;

use nsjail::{MountPoint, NsJailCmdBuilder};

use crate::Error;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Path to the nsjail binary.
    #[arg(long)]
    pub bin: PathBuf,
    /// Give the command its own network namespace.
    #[arg(long)]
    pub isolate_network: bool,
    /// Working directory inside the jail.
    #[arg(long)]
    pub cwd: Option<PathBuf>,
    /// Directory to chroot into.
    #[arg(long)]
    pub chroot: Option<PathBuf>,
    /// Extra bind mount, as `SRC[:DST][:rw|:ro]` (read-only by default).
    #[arg(long = "mount", value_parser = parse_mount)]
    pub mounts: Vec<MountPoint>,
    /// Command to run inside the jail.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl Args {
    fn builder(&self) -> NsJailCmdBuilder {
        NsJailCmdBuilder {
            bin: self.bin.clone(),
            isolate_network: self.isolate_network,
            mount_points: self.mounts.clone(),
            cwd: self.cwd.clone(),
            chroot: self.chroot.clone(),
        }
    }
}

pub fn run(args: Args) -> Result<(), Error> {
    let argv = args.builder().build(args.command.iter().cloned())?;
    println!("{}", argv.join(" "));
    Ok(())
}

fn parse_mount(raw: &str) -> Result<MountPoint, String> {
    let mut parts: Vec<&str> = raw.split(':').collect();
    let writable = match parts.last().copied() {
        Some("rw") if parts.len() > 1 => {
            parts.pop();
            true
        }
        Some("ro") if parts.len() > 1 => {
            parts.pop();
            false
        }
        _ => false,
    };

    let mount = match parts.as_slice() {
        [src] if !src.is_empty() => MountPoint::read_only(*src),
        [src, dst] if !src.is_empty() && !dst.is_empty() => MountPoint::read_only(*src).at(*dst),
        _ => return Err(format!("expected SRC[:DST][:rw|:ro], got `{raw}`")),
    };
    Ok(MountPoint { writable, ..mount })
}
