#![forbid(unsafe_code)]
//! Builds the argument vector for running a command inside an
//! [nsjail](https://github.com/google/nsjail) sandbox.
//!
//! The builder only assembles arguments; spawning the resulting command is
//! left to the caller.
//!
//! ```rust
//! use nsjail::{MountPoint, NsJailCmdBuilder};
//!
//! let argv = NsJailCmdBuilder::new("/usr/bin/nsjail")
//!     .isolate_network(true)
//!     .mount(MountPoint::read_only("/data"))
//!     .build(["/bin/true"])?;
//! assert_eq!(argv[1], "--keep_env");
//! # Ok::<(), nsjail::NsJailError>(())
//! ```

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

const READ_ONLY_DEFAULT_MOUNTS: &[&str] = &[
    "/dev/kvm",
    "/bin/bash",
    "/lib",
    "/lib64",
    "/usr/bin/dirname",
    "/dev/urandom",
];

const WRITABLE_DEFAULT_MOUNTS: &[&str] = &["/dev/null"];

/// Errors returned by [`NsJailCmdBuilder::build`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NsJailError {
    #[error("nsjail binary path must not be empty")]
    MissingBinary,
    #[error("sandboxed command must not be empty")]
    EmptyCommand,
}

/// A bind mount from the host into the jail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountPoint {
    pub src: PathBuf,
    /// Path inside the jail; defaults to `src`.
    pub dst: Option<PathBuf>,
    pub writable: bool,
}

impl MountPoint {
    pub fn read_only(src: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dst: None,
            writable: false,
        }
    }

    pub fn writable(src: impl Into<PathBuf>) -> Self {
        Self {
            writable: true,
            ..Self::read_only(src)
        }
    }

    pub fn at(mut self, dst: impl Into<PathBuf>) -> Self {
        self.dst = Some(dst.into());
        self
    }

    fn flag(&self) -> &'static str {
        if self.writable {
            "--bindmount"
        } else {
            "--bindmount_ro"
        }
    }

    fn spec(&self) -> String {
        let dst = self.dst.as_ref().unwrap_or(&self.src);
        format!("{}:{}", self.src.display(), dst.display())
    }
}

/// Builder for an nsjail invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NsJailCmdBuilder {
    pub bin: PathBuf,
    /// Run the command in a fresh network namespace.
    pub isolate_network: bool,
    pub mount_points: Vec<MountPoint>,
    pub cwd: Option<PathBuf>,
    pub chroot: Option<PathBuf>,
}

impl NsJailCmdBuilder {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            ..Self::default()
        }
    }

    pub fn isolate_network(mut self, enable: bool) -> Self {
        self.isolate_network = enable;
        self
    }

    pub fn mount(mut self, mount: MountPoint) -> Self {
        self.mount_points.push(mount);
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn chroot(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chroot = Some(dir.into());
        self
    }

    /// Returns the full argument vector, starting with the nsjail binary and
    /// ending with `--` followed by `subcmd`.
    pub fn build<I, S>(&self, subcmd: I) -> Result<Vec<String>, NsJailError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.bin.as_os_str().is_empty() {
            return Err(NsJailError::MissingBinary);
        }
        let subcmd: Vec<String> = subcmd.into_iter().map(Into::into).collect();
        if subcmd.is_empty() {
            return Err(NsJailError::EmptyCommand);
        }

        let mut args = vec![self.bin.display().to_string(), "--keep_env".to_string()];
        if !self.isolate_network {
            args.push("--disable_clone_newnet".to_string());
        }
        if let Some(cwd) = &self.cwd {
            args.push("--cwd".to_string());
            args.push(cwd.display().to_string());
        }
        if let Some(chroot) = &self.chroot {
            args.push("--chroot".to_string());
            args.push(chroot.display().to_string());
        }

        let defaults = READ_ONLY_DEFAULT_MOUNTS
            .iter()
            .map(|path| MountPoint::read_only(*path))
            .chain(WRITABLE_DEFAULT_MOUNTS.iter().map(|path| MountPoint::writable(*path)));
        for mount in self.mount_points.iter().cloned().chain(defaults) {
            args.push(mount.flag().to_string());
            args.push(mount.spec());
        }

        args.extend(
            ["--rlimit_as", "inf", "--rlimit_fsize", "inf", "--"]
                .iter()
                .map(|arg| arg.to_string()),
        );
        args.extend(subcmd);

        debug!(argc = args.len(), "built nsjail command");
        Ok(args)
    }
}
