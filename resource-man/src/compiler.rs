// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Invoking an external Qt resource compiler.

The compiler turns a `.qrc` manifest into something the toolkit can load.
Qt's own `rcc` is asked for a binary `.rcc` blob. The Python binding
variants (`pyside6-rcc` and friends) emit a module that registers the data
when imported. The output is opaque to this crate either way.
*/

use {
    crate::error::{ResourceManError, Result},
    duct::cmd,
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
    },
};

/// Compiler executables searched for on `PATH`, in order.
pub const KNOWN_COMPILERS: &[&str] = &["rcc", "pyside6-rcc", "pyside2-rcc", "pyrcc5"];

/// The command line convention a compiler follows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompilerFlavor {
    /// Qt's `rcc`, producing a binary blob.
    Rcc,
    /// A binding's wrapper, producing a source module.
    Binding,
}

impl CompilerFlavor {
    fn from_executable(path: &Path) -> Self {
        match path.file_stem().and_then(|s| s.to_str()) {
            Some("rcc") => Self::Rcc,
            _ => Self::Binding,
        }
    }
}

/// A resource compiler executable.
#[derive(Clone, Debug)]
pub struct ResourceCompiler {
    executable: PathBuf,
    flavor: CompilerFlavor,
    extra_args: Vec<OsString>,
}

impl ResourceCompiler {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        let executable = executable.into();
        let flavor = CompilerFlavor::from_executable(&executable);

        Self {
            executable,
            flavor,
            extra_args: vec![],
        }
    }

    /// Locate the first of [KNOWN_COMPILERS] on `PATH`.
    pub fn find() -> Result<Self> {
        KNOWN_COMPILERS
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
            .ok_or_else(|| {
                ResourceManError::Compiler(format!(
                    "no resource compiler found on PATH (looked for {})",
                    KNOWN_COMPILERS.join(", ")
                ))
            })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn flavor(&self) -> CompilerFlavor {
        self.flavor
    }

    /// Override the detected command line convention.
    pub fn with_flavor(mut self, flavor: CompilerFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Append an argument passed before the input file.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Arguments used to compile `qrc` into `output`.
    pub fn command_args(&self, qrc: &Path, output: &Path) -> Vec<OsString> {
        let mut args = vec![];

        if self.flavor == CompilerFlavor::Rcc {
            args.push(OsString::from("--binary"));
        }

        args.extend(self.extra_args.iter().cloned());
        args.push(OsString::from("-o"));
        args.push(output.as_os_str().to_os_string());
        args.push(qrc.as_os_str().to_os_string());

        args
    }

    /// Compile a manifest.
    ///
    /// On failure the error carries the compiler's combined output verbatim.
    pub fn compile(&self, qrc: &Path, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let res = cmd(self.executable.as_path(), self.command_args(qrc, output))
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|e| {
                ResourceManError::Compiler(format!(
                    "unable to run {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        if res.status.success() {
            Ok(())
        } else {
            Err(ResourceManError::Compiler(
                String::from_utf8_lossy(&res.stdout).trim_end().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let rcc = ResourceCompiler::new("/usr/lib/qt6/libexec/rcc");
        assert_eq!(rcc.flavor(), CompilerFlavor::Rcc);
        assert_eq!(
            rcc.command_args(Path::new("res.qrc"), Path::new("res.rcc")),
            vec!["--binary", "-o", "res.rcc", "res.qrc"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );

        let pyside = ResourceCompiler::new("pyside6-rcc").arg("--compress-algo=zlib");
        assert_eq!(pyside.flavor(), CompilerFlavor::Binding);
        assert_eq!(
            pyside.command_args(Path::new("res.qrc"), Path::new("res_rc.py")),
            vec!["--compress-algo=zlib", "-o", "res_rc.py", "res.qrc"]
                .into_iter()
                .map(OsString::from)
                .collect::<Vec<_>>()
        );
    }

    #[cfg(unix)]
    fn write_script(path: &Path, body: &str) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        std::fs::write(path, format!("#!/bin/sh\n{}\n", body))?;
        let mut permissions = std::fs::metadata(path)?.permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(path, permissions)
    }

    #[cfg(unix)]
    #[test]
    fn test_compile() -> Result<()> {
        let td = tempfile::Builder::new()
            .prefix("resource-man-test")
            .tempdir()?;

        let good = td.path().join("good-rcc");
        write_script(&good, "cp \"$3\" \"$2\"")?;
        let bad = td.path().join("bad-rcc");
        write_script(&bad, "echo \"cannot open $3\" >&2\nexit 3")?;

        let qrc = td.path().join("res.qrc");
        std::fs::write(&qrc, "<RCC/>")?;
        let output = td.path().join("out").join("res.bin");

        ResourceCompiler::new(&good).compile(&qrc, &output)?;
        assert_eq!(std::fs::read(&output)?, b"<RCC/>".to_vec());

        let err = ResourceCompiler::new(&bad)
            .compile(&qrc, &output)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("resource compiler failed: cannot open {}", qrc.display())
        );

        let err = ResourceCompiler::new(td.path().join("missing"))
            .compile(&qrc, &output)
            .unwrap_err();
        assert!(matches!(err, ResourceManError::Compiler(_)));

        Ok(())
    }
}
