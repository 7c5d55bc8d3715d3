//! Compile-and-load wrapper around the external C compiler.
//!
//! A [`Module`] owns one generated translation unit. `compile` writes the
//! source into a private temporary directory, shells out to `cc`, and
//! opens the resulting shared object; `get` resolves kernel symbols to
//! callable function pointers. The rest of the compiler depends only on
//! this source-string-in / symbol-out interface.
//!
//! Compilation failures and missing symbols are hard errors: by the time
//! a module exists, the source came out of the emitter and is expected
//! to be valid.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use log::debug;

/// A generated C translation unit and its compiled shared object.
pub struct Module {
    source: String,
    dir: tempfile::TempDir,
    lib: Option<libloading::Library>,
}

impl Module {
    /// Wrap emitted source. `stdio.h` is prepended so generated kernels
    /// may call `printf`.
    pub fn new(source: &str) -> Result<Module> {
        let dir = tempfile::tempdir().context("creating module build directory")?;
        Ok(Module {
            source: format!("#include <stdio.h>\n{}", source),
            dir,
            lib: None,
        })
    }

    /// The full source text, header included.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compile the source to a shared object and load it. Returns the
    /// object's path.
    pub fn compile(&mut self) -> Result<PathBuf> {
        let c_path = self.dir.path().join("module.c");
        let so_path = self.dir.path().join("module.so");
        std::fs::write(&c_path, &self.source)
            .with_context(|| format!("writing {}", c_path.display()))?;

        let mut cmd = Command::new("cc");
        cmd.arg("-std=c99")
            .arg("-shared")
            .arg("-fPIC")
            .arg(&c_path)
            .arg("-o")
            .arg(&so_path);
        debug!("compiling module: {:?}", cmd);

        let status = cmd.status().context("invoking cc")?;
        if !status.success() {
            bail!("compilation command {:?} failed: {}", cmd, status);
        }

        // Library::new is unsafe because loading runs arbitrary
        // initialization code; the object was just built from our own
        // emitted source.
        let lib = unsafe { libloading::Library::new(&so_path) }
            .with_context(|| format!("loading {}", so_path.display()))?;
        self.lib = Some(lib);
        Ok(so_path)
    }

    /// Path of the build directory holding the source and object.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Resolve a symbol from the compiled object.
    ///
    /// # Safety
    ///
    /// The caller must supply the function type the generated code
    /// actually has; calling through a mistyped pointer is undefined
    /// behavior.
    pub unsafe fn get<T>(&self, name: &str) -> Result<libloading::Symbol<'_, T>> {
        let lib = self
            .lib
            .as_ref()
            .context("module has not been compiled")?;
        lib.get(name.as_bytes())
            .with_context(|| format!("symbol `{}` not found in module", name))
    }
}
