//! Typst rendering engine.
//!
//! Layout templates live in `static/` and are loaded once at startup. Each export
//! writes a small entry source next to them on a [`RenderSurface`] and hands it
//! to a [`DocumentCompiler`], normally the `typst` CLI.

use std::fs;
use std::path::Path;
use std::process::Command;

use super::ExportError;

pub const RECEIPT_LAYOUT_FILE: &str = "receipt_layout.typ";
pub const LETTER_LAYOUT_FILE: &str = "letter_layout.typ";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Pdf,
    Png { ppi: f32 },
}

/// Compiles a Typst source inside `workdir` into `output`.
pub trait DocumentCompiler: Send + Sync {
    fn compile(
        &self,
        workdir: &Path,
        source: &str,
        output: &str,
        format: OutputFormat,
    ) -> Result<(), ExportError>;
}

/// Compiler backed by the `typst` command-line tool.
pub struct TypstCli {
    bin: String,
}

impl TypstCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl DocumentCompiler for TypstCli {
    fn compile(
        &self,
        workdir: &Path,
        source: &str,
        output: &str,
        format: OutputFormat,
    ) -> Result<(), ExportError> {
        let mut command = Command::new(&self.bin);
        command.arg("compile").arg("--root").arg(workdir);

        match format {
            OutputFormat::Pdf => {
                command.arg("--format").arg("pdf");
            }
            OutputFormat::Png { ppi } => {
                command
                    .arg("--format")
                    .arg("png")
                    .arg("--ppi")
                    .arg(ppi.to_string());
            }
        }

        let status = command
            .arg(workdir.join(source))
            .arg(workdir.join(output))
            .current_dir(workdir)
            .status()
            .map_err(ExportError::TypstIo)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            log::error!("typst compile of {} exited with status {}", source, code);
            return Err(ExportError::TypstExit(code));
        }

        Ok(())
    }
}

/// Layout templates, one per printable region.
#[derive(Debug, Clone)]
pub struct Templates {
    pub receipt: String,
    pub letter: String,
}

impl Templates {
    pub fn load() -> Result<Self, ExportError> {
        Self::load_from(get_static_dir())
    }

    pub fn load_from(dir: &Path) -> Result<Self, ExportError> {
        let read = |name: &str| fs::read_to_string(dir.join(name)).map_err(ExportError::TemplateIo);
        Ok(Self {
            receipt: read(RECEIPT_LAYOUT_FILE)?,
            letter: read(LETTER_LAYOUT_FILE)?,
        })
    }
}

/// Get the static assets directory path.
pub fn get_static_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}
