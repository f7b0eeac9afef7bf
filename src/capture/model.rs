use std::path::PathBuf;

/// A screenshot written to disk
#[derive(Debug, Clone)]
pub struct CapturedPage {
    /// Path of the saved PNG
    pub file_path: PathBuf,

    /// Size of the PNG in bytes
    pub byte_len: usize,
}

impl CapturedPage {
    pub fn new(file_path: PathBuf, byte_len: usize) -> Self {
        Self { file_path, byte_len }
    }

    /// Filename portion of the saved path, for log lines.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string())
    }
}
