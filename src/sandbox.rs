// ABOUTME: Sandboxed filesystem access for the `load` builtin
// Uses cap-std for capability-based security: `load` can only read files
// reachable through one of the configured root directories.

use crate::config::FsConfig;
use cap_std::fs::Dir;

/// Failures reading a file through the sandbox.
#[derive(Debug, Clone)]
pub enum SandboxError {
    PathNotAllowed(String),
    FileNotFound(String),
    FileTooLarge(String),
    IoError(String),
}

impl std::fmt::Display for SandboxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxError::PathNotAllowed(path) => {
                write!(f, "access denied: {path} is not in an allowed path")
            }
            SandboxError::FileNotFound(path) => write!(f, "file not found: {path}"),
            SandboxError::FileTooLarge(msg) => write!(f, "file too large: {msg}"),
            SandboxError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for SandboxError {}

/// Capability-based read-only sandbox backing `load`.
pub struct Sandbox {
    roots: Vec<Dir>,
    max_file_size: usize,
}

impl Sandbox {
    /// Opens every allowed path as a `cap_std` capability directory,
    /// creating it first if it doesn't exist.
    pub fn new(config: FsConfig) -> Result<Self, SandboxError> {
        let mut roots = Vec::new();
        for path in &config.allowed_paths {
            std::fs::create_dir_all(path)
                .map_err(|e| SandboxError::IoError(format!("cannot create {}: {e}", path.display())))?;
            let dir = Dir::open_ambient_dir(path, cap_std::ambient_authority())
                .map_err(|e| SandboxError::IoError(format!("cannot open {}: {e}", path.display())))?;
            roots.push(dir);
        }

        Ok(Self {
            roots,
            max_file_size: config.max_file_size,
        })
    }

    /// Reads a file's contents as a UTF-8 string, searching each
    /// configured root in order. Rejects absolute paths and `..`
    /// traversal up front — `cap_std::fs::Dir` would reject them anyway,
    /// but the explicit check gives a clearer error.
    pub fn read_file(&self, path: &str) -> Result<String, SandboxError> {
        if path.starts_with('/') || path.starts_with('\\') || path.contains("..") {
            return Err(SandboxError::PathNotAllowed(path.to_string()));
        }

        for root in &self.roots {
            match root.metadata(path) {
                Ok(metadata) => {
                    if metadata.len() as usize > self.max_file_size {
                        return Err(SandboxError::FileTooLarge(format!(
                            "{} bytes exceeds limit of {} bytes",
                            metadata.len(),
                            self.max_file_size
                        )));
                    }
                    return root
                        .read_to_string(path)
                        .map_err(|e| SandboxError::IoError(format!("cannot read {path}: {e}")));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(SandboxError::IoError(format!("cannot stat {path}: {e}"))),
            }
        }

        Err(SandboxError::FileNotFound(path.to_string()))
    }
}
