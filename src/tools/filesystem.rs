use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a file from the filesystem
pub fn read_file(path: &str) -> Result<String> {
    let path = normalize_path(path)?;
    validate_path(&path)?;

    fs::read_to_string(&path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write content to a file, creating parent directories as needed
pub fn write_file(path: &str, content: &str) -> Result<()> {
    let path = normalize_path(path)?;
    validate_path(&path)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "Failed to create parent directories for: {}",
                path.display()
            )
        })?;
    }

    fs::write(&path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}

/// List directory entries, one name per line
pub fn list_directory(path: &str) -> Result<String> {
    let path = normalize_path(path)?;
    validate_path(&path)?;

    let mut names: Vec<String> = fs::read_dir(&path)
        .with_context(|| format!("Failed to read directory: {}", path.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    Ok(names.join("\n"))
}

/// Normalize a path (resolve relative paths against the working directory)
fn normalize_path(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);

    if path.is_absolute() {
        let current_dir = std::env::current_dir()?;
        if !path.starts_with(&current_dir) {
            anyhow::bail!("Access denied: path outside of working directory");
        }
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir()?;
        Ok(current_dir.join(path))
    }
}

/// Validate that a path is safe to access
fn validate_path(path: &Path) -> Result<()> {
    let current_dir = std::env::current_dir()?;

    // Resolve the path to handle .. and .
    let canonical = if path.exists() {
        path.canonicalize()?
    } else if let Some(parent) = path.parent() {
        if parent.exists() {
            let parent_canonical = parent.canonicalize()?;
            parent_canonical.join(path.file_name().unwrap_or_default())
        } else {
            path.to_path_buf()
        }
    } else {
        path.to_path_buf()
    };

    if !canonical.starts_with(&current_dir) {
        anyhow::bail!(
            "Security error: attempted to access path outside of working directory: {}",
            path.display()
        );
    }

    let sensitive_patterns = [
        ".ssh",
        ".aws",
        ".env",
        "id_rsa",
        "id_ed25519",
        ".git/config",
        ".npmrc",
        ".pypirc",
    ];

    let path_str = path.to_string_lossy();
    for pattern in &sensitive_patterns {
        if path_str.contains(pattern) {
            anyhow::bail!(
                "Security error: attempted to access potentially sensitive file: {}",
                path.display()
            );
        }
    }

    Ok(())
}
