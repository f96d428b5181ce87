use crate::shared::error::AdminError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum config file size (1 MiB). Config files are small; anything larger
/// is almost certainly the wrong file.
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Validates that a config path is a regular file of acceptable size
///
/// # Security
/// Uses `symlink_metadata()` so that a symlink is rejected rather than followed.
///
/// # Errors
/// Returns `AdminError::SecurityError` for symlinks, non-files and oversized files,
/// and `AdminError::ConfigReadError` when metadata cannot be read.
pub fn validate_config_file(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| AdminError::ConfigReadError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    if metadata.is_symlink() {
        return Err(AdminError::SecurityError {
            path: path.to_path_buf(),
            reason: "Config file is a symbolic link".to_string(),
            hint: "Point --config at the real file instead of a link".to_string(),
        }
        .into());
    }

    if !metadata.is_file() {
        return Err(AdminError::SecurityError {
            path: path.to_path_buf(),
            reason: "Config path is not a regular file".to_string(),
            hint: "Pass the path of a .yml, .yaml or .toml file".to_string(),
        }
        .into());
    }

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(AdminError::SecurityError {
            path: path.to_path_buf(),
            reason: format!(
                "Config file is too large ({} bytes, maximum {} bytes)",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            ),
            hint: "Check that --config points at the intended file".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Validates a backend base URL: http(s) only, no query or fragment
///
/// Paths are appended verbatim, so a trailing query would corrupt every request.
pub fn validate_base_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Base URL must start with http:// or https:// (got '{}')",
                url
            )
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        anyhow::bail!("Base URL has no host: '{}'", url);
    }

    if rest.contains('?') || rest.contains('#') {
        anyhow::bail!("Base URL must not contain a query or fragment: '{}'", url);
    }

    Ok(())
}

/// Validates a single path segment substituted into an endpoint template
///
/// # Security
/// Prevents ids such as `../admin` from escaping the endpoint they target.
pub fn validate_path_segment(segment: &str, description: &str) -> Result<()> {
    if segment.is_empty() {
        anyhow::bail!("{} must not be empty", description);
    }

    if segment.contains('/') || segment.contains('\\') || segment.contains("..") {
        anyhow::bail!(
            "Security: {} contains path separators which are not allowed",
            description
        );
    }

    if segment.contains('#') || segment.contains('?') {
        anyhow::bail!("Security: {} contains URL-unsafe characters", description);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_config_file_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("admin.yml");
        fs::write(&path, "base_url: http://localhost:1337\n").unwrap();
        assert!(validate_config_file(&path).is_ok());
    }

    #[test]
    fn test_validate_config_file_missing() {
        let result = validate_config_file(Path::new("/nonexistent/admin.yml"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_config_file_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_config_file(temp_dir.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a regular file"));
    }

    #[test]
    fn test_validate_config_file_too_large() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("huge.yml");
        fs::write(&path, vec![b'#'; (MAX_CONFIG_FILE_SIZE + 1) as usize]).unwrap();
        let result = validate_config_file(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_config_file_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("real.yml");
        let link = temp_dir.path().join("link.yml");
        fs::write(&target, "").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let result = validate_config_file(&link);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("symbolic link"));
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("http://localhost:1337").is_ok());
        assert!(validate_base_url("https://cms.example.com/api").is_ok());
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("http://").is_err());
        assert!(validate_base_url("http://example.com?x=1").is_err());
    }

    #[test]
    fn test_validate_path_segment() {
        assert!(validate_path_segment("42", "id").is_ok());
        assert!(validate_path_segment("", "id").is_err());
        assert!(validate_path_segment("../admin", "id").is_err());
        assert!(validate_path_segment("1?x", "id").is_err());
    }
}
