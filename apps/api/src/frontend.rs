use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;

pub const DEFAULT_INDEX_HTML: &str = "<h1>Welcome to CloudPulse</h1>\
<p>Go to <a href=\"/api/ec2-usage\">/api/ec2-usage</a> for EC2 usage, \
<a href=\"/api/github-users\">/api/github-users</a> for repository collaborators \
or <a href=\"/api/free-tier-usage\">/api/free-tier-usage</a> for free tier notes.</p>\n";

/// Creates `dir` with a placeholder `index.html` when it does not exist.
/// Returns whether anything was written.
pub fn ensure_frontend_dir(dir: &Path) -> io::Result<bool> {
    if dir.exists() {
        return Ok(false);
    }

    warn!("Frontend directory {} not found, creating a default index.html", dir.display());
    fs::create_dir_all(dir)?;
    fs::write(dir.join("index.html"), DEFAULT_INDEX_HTML)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_index() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frontend");

        assert!(ensure_frontend_dir(&dir).unwrap());
        let index = fs::read_to_string(dir.join("index.html")).unwrap();
        assert!(index.contains("/api/ec2-usage"));
    }

    #[test]
    fn test_existing_directory_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("index.html"), "custom").unwrap();

        assert!(!ensure_frontend_dir(tmp.path()).unwrap());
        assert_eq!(fs::read_to_string(tmp.path().join("index.html")).unwrap(), "custom");
    }
}
