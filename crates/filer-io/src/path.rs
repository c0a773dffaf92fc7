//! Extension extraction.

use std::ffi::OsStr;
use std::path::Path;

/// Extension of the last path component, including the leading dot.
///
/// The extension starts at the last `.` of the file name. Names without a
/// dot, and names whose only dot is the first character (`.bashrc`), have
/// no extension. A trailing dot yields `"."`. Non UTF-8 names have no
/// extension.
pub fn extname(path: &Path) -> &str {
    let Some(name) = path.file_name().and_then(OsStr::to_str) else {
        return "";
    };

    match name.rfind('.') {
        None | Some(0) => "",
        Some(dot) => &name[dot..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extname() {
        assert_eq!(extname(Path::new("data/config.json")), ".json");
        assert_eq!(extname(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extname(Path::new("README")), "");
        assert_eq!(extname(Path::new(".bashrc")), "");
        assert_eq!(extname(Path::new(".config.toml")), ".toml");
        assert_eq!(extname(Path::new("notes.")), ".");
        assert_eq!(extname(Path::new("dir.d/file")), "");
        assert_eq!(extname(Path::new("Upper.JSON")), ".JSON");
        assert_eq!(extname(Path::new("/")), "");
    }
}
