//! Interpreter line handling
//!
//! A script may start with `#!/usr/bin/env cs` so it can be executed
//! directly. The compiler rejects that line, so the build compiles a
//! scratch copy without it.

use crate::error::{CsError, CsResult};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Whether `source` starts with an interpreter marker
pub fn has_shebang(source: &[u8]) -> bool {
    source.starts_with(b"#!")
}

/// Drop the first line, including its newline.
///
/// A file consisting only of the marker line strips to nothing.
pub fn strip_first_line(source: &[u8]) -> &[u8] {
    match source.iter().position(|&b| b == b'\n') {
        Some(newline) => &source[newline + 1..],
        None => &[],
    }
}

/// Directory holding `source`; `.` for a bare file name
fn source_dir(source: &Path) -> &Path {
    match source.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Create an empty scratch file next to `source` so quoted includes
/// resolve against the script's directory. Falls back to the temp dir
/// when that directory is read-only.
fn create_scratch(source: &Path) -> CsResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".cs-").suffix(".c");

    let dir = source_dir(source);
    match builder.tempfile_in(dir) {
        Ok(file) => Ok(file),
        Err(e) => {
            debug!("Scratch in {} failed ({}), using temp dir", dir.display(), e);
            builder
                .tempfile()
                .map_err(|e| CsError::io("creating scratch source file", e))
        }
    }
}

/// Write a marker-free copy of `source` to a scratch file.
///
/// Returns `None` when the source has no marker line. The scratch file is
/// deleted when the returned handle is dropped.
pub fn prepare_scratch(source: &Path) -> CsResult<Option<NamedTempFile>> {
    let content = fs::read(source).map_err(|e| CsError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    })?;
    if !has_shebang(&content) {
        return Ok(None);
    }

    let mut scratch = create_scratch(source)?;
    scratch
        .write_all(strip_first_line(&content))
        .and_then(|()| scratch.flush())
        .map_err(|e| CsError::io("writing scratch source file", e))?;

    Ok(Some(scratch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_marker_only_at_start() {
        assert!(has_shebang(b"#!/usr/bin/env cs\nint main;"));
        assert!(!has_shebang(b" #!/usr/bin/env cs\n"));
        assert!(!has_shebang(b"#include <stdio.h>\n"));
        assert!(!has_shebang(b"#"));
        assert!(!has_shebang(b""));
    }

    #[test]
    fn strips_through_first_newline() {
        assert_eq!(strip_first_line(b"#!cs\nline2\nline3\n"), b"line2\nline3\n");
        assert_eq!(strip_first_line(b"#!cs\n"), b"");
        assert_eq!(strip_first_line(b"#!cs"), b"");
    }

    #[test]
    fn scratch_matches_manually_stripped_file() {
        let dir = TempDir::new().unwrap();
        let body = "#include <stdio.h>\nint main(void) { puts(\"hi\"); return 0; }\n";
        let script = dir.path().join("hello.c");
        fs::write(&script, format!("#!/usr/bin/env cs --cflags -O2\n{body}")).unwrap();

        let scratch = prepare_scratch(&script).unwrap().expect("scratch file");
        assert_eq!(fs::read_to_string(scratch.path()).unwrap(), body);
        assert_eq!(scratch.path().extension().unwrap(), "c");
    }

    #[test]
    fn scratch_sits_next_to_source() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("tool.c");
        fs::write(dir.path().join("local.h"), "#define ANSWER 42\n").unwrap();
        fs::write(&script, "#!/usr/bin/env cs\n#include \"local.h\"\n").unwrap();

        let scratch = prepare_scratch(&script).unwrap().unwrap();
        assert_eq!(scratch.path().parent(), Some(dir.path()));
        assert!(scratch.path().with_file_name("local.h").is_file());
    }

    #[test]
    fn bare_file_name_uses_current_dir() {
        assert_eq!(source_dir(Path::new("tool.c")), Path::new("."));
        assert_eq!(source_dir(Path::new("bin/tool.c")), Path::new("bin"));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_source_dir_falls_back_to_temp() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("tool.c");
        fs::write(&script, "#!/usr/bin/env cs\nint main(void) { return 0; }\n").unwrap();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        let result = prepare_scratch(&script);
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        let scratch = result.unwrap().unwrap();
        // root ignores directory permissions, so either location is valid
        let parent = scratch.path().parent().unwrap();
        assert!(parent == dir.path() || parent == std::env::temp_dir());
    }

    #[test]
    fn scratch_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("hello.c");
        fs::write(&script, "#!/usr/bin/env cs\nint main(void) { return 0; }\n").unwrap();

        let scratch = prepare_scratch(&script).unwrap().unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn plain_source_needs_no_scratch() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("hello.c");
        fs::write(&script, "int main(void) { return 0; }\n").unwrap();

        assert!(prepare_scratch(&script).unwrap().is_none());
    }
}
