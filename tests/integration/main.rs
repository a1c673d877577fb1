//! Integration tests for cs

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Stand-in compiler: counts invocations, copies the input source
    /// to a capture file, resolves quoted includes against the input's
    /// directory and writes a shell-script artifact to `-o`.
    const FAKE_CC: &str = r#"#!/bin/sh
echo compile >> "$FAKECC_COUNTER"
out=""
prev=""
for a in "$@"; do
    if [ "$prev" = "-o" ]; then
        out="$a"
    elif [ -f "$a" ]; then
        cat "$a" > "$FAKECC_CAPTURE"
        for inc in $(sed -n 's/^#include "\(.*\)"$/\1/p' "$a"); do
            if [ ! -f "$(dirname "$a")/$inc" ]; then
                echo "$a: fatal error: $inc: No such file or directory" >&2
                exit 1
            fi
        done
    fi
    prev="$a"
done
if [ -n "$FAKECC_FAIL" ]; then
    exit "$FAKECC_FAIL"
fi
printf '#!/bin/sh\necho "args: $*"\nexit ${ARTIFACT_EXIT:-0}\n' > "$out"
chmod +x "$out"
"#;

    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let cc = dir.path().join("fakecc");
            fs::write(&cc, FAKE_CC).unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&cc, fs::Permissions::from_mode(0o755)).unwrap();
            }
            fs::write(
                dir.path().join("hello.c"),
                "int main(void) { return 0; }\n",
            )
            .unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn cache(&self) -> PathBuf {
            self.path("cache")
        }

        fn cs(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("cs");
            cmd.current_dir(self.dir.path())
                .env("CS_CONFIG", self.path("config.toml"))
                .env_remove("CS_CACHE_DIR")
                .env("FAKECC_COUNTER", self.path("counter"))
                .env("FAKECC_CAPTURE", self.path("capture"))
                .env_remove("FAKECC_FAIL")
                .arg("--cc")
                .arg(self.path("fakecc"));
            cmd
        }

        fn compiles(&self) -> usize {
            fs::read_to_string(self.path("counter"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("cs")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Run C source files like scripts with a content-addressed build cache",
            ));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("cs")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cs"));
    }

    #[test]
    fn missing_source_argument() {
        cargo_bin_cmd!("cs").assert().failure();
    }

    #[cfg(unix)]
    #[test]
    fn runs_program_with_forwarded_args() {
        let sb = Sandbox::new();
        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .args(["hello.c", "one", "-v", "two"])
            .assert()
            .success()
            .stdout("args: one -v two\n");
    }

    #[cfg(unix)]
    #[test]
    fn cache_hit_compiles_once() {
        let sb = Sandbox::new();
        for _ in 0..2 {
            sb.cs()
                .arg("--cache-dir")
                .arg(sb.cache())
                .arg("hello.c")
                .assert()
                .success();
        }
        assert_eq!(sb.compiles(), 1);

        let cached = entries(&sb.cache());
        assert_eq!(cached.len(), 1);
        let suffix = cached[0].strip_prefix("hello.c-").unwrap();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[cfg(unix)]
    #[test]
    fn cache_dir_from_env() {
        let sb = Sandbox::new();
        sb.cs()
            .env("CS_CACHE_DIR", sb.path("env-cache"))
            .arg("hello.c")
            .assert()
            .success();
        assert_eq!(entries(&sb.path("env-cache")).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn changed_flags_rebuild() {
        let sb = Sandbox::new();
        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .arg("hello.c")
            .assert()
            .success();
        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .args(["--cflags", "-O2", "hello.c"])
            .assert()
            .success();

        assert_eq!(sb.compiles(), 2);
        assert_eq!(entries(&sb.cache()).len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn no_cache_compiles_every_time() {
        let sb = Sandbox::new();
        for _ in 0..2 {
            sb.cs()
                .arg("--cache-dir")
                .arg(sb.cache())
                .args(["--no-cache", "hello.c"])
                .assert()
                .success();
        }
        assert_eq!(sb.compiles(), 2);
        assert!(!sb.cache().exists());
    }

    #[cfg(unix)]
    #[test]
    fn no_cache_leaves_one_artifact() {
        let sb = Sandbox::new();
        let tmp = sb.path("tmp");
        fs::create_dir(&tmp).unwrap();

        for _ in 0..3 {
            sb.cs()
                .env("TMPDIR", &tmp)
                .args(["--no-cache", "hello.c"])
                .assert()
                .success();
        }

        let left: Vec<String> = entries(&tmp)
            .into_iter()
            .filter(|name| name.starts_with("cs-hello.c-"))
            .collect();
        assert_eq!(sb.compiles(), 3);
        assert_eq!(left.len(), 1, "{left:?}");
    }

    #[cfg(unix)]
    #[test]
    fn shebang_line_is_stripped() {
        let sb = Sandbox::new();
        let body = "#include <stdio.h>\nint main(void) { return 0; }\n";
        fs::write(sb.path("script.c"), format!("#!/usr/bin/env cs\n{body}")).unwrap();

        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .arg("script.c")
            .assert()
            .success();

        assert_eq!(fs::read_to_string(sb.path("capture")).unwrap(), body);
    }

    #[cfg(unix)]
    #[test]
    fn shebang_script_includes_local_header() {
        let sb = Sandbox::new();
        fs::create_dir(sb.path("tools")).unwrap();
        fs::write(sb.path("tools/local.h"), "#define GREETING \"hi\"\n").unwrap();
        fs::write(
            sb.path("tools/greet.c"),
            "#!/usr/bin/env cs\n#include \"local.h\"\nint main(void) { return 0; }\n",
        )
        .unwrap();

        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .args(["tools/greet.c", "x"])
            .assert()
            .success()
            .stdout("args: x\n");

        let leftovers: Vec<String> = entries(&sb.path("tools"))
            .into_iter()
            .filter(|name| name.starts_with(".cs-"))
            .collect();
        assert!(leftovers.is_empty(), "scratch not removed: {leftovers:?}");
    }

    #[cfg(unix)]
    #[test]
    fn missing_local_header_fails_compile() {
        let sb = Sandbox::new();
        fs::write(
            sb.path("script.c"),
            "#!/usr/bin/env cs\n#include \"absent.h\"\nint main(void) { return 0; }\n",
        )
        .unwrap();

        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .arg("script.c")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("absent.h"));
    }

    #[cfg(unix)]
    #[test]
    fn program_exit_code_propagates() {
        let sb = Sandbox::new();
        sb.cs()
            .env("ARTIFACT_EXIT", "7")
            .arg("--cache-dir")
            .arg(sb.cache())
            .arg("hello.c")
            .assert()
            .code(7);
    }

    #[cfg(unix)]
    #[test]
    fn compile_failure_exit_code_propagates() {
        let sb = Sandbox::new();
        sb.cs()
            .env("FAKECC_FAIL", "3")
            .arg("--cache-dir")
            .arg(sb.cache())
            .arg("hello.c")
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Compile failed (3)"));

        assert!(entries(&sb.cache()).is_empty());
    }

    #[test]
    fn source_not_found() {
        let sb = Sandbox::new();
        sb.cs()
            .arg("--cache-dir")
            .arg(sb.cache())
            .arg("missing.c")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Source file not found: missing.c"));
        assert_eq!(sb.compiles(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn config_file_supplies_compiler_flags() {
        let sb = Sandbox::new();
        fs::write(
            sb.path("config.toml"),
            format!(
                "[build]\ncflags = [\"-DFROM_CONFIG\"]\n\n[cache]\ndir = \"{}\"\n",
                sb.path("config-cache").display()
            ),
        )
        .unwrap();

        sb.cs().arg("-v").arg("hello.c").assert().success().stderr(
            predicate::str::contains("-DFROM_CONFIG").and(predicate::str::contains("compile:")),
        );
        assert_eq!(entries(&sb.path("config-cache")).len(), 1);
    }

    #[test]
    fn invalid_config_rejected() {
        let sb = Sandbox::new();
        fs::write(sb.path("config.toml"), "[build\ncc = 1").unwrap();

        sb.cs()
            .arg("hello.c")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn update_requires_repository() {
        let sb = Sandbox::new();
        sb.cs()
            .env_remove("CS_REPO_OWNER")
            .env_remove("CS_REPO_NAME")
            .arg("--update")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("CS_REPO_OWNER"));
    }

    #[test]
    fn update_failure_reported_once() {
        let sb = Sandbox::new();
        fs::write(
            sb.path("config.toml"),
            "[update]\napi_base = \"http://127.0.0.1:1\"\nmax_attempts = 1\n",
        )
        .unwrap();

        let output = sb
            .cs()
            .env("CS_REPO_OWNER", "acme")
            .env("CS_REPO_NAME", "cs")
            .env("CI", "1")
            .env_remove("HTTP_PROXY")
            .env_remove("HTTPS_PROXY")
            .env_remove("ALL_PROXY")
            .arg("--update")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Update failed"))
            .get_output()
            .clone();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(!stdout.contains("127.0.0.1"), "{stdout}");
        assert_eq!(stderr.matches("Request to http://127.0.0.1:1").count(), 1, "{stderr}");
    }
}
