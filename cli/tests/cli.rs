use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn diaflow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_diaflow"))
        .arg("--no-color")
        .args(args)
        .env_remove("DIAFLOW_LOG")
        .output()
        .expect("failed to run diaflow")
}

fn fixtures() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .to_string_lossy()
        .into_owned()
}

#[test]
fn bundled_fixtures_pass() {
    let out = diaflow(&["test", &fixtures()]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "{stderr}");
    assert!(stderr.contains("test result: ok. 7 passed, 0 failed"), "{stderr}");
}

#[test]
fn category_filter() {
    let out = diaflow(&["test", &fixtures(), "-c", "corrupt"]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(out.status.success(), "{stderr}");
    assert!(stderr.contains("4 passed"), "{stderr}");
}

#[test]
fn new_then_check() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("prog.xml");
    let file = file.to_str().unwrap();

    assert!(diaflow(&["new", file, "--name", "start"]).status.success());
    assert_eq!(
        fs::read_to_string(file).unwrap(),
        "<prog>\n    <func name=\"start\">\n        <body/>\n    </func>\n</prog>\n"
    );
    assert!(!diaflow(&["new", file]).status.success());

    let out = diaflow(&["check", file]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("ok:"));
}

#[test]
fn check_reports_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.xml");
    fs::write(&file, "<prog>\n  <func>\n    <body/>\n  </func>\n</prog>\n").unwrap();

    let out = diaflow(&["check", file.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing required attribute `name`"), "{stderr}");
    assert!(stderr.contains("cannot be opened"), "{stderr}");
}

#[test]
fn fmt_normalizes_layout() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("messy.xml");
    let config = dir.path().join("diaflow.toml");
    fs::write(
        &file,
        "<prog><func name=\"m\">  <body>\n<break></break></body></func></prog>",
    )
    .unwrap();
    fs::write(&config, "[write]\nindent = 2\n").unwrap();

    let file = file.to_str().unwrap();
    assert!(!diaflow(&["fmt", file, "--check"]).status.success());

    let out = diaflow(&["fmt", file, "--config", config.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        fs::read_to_string(file).unwrap(),
        "<prog>\n  <func name=\"m\">\n    <body>\n      <break/>\n    </body>\n  </func>\n</prog>\n"
    );
}

#[test]
fn fmt_check_accepts_formatted_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tidy.xml");
    let file = file.to_str().unwrap();

    assert!(diaflow(&["new", file]).status.success());
    let out = diaflow(&["fmt", file, "--check"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let missing = dir.path().join("missing.xml");
    let out = diaflow(&["fmt", missing.to_str().unwrap(), "--check"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("cannot access"), "{stderr}");
    assert!(!stderr.contains("is not formatted"), "{stderr}");
}

#[test]
fn check_reports_invalid_utf8_as_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("binary.xml");
    fs::write(&file, b"<prog>\xff\xfe</prog>").unwrap();

    let out = diaflow(&["check", file.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("corrupted program"), "{stderr}");
    assert!(stderr.contains("UTF-8"), "{stderr}");
}

#[test]
fn check_rejects_runaway_nesting() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("deep.xml");
    let depth = 100_000;
    let text = String::from("<prog><func name=\"f\"><body>")
        + &"<while cond=\"a\">".repeat(depth)
        + &"</while>".repeat(depth)
        + "</body></func></prog>";
    fs::write(&file, text).unwrap();

    let out = diaflow(&["check", file.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("nested more than"), "{stderr}");
}

#[test]
fn show_lists_functions() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("two.xml");
    fs::write(
        &file,
        r#"<prog><func name="b"><arg name="x"/><arg name="y"/><body><break/></body></func><func name="a"><body/></func></prog>"#,
    )
    .unwrap();

    let out = diaflow(&["show", file.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "a()  0 statements\nb(x, y)  1 statements\n"
    );
}
