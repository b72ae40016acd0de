use std::fs;
use std::path::PathBuf;

use tagsugar_cli::{BuildOptions, EmitMode, FileFilter, build_cmd, check_cmd, collect_inputs};
use tagsugar_jsx::TransformOptions;

const PAGE: &str = r#"# Shopping
<$if test={items.length}>
  <ul><$for var="item" of={items}><li>{item}</li></$for></ul>
</$if>
"#;

fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn cli_build_emits_desugared_code() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = write(src_dir.path(), "page.mdx", PAGE);

    let opts = BuildOptions {
        out_dir: Some(out_dir.path().to_path_buf()),
        ..Default::default()
    };
    let written = build_cmd(&[input], &opts).expect("build");
    assert_eq!(written, vec![out_dir.path().join("page.mdx")]);

    let content = fs::read_to_string(&written[0]).unwrap();
    assert!(!content.contains("$if") && !content.contains("$for"), "{content}");
    assert!(content.contains("{(items.length) ? <>") || content.contains("{items.length ? <>"));
    assert!(content.contains("{items.map((item) => <><li>{item}</li></>)}"), "{content}");
}

#[test]
fn cli_build_writes_source_map() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = write(src_dir.path(), "page.mdx", PAGE);

    let opts = BuildOptions {
        out_dir: Some(out_dir.path().to_path_buf()),
        source_map: true,
        ..Default::default()
    };
    build_cmd(&[input], &opts).expect("build");

    let map = fs::read_to_string(out_dir.path().join("page.mdx.map.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&map).unwrap();
    let mappings = json["mappings"].as_array().expect("mappings array");
    assert!(!mappings.is_empty());
    assert!(mappings.iter().any(|m| m["original_line"] == 2 && m["original_column"] == 1));
}

#[test]
fn cli_build_tree_mode() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let input = write(src_dir.path(), "page.mdx", PAGE);

    let opts = BuildOptions {
        out_dir: Some(out_dir.path().to_path_buf()),
        emit: EmitMode::Tree,
        ..Default::default()
    };
    let written = build_cmd(&[input], &opts).expect("build");
    let dump = fs::read_to_string(&written[0]).unwrap();
    assert!(dump.contains("Conditional"));
    assert!(dump.contains("property: \"map\""));
}

#[test]
fn cli_build_reports_failing_file_but_builds_the_rest() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write(src_dir.path(), "a_good.mdx", PAGE);
    write(src_dir.path(), "b_bad.mdx", r#"<$for var="x" of={xs} step={1}>{x}</$for>"#);

    let opts = BuildOptions {
        out_dir: Some(out_dir.path().to_path_buf()),
        ..Default::default()
    };
    let err = build_cmd(&[src_dir.path().to_path_buf()], &opts).unwrap_err();
    assert!(err.to_string().contains("1 of 2 files failed"), "{err}");
    assert!(out_dir.path().join("a_good.mdx").exists());
    assert!(!out_dir.path().join("b_bad.mdx").exists());
}

#[test]
fn filter_selects_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "docs/a.mdx", PAGE);
    write(dir.path(), "docs/drafts/b.mdx", PAGE);
    write(dir.path(), "docs/notes.txt", "plain");
    write(dir.path(), "src/App.jsx", "<div/>");

    let filter = FileFilter::new(&[], &["**/drafts/**".to_string()]).unwrap();
    let files = collect_inputs(&[dir.path().to_path_buf()], &filter).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
    assert_eq!(names, vec![PathBuf::from("docs/a.mdx"), PathBuf::from("src/App.jsx")]);
    assert_eq!(files[0].path, dir.path().join("docs/a.mdx"));

    let only_jsx = FileFilter::new(&["**/*.jsx".to_string()], &[]).unwrap();
    assert_eq!(collect_inputs(&[dir.path().to_path_buf()], &only_jsx).unwrap().len(), 1);
    assert!(FileFilter::new(&["[".to_string()], &[]).is_err());
}

#[test]
fn cli_check_counts_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ok.mdx", PAGE);
    let filter = FileFilter::default();
    let n = check_cmd(&[dir.path().to_path_buf()], &filter, &TransformOptions::default()).unwrap();
    assert_eq!(n, 1);

    write(dir.path(), "loose.mdx", r#"<$let var="a b" value={1}>x</$let>"#);
    assert!(check_cmd(&[dir.path().to_path_buf()], &filter, &TransformOptions::default()).is_ok());
    let strict = TransformOptions {
        strict_patterns: true,
    };
    assert!(check_cmd(&[dir.path().to_path_buf()], &filter, &strict).is_err());
}

#[test]
fn cli_build_mirrors_input_tree() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write(src_dir.path(), "a/page.mdx", "<$if test={a}>A</$if>");
    write(src_dir.path(), "b/page.mdx", "<$if test={b}>B</$if>");

    let opts = BuildOptions {
        out_dir: Some(out_dir.path().to_path_buf()),
        source_map: true,
        ..Default::default()
    };
    let written = build_cmd(&[src_dir.path().to_path_buf()], &opts).expect("build");
    assert_eq!(
        written,
        vec![out_dir.path().join("a/page.mdx"), out_dir.path().join("b/page.mdx")]
    );
    assert_eq!(fs::read_to_string(&written[0]).unwrap(), "{a ? <>A</> : null}");
    assert_eq!(fs::read_to_string(&written[1]).unwrap(), "{b ? <>B</> : null}");
    assert!(out_dir.path().join("b/page.mdx.map.json").exists());
}

#[test]
fn cli_build_rejects_colliding_outputs() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let first = write(src_dir.path(), "a/page.mdx", "<$if test={a}>A</$if>");
    let second = write(src_dir.path(), "b/page.mdx", "<$if test={b}>B</$if>");

    let opts = BuildOptions {
        out_dir: Some(out_dir.path().to_path_buf()),
        ..Default::default()
    };
    // passed directly, both land on `page.mdx`
    let err = build_cmd(&[first, second], &opts).unwrap_err();
    assert!(err.to_string().contains("1 of 2 files failed"), "{err}");
    let kept = fs::read_to_string(out_dir.path().join("page.mdx")).unwrap();
    assert_eq!(kept, "{a ? <>A</> : null}");
}

#[test]
fn cli_check_counts_unreadable_files_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let ok = write(dir.path(), "ok.mdx", PAGE);
    let missing = dir.path().join("missing.mdx");

    let err = check_cmd(&[missing, ok], &FileFilter::default(), &TransformOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("1 of 2 files failed"), "{err}");
}

#[cfg(unix)]
#[test]
fn unreadable_directory_fails_collection() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "locked/a.mdx", PAGE);
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // root ignores mode bits; nothing to assert there
    let denied = fs::read_dir(&locked).is_err();
    let result = collect_inputs(&[dir.path().to_path_buf()], &FileFilter::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if denied {
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"), "{err:#}");
    } else {
        assert_eq!(result.unwrap().len(), 1);
    }
}
