use super::*;

fn install(root: &Path, repo: &str, name: &str) -> PathBuf {
    let dir = root.join(repo).join(platform_dir());
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
    std::fs::write(&path, b"").unwrap();
    path
}

#[test]
fn override_wins_over_roots() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "resvg", "resvg");
    let custom = root.path().join("my-resvg");
    std::fs::write(&custom, b"").unwrap();

    let resolver = ExecutableResolver::with_roots(vec![root.path().to_path_buf()])
        .with_override("resvg", &custom);
    assert_eq!(resolver.resolve("resvg", "resvg").unwrap(), custom);
}

#[test]
fn missing_override_is_reported_not_skipped() {
    let root = tempfile::tempdir().unwrap();
    install(root.path(), "resvg", "resvg");
    let resolver = ExecutableResolver::with_roots(vec![root.path().to_path_buf()])
        .with_override("resvg", "/nonexistent/resvg");
    let err = resolver.resolve("resvg", "resvg").unwrap_err();
    match err {
        TokenpressError::ExecutableNotFound { tool, searched } => {
            assert_eq!(tool, "resvg");
            assert_eq!(searched, vec![PathBuf::from("/nonexistent/resvg")]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn roots_are_searched_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let expected = install(second.path(), "rsvg-convert", "rsvg-convert");

    let resolver = ExecutableResolver::with_roots(vec![
        first.path().to_path_buf(),
        second.path().to_path_buf(),
    ]);
    assert_eq!(
        resolver.resolve("rsvg-convert", "rsvg-convert").unwrap(),
        expected
    );
}

#[test]
fn bin_root_override_is_exclusive() {
    let normal = tempfile::tempdir().unwrap();
    let exclusive = tempfile::tempdir().unwrap();
    install(normal.path(), "resvg", "resvg");

    let resolver = ExecutableResolver::with_roots(vec![normal.path().to_path_buf()])
        .with_bin_root_override(exclusive.path());
    let err = resolver.resolve("resvg", "resvg").unwrap_err();
    let TokenpressError::ExecutableNotFound { searched, .. } = err else {
        panic!("expected ExecutableNotFound");
    };
    assert!(searched.iter().all(|p| p.starts_with(exclusive.path())));

    let expected = install(exclusive.path(), "resvg", "resvg");
    assert_eq!(resolver.resolve("resvg", "resvg").unwrap(), expected);
}

#[test]
fn config_wires_overrides_and_bin_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunConfig::default().with_bin_dir(dir.path());
    let err = ExecutableResolver::from_config(&cfg)
        .resolve("chromium", "chromium")
        .unwrap_err();
    assert!(matches!(err, TokenpressError::ExecutableNotFound { .. }));
}
