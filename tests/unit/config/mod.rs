use super::*;

#[test]
fn empty_json_yields_defaults() {
    let cfg: RunConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, RunConfig::default());
    assert_eq!(cfg.target_format().unwrap(), "pdf");
    assert_eq!(cfg.page_size().unwrap(), Size::new(210.0, 297.0));
}

#[test]
fn flattened_layout_keys_accept_names_lists_and_all() {
    let cfg: RunConfig = serde_json::from_str(
        r#"{
            "output_file": "out.svg",
            "layout": "single",
            "bin_algo": "bff",
            "pack_algo": ["MaxRectsBssf", "SkylineMwf"],
            "sort_algo": "all",
            "rotation": false,
            "threads": 2
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.packing.layout, LayoutKind::Single);
    assert_eq!(
        cfg.packing.bin_algo.as_ref().and_then(Choice::names),
        Some(vec!["bff".to_string()])
    );
    assert_eq!(
        cfg.packing.pack_algo.as_ref().and_then(Choice::names),
        Some(vec!["MaxRectsBssf".to_string(), "SkylineMwf".to_string()])
    );
    assert_eq!(cfg.packing.sort_algo.as_ref().and_then(Choice::names), None);
    assert_eq!(cfg.packing.rotation, Some(false));
    assert_eq!(cfg.target_format().unwrap(), "svg");
}

#[test]
fn explicit_page_dimensions_and_named_sizes() {
    let cfg: RunConfig = serde_json::from_str(r#"{ "page_size": [100, 150] }"#).unwrap();
    assert_eq!(cfg.page_size().unwrap(), Size::new(100.0, 150.0));

    let cfg: RunConfig = serde_json::from_str(r#"{ "page_size": "Letter-landscape" }"#).unwrap();
    assert_eq!(cfg.page_size().unwrap(), Size::new(216.0, 279.0));

    let cfg: RunConfig = serde_json::from_str(r#"{ "page_size": "napkin" }"#).unwrap();
    assert!(cfg.validate().is_err());
}

#[test]
fn output_format_overrides_extension() {
    let cfg = RunConfig::new("out.bin").with_output_format("PNG");
    assert_eq!(cfg.target_format().unwrap(), "png");

    let err = RunConfig::new("no_extension").target_format().unwrap_err();
    assert!(matches!(err, TokenpressError::Configuration(_)));
}

#[test]
fn validation_rejects_bad_values() {
    let mut cfg = RunConfig::default();
    cfg.page_margin = -1.0;
    assert!(cfg.validate().is_err());

    let mut cfg = RunConfig::default();
    cfg.packing.threads = Some(0);
    assert!(cfg.validate().is_err());

    let mut cfg = RunConfig::default();
    cfg.idle_poll_ms = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(
        &path,
        r#"{ "output_file": "tokens.html", "executables": { "resvg": "/opt/resvg" } }"#,
    )
    .unwrap();
    let cfg = RunConfig::from_path(&path).unwrap();
    assert_eq!(cfg.output_file, PathBuf::from("tokens.html"));
    assert_eq!(
        cfg.executables.get("resvg"),
        Some(&PathBuf::from("/opt/resvg"))
    );

    assert!(RunConfig::from_path(dir.path().join("missing.json")).is_err());
}
