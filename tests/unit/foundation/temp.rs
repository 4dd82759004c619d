use super::*;

#[test]
fn cleanup_removes_every_registered_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempFiles::new("test").in_dir(Some(dir.path().to_path_buf()));

    let a = temps.reserve(".svg").unwrap();
    let b = temps.write(".html", b"<html/>").unwrap();
    assert!(a.exists());
    assert_eq!(std::fs::read(&b).unwrap(), b"<html/>");
    assert!(a.extension().is_some_and(|e| e == "svg"));
    assert_eq!(temps.len(), 2);

    temps.cleanup();
    assert!(temps.is_empty());
    assert!(!a.exists());
    assert!(!b.exists());
}

#[test]
fn adopted_paths_are_removed_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let foreign = dir.path().join("made-by-tool.pdf");
    std::fs::write(&foreign, b"%PDF").unwrap();
    {
        let mut temps = TempFiles::new("test");
        temps.adopt(&foreign).unwrap();
    }
    assert!(!foreign.exists());
}

#[test]
fn cleanup_tolerates_already_removed_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut temps = TempFiles::new("test").in_dir(Some(dir.path().to_path_buf()));
    let a = temps.reserve(".txt").unwrap();
    std::fs::remove_file(&a).unwrap();
    temps.cleanup();
    temps.cleanup();
    assert!(temps.is_empty());
}
