use anyhow::Result;
use cbir::{build_database, query_image, FeatureDb, Registry, TaskId};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;

fn solid(dir: &Path, name: &str, value: u8) -> Result<()> {
    RgbImage::from_pixel(16, 12, Rgb([value, value, value])).save(dir.join(name))?;
    Ok(())
}

fn names(matches: &[cbir::Match]) -> Vec<&str> {
    matches.iter().map(|m| m.filename.as_str()).collect()
}

#[test]
fn build_then_query_excludes_target() -> Result<()> {
    let dir = tempfile::tempdir()?;
    solid(dir.path(), "a.png", 10)?;
    solid(dir.path(), "b.png", 20)?;
    solid(dir.path(), "c.png", 200)?;
    let csv = dir.path().join("features.csv");

    let spec = Registry::default().spec(TaskId::CenterPatch);
    let report = build_database(dir.path(), &csv, &spec)?;
    assert_eq!(report.written, 3);
    assert_eq!(report.skipped, 0);

    let db = FeatureDb::open(&csv)?;
    assert_eq!(db.len(), 3);
    assert!(db.rows().iter().all(|r| r.vector.len() == 147));

    let matches = query_image(dir.path().join("a.png"), &db, &spec, 10)?;
    assert_eq!(names(&matches), vec!["b.png", "c.png"]);
    assert_eq!(matches[0].distance, 147.0 * 100.0);
    assert!(matches[0].distance < matches[1].distance);
    Ok(())
}

#[test]
fn top_n_larger_than_database() -> Result<()> {
    let dir = tempfile::tempdir()?;
    solid(dir.path(), "x.png", 0)?;
    solid(dir.path(), "y.png", 255)?;
    let csv = dir.path().join("features.csv");
    let spec = Registry::default().spec(TaskId::Chromaticity);
    build_database(dir.path(), &csv, &spec)?;

    // the target is not part of the database
    let query_dir = tempfile::tempdir()?;
    solid(query_dir.path(), "q.png", 128)?;
    let db = FeatureDb::open(&csv)?;
    let matches = query_image(query_dir.path().join("q.png"), &db, &spec, 5)?;
    assert_eq!(matches.len(), 2);
    Ok(())
}

#[test]
fn unreadable_and_refused_images_are_skipped() -> Result<()> {
    let dir = tempfile::tempdir()?;
    solid(dir.path(), "ok.png", 90)?;
    fs::write(dir.path().join("broken.jpg"), b"not an image")?;
    RgbImage::from_pixel(5, 5, Rgb([1, 2, 3])).save(dir.path().join("tiny.png"))?;
    fs::write(dir.path().join("notes.txt"), b"ignored")?;
    let csv = dir.path().join("features.csv");

    let spec = Registry::default().spec(TaskId::CenterPatch);
    let report = build_database(dir.path(), &csv, &spec)?;
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped, 2);

    let db = FeatureDb::open(&csv)?;
    let stored: Vec<&str> = db.rows().iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(stored, vec!["ok.png"]);
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_name_is_counted_as_skipped() -> Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir()?;
    solid(dir.path(), "ok.png", 90)?;
    let latin1 = dir.path().join(OsStr::from_bytes(b"caf\xe9.png"));
    fs::copy(dir.path().join("ok.png"), latin1)?;
    let csv = dir.path().join("features.csv");

    let spec = Registry::default().spec(TaskId::CenterPatch);
    let report = build_database(dir.path(), &csv, &spec)?;
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped, 1);
    Ok(())
}

#[test]
fn unwritable_output_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    solid(dir.path(), "a.png", 10)?;
    let output = dir.path().join("missing").join("out.csv");
    let spec = Registry::default().spec(TaskId::CenterPatch);
    let err = build_database(dir.path(), &output, &spec).unwrap_err();
    assert!(format!("{err:#}").contains("cannot open output"));
    Ok(())
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let spec = Registry::default().spec(TaskId::CenterPatch);
    let err = build_database(dir.path().join("nope"), dir.path().join("out.csv"), &spec);
    assert!(err.is_err());
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn binary_database_matches_csv() -> Result<()> {
    let dir = tempfile::tempdir()?;
    solid(dir.path(), "a.png", 30)?;
    solid(dir.path(), "b.png", 60)?;
    solid(dir.path(), "c.png", 90)?;
    let out = tempfile::tempdir()?;
    let csv = out.path().join("db.csv");
    let fdb = out.path().join("db.fdb");

    let spec = Registry::default().spec(TaskId::ColorTexture);
    build_database(dir.path(), &csv, &spec)?;
    build_database(dir.path(), &fdb, &spec)?;

    let from_csv = FeatureDb::open(&csv)?;
    let from_bin = FeatureDb::open(&fdb)?;
    assert_eq!(from_csv.len(), 3);
    for row in from_csv.rows() {
        let other = from_bin.find(&row.filename).expect("row in binary db");
        assert_eq!(other.vector, row.vector);
    }

    let target = dir.path().join("b.png");
    let a = query_image(&target, &from_csv, &spec, 3)?;
    let b = query_image(&target, &from_bin, &spec, 3)?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn mismatched_rows_are_ignored_by_query() -> Result<()> {
    let dir = tempfile::tempdir()?;
    solid(dir.path(), "a.png", 10)?;
    let csv = dir.path().join("mixed.csv");
    fs::write(&csv, "short.png,1,2,3\nbad.png,1,x\n")?;

    let db = FeatureDb::open(&csv)?;
    assert_eq!(db.len(), 1);
    let spec = Registry::default().spec(TaskId::CenterPatch);
    let matches = query_image(dir.path().join("a.png"), &db, &spec, 5)?;
    assert!(matches.is_empty());
    Ok(())
}
