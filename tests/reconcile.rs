//! End-to-end runs against temporary Jekyll trees through the public API.

use image::{ImageEncoder, RgbImage};
use site_assets::config::{BackendKind, SiteConfig, load_config};
use site_assets::imaging::{RustBackend, backend_from_config};
use site_assets::policy::{Remediate, ReportOnly};
use site_assets::reconcile::{MissingAction, ReconcileError, Report, Session, WasteAction};
use site_assets::repair::FsRenamer;
use site_assets::resolve::Variant;
use site_assets::scan::find_source_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("_posts")).unwrap();
    fs::create_dir_all(tmp.path().join("_images")).unwrap();
    tmp
}

fn post(root: &Path, name: &str, date: &str, body: &str) {
    write(
        &root.join("_posts").join(name),
        &format!("---\nlayout: post\ndate: '{date}'\n---\n{body}"),
    );
}

fn jpeg(path: &Path, width: u32, height: u32) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let file = fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    path.to_path_buf()
}

fn check(root: &Path) -> Report {
    let mut session = Session::open(root, SiteConfig::default()).unwrap();
    session.scan(&FsRenamer).unwrap();
    session.validate(&mut ReportOnly).unwrap()
}

#[test]
fn unreferenced_file_is_waste_and_nothing_missing() {
    let tmp = site();
    post(tmp.path(), "2013-11-27-foo-bar.markdown", "2013-11-27", "![a](/images/a.jpg)\n");
    write(&tmp.path().join("_images/a.jpg"), "a");
    write(&tmp.path().join("_images/b.jpg"), "b");

    let report = check(tmp.path());

    let waste: Vec<_> = report.waste.iter().map(|w| w.path.as_str()).collect();
    assert_eq!(waste, vec!["/_images/b.jpg"]);
    assert!(report.missing.is_empty());
}

#[test]
fn missing_lists_every_referrer() {
    let tmp = site();
    post(
        tmp.path(),
        "2013-11-27-foo.markdown",
        "2013-11-27",
        "{% slide /images/2013/11/IMG_1 %}\n",
    );
    write(
        &tmp.path().join("about.md"),
        "---\nlayout: page\n---\n[![t](/images/2013/11/IMG_1_t.jpg \"t\")](/images/2013/11/IMG_1_l.jpg \"l\")\n",
    );
    write(&tmp.path().join("_images/2013/11/IMG_1_t.jpg"), "t");

    let report = check(tmp.path());

    assert!(report.waste.is_empty());
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].path, "/_images/2013/11/IMG_1_l.jpg");
    assert_eq!(report.missing[0].referrers, vec!["foo.html", "about.html"]);
}

#[test]
fn duplicate_url_aborts_scan() {
    let tmp = site();
    post(tmp.path(), "2013-11-27-foo.markdown", "2013-11-27", "");
    post(tmp.path(), "2014-01-01-foo.md", "2014-01-01", "");

    let mut session = Session::open(tmp.path(), SiteConfig::default()).unwrap();
    let err = session.scan(&FsRenamer).unwrap_err();

    assert!(matches!(err, ReconcileError::DuplicateUrl(_)));
    let message = err.to_string();
    assert!(message.contains("2013-11-27-foo.markdown"));
    assert!(message.contains("2014-01-01-foo.md"));
}

#[test]
fn source_dir_found_from_posts() {
    let tmp = site();
    let root = find_source_dir(&tmp.path().join("_posts"), &SiteConfig::default().layout).unwrap();
    assert_eq!(root, tmp.path());
}

#[test]
fn fix_generates_variants_and_deletes_waste() {
    let tmp = site();
    let archive = TempDir::new().unwrap();
    jpeg(&archive.path().join("2013/11/IMG_1.jpg"), 1000, 800);
    post(
        tmp.path(),
        "2013-11-27-foo.markdown",
        "2013-11-27",
        "{% cover /images/2013/11/IMG_1 %}\n![gone](/images/2013/11/IMG_9_t.jpg)\n",
    );
    write(&tmp.path().join("_images/2013/11/old_t.jpg"), "w");

    let mut config = SiteConfig::default();
    config.originals.roots = vec![archive.path().to_string_lossy().to_string()];
    config.tools.backend = BackendKind::Builtin;

    let backend = RustBackend::new();
    let mut session = Session::open(tmp.path(), config.clone()).unwrap();
    session.scan(&FsRenamer).unwrap();
    let mut policy = Remediate::new(tmp.path(), &config, &backend);
    let report = session.validate(&mut policy).unwrap();

    assert_eq!(report.waste.len(), 1);
    assert_eq!(report.waste[0].action, WasteAction::Deleted);
    assert!(!tmp.path().join("_images/2013/11/old_t.jpg").exists());

    let thumb = tmp.path().join("_images/2013/11/IMG_1_t.jpg");
    let medium = tmp.path().join("_images/2013/11/IMG_1_c.jpg");
    assert_eq!(image::image_dimensions(&thumb).unwrap(), (150, 150));
    assert_eq!(image::image_dimensions(&medium).unwrap(), (750, 600));
    assert!(report.missing.iter().any(|m| matches!(
        m.action,
        MissingAction::Generated {
            variant: Variant::Medium,
            ..
        }
    )));

    let originals: Vec<_> = report.originals_missing().map(|m| m.path.as_str()).collect();
    assert_eq!(originals, vec!["/_images/2013/11/IMG_9_t.jpg"]);

    // A second check sees only the variant without an original.
    let again = check(tmp.path());
    assert!(again.waste.is_empty());
    let missing: Vec<_> = again.missing.iter().map(|m| m.path.as_str()).collect();
    assert_eq!(missing, vec!["/_images/2013/11/IMG_9_t.jpg"]);
}

#[test]
fn config_file_selects_backend_and_layout() {
    let tmp = site();
    write(
        &tmp.path().join("site-assets.toml"),
        "[tools]\nbackend = \"builtin\"\n\n[layout]\nasset_dirs = [\"files\"]\n",
    );
    post(tmp.path(), "2013-11-27-foo.markdown", "2013-11-27", "[x](/files/x.zip)\n");
    write(&tmp.path().join("files/y.zip"), "y");

    let config = load_config(tmp.path()).unwrap();
    assert_eq!(backend_from_config(&config.tools).name(), "builtin");

    let mut session = Session::open(tmp.path(), config).unwrap();
    session.scan(&FsRenamer).unwrap();
    let report = session.validate(&mut ReportOnly).unwrap();

    let waste: Vec<_> = report.waste.iter().map(|w| w.path.as_str()).collect();
    let missing: Vec<_> = report.missing.iter().map(|m| m.path.as_str()).collect();
    assert_eq!(waste, vec!["/files/y.zip"]);
    assert_eq!(missing, vec!["/files/x.zip"]);
}
