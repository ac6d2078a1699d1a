//! Manager-level tests against the real backends: containers built with the
//! `zip` crate, directory trees and save blobs on tempdir fixtures.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use assetpack_package::{
    DirectorySaveProvider, FileTypeMask, PackageManager, SaveFileProvider,
};
use assetpack_vfs::VirtualFile;
use pretty_assertions::assert_eq;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn write_container(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn write_file(path: &Path, data: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

fn manager(root: &Path) -> PackageManager {
    let save_dir = root.join("saves");
    fs::create_dir_all(&save_dir).unwrap();
    PackageManager::new(root, Box::new(DirectorySaveProvider::new(save_dir)))
}

#[test]
fn mounts_and_reads_a_container() {
    let root = tempfile::tempdir().unwrap();
    write_container(
        &root.path().join("assets.pak"),
        &[
            ("sound/click.ogg", b"click bytes"),
            ("title.png", b"png bytes"),
        ],
    );
    let mut pm = manager(root.path());

    assert!(pm.mount_package("assets.pak", "/assets"));

    assert!(pm.file_exists("/assets/sound/click.ogg"));
    assert_eq!(pm.read_whole("/assets/sound/click.ogg").unwrap(), b"click bytes");
    assert_eq!(pm.file_size("/assets/title.png"), 9);
    assert!(!pm.file_exists("/title.png"));
}

#[test]
fn mounts_and_reads_a_directory() {
    let root = tempfile::tempdir().unwrap();
    write_file(&root.path().join("data/gfx/title.png"), b"title");
    let mut pm = manager(root.path());

    assert!(pm.mount_directory("data", "/"));

    assert!(pm.file_exists("/gfx/title.png"));
    assert_eq!(pm.read_whole("/gfx/title.png").unwrap(), b"title");
}

#[test]
fn relative_mount_sources_anchor_on_the_root_folder() {
    let root = tempfile::tempdir().unwrap();
    write_container(&root.path().join("packs/a.pak"), &[("a.txt", b"a")]);
    let mut pm = manager(root.path());

    assert_eq!(pm.root_folder(), root.path());
    assert!(pm.mount_package("packs/a.pak", "/"));
    assert!(pm.mount_package(root.path().join("packs/a.pak"), "/abs"));

    assert!(pm.file_exists("/a.txt"));
    assert!(pm.file_exists("/abs/a.txt"));
}

#[test]
fn failed_mounts_leave_the_table_untouched() {
    let root = tempfile::tempdir().unwrap();
    write_container(&root.path().join("good.pak"), &[("a.txt", b"a")]);
    write_file(&root.path().join("bogus.pak"), b"not a container");
    let mut pm = manager(root.path());

    assert!(pm.mount_package("good.pak", "/"));
    assert!(!pm.mount_package("missing.pak", "/"));
    assert!(!pm.mount_package("bogus.pak", "/"));
    assert!(!pm.mount_directory("missing-dir", "/"));
    // A file is not a mountable directory.
    assert!(!pm.mount_directory("good.pak", "/"));

    assert!(pm.file_exists("/a.txt"));
}

#[test]
fn directory_mount_shadows_a_container_member() {
    let root = tempfile::tempdir().unwrap();
    write_container(
        &root.path().join("assets.pak"),
        &[("gfx/title.png", b"container copy"), ("gfx/menu.png", b"menu")],
    );
    write_file(&root.path().join("patch/gfx/title.png"), b"patched copy");
    let mut pm = manager(root.path());

    // Directory mounted first, container second; the directory still wins.
    assert!(pm.mount_directory("patch", "/"));
    assert!(pm.mount_package("assets.pak", "/"));

    assert_eq!(pm.read_whole("/gfx/title.png").unwrap(), b"patched copy");
    // Members the patch directory lacks fall through to the container.
    assert_eq!(pm.read_whole("/gfx/menu.png").unwrap(), b"menu");
}

#[test]
fn streams_are_lazy_and_caller_owned() {
    let root = tempfile::tempdir().unwrap();
    write_container(&root.path().join("assets.pak"), &[("data.bin", b"0123456789")]);
    let mut pm = manager(root.path());
    assert!(pm.mount_package("assets.pak", "/"));

    let mut stream = pm.open_stream("/data.bin").unwrap();
    assert_eq!(stream.size(), 10);

    // The stream outlives further manager mutation.
    assert!(pm.change_directory("/somewhere"));
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).unwrap();
    assert_eq!(buffer, b"0123456789");
}

#[test]
fn saves_load_from_the_save_directory() {
    let root = tempfile::tempdir().unwrap();
    write_file(&root.path().join("saves/slot0.b25s"), b"save bytes");
    write_container(&root.path().join("assets.pak"), &[("slot0.b25s", b"mounted bytes")]);
    let mut pm = manager(root.path());
    assert!(pm.mount_package("assets.pak", "/"));

    // The suffix routes to the save store no matter how the path is spelled.
    assert_eq!(pm.read_whole("slot0.b25s").unwrap(), b"save bytes");
    assert_eq!(pm.read_whole("/deep/nested/slot0.b25s").unwrap(), b"save bytes");
    assert!(pm.read_whole("slot9.b25s").is_none());
}

#[test]
fn save_provider_reads_named_blobs() {
    let root = tempfile::tempdir().unwrap();
    write_file(&root.path().join("saves/slot0.b25s"), b"save bytes");
    let provider = DirectorySaveProvider::new(root.path().join("saves"));

    let mut stream = provider.open_for_loading("slot0.b25s").unwrap();
    assert_eq!(stream.size(), 10);
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).unwrap();
    assert_eq!(buffer, b"save bytes");

    assert!(provider.open_for_loading("slot9.b25s").is_err());
}

#[test]
fn search_unions_container_and_directory_mounts() {
    let root = tempfile::tempdir().unwrap();
    write_container(
        &root.path().join("assets.pak"),
        &[("title.png", b"t"), ("click.ogg", b"c")],
    );
    write_file(&root.path().join("patch/splash.png"), b"s");
    let mut pm = manager(root.path());
    assert!(pm.mount_package("assets.pak", "/"));
    assert!(pm.mount_directory("patch", "/"));

    let mut hits = pm.search("*.png", "", FileTypeMask::FILE);
    hits.sort();
    assert_eq!(hits, vec!["splash.png", "title.png"]);
}

#[test]
fn oversized_reads_still_succeed() {
    let root = tempfile::tempdir().unwrap();
    let big = vec![0x5au8; 300 * 1024];
    write_container(&root.path().join("assets.pak"), &[("big.bin", big.as_slice())]);
    let mut pm = manager(root.path());
    assert!(pm.mount_package("assets.pak", "/"));

    // Over the warning threshold; the read is logged but not refused.
    let buffer = pm.read_whole("/big.bin").unwrap();
    assert_eq!(buffer.len(), big.len());
    assert_eq!(pm.file_size("/big.bin"), big.len() as u64);
}
