//! Integration tests for boot menu generation.

mod helpers;

use helpers::{write_file, TestEnv};
use regex::Regex;
use std::fs;
use std::path::Path;

use bootkeep::config::MenuConfig;
use bootkeep::menu;

fn menu_config(path: std::path::PathBuf, title: &str, timeout: u32) -> MenuConfig {
    MenuConfig {
        path,
        title: title.to_string(),
        timeout,
    }
}

fn populate_versions(env: &TestEnv, versions: &[&str]) {
    for version in versions {
        write_file(
            &env.target,
            &format!("vmlinuz-{version}"),
            format!("kernel {version}").as_bytes(),
        );
        write_file(
            &env.target,
            &format!("initramfs-{version}.img"),
            format!("initramfs {version}").as_bytes(),
        );
    }
}

#[test]
fn generates_one_block_per_retained_version_newest_default() {
    let env = TestEnv::new();
    populate_versions(&env, &["2", "3"]);

    let menu_path = env.boot.join("extlinux/extlinux.conf");
    menu::generate(
        &env.scratch,
        &env.target,
        "vmlinuz",
        &env.boot,
        "root=/dev/sda2 rw",
        &menu_config(menu_path.clone(), "Boot Menu", 50),
    )
    .unwrap();

    let text = fs::read_to_string(&menu_path).unwrap();

    // Exactly two entry blocks, version 3 first and default.
    assert_eq!(text.matches("LABEL linux-").count(), 2);
    assert!(text.contains("DEFAULT linux-3\n"));
    assert!(text.find("LABEL linux-3").unwrap() < text.find("LABEL linux-2").unwrap());

    // Paths have the boot mount prefix stripped.
    assert!(text.contains("  LINUX /managed/vmlinuz-3\n"));
    assert!(text.contains("  INITRD /managed/initramfs-3.img\n"));
    assert!(!text.contains(env.boot.to_str().unwrap()));

    // Every entry block carries the configured command line.
    let append = Regex::new(r"(?m)^  APPEND root=/dev/sda2 rw$").unwrap();
    assert_eq!(append.find_iter(&text).count(), 2);
}

#[test]
fn entry_blocks_have_the_expected_shape() {
    let env = TestEnv::new();
    populate_versions(&env, &["5.10"]);

    let menu_path = env.boot.join("menu.conf");
    menu::generate(
        &env.scratch,
        &env.target,
        "vmlinuz",
        &env.boot,
        "quiet",
        &menu_config(menu_path.clone(), "My Machine", 30),
    )
    .unwrap();

    let text = fs::read_to_string(&menu_path).unwrap();
    assert!(text.contains("MENU TITLE My Machine\n"));
    assert!(text.contains("TIMEOUT 30\n"));

    let block = Regex::new(
        r"(?m)^LABEL linux-5\.10\n  MENU LABEL Linux 5\.10\n  LINUX /managed/vmlinuz-5\.10\n  INITRD /managed/initramfs-5\.10\.img\n  APPEND quiet$",
    )
    .unwrap();
    assert!(block.is_match(&text), "unexpected menu shape:\n{text}");
}

#[test]
fn kernel_without_initramfs_is_skipped() {
    let env = TestEnv::new();
    populate_versions(&env, &["2"]);
    // An unpaired kernel must not become an unbootable entry.
    write_file(&env.target, "vmlinuz-3", b"kernel 3");

    let menu_path = env.boot.join("menu.conf");
    menu::generate(
        &env.scratch,
        &env.target,
        "vmlinuz",
        &env.boot,
        "",
        &menu_config(menu_path.clone(), "Boot Menu", 50),
    )
    .unwrap();

    let text = fs::read_to_string(&menu_path).unwrap();
    assert!(!text.contains("linux-3"));
    assert!(text.contains("DEFAULT linux-2\n"));
}

#[test]
fn unified_images_never_appear_in_the_menu() {
    let env = TestEnv::new();
    populate_versions(&env, &["2"]);
    write_file(&env.target, "vmlinuz-9.efi", b"efi 9");

    let menu_path = env.boot.join("menu.conf");
    menu::generate(
        &env.scratch,
        &env.target,
        "vmlinuz",
        &env.boot,
        "",
        &menu_config(menu_path.clone(), "Boot Menu", 50),
    )
    .unwrap();

    let text = fs::read_to_string(&menu_path).unwrap();
    assert!(!text.contains("vmlinuz-9"));
    assert!(!text.contains("linux-9"));
    assert!(text.contains("DEFAULT linux-2\n"));
}

#[test]
fn single_slot_directories_list_current_before_backup() {
    let env = TestEnv::new();
    for slot in ["current", "backup"] {
        write_file(
            &env.target,
            &format!("vmlinuz-{slot}"),
            format!("kernel {slot}").as_bytes(),
        );
        write_file(
            &env.target,
            &format!("initramfs-{slot}.img"),
            format!("initramfs {slot}").as_bytes(),
        );
    }

    let menu_path = env.boot.join("menu.conf");
    menu::generate(
        &env.scratch,
        &env.target,
        "vmlinuz",
        &env.boot,
        "",
        &menu_config(menu_path.clone(), "Boot Menu", 50),
    )
    .unwrap();

    let text = fs::read_to_string(&menu_path).unwrap();
    assert!(text.contains("DEFAULT linux-current\n"));
    assert!(text.find("LABEL linux-current").unwrap() < text.find("LABEL linux-backup").unwrap());
}

#[test]
fn menu_file_is_staged_through_scratch() {
    let env = TestEnv::new();
    populate_versions(&env, &["1"]);

    let menu_path = env.boot.join("menu.conf");
    menu::generate(
        &env.scratch,
        &env.target,
        "vmlinuz",
        &env.boot,
        "",
        &menu_config(menu_path.clone(), "Boot Menu", 50),
    )
    .unwrap();

    // The staged copy exists in the scratch area and matches the placed one.
    let staged = env.scratch.join("menu.conf");
    assert!(staged.exists());
    assert_eq!(
        fs::read(&staged).unwrap(),
        fs::read(&menu_path).unwrap()
    );
}

#[test]
fn missing_target_directory_yields_no_entries() {
    let env = TestEnv::new();
    let entries = menu::collect_entries(
        &env.boot.join("does-not-exist"),
        "vmlinuz",
        Path::new("/boot"),
        "",
    )
    .unwrap();
    assert!(entries.is_empty());
}
