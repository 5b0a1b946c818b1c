//! File I/O helper tests: content round-trips and directory enumeration

use std::collections::BTreeSet;
use std::path::Path;

use dpi_relay::fileio::{
    directory_exists, file_exists, read_ascii_file_content, write_ascii_file_content,
    DirEntryKind, DirectoryReader,
};
use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn random_name(rng: &mut rand::rngs::StdRng, prefix: &str) -> String {
    format!("{prefix}{:08x}.txt", rng.gen::<u32>())
}

#[test]
fn reading_a_missing_file_reports_the_failure_without_panicking() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-file.txt");

    let content = read_ascii_file_content(&missing);
    assert!(content.has_failed());
    assert!(content.result.is_empty());
    assert!(content.error.contains("no-such-file.txt"));
}

#[test]
fn written_content_reads_back_verbatim() {
    let dir = TempDir::new().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    let path = dir.path().join(random_name(&mut rng, "roundtrip-"));
    let body = "line one\nline two\n";

    let outcome = write_ascii_file_content(&path, body);
    assert!(!outcome.has_failed(), "write failed: {}", outcome.error);
    assert!(outcome.result);

    let content = read_ascii_file_content(&path);
    assert!(!content.has_failed());
    assert_eq!(content.result, body);
}

#[test]
fn writing_into_a_missing_directory_reports_the_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent").join("out.txt");

    let outcome = write_ascii_file_content(&path, "x");
    assert!(outcome.has_failed());
    assert!(!outcome.result);
}

#[test]
fn existence_checks_distinguish_files_from_directories() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("present.txt");
    write_ascii_file_content(&file, "here");

    assert!(file_exists(&file));
    assert!(file_exists(dir.path()));
    assert!(directory_exists(dir.path()));
    assert!(!directory_exists(&file));
    assert!(!file_exists(Path::new("/definitely/not/here")));
}

#[test]
fn directory_reader_enumerates_every_file_exactly_once() {
    let dir = TempDir::new().unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let mut expected = BTreeSet::new();
    for _ in 0..50 {
        let name = random_name(&mut rng, "script-");
        write_ascii_file_content(&dir.path().join(&name), "content");
        expected.insert(name);
    }
    assert_eq!(expected.len(), 50, "seeded names must not collide");

    let mut reader = DirectoryReader::new(dir.path()).unwrap();
    let mut seen = BTreeSet::new();
    loop {
        let (kind, name) = reader.next_entry();
        match kind {
            DirEntryKind::End => break,
            DirEntryKind::File => {
                assert!(seen.insert(name), "entry reported twice");
            }
            other => panic!("unexpected entry kind {other:?}"),
        }
    }
    assert_eq!(seen, expected);
}

#[test]
fn directory_reader_reports_subdirectories_as_directories() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    write_ascii_file_content(&dir.path().join("flat.txt"), "x");

    let mut reader = DirectoryReader::new(dir.path()).unwrap();
    let mut kinds = Vec::new();
    loop {
        let (kind, name) = reader.next_entry();
        if kind == DirEntryKind::End {
            break;
        }
        kinds.push((name, kind));
    }
    kinds.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        kinds,
        vec![
            ("flat.txt".to_string(), DirEntryKind::File),
            ("nested".to_string(), DirEntryKind::Directory),
        ]
    );
}

#[test]
fn reset_restarts_enumeration_from_the_beginning() {
    let dir = TempDir::new().unwrap();
    for i in 0..5 {
        write_ascii_file_content(&dir.path().join(format!("f{i}.txt")), "x");
    }

    let mut reader = DirectoryReader::new(dir.path()).unwrap();
    let mut first_pass = 0;
    while reader.next_entry().0 != DirEntryKind::End {
        first_pass += 1;
    }
    assert_eq!(first_pass, 5);

    // Exhausted reader stays at the end until reset.
    assert_eq!(reader.next_entry().0, DirEntryKind::End);

    reader.reset().unwrap();
    let mut second_pass = 0;
    while reader.next_entry().0 != DirEntryKind::End {
        second_pass += 1;
    }
    assert_eq!(second_pass, 5);
}
