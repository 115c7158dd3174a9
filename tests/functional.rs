use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

struct Database {
    filename: PathBuf,
    _dir: tempfile::TempDir,
}

impl Database {
    fn new() -> Database {
        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("test.db");
        Database {
            filename,
            _dir: dir,
        }
    }

    fn run_script<T: AsRef<str>>(&self, commands: &[T]) -> Vec<String> {
        let mut process = Command::new(env!("CARGO_BIN_EXE_bptreekv"))
            .arg(&self.filename)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();

        let mut input = String::new();
        for command in commands {
            input.push_str(command.as_ref());
            input.push('\n');
        }

        process
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();

        let mut output = String::new();
        process
            .stdout
            .take()
            .unwrap()
            .read_to_string(&mut output)
            .unwrap();
        process.wait().unwrap();
        output.lines().map(|l| l.to_string()).collect()
    }
}

#[test]
fn inserts_and_selects_a_row() {
    let db = Database::new();
    let output = db.run_script(&["insert 1 user1 person1@example.com", "select", ".exit"]);
    assert_eq!(
        output,
        vec![
            "db > Executed.",
            "db > (1, user1, person1@example.com)",
            "db > ",
        ]
    );
}

#[test]
fn rejects_a_duplicate_id() {
    let db = Database::new();
    let output = db.run_script(&[
        "insert 1 user1 person1@example.com",
        "insert 1 user1 person1@example.com",
        "select",
        ".exit",
    ]);
    assert_eq!(
        output,
        vec![
            "db > Executed.",
            "db > Error: Duplicate key.",
            "db > (1, user1, person1@example.com)",
            "db > ",
        ]
    );
}

#[test]
fn select_where_id_finds_one_row_among_many() {
    let db = Database::new();
    let mut script: Vec<String> = (1..=14)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    script.push("select where id = 7".to_string());
    script.push(".exit".to_string());

    let output = db.run_script(&script);
    assert_eq!(
        output.last().unwrap(),
        "db > (7, user7, person7@example.com)"
    );
}

#[test]
fn inserting_past_one_leaf_splits_and_promotes_a_root() {
    let db = Database::new();
    let mut script: Vec<String> = (1..=14)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    script.push(".btree".to_string());
    script.push(".exit".to_string());

    let output = db.run_script(&script);
    assert!(output.iter().any(|l| l.contains("- internal")));
    assert!(output.iter().any(|l| l.contains("- leaf")));
}

#[test]
fn data_survives_close_and_reopen() {
    let db = Database::new();
    let mut script: Vec<String> = (1..=30)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    script.push(".exit".to_string());
    db.run_script(&script);

    let output = db.run_script(&["select".to_string(), ".exit".to_string()]);
    assert_eq!(output[1], "db > (1, user1, person1@example.com)");
    assert_eq!(output[30], "(30, user30, person30@example.com)");
}

#[test]
fn deleting_ascending_leaves_the_remainder_intact() {
    let db = Database::new();
    let mut script: Vec<String> = (1..=30)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    for i in 1..=15 {
        script.push(format!("delete where id = {i}"));
    }
    script.push("select".to_string());
    script.push(".exit".to_string());

    let output = db.run_script(&script);
    assert!(output.iter().any(|l| l.contains("(16, user16")));
    assert!(!output.iter().any(|l| l.contains("(15, user15")));
    assert!(output.iter().any(|l| l.contains("(30, user30")));
}

#[test]
fn deleting_descending_to_empty_leaves_nothing() {
    let db = Database::new();
    let mut script: Vec<String> = (1..=30)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    for i in (1..=30).rev() {
        script.push(format!("delete where id = {i}"));
    }
    script.push("select".to_string());
    script.push(".exit".to_string());

    let output = db.run_script(&script);
    assert!(!output.iter().any(|l| l.contains('(')));
}
