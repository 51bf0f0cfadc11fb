use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn daybook_help_works() {
    Command::cargo_bin("daybook")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("personal task tracker"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "add",
        "list",
        "show",
        "edit",
        "complete",
        "incomplete",
        "touch",
        "delete",
        "note",
    ];

    for cmd in subcommands {
        Command::cargo_bin("daybook")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn note_subcommand_help_works() {
    for sub in ["add", "edit"] {
        Command::cargo_bin("daybook")
            .expect("binary")
            .args(["note", sub, "--help"])
            .assert()
            .success();
    }
}
