use assert_cmd::Command;
use predicates::prelude::*;

// Malformed request JSON is rejected before anything else runs
#[test]
fn test_rejects_malformed_request() {
    let mut cmd = Command::cargo_bin("footy_cards").unwrap();

    cmd.arg("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing card request"));
}

// A request missing required fields is rejected
#[test]
fn test_rejects_incomplete_request() {
    let mut cmd = Command::cargo_bin("footy_cards").unwrap();

    cmd.arg(r#"{"parentTagRecordId": "recP"}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing card request"));
}

// The record store credential must be configured
#[test]
fn test_requires_api_key() {
    let mut cmd = Command::cargo_bin("footy_cards").unwrap();

    cmd.env_remove("RECORD_STORE_API_KEY")
        .arg(
            r#"{
                "parentTagRecordId": "recP",
                "parentTagTeamId": "1",
                "cardsRequired": 5,
                "baseId": "app1",
                "tableId": "tblCards",
                "tagsTableId": "tblTags"
            }"#,
        )
        .assert()
        .failure()
        .stderr(predicate::str::contains("RECORD_STORE_API_KEY"));
}

// Request JSON is read from stdin when no argument is given
#[test]
fn test_reads_request_from_stdin() {
    let mut cmd = Command::cargo_bin("footy_cards").unwrap();

    cmd.env_remove("RECORD_STORE_API_KEY")
        .write_stdin(
            r#"{
                "parentTagRecordId": "recP",
                "parentTagTeamId": "1",
                "cardsRequired": 5,
                "baseId": "app1",
                "tableId": "tblCards",
                "tagsTableId": "tblTags"
            }"#,
        )
        .assert()
        .failure()
        .stderr(predicate::str::contains("RECORD_STORE_API_KEY"));
}
