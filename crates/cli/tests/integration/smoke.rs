// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    path::Path,
    process::{Command, Output},
};

const MANIFEST: &str = r#"{
  "Methods": [
    {"Path": "users/create", "In": "UserCreate", "Out": "User"},
    {"Path": "users/list", "In": "?UserQuery", "Out": "[User]"}
  ],
  "Types": {
    "UserCreate": {"Name": ".string", "Age": ".uint8", "Role": "Role"},
    "UserQuery": {"NameContains": ".string"},
    "User": {"Id": ".int64", "Name": ".string", "Role": "Role"}
  },
  "Enums": {"Role": ["admin", "member"]}
}"#;

fn swag<I>(cwd: impl AsRef<Path>, args: I) -> Command
where
    I: IntoIterator<Item = &'static str>,
{
    let bin = env!("CARGO_BIN_EXE_swag");

    let mut cmd = Command::new(bin);
    cmd.current_dir(cwd)
        .args(args)
        .env_remove("SWAG_LOG")
        .env_remove("SWAG_MANIFEST")
        .env_remove("SWAG_API_BASE_URL")
        .env("SWAG_HISTORY_FILE", "history.json");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to run swag")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).replace('\r', "")
}

#[test]
fn swag_smoke_tests() {
    let cargo_tmp_dir = env!("CARGO_TARGET_TMPDIR");
    let tmp_dir = tempfile::tempdir_in(cargo_tmp_dir).expect("Failed to create tempdir");
    let dir = tmp_dir.path();
    std::fs::write(dir.join("yo-refl.json"), MANIFEST).unwrap();

    let output = run(&mut swag(dir, ["methods"]));
    assert!(output.status.success());
    let methods = stdout(&output);
    assert!(methods.contains("users/create"));
    assert!(methods.contains("users/list"));

    let output = run(&mut swag(dir, ["sample", "users/create"]));
    assert!(output.status.success());
    let sample: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        sample,
        serde_json::json!({"Name": "", "Age": 0, "Role": ""})
    );

    std::fs::write(dir.join("good.json"), r#"{"Name": "Ana", "Age": 31}"#).unwrap();
    std::fs::write(dir.join("bad.json"), r#"{"Name": "Ana", "Age": 300}"#).unwrap();

    let output = run(&mut swag(dir, ["validate", "users/create", "-i", "good.json"]));
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "(all ok)");

    let output = run(&mut swag(dir, ["validate", "users/create", "-i", "bad.json"]));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Age"));

    let output = run(&mut swag(dir, ["tree", "users/create", "-i", "good.json"]));
    assert!(output.status.success());
    assert!(stdout(&output).contains("[x] .Name .string = \"Ana\""));

    let output = run(&mut swag(dir, ["send"]));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No method given"));

    // Nothing listens there, so the call fails; the payload is still remembered.
    let output = run(&mut swag(
        dir,
        [
            "send",
            "users/create",
            "-i",
            "good.json",
            "--base-url",
            "http://127.0.0.1:9",
            "--timeout",
            "500",
        ],
    ));
    assert!(!output.status.success());

    // Without a method, the latest submission is sent again.
    let output = run(&mut swag(
        dir,
        ["send", "--base-url", "http://127.0.0.1:9", "--timeout", "500"],
    ));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Request to users/create failed"));

    let output = run(&mut swag(dir, ["history", "users/create", "--entry", "0"]));
    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(payload, serde_json::json!({"Name": "Ana", "Age": 31}));

    let output = run(&mut swag(dir, ["history", "--autocomplete", "Name"]));
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "Ana");
}
