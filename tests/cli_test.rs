//! Integration tests for the curfew binary

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use common::Fixture;

const WEDNESDAY: &str = "2024-05-15T14:30:00Z";
const SATURDAY: &str = "2024-05-18T14:30:00Z";

/// Run the binary inside the fixture directory so default list names resolve there
fn cmd(fx: &Fixture) -> Command {
    let mut cmd = cargo_bin_cmd!();
    cmd.current_dir(fx.dir.path());
    cmd
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

// ---------- check ----------

#[test]
fn check_denied_by_blacklist() {
    let fx = Fixture::new();
    fx.write("blacklist", "* 8-15 * * 1-5 youtube\n");

    let output = cmd(&fx)
        .args(["check", "--host", "www.youtube.com", "--at", WEDNESDAY])
        .output()
        .unwrap();
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(2), "{}", out);
    assert!(out.contains("DENY www.youtube.com"), "{}", out);
    assert!(out.contains("Denied by blacklist rule"), "{}", out);
    assert!(out.contains("line 1 of blacklist"), "{}", out);
}

#[test]
fn check_allowed_outside_schedule() {
    let fx = Fixture::new();
    fx.write("blacklist", "* 8-15 * * 1-5 youtube\n");

    let output = cmd(&fx)
        .args(["check", "--host", "www.youtube.com", "--at", SATURDAY])
        .output()
        .unwrap();
    let out = stdout(&output);

    assert!(output.status.success(), "{}", out);
    assert!(out.contains("ALLOW www.youtube.com"), "{}", out);
    assert!(out.contains("Accepted by default"), "{}", out);
}

#[test]
fn check_whitelist_only_denies_by_default() {
    let fx = Fixture::new();
    let whitelist = fx.write("allowed.txt", "* * * * * wiki\n");

    let output = cmd(&fx)
        .args(["check", "--host", "example.com", "--at", WEDNESDAY])
        .args(["--whitelist", whitelist.to_str().unwrap()])
        .output()
        .unwrap();
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(2), "{}", out);
    assert!(out.contains("Denied by default"), "{}", out);
}

#[test]
fn check_default_allow_flag() {
    let fx = Fixture::new();

    let output = cmd(&fx)
        .args(["check", "--host", "example.com", "--at", WEDNESDAY])
        .args(["--default-allow", "false"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let output = cmd(&fx)
        .args(["check", "--host", "example.com", "--at", WEDNESDAY])
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn check_rejects_bad_time() {
    let fx = Fixture::new();

    let output = cmd(&fx)
        .args(["check", "--host", "example.com", "--at", "yesterday"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Invalid --at time"), "{}", stderr);
}

#[test]
fn check_explicit_missing_list_fails() {
    let fx = Fixture::new();

    let output = cmd(&fx)
        .args(["check", "--host", "example.com", "--blacklist", "nope.txt"])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("blacklist file 'nope.txt'"), "{}", stderr);
}

// ---------- auth ----------

#[test]
fn auth_accepts_and_rejects() {
    let fx = Fixture::new();
    fx.write("userlist", "alice:secret\nbob hunter2\n");

    let output = cmd(&fx)
        .args(["auth", "--user", "bob", "--password", "hunter2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Authenticated bob"));

    let output = cmd(&fx)
        .args(["auth", "--user", "alice", "--password", "wrong"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Rejected alice"));
}

#[test]
fn auth_without_userlist() {
    let fx = Fixture::new();

    let output = cmd(&fx)
        .args(["auth", "--user", "alice", "--password", "secret"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Authentication disabled"));
}

// ---------- validate-config ----------

#[test]
fn validate_config_with_file() {
    let fx = Fixture::new();
    let blacklist = fx.write("blocked.txt", "* * * * * youtube\n* * * * * tiktok\n");
    fx.write("users.txt", "alice:secret\n");
    let config = fx.write(
        "curfew.toml",
        &format!(
            "[lists]\nblacklist = {:?}\nwhitelist = \"\"\nuserlist = \"users.txt\"\n",
            blacklist.to_string_lossy()
        ),
    );

    let output = cmd(&fx)
        .args(["validate-config", "--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    let out = stdout(&output);

    assert!(output.status.success(), "{}", out);
    assert!(out.contains("Configuration is valid!"), "{}", out);
    assert!(out.contains("(2 rules)"), "{}", out);
    assert!(out.contains("Whitelist: disabled"), "{}", out);
    assert!(out.contains("(1 users)"), "{}", out);
    assert!(out.contains("Default: accept"), "{}", out);
}

#[test]
fn validate_config_bad_rule() {
    let fx = Fixture::new();
    fx.write("whitelist", "* * * * * ok\n* 9-x * * * broken\n");

    let output = cmd(&fx).args(["validate-config"]).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("line 2"), "{}", stderr);
}

#[test]
fn validate_config_invalid_toml() {
    let fx = Fixture::new();
    let config = fx.write("curfew.toml", "[lists\n");

    let output = cmd(&fx)
        .args(["validate-config", "--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Invalid TOML"), "{}", stderr);
}
