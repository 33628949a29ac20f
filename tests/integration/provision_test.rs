// tests/integration/provision_test.rs

//! Integration tests for `create`: account provisioning and skeleton files.

use super::test_helpers::*;
use sshcommand::core::SshCommandError;
use sshcommand::core::account::AccountResolver;
use std::fs;
use std::os::unix::fs::PermissionsExt;

fn mode(path: &std::path::Path) -> u32 {
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[test]
fn test_create_new_account_writes_skeleton() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    assert_eq!(*ctx.created.borrow(), vec!["deploy".to_string()]);
    assert!(ctx.accounts.exists("deploy").unwrap());

    let home = ctx.home("deploy");
    assert_eq!(fs::read_to_string(home.join(".sshcommand")).unwrap(), "git-shell\n");
    assert_eq!(mode(&home.join(".ssh")), 0o700);
    assert_eq!(mode(&ctx.keys_path("deploy")), 0o600);
    assert_eq!(ctx.keys_file("deploy"), "");
}

#[test]
fn test_create_returns_resolved_account() {
    let ctx = TestContext::new();
    let account = ctx.provisioner().create("deploy", "git-shell").unwrap();
    assert_eq!(account.name, "deploy");
    assert_eq!(account.home_dir, ctx.home_root.join("deploy"));
}

#[test]
fn test_create_existing_account_skips_creation() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");

    ctx.create("deploy", "git-shell").unwrap();

    assert!(ctx.created.borrow().is_empty());
    let home = ctx.home("deploy");
    assert_eq!(fs::read_to_string(home.join(".sshcommand")).unwrap(), "git-shell\n");
}

#[test]
fn test_create_again_rewrites_command_and_keeps_keys() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let keys_before = ctx.keys_file("deploy");

    ctx.create("deploy", "/usr/local/bin/deploy --verbose").unwrap();

    let home = ctx.home("deploy");
    assert_eq!(
        fs::read_to_string(home.join(".sshcommand")).unwrap(),
        "/usr/local/bin/deploy --verbose\n"
    );
    assert_eq!(ctx.keys_file("deploy"), keys_before);
    assert_eq!(ctx.created.borrow().len(), 1);
}

#[test]
fn test_create_restores_permissions() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    let home = ctx.home("deploy");
    fs::set_permissions(home.join(".ssh"), fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(ctx.keys_path("deploy"), fs::Permissions::from_mode(0o644)).unwrap();

    ctx.create("deploy", "git-shell").unwrap();

    assert_eq!(mode(&home.join(".ssh")), 0o700);
    assert_eq!(mode(&ctx.keys_path("deploy")), 0o600);
}

#[test]
fn test_create_requires_account_and_command() {
    let ctx = TestContext::new();
    for (account, command) in [("", "git-shell"), ("deploy", ""), ("deploy", "   ")] {
        let err = ctx.create(account, command).unwrap_err();
        assert!(matches!(err, SshCommandError::InvalidArguments(_)));
    }
    assert!(ctx.created.borrow().is_empty());
}

#[test]
fn test_create_rejects_multiline_command() {
    let ctx = TestContext::new();
    let err = ctx.create("deploy", "git-shell\nrm -rf /").unwrap_err();
    assert!(matches!(err, SshCommandError::InvalidArguments(_)));
    assert!(!ctx.accounts.exists("deploy").unwrap());
}

#[test]
fn test_create_rejects_invalid_account_names() {
    let ctx = TestContext::new();
    for name in ["Deploy", "1deploy", "de ploy", "../etc", "a-very-long-account-name-that-exceeds-32"] {
        let err = ctx.create(name, "git-shell").unwrap_err();
        assert!(
            matches!(err, SshCommandError::InvalidArguments(_)),
            "expected InvalidArguments for {name:?}"
        );
    }
    assert!(ctx.created.borrow().is_empty());
}

#[test]
fn test_create_propagates_creation_failure() {
    let ctx = TestContext::with_failing_creator();
    let err = ctx.create("deploy", "git-shell").unwrap_err();
    assert!(matches!(err, SshCommandError::AccountCreation(_)));
    assert!(!ctx.home_root.join("deploy").exists());
}

#[test]
fn test_acl_operations_on_created_account() {
    let ctx = TestContext::new();
    ctx.create("git", "git-shell").unwrap();
    ctx.acl_add("git", "alice", ALICE_KEY).unwrap();

    // The forced command points at the command file of the new home.
    let home = ctx.home("git");
    let expected = format!("`cat {}/.sshcommand` $SSH_ORIGINAL_COMMAND", home.display());
    assert!(ctx.keys_file("git").contains(&expected));
}
