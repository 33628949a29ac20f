// tests/integration/acl_store_test.rs

//! Integration tests for adding, removing and listing authorized keys.

use super::test_helpers::*;
use sshcommand::config::Config;
use sshcommand::core::SshCommandError;
use sshcommand::core::acl::AclStore;
use sshcommand::core::keys::SshKeyValidator;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::Barrier;
use std::thread;

// ===== acl-add =====

#[test]
fn test_add_returns_fingerprint_and_lists_entry() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    let fingerprint = ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    assert_eq!(fingerprint, ALICE_FP);

    let records = ctx.list("deploy").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "alice");
    assert_eq!(records[0].fingerprint, ALICE_FP);
    assert_eq!(
        records[0].flags,
        vec![
            "no-agent-forwarding",
            "no-user-rc",
            "no-X11-forwarding",
            "no-port-forwarding"
        ]
    );
}

#[test]
fn test_add_writes_forced_command_line() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();

    let home = ctx.home("deploy");
    let expected = format!(
        "command=\"FINGERPRINT={ALICE_FP} NAME=\\\"alice\\\" `cat {}/.sshcommand` $SSH_ORIGINAL_COMMAND\",no-agent-forwarding,no-user-rc,no-X11-forwarding,no-port-forwarding {ALICE_KEY}\n",
        home.display()
    );
    assert_eq!(ctx.keys_file("deploy"), expected);
}

#[test]
fn test_add_supports_rsa_and_ecdsa_keys() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    assert_eq!(ctx.acl_add("deploy", "bob", BOB_KEY).unwrap(), BOB_FP);
    assert_eq!(ctx.acl_add("deploy", "carol", CAROL_KEY).unwrap(), CAROL_FP);

    let names: Vec<String> = ctx.list("deploy").unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["bob", "carol"]);
}

#[test]
fn test_add_duplicate_name_fails_without_mutation() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let before = ctx.keys_file("deploy");

    // Same key, same name.
    let err = ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap_err();
    assert_eq!(err, SshCommandError::DuplicateName("alice".to_string()));

    // Different key, same name.
    let err = ctx.acl_add("deploy", "alice", BOB_KEY).unwrap_err();
    assert_eq!(err, SshCommandError::DuplicateName("alice".to_string()));

    // Invalid key, same name: the name check comes first.
    let err = ctx.acl_add("deploy", "alice", "ssh-rsa AAAA").unwrap_err();
    assert!(matches!(err, SshCommandError::DuplicateName(_)));

    assert_eq!(ctx.keys_file("deploy"), before);
    assert_eq!(ctx.list("deploy").unwrap().len(), 1);
}

#[test]
fn test_add_name_match_is_exact_and_case_sensitive() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice-laptop", ALICE_KEY).unwrap();

    // Neither a prefix nor a different case counts as a duplicate.
    ctx.acl_add("deploy", "alice", BOB_KEY).unwrap();
    ctx.acl_add("deploy", "Alice-laptop", CAROL_KEY).unwrap();
    assert_eq!(ctx.list("deploy").unwrap().len(), 3);
}

#[test]
fn test_add_same_key_under_two_names_by_default() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    assert_eq!(ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap(), ALICE_FP);
    assert_eq!(ctx.acl_add("deploy", "alice-second", ALICE_KEY).unwrap(), ALICE_FP);

    let records = ctx.list("deploy").unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.fingerprint == ALICE_FP));
}

#[test]
fn test_add_duplicate_fingerprint_rejected_when_enabled() {
    let mut config = Config::default();
    config.acl.ignore_duplicate_fingerprints = false;
    let ctx = TestContext::with_config(config);
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let before = ctx.keys_file("deploy");

    let err = ctx.acl_add("deploy", "alice-again", ALICE_KEY).unwrap_err();
    assert_eq!(err, SshCommandError::DuplicateFingerprint(ALICE_FP.to_string()));
    assert_eq!(ctx.keys_file("deploy"), before);
}

#[test]
fn test_add_invalid_key_never_appends() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let before = ctx.keys_file("deploy");

    let truncated = &ALICE_KEY[..40];
    let inputs = [
        truncated,
        "",
        "not a key at all",
        "ssh-rsa !!!notbase64!!!",
        "ssh-ed25519 AAAAB3NzaC1yc2EAAAADAQABAAABAQCeeM15k6aUAd+1UnKAmTJU",
    ];
    for input in inputs {
        let err = ctx.acl_add("deploy", "mallory", input).unwrap_err();
        assert!(
            matches!(err, SshCommandError::InvalidKeyFormat(_)),
            "expected InvalidKeyFormat for {input:?}, got {err:?}"
        );
    }
    assert_eq!(ctx.keys_file("deploy"), before);
}

#[test]
fn test_add_rejects_multiple_keys() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    let both = format!("{ALICE_KEY}\n{BOB_KEY}\n");
    let err = ctx.acl_add("deploy", "both", &both).unwrap_err();
    assert!(matches!(err, SshCommandError::InvalidKeyFormat(_)));
    assert_eq!(ctx.keys_file("deploy"), "");
}

#[test]
fn test_add_trims_surrounding_whitespace() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    let padded = format!("\n  {ALICE_KEY}  \n\n");
    assert_eq!(ctx.acl_add("deploy", "alice", &padded).unwrap(), ALICE_FP);
    assert!(ctx.keys_file("deploy").ends_with(&format!(" {ALICE_KEY}\n")));
}

#[test]
fn test_add_unknown_account() {
    let ctx = TestContext::new();
    let err = ctx.acl_add("ghost", "alice", ALICE_KEY).unwrap_err();
    assert_eq!(err, SshCommandError::AccountNotFound("ghost".to_string()));
}

#[test]
fn test_add_reports_missing_account_before_bad_name() {
    let ctx = TestContext::new();
    let err = ctx.acl_add("ghost", "", ALICE_KEY).unwrap_err();
    assert_eq!(err, SshCommandError::AccountNotFound("ghost".to_string()));
}

#[test]
fn test_add_rejects_empty_or_multiline_name() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    for name in ["", "two\nlines", "tab\there"] {
        let err = ctx.acl_add("deploy", name, ALICE_KEY).unwrap_err();
        assert!(matches!(err, SshCommandError::InvalidArguments(_)));
    }
    assert_eq!(ctx.keys_file("deploy"), "");
}

#[test]
fn test_add_creates_missing_keys_file() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    assert!(!ctx.keys_path("deploy").exists());

    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();

    let ssh_dir = ctx.home("deploy").join(".ssh");
    assert_eq!(fs::metadata(&ssh_dir).unwrap().permissions().mode() & 0o777, 0o700);
    assert_eq!(ctx.list("deploy").unwrap().len(), 1);
}

#[test]
fn test_add_appends_newline_to_unterminated_file() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    ctx.write_keys_file("deploy", b"# managed by hand");

    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();

    let contents = ctx.keys_file("deploy");
    assert!(contents.starts_with("# managed by hand\ncommand=\""));
    assert!(contents.ends_with('\n'));
}

#[test]
fn test_add_special_characters_in_name() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    let name = r#"ci "runner" $HOME `id` \ done"#;
    ctx.acl_add("deploy", name, ALICE_KEY).unwrap();

    let records = ctx.list("deploy").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, name);

    // The stored line keeps the quoted option intact for sshd.
    let line = ctx.keys_file("deploy");
    assert!(line.contains(r#"NAME=\"ci \\"runner\\" \$HOME \`id\` \\ done\""#));
    assert_eq!(
        ctx.acl_add("deploy", name, BOB_KEY).unwrap_err(),
        SshCommandError::DuplicateName(name.to_string())
    );
}

#[test]
fn test_add_after_failure_is_not_blocked() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    // A failed add must release the lock.
    ctx.acl_add("deploy", "bad", "garbage").unwrap_err();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    assert_eq!(ctx.list("deploy").unwrap().len(), 1);
}

#[test]
fn test_add_uses_configured_flags() {
    let mut config = Config::default();
    config.acl.allowed_keys = vec!["restrict".to_string(), "pty".to_string()];
    let ctx = TestContext::with_config(config);
    ctx.create("deploy", "git-shell").unwrap();

    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    assert_eq!(ctx.list("deploy").unwrap()[0].flags, vec!["restrict", "pty"]);
    assert!(ctx.keys_file("deploy").contains("$SSH_ORIGINAL_COMMAND\",restrict,pty ssh-ed25519 "));
}

#[test]
fn test_add_new_file_gets_private_mode() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let mode = fs::metadata(ctx.keys_path("deploy")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_add_leaves_no_keys_file_when_ownership_fails() {
    let ctx = TestContext::new();
    if ctx.is_root() {
        // Root can hand files to any account.
        return;
    }
    let home = ctx.add_account_with_ids("deploy", 0, 0);
    fs::create_dir_all(home.join(".ssh")).unwrap();

    let err = ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap_err();
    assert!(matches!(err, SshCommandError::Io(_)));
    assert!(!ctx.keys_path("deploy").exists());
}

#[test]
fn test_add_leaves_no_keys_file_when_ssh_dir_ownership_fails() {
    let ctx = TestContext::new();
    if ctx.is_root() {
        return;
    }
    ctx.add_account_with_ids("deploy", 0, 0);

    let err = ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap_err();
    assert!(matches!(err, SshCommandError::Io(_)));
    assert!(!ctx.keys_path("deploy").exists());
}

// ===== Concurrency =====

#[test]
fn test_concurrent_adds_of_same_name_admit_one() {
    const THREADS: usize = 4;

    for _ in 0..10 {
        let ctx = TestContext::new();
        ctx.create("deploy", "git-shell").unwrap();
        let passwd_path = &ctx.passwd_path;
        let config = &ctx.config;
        let barrier = Barrier::new(THREADS);

        let results: Vec<Result<String, SshCommandError>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        let accounts = detached_accounts(passwd_path);
                        let store = AclStore::new(&accounts, &SshKeyValidator, &config.acl);
                        barrier.wait();
                        store.add("deploy", "alice", ALICE_KEY.as_bytes())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1, "results: {results:?}");
        for result in &results {
            if let Err(err) = result {
                assert_eq!(*err, SshCommandError::DuplicateName("alice".to_string()));
            }
        }
        assert_eq!(ctx.list("deploy").unwrap().len(), 1);
    }
}

#[test]
fn test_concurrent_adds_of_distinct_names_all_land() {
    const THREADS: usize = 8;

    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    let passwd_path = &ctx.passwd_path;
    let config = &ctx.config;
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for i in 0..THREADS {
            let barrier = &barrier;
            s.spawn(move || {
                let accounts = detached_accounts(passwd_path);
                let store = AclStore::new(&accounts, &SshKeyValidator, &config.acl);
                barrier.wait();
                store
                    .add("deploy", &format!("key-{i}"), BOB_KEY.as_bytes())
                    .unwrap();
            });
        }
    });

    // No appends were interleaved: every line is a complete entry.
    let contents = ctx.keys_file("deploy");
    assert_eq!(contents.lines().count(), THREADS);
    let mut names: Vec<String> = ctx.list("deploy").unwrap().into_iter().map(|r| r.name).collect();
    names.sort();
    let mut expected: Vec<String> = (0..THREADS).map(|i| format!("key-{i}")).collect();
    expected.sort();
    assert_eq!(names, expected);
}

// ===== acl-remove =====

#[test]
fn test_remove_deletes_only_named_entry() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    ctx.acl_add("deploy", "bob", BOB_KEY).unwrap();
    ctx.acl_add("deploy", "carol", CAROL_KEY).unwrap();

    assert_eq!(ctx.acl_remove("deploy", "bob").unwrap(), 1);

    let names: Vec<String> = ctx.list("deploy").unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["alice", "carol"]);
}

#[test]
fn test_remove_absent_name_is_noop() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let before = ctx.keys_file("deploy");

    assert_eq!(ctx.acl_remove("deploy", "nobody").unwrap(), 0);
    assert_eq!(ctx.acl_remove("deploy", "alic").unwrap(), 0);
    assert_eq!(ctx.keys_file("deploy"), before);
}

#[test]
fn test_remove_without_keys_file_succeeds() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    assert_eq!(ctx.acl_remove("deploy", "alice").unwrap(), 0);
    assert!(!ctx.keys_path("deploy").exists());
}

#[test]
fn test_remove_unknown_account() {
    let ctx = TestContext::new();
    let err = ctx.acl_remove("ghost", "alice").unwrap_err();
    assert_eq!(err, SshCommandError::AccountNotFound("ghost".to_string()));
}

#[test]
fn test_remove_preserves_opaque_lines_verbatim() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    let mut original = Vec::new();
    original.extend_from_slice(b"# operator keys\n");
    original.extend_from_slice(format!("{BOB_KEY}\n").as_bytes());
    original.extend_from_slice(b"\n");
    original.extend_from_slice(b"command=\"/usr/bin/backup\",no-pty ssh-ed25519 AAAA backup\n");
    original.extend_from_slice(b"\xff\xfe not utf-8\n");
    ctx.write_keys_file("deploy", &original);

    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    ctx.acl_remove("deploy", "alice").unwrap();

    assert_eq!(fs::read(ctx.keys_path("deploy")).unwrap(), original);
}

#[test]
fn test_remove_keeps_file_mode() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    ctx.acl_add("deploy", "bob", BOB_KEY).unwrap();

    ctx.acl_remove("deploy", "alice").unwrap();

    let mode = fs::metadata(ctx.keys_path("deploy")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    // No temporary files are left behind.
    let leftovers: Vec<String> = fs::read_dir(ctx.home("deploy").join(".ssh"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(leftovers, vec!["authorized_keys"]);
}

#[test]
fn test_remove_by_fingerprint() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    ctx.acl_add("deploy", "alice-2", ALICE_KEY).unwrap();
    ctx.acl_add("deploy", "bob", BOB_KEY).unwrap();

    assert_eq!(ctx.store().remove_by_fingerprint("deploy", ALICE_FP).unwrap(), 2);
    assert_eq!(ctx.store().remove_by_fingerprint("deploy", ALICE_FP).unwrap(), 0);

    let records = ctx.list("deploy").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "bob");
}

#[test]
fn test_remove_by_fingerprint_rejects_malformed_fingerprint() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    let err = ctx
        .store()
        .remove_by_fingerprint("deploy", "SHA256:abc")
        .unwrap_err();
    assert!(matches!(err, SshCommandError::InvalidArguments(_)));
}

// ===== list =====

#[test]
fn test_list_on_fresh_account_is_empty_keys_file() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    let err = ctx.list("deploy").unwrap_err();
    assert_eq!(err, SshCommandError::EmptyKeysFile(ctx.keys_path("deploy")));
}

#[test]
fn test_list_without_keys_file() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    let err = ctx.list("deploy").unwrap_err();
    assert_eq!(err, SshCommandError::NoKeysFile(ctx.keys_path("deploy")));
}

#[test]
fn test_list_unknown_account() {
    let ctx = TestContext::new();
    let err = ctx.list("ghost").unwrap_err();
    assert_eq!(err, SshCommandError::AccountNotFound("ghost".to_string()));
}

#[test]
fn test_list_skips_opaque_lines() {
    let ctx = TestContext::new();
    ctx.add_account("deploy");
    ctx.write_keys_file("deploy", format!("# comment\n{BOB_KEY}\n").as_bytes());

    assert!(ctx.list("deploy").unwrap().is_empty());

    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    let records = ctx.list("deploy").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "alice");
}

#[test]
fn test_list_with_name_filter() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();
    ctx.acl_add("deploy", "alice", ALICE_KEY).unwrap();
    ctx.acl_add("deploy", "bob", BOB_KEY).unwrap();

    let records = ctx.store().list("deploy", Some("bob")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fingerprint, BOB_FP);

    let err = ctx.store().list("deploy", Some("carol")).unwrap_err();
    assert_eq!(err, SshCommandError::NoMatchingKeys("carol".to_string()));
}

// ===== Lifecycle scenario =====

#[test]
fn test_deploy_scenario() {
    let ctx = TestContext::new();
    ctx.create("deploy", "git-shell").unwrap();

    let fingerprint = ctx.acl_add("deploy", "alice", BOB_KEY).unwrap();
    assert_eq!(fingerprint.split(':').count(), 16);

    let records = ctx.list("deploy").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "alice");
    assert_eq!(records[0].fingerprint, fingerprint);
    assert_eq!(records[0].flags[0], "no-agent-forwarding");

    ctx.acl_remove("deploy", "alice").unwrap();
    assert!(matches!(
        ctx.list("deploy").unwrap_err(),
        SshCommandError::EmptyKeysFile(_)
    ));
}
