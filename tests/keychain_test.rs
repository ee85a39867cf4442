mod common;

use common::*;
use evtrust::PipelineError;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_keychain_imports_certificates_in_source_order() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    let runner = ScriptedRunner::new();

    let report = fixture.pipeline(&runner).build_keychain().await.unwrap();

    assert_eq!(report.imported, 3);
    assert_eq!(report.already_present, 0);
    assert_eq!(report.keychain, fixture.keychain());
    assert_eq!(
        runner.subcommands(),
        vec![
            "create-keychain",
            "add-certificates",
            "add-certificates",
            "add-certificates"
        ]
    );

    let keychain = fixture.keychain().to_string_lossy().into_owned();
    let create = &runner.calls()[0];
    assert_eq!(create.program.to_string_lossy(), "security");
    assert_eq!(create.args, vec!["create-keychain", "-p", "", keychain.as_str()]);

    let imported: Vec<String> = runner
        .calls_for("add-certificates")
        .iter()
        .map(|c| {
            assert_eq!(c.args[1..3].to_vec(), vec!["-k".to_string(), keychain.clone()]);
            c.args.last().unwrap().rsplit('/').next().unwrap().to_string()
        })
        .collect();
    assert_eq!(imported, vec!["certA.cer", "certB.cer", "certC.cer"]);
}

#[tokio::test]
async fn test_previous_keychain_is_replaced() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    std::fs::create_dir_all(&fixture.settings.output_dir).unwrap();
    std::fs::write(fixture.keychain(), b"old keychain").unwrap();
    let runner = ScriptedRunner::new();

    fixture.pipeline(&runner).build_keychain().await.unwrap();

    assert_eq!(std::fs::read(fixture.keychain()).unwrap(), b"fresh keychain");
}

#[tokio::test]
async fn test_already_present_certificate_is_not_fatal() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    let runner = ScriptedRunner::new();
    runner.respond(
        "add-certificates",
        "certB.cer",
        exit(45, "The specified item already exists in the keychain."),
    );

    let report = fixture.pipeline(&runner).build_keychain().await.unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.already_present, 1);
}

#[tokio::test]
async fn test_already_present_exit_code_is_configurable() {
    let mut fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    fixture.settings.keychain.already_present_exit_code = 7;
    let runner = ScriptedRunner::new();
    runner.respond("add-certificates", "certA.cer", exit(7, ""));

    let report = fixture.pipeline(&runner).build_keychain().await.unwrap();

    assert_eq!(report.already_present, 1);
}

#[tokio::test]
async fn test_other_import_failure_is_fatal() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    let runner = ScriptedRunner::new();
    runner.respond("add-certificates", "certB.cer", exit(1, "bad certificate"));

    let err = fixture.pipeline(&runner).build_keychain().await.unwrap_err();

    match err {
        PipelineError::ExternalTool { command, reason } => {
            assert!(command.contains("add-certificates"));
            assert_eq!(reason, "exit status 1: bad certificate");
        }
        other => panic!("Expected ExternalTool, got {other:?}"),
    }
    // certC is never attempted
    assert_eq!(runner.calls_for("add-certificates").len(), 2);
}

#[tokio::test]
async fn test_create_keychain_failure_is_fatal() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    let runner = ScriptedRunner::new();
    runner.respond("create-keychain", "EVRoots", exit(48, "already exists"));

    let err = fixture.pipeline(&runner).build_keychain().await.unwrap_err();

    assert!(matches!(err, PipelineError::ExternalTool { .. }));
    assert!(runner.calls_for("add-certificates").is_empty());
}

#[tokio::test]
async fn test_missing_certificate_stops_import() {
    let fixture = Fixture::new(SCENARIO_CONFIG, &["certA.cer", "certC.cer"]);
    let runner = ScriptedRunner::new();

    let err = fixture.pipeline(&runner).build_keychain().await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::MissingCertificate { ref filename, .. } if filename == "certB.cer"
    ));
    assert_eq!(runner.calls_for("add-certificates").len(), 1);
}

#[tokio::test]
async fn test_full_build_runs_phases_in_order() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    let runner = ScriptedRunner::new();

    let report = fixture.pipeline(&runner).build().await.unwrap();

    assert_eq!(report.oids, 2);
    assert_eq!(report.fingerprints, 3);
    assert_eq!(report.keychain.imported, 3);
    assert_eq!(report.trust_database, fixture.trust_database());
    assert!(fixture.trust_database().exists());

    let subcommands = runner.subcommands();
    assert_eq!(subcommands[0], "list-keychains");
    assert_eq!(subcommands[1], "create-keychain");
    // Nothing is restored after a successful run
    assert_eq!(
        subcommands.iter().filter(|s| *s == "list-keychains").count(),
        1
    );
}

#[tokio::test]
async fn test_full_build_without_search_list_management() {
    let mut fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    fixture.settings.keychain.manage_search_list = false;
    let runner = ScriptedRunner::new();

    fixture.pipeline(&runner).build().await.unwrap();

    assert!(runner.calls_for("list-keychains").is_empty());
}

#[tokio::test]
async fn test_full_build_stops_before_index_when_keychain_fails() {
    let fixture = Fixture::new(SCENARIO_CONFIG, SCENARIO_CERTS);
    let runner = ScriptedRunner::new();
    runner.respond("add-certificates", "certA.cer", exit(2, "unknown error"));

    assert!(fixture.pipeline(&runner).build().await.is_err());
    assert!(!fixture.trust_database().exists());
}

#[tokio::test]
async fn test_full_build_with_missing_certificate_leaves_no_database() {
    let fixture = Fixture::new(SCENARIO_CONFIG, &["certA.cer", "certB.cer"]);
    std::fs::create_dir_all(&fixture.settings.output_dir).unwrap();
    std::fs::write(fixture.trust_database(), b"stale").unwrap();
    let runner = ScriptedRunner::new();

    let err = fixture.pipeline(&runner).build().await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::MissingCertificate { ref filename, .. } if filename == "certC.cer"
    ));
    assert!(!fixture.trust_database().exists());
    // Every certificate is resolved before the keychain is touched
    assert!(runner.calls_for("create-keychain").is_empty());
    assert!(runner.calls_for("add-certificates").is_empty());
}
