use engram_core::errors::EngramError;

#[test]
fn exit_codes_follow_the_cli_contract() {
    assert_eq!(EngramError::InvalidInput("x".into()).exit_code(), 1);
    assert_eq!(EngramError::NotFound("x".into()).exit_code(), 1);
    assert_eq!(EngramError::Conflict("x".into()).exit_code(), 1);
    assert_eq!(EngramError::PolicyHold("x".into()).exit_code(), 1);
    assert_eq!(EngramError::Storage("x".into()).exit_code(), 2);
    assert_eq!(EngramError::Dependency("x".into()).exit_code(), 2);
    assert_eq!(EngramError::Cancelled("x".into()).exit_code(), 3);
}

#[test]
fn only_dependency_failures_skip_rollback() {
    assert!(!EngramError::Dependency("embedder down".into()).rolls_back());
    assert!(EngramError::Storage("disk full".into()).rolls_back());
    assert!(EngramError::Cancelled("deadline".into()).rolls_back());
}

#[test]
fn messages_carry_the_cause() {
    let e = EngramError::NotFound("object abc".into());
    assert_eq!(e.to_string(), "not found: object abc");
}
