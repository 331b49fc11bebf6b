use std::path::PathBuf;

use bytecraft::error::{exit_codes, Error, JsonError};
use bytecraft::gate::Mutation;
use bytecraft::model::EntityKind;

#[test]
fn exit_codes_map_correctly() {
    let user = Error::InvalidArgument("bad".to_string());
    assert_eq!(user.exit_code(), exit_codes::USER_ERROR);

    let missing = Error::NotFound {
        kind: EntityKind::Task,
        id: 7,
    };
    assert_eq!(missing.exit_code(), exit_codes::USER_ERROR);
    assert!(missing.is_not_found());

    let policy = Error::Offline(Mutation::Delete(EntityKind::Client));
    assert_eq!(policy.exit_code(), exit_codes::POLICY_BLOCKED);

    let op = Error::LockFailed(PathBuf::from("bytecraft_db.json.lock"));
    assert_eq!(op.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn json_error_includes_code_and_details() {
    let err = Error::NotFound {
        kind: EntityKind::Collaborator,
        id: 42,
    };
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    assert!(json.error.contains("Collaborator not found: 42"));
    let details = json.details.expect("details");
    assert_eq!(details["type"], "collaborator");
    assert_eq!(details["id"], 42);
}

#[test]
fn offline_error_names_the_action() {
    let err = Error::Offline(Mutation::Import);
    assert!(err.to_string().contains("importing a backup"));
    assert_eq!(
        JsonError::from(&err).details.expect("details")["action"],
        "importing a backup"
    );
}

#[test]
fn validation_errors_read_as_input_errors() {
    let err = Error::Validation("client name must not be empty".to_string());
    assert_eq!(err.to_string(), "Invalid input: client name must not be empty");
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
}
