//! Tests for error handling

use std::path::PathBuf;

use perfmap_attach_core::error::{AttachError, Result, AGENT_ON_ATTACH_FAILED};

#[test]
fn test_process_not_found_display()
{
    let error = AttachError::ProcessNotFound(12345);
    let message = format!("{}", error);
    assert!(message.contains("12345"));
    assert!(message.contains("not found"));
}

#[test]
fn test_permission_denied_display()
{
    let error = AttachError::PermissionDenied("test reason".to_string());
    let message = format!("{}", error);
    assert!(message.contains("Permission denied"));
    assert!(message.contains("test reason"));
}

#[test]
fn test_library_missing_message()
{
    let error = AttachError::LibraryMissing {
        name: "liblo2s-perfmap.so".to_string(),
        path: PathBuf::from("/home/user/liblo2s-perfmap.so"),
    };
    assert_eq!(
        error.to_string(),
        "Expected liblo2s-perfmap.so at '/home/user/liblo2s-perfmap.so' but it didn't exist."
    );
}

#[test]
fn test_agent_load_message_is_verbatim()
{
    let error = AttachError::AgentLoad("Failed to load agent library: boom".to_string());
    assert_eq!(error.to_string(), "Failed to load agent library: boom");
}

#[test]
fn test_only_exact_message_is_ignorable()
{
    let expected = AttachError::AgentInitialization {
        message: AGENT_ON_ATTACH_FAILED.to_string(),
        return_code: 1,
    };
    assert!(expected.is_ignorable_initialization());

    let other_text = AttachError::AgentInitialization {
        message: "agent_onattach failed".to_string(),
        return_code: 1,
    };
    assert!(!other_text.is_ignorable_initialization());

    let other_kind = AttachError::AgentLoad(AGENT_ON_ATTACH_FAILED.to_string());
    assert!(!other_kind.is_ignorable_initialization());
}

#[test]
fn test_io_error_converts()
{
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let error: AttachError = io.into();
    assert!(matches!(error, AttachError::Io(_)));
    assert!(error.to_string().contains("pipe closed"));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: Result<()> = Ok(());
    let _error_result: Result<()> = Err(AttachError::ProcessNotFound(12345));
}
