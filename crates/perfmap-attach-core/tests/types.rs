//! Tests for process id and agent library types

use perfmap_attach_core::error::AttachError;
use perfmap_attach_core::types::{AgentLibrary, ProcessId, PERFMAP_LIBRARY_NAME};

#[test]
fn test_process_id_from_u32()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.0, 12345);
}

#[test]
fn test_process_id_to_u32()
{
    let pid = ProcessId::from(54321);
    let value: u32 = pid.into();
    assert_eq!(value, 54321);
}

#[test]
fn test_process_id_parse()
{
    assert_eq!("4242".parse::<ProcessId>().unwrap(), ProcessId::from(4242));
    assert_eq!(" 17\n".parse::<ProcessId>().unwrap(), ProcessId::from(17));
}

#[test]
fn test_process_id_parse_rejects_garbage()
{
    for input in ["", "abc", "-5", "0", "12x", "4294967295"] {
        let result = input.parse::<ProcessId>();
        assert!(
            matches!(result, Err(AttachError::InvalidArgument(_))),
            "'{input}' should be rejected"
        );
    }
}

#[test]
fn test_process_id_display()
{
    assert_eq!(ProcessId::from(99).to_string(), "99");
}

#[test]
fn test_process_id_as_raw()
{
    assert_eq!(ProcessId::from(1234).as_raw(), 1234);
    assert_eq!(ProcessId::from(u32::MAX).as_raw(), -1);
}

#[test]
fn test_perfmap_library_name()
{
    let library = AgentLibrary::perfmap();
    assert_eq!(library.file_name(), PERFMAP_LIBRARY_NAME);
    assert_eq!(PERFMAP_LIBRARY_NAME, "liblo2s-perfmap.so");
}

#[test]
fn test_library_in_dir_resolves_inside_dir()
{
    let temp = tempfile::tempdir().unwrap();
    let library = AgentLibrary::perfmap().in_dir(temp.path());
    assert_eq!(library.resolve().unwrap(), temp.path().join(PERFMAP_LIBRARY_NAME));
}
