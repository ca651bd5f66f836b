//! # Attach Protocol Codec
//!
//! Framing of requests to, and parsing of replies from, the HotSpot attach
//! listener.
//!
//! A request is a sequence of NUL-terminated strings:
//!
//! ```text
//! "1" NUL <command> NUL <arg0> NUL <arg1> NUL <arg2> NUL
//! ```
//!
//! Exactly three arguments are always sent; unused ones are empty.
//!
//! The reply starts with a decimal completion status on its own line. For
//! `load` a zero status is followed by the agent's `Agent_OnAttach` result,
//! either as `return code: <n>` (JDK 9+) or a bare integer (JDK 8).

use std::io::BufRead;

use super::constants::{ARGS_PER_REQUEST, ATTACH_ERROR_BADVERSION, PROTOCOL_VERSION, RETURN_CODE_PREFIX};
use crate::error::{AttachError, Result, AGENT_ON_ATTACH_FAILED};

/// Encode `command` and `args` into a request.
///
/// ## Errors
///
/// - `InvalidArgument`: more than three arguments, or a NUL byte inside a field
pub fn encode_request(command: &str, args: &[&[u8]]) -> Result<Vec<u8>>
{
    if args.len() > ARGS_PER_REQUEST {
        return Err(AttachError::InvalidArgument(format!(
            "attach command '{command}' takes at most {ARGS_PER_REQUEST} arguments, got {}",
            args.len()
        )));
    }

    let mut fields: Vec<&[u8]> = vec![PROTOCOL_VERSION.as_bytes(), command.as_bytes()];
    fields.extend_from_slice(args);
    fields.resize(2 + ARGS_PER_REQUEST, &[]);

    let mut request = Vec::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
    for field in fields {
        if field.contains(&0) {
            return Err(AttachError::InvalidArgument(format!(
                "attach request field contains a NUL byte: {}",
                String::from_utf8_lossy(field)
            )));
        }
        request.extend_from_slice(field);
        request.push(0);
    }

    Ok(request)
}

/// Read one line, without its terminator. `None` at end of stream.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>>
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Read the completion status that opens every reply.
///
/// ## Errors
///
/// - `Protocol`: the stream ended first or the line isn't an integer
pub fn read_status<R: BufRead>(reader: &mut R) -> Result<i32>
{
    let line = read_line(reader)?.ok_or_else(|| AttachError::Protocol("Premature EOF".to_string()))?;
    line.trim()
        .parse::<i32>()
        .map_err(|_| AttachError::Protocol(format!("Non-numeric value found - int expected, got '{line}'")))
}

/// Everything left in the reply, lines concatenated.
fn read_error_message<R: BufRead>(reader: &mut R) -> Result<String>
{
    let mut message = String::new();
    while let Some(line) = read_line(reader)? {
        message.push_str(&line);
    }
    Ok(message)
}

/// Interpret the full reply to a `load` request.
///
/// ## Errors
///
/// - `Protocol`: malformed status, or a protocol version mismatch
/// - `AgentLoad`: the VM failed to load the library or sent an unexpected reply
/// - `AgentInitialization`: `Agent_OnAttach` returned non-zero; the message is
///   always [`AGENT_ON_ATTACH_FAILED`]
pub fn parse_load_reply<R: BufRead>(reader: &mut R) -> Result<()>
{
    let status = read_status(reader)?;
    if status != 0 {
        let message = read_error_message(reader)?;
        if status == ATTACH_ERROR_BADVERSION {
            return Err(AttachError::Protocol("Protocol mismatch with target VM".to_string()));
        }
        let mut text = String::from("Failed to load agent library");
        if !message.is_empty() {
            text.push_str(": ");
            text.push_str(&message);
        }
        return Err(AttachError::AgentLoad(text));
    }

    let Some(line) = read_line(reader)? else {
        return Err(AttachError::AgentLoad("Target VM did not respond".to_string()));
    };

    let code_text = line.strip_prefix(RETURN_CODE_PREFIX).unwrap_or(&line).trim();
    let return_code = code_text
        .parse::<i32>()
        .map_err(|_| AttachError::AgentLoad(line.clone()))?;

    if return_code != 0 {
        return Err(AttachError::AgentInitialization {
            message: AGENT_ON_ATTACH_FAILED.to_string(),
            return_code,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests
{
    use std::io::Cursor;

    use super::*;

    fn reply(text: &str) -> Cursor<Vec<u8>>
    {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[test]
    fn test_load_request_layout()
    {
        let request = encode_request("load", &[b"/opt/liblo2s-perfmap.so", b"true", b""]).unwrap();
        assert_eq!(request, b"1\0load\0/opt/liblo2s-perfmap.so\0true\0\0".to_vec());
    }

    #[test]
    fn test_missing_arguments_are_padded()
    {
        let request = encode_request("properties", &[]).unwrap();
        assert_eq!(request, b"1\0properties\0\0\0\0".to_vec());
    }

    #[test]
    fn test_too_many_arguments_rejected()
    {
        let err = encode_request("load", &[b"a", b"b", b"c", b"d"]).unwrap_err();
        assert!(matches!(err, AttachError::InvalidArgument(_)));
    }

    #[test]
    fn test_embedded_nul_rejected()
    {
        let err = encode_request("load", &[b"/tmp/a\0b.so"]).unwrap_err();
        assert!(matches!(err, AttachError::InvalidArgument(_)));
    }

    #[test]
    fn test_jdk9_success()
    {
        assert!(parse_load_reply(&mut reply("0\nreturn code: 0\n")).is_ok());
    }

    #[test]
    fn test_jdk8_success()
    {
        assert!(parse_load_reply(&mut reply("0\n0\n")).is_ok());
    }

    #[test]
    fn test_nonzero_agent_result_is_initialization_failure()
    {
        let err = parse_load_reply(&mut reply("0\nreturn code: -1\n")).unwrap_err();
        match err {
            AttachError::AgentInitialization { message, return_code } => {
                assert_eq!(message, AGENT_ON_ATTACH_FAILED);
                assert_eq!(return_code, -1);
            }
            other => panic!("expected AgentInitialization, got {other:?}"),
        }

        let jdk8 = parse_load_reply(&mut reply("0\n1")).unwrap_err();
        assert!(jdk8.is_ignorable_initialization());
    }

    #[test]
    fn test_failed_status_carries_message()
    {
        let err = parse_load_reply(&mut reply("1\nCould not load library\n")).unwrap_err();
        match err {
            AttachError::AgentLoad(message) => {
                assert_eq!(message, "Failed to load agent library: Could not load library");
            }
            other => panic!("expected AgentLoad, got {other:?}"),
        }

        let bare = parse_load_reply(&mut reply("1\n")).unwrap_err();
        assert!(matches!(bare, AttachError::AgentLoad(ref m) if m == "Failed to load agent library"));
    }

    #[test]
    fn test_bad_version_status()
    {
        let err = parse_load_reply(&mut reply("101\n")).unwrap_err();
        assert!(matches!(err, AttachError::Protocol(ref m) if m.contains("Protocol mismatch")));
    }

    #[test]
    fn test_truncated_replies()
    {
        assert!(matches!(parse_load_reply(&mut reply("")), Err(AttachError::Protocol(_))));
        assert!(matches!(
            parse_load_reply(&mut reply("0\n")),
            Err(AttachError::AgentLoad(ref m)) if m == "Target VM did not respond"
        ));
    }

    #[test]
    fn test_unexpected_result_line()
    {
        let err = parse_load_reply(&mut reply("0\nagent library not found\n")).unwrap_err();
        assert!(matches!(err, AttachError::AgentLoad(ref m) if m == "agent library not found"));
        assert!(!err.is_ignorable_initialization());
    }

    #[test]
    fn test_non_numeric_status()
    {
        let err = parse_load_reply(&mut reply("ok\n")).unwrap_err();
        assert!(matches!(err, AttachError::Protocol(_)));
    }
}
