// Transport encoding for judge payloads
// Source, stdin and every output field travel as base64

use crate::error::JudgeError;
use base64::{engine::general_purpose, Engine as _};
use codejudge_common::types::SubmissionResult;

pub fn encode(text: &str) -> String {
    general_purpose::STANDARD.encode(text.as_bytes())
}

/// Decode an optional base64 field; absent means empty
///
/// The judge wraps long base64 values across lines, so ASCII whitespace
/// is dropped before decoding. Invalid UTF-8 is replaced, not rejected.
pub fn decode_field(field: &'static str, value: Option<&str>) -> Result<String, JudgeError> {
    let Some(encoded) = value else {
        return Ok(String::new());
    };

    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| JudgeError::Decode { field, source })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// All three output fields of a result, decoded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedOutput {
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
}

pub fn decode_result(result: &SubmissionResult) -> Result<DecodedOutput, JudgeError> {
    Ok(DecodedOutput {
        stdout: decode_field("stdout", result.stdout.as_deref())?,
        stderr: decode_field("stderr", result.stderr.as_deref())?,
        compile_output: decode_field("compile_output", result.compile_output.as_deref())?,
    })
}
