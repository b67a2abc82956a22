//! JSON output for the CLI
//!
//! Every command writes exactly one JSON object to stdout, UTF-8, one line.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Wrap `data` in a success envelope
pub fn response(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Build an error envelope
pub fn error_response(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write an envelope to stdout as one line
pub fn write_envelope(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = response(serde_json::json!([1, 2]));
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["data"][1], 2);

        let err = error_response("AERO_CLI_IO_ERROR", "closed");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "AERO_CLI_IO_ERROR");
        assert_eq!(err["message"], "closed");
    }
}
