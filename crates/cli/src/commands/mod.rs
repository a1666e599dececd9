pub mod config;
pub mod doctor;
pub mod migrate;
pub mod seed;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::CommandResult;

    #[test]
    fn success_payload_is_json_with_ok_status() {
        let result = CommandResult::success("migrate", "applied pending migrations");
        assert_eq!(result.exit_code, 0);

        let parsed: serde_json::Value =
            serde_json::from_str(&result.output).expect("output should be JSON");
        assert_eq!(parsed["command"], "migrate");
        assert_eq!(parsed["status"], "ok");
        assert!(parsed["error_class"].is_null());
    }

    #[test]
    fn failure_payload_carries_error_class_and_exit_code() {
        let result = CommandResult::failure("seed", "db_connectivity", "connection refused", 4);
        assert_eq!(result.exit_code, 4);

        let parsed: serde_json::Value =
            serde_json::from_str(&result.output).expect("output should be JSON");
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["error_class"], "db_connectivity");
    }
}
