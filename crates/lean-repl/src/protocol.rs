use serde::{Deserialize, Serialize};

use crate::types::LeanError;

/// A request to send to Pantograph via JSON lines.
///
/// Serializes to `{"cmd": "<command>", "payload": {<args>}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "cmd", content = "payload")]
pub enum PantographRequest {
    /// Start a proof, either from an expression or from a named theorem.
    #[serde(rename = "goal.start")]
    GoalStart(GoalStartPayload),
    /// Apply a tactic to a goal within a proof state.
    #[serde(rename = "goal.tactic")]
    GoalTactic(GoalTacticPayload),
}

/// Payload of `goal.start`. Pantograph requires exactly one of the two fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStartPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_from: Option<String>,
}

/// Payload of `goal.tactic`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalTacticPayload {
    pub state_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<u64>,
    pub tactic: String,
}

impl PantographRequest {
    /// `goal.start` for an elaborated expression.
    pub fn start_expr(expr: impl Into<String>) -> Self {
        Self::GoalStart(GoalStartPayload {
            expr: Some(expr.into()),
            copy_from: None,
        })
    }

    /// `goal.start` copying the type of a theorem already in the environment.
    pub fn start_copy_from(name: impl Into<String>) -> Self {
        Self::GoalStart(GoalStartPayload {
            expr: None,
            copy_from: Some(name.into()),
        })
    }

    /// `goal.tactic` against `state_id` (first goal when `goal_id` is `None`).
    pub fn tactic(state_id: u64, goal_id: Option<u64>, tactic: impl Into<String>) -> Self {
        Self::GoalTactic(GoalTacticPayload {
            state_id,
            goal_id,
            tactic: tactic.into(),
        })
    }

    /// Serialize this request to a single JSON line (without the newline).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// --- Response types ---

/// A goal variable (hypothesis) in a Pantograph response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantographVariable {
    /// Internal name.
    #[serde(default)]
    pub name: String,
    /// User-facing name.
    pub user_name: String,
    /// Whether the name is inaccessible (shown with a dagger).
    #[serde(default)]
    pub is_inaccessible: bool,
    /// Type expression.
    #[serde(rename = "type")]
    pub type_expr: Option<PantographExpression>,
    /// Value expression (for let-bindings).
    pub value: Option<PantographExpression>,
}

/// An expression in a Pantograph response.
#[derive(Debug, Clone, Deserialize)]
pub struct PantographExpression {
    /// Pretty-printed expression.
    pub pp: Option<String>,
    /// S-expression form.
    pub sexp: Option<String>,
}

/// A structured goal in a Pantograph response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantographGoal {
    /// Metavariable name.
    pub name: String,
    /// Case tag, absent for anonymous goals.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Target expression.
    pub target: PantographExpression,
    /// Variables (hypotheses) in scope.
    #[serde(default)]
    pub vars: Vec<PantographVariable>,
}

/// Response from `goal.start`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStartResult {
    pub state_id: u64,
    /// Root metavariable name.
    pub root: String,
}

/// Response from `goal.tactic`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalTacticResult {
    /// Next state ID (present on success).
    pub next_state_id: Option<u64>,
    /// Goals after tactic application (empty = proof complete).
    #[serde(default)]
    pub goals: Option<Vec<PantographGoal>>,
    /// Tactic parsing failed.
    pub parse_error: Option<String>,
    /// Tactic elaborated but failed.
    pub tactic_errors: Option<Vec<String>>,
}

impl GoalTacticResult {
    /// Failure message, if the reply reports one.
    pub fn failure_message(&self) -> Option<String> {
        if let Some(parse_error) = &self.parse_error {
            return Some(parse_error.clone());
        }
        match &self.tactic_errors {
            Some(errors) if !errors.is_empty() => Some(errors.join("\n")),
            _ => None,
        }
    }
}

/// Error response from Pantograph.
#[derive(Debug, Clone, Deserialize)]
pub struct PantographError {
    /// Error category (e.g., "command", "index", "parse", "elab").
    pub error: String,
    /// Error description.
    pub desc: String,
}

/// A response received from Pantograph.
///
/// The variant is decided by the command that was sent; an error object
/// can come back for either.
#[derive(Debug, Clone)]
pub enum PantographResponse {
    /// Response to `goal.start`.
    GoalStarted(GoalStartResult),
    /// Response to `goal.tactic`.
    TacticResult(GoalTacticResult),
    /// An error from Pantograph.
    Error(PantographError),
}

impl PantographResponse {
    /// Parse a JSON response line from Pantograph as a `goal.start` response.
    pub fn parse_goal_start(json: &str) -> Result<Self, LeanError> {
        match Self::parse_error_or(json)? {
            Ok(err) => Ok(Self::Error(err)),
            Err(value) => serde_json::from_value(value)
                .map(Self::GoalStarted)
                .map_err(|e| {
                    LeanError::Protocol(format!(
                        "Failed to parse goal.start response: {e}. Raw: {json}"
                    ))
                }),
        }
    }

    /// Parse a JSON response line from Pantograph as a `goal.tactic` response.
    pub fn parse_goal_tactic(json: &str) -> Result<Self, LeanError> {
        match Self::parse_error_or(json)? {
            Ok(err) => Ok(Self::Error(err)),
            Err(value) => serde_json::from_value(value)
                .map(Self::TacticResult)
                .map_err(|e| {
                    LeanError::Protocol(format!(
                        "Failed to parse goal.tactic response: {e}. Raw: {json}"
                    ))
                }),
        }
    }

    /// Parse the line as JSON; `Ok(err)` for a Pantograph error object
    /// (`error` + `desc` keys), `Err(value)` for anything else.
    fn parse_error_or(
        json: &str,
    ) -> Result<Result<PantographError, serde_json::Value>, LeanError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| LeanError::Protocol(format!("Invalid JSON: {e}. Raw: {json}")))?;

        if value.get("error").is_some() && value.get("desc").is_some() {
            let err: PantographError = serde_json::from_value(value)
                .map_err(|e| LeanError::Protocol(format!("Failed to parse error: {e}")))?;
            return Ok(Ok(err));
        }
        Ok(Err(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_goal_start_expr() {
        let json = PantographRequest::start_expr("∀ (n : ℕ), n = n").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["cmd"], "goal.start");
        assert_eq!(parsed["payload"]["expr"], "∀ (n : ℕ), n = n");
        assert!(parsed["payload"].get("copyFrom").is_none());
    }

    #[test]
    fn serialize_goal_start_copy_from() {
        let json = PantographRequest::start_copy_from("MyNat.add_zero").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["cmd"], "goal.start");
        assert_eq!(parsed["payload"]["copyFrom"], "MyNat.add_zero");
        assert!(parsed["payload"].get("expr").is_none());
    }

    #[test]
    fn serialize_goal_tactic() {
        let json = PantographRequest::tactic(5, None, "rw [h]").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["cmd"], "goal.tactic");
        assert_eq!(parsed["payload"]["stateId"], 5);
        assert_eq!(parsed["payload"]["tactic"], "rw [h]");
        assert!(parsed["payload"].get("goalId").is_none());
        assert!(!json.contains("state_id"));
        assert!(!json.ends_with('\n'));
    }

    #[test]
    fn serialize_goal_tactic_with_goal_id() {
        let json = PantographRequest::tactic(0, Some(1), "rfl").to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["payload"]["goalId"], 1);
    }

    #[test]
    fn deserialize_goal_start_success() {
        let json = r#"{"root":"_uniq.7","stateId":0}"#;
        match PantographResponse::parse_goal_start(json).unwrap() {
            PantographResponse::GoalStarted(r) => {
                assert_eq!(r.state_id, 0);
                assert_eq!(r.root, "_uniq.7");
            }
            other => panic!("Expected GoalStarted, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_goal_tactic_with_case_goal() {
        let json = r#"{"goals":[{"fragment":"tactic","name":"_uniq.9","userName":"succ","target":{"pp":"n = n"},"vars":[{"isInaccessible":false,"name":"_uniq.8","type":{"pp":"ℕ"},"userName":"n"}]}],"hasSorry":false,"messages":[],"nextStateId":1}"#;
        match PantographResponse::parse_goal_tactic(json).unwrap() {
            PantographResponse::TacticResult(r) => {
                assert_eq!(r.next_state_id, Some(1));
                assert!(r.failure_message().is_none());
                let goals = r.goals.unwrap();
                assert_eq!(goals[0].user_name.as_deref(), Some("succ"));
                assert_eq!(goals[0].vars[0].user_name, "n");
            }
            other => panic!("Expected TacticResult, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_goal_tactic_proof_complete() {
        let json = r#"{"goals":[],"hasSorry":false,"messages":[],"nextStateId":2}"#;
        match PantographResponse::parse_goal_tactic(json).unwrap() {
            PantographResponse::TacticResult(r) => {
                assert_eq!(r.next_state_id, Some(2));
                assert!(r.goals.unwrap().is_empty());
            }
            other => panic!("Expected TacticResult, got {other:?}"),
        }
    }

    #[test]
    fn parse_error_is_failure_message() {
        let json = r#"{"parseError":"<Pantograph>:1:1: unknown tactic"}"#;
        match PantographResponse::parse_goal_tactic(json).unwrap() {
            PantographResponse::TacticResult(r) => {
                assert!(r.next_state_id.is_none());
                assert!(r.failure_message().unwrap().contains("unknown tactic"));
            }
            other => panic!("Expected TacticResult, got {other:?}"),
        }
    }

    #[test]
    fn tactic_errors_are_joined() {
        let json = r#"{"tacticErrors":["first","second"]}"#;
        match PantographResponse::parse_goal_tactic(json).unwrap() {
            PantographResponse::TacticResult(r) => {
                assert_eq!(r.failure_message().as_deref(), Some("first\nsecond"));
            }
            other => panic!("Expected TacticResult, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_pantograph_error() {
        let json = r#"{"error":"index","desc":"Invalid state index 42"}"#;
        match PantographResponse::parse_goal_tactic(json).unwrap() {
            PantographResponse::Error(e) => {
                assert_eq!(e.error, "index");
                assert!(e.desc.contains("42"));
            }
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_malformed_json() {
        assert!(matches!(
            PantographResponse::parse_goal_start("not valid json {{{"),
            Err(LeanError::Protocol(_))
        ));
    }

    #[test]
    fn unexpected_shape_is_protocol_error() {
        assert!(matches!(
            PantographResponse::parse_goal_start(r#"{"foo":1}"#),
            Err(LeanError::Protocol(_))
        ));
    }
}
