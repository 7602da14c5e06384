/// Slack interaction payloads
///
/// Slack posts interactions as `payload=<json>`. Two shapes are handled:
/// `view_submission` (the task creation modal) and `block_actions` (buttons
/// on task messages). Every other type parses as [`InteractionPayload::Unknown`].

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use super::blocks::{fields, ActionValue, TASK_CREATE_CALLBACK_ID};
use super::error::SlackError;

/// Action label recorded when a button value names no action
pub const DEFAULT_ACTION: &str = "updated";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    ViewSubmission {
        #[serde(default)]
        team: Option<TeamRef>,
        user: UserRef,
        view: SubmittedView,
    },
    BlockActions {
        #[serde(default)]
        team: Option<TeamRef>,
        user: UserRef,
        #[serde(default)]
        actions: Vec<BlockAction>,
    },
    #[serde(other)]
    Unknown,
}

impl InteractionPayload {
    /// Parses the JSON carried in the `payload` form field
    pub fn parse(json: &str) -> Result<Self, SlackError> {
        serde_json::from_str(json).map_err(|e| SlackError::InvalidPayload(e.to_string()))
    }

    /// Slack team the interaction came from
    pub fn team_id(&self) -> Option<&str> {
        match self {
            Self::ViewSubmission { team, .. } | Self::BlockActions { team, .. } => {
                team.as_ref().map(|t| t.id.as_str())
            }
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedView {
    #[serde(default)]
    pub callback_id: String,
    #[serde(default)]
    pub state: ViewState,
}

impl SubmittedView {
    pub fn is_task_create(&self) -> bool {
        self.callback_id == TASK_CREATE_CALLBACK_ID
    }

    fn value(&self, (block_id, action_id): (&str, &str)) -> Option<&StateValue> {
        self.state.values.get(block_id)?.get(action_id)
    }
}

/// `view.state.values`, keyed by block id then action id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, StateValue>>,
}

/// State of one input element; which field is set depends on the element
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_user: Option<String>,
    #[serde(default)]
    pub selected_date: Option<String>,
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAction {
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl BlockAction {
    /// Decodes the button value
    ///
    /// Returns the typed value and the raw JSON object, which is what gets
    /// recorded in task history.
    pub fn decode_value(&self) -> Result<(ActionValue, serde_json::Value), SlackError> {
        let raw = self.value.as_deref().unwrap_or("{}");
        let json: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| SlackError::InvalidPayload(format!("action value: {}", e)))?;

        let task_id = json
            .get("task_id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| SlackError::InvalidPayload("action value has no task_id".to_string()))?;
        let action = json
            .get("action")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(DEFAULT_ACTION)
            .to_string();

        Ok((ActionValue { action, task_id }, json))
    }
}

/// Task fields extracted from a submitted creation modal
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSubmission {
    pub title: String,
    pub description: String,
    pub assignee_user_id: String,
    pub priority: String,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: String,
}

impl TaskSubmission {
    /// Reads the modal's state; reports the first missing required field
    pub fn from_view(view: &SubmittedView) -> Result<Self, SlackError> {
        let required = |field: (&str, &str), pick: fn(&StateValue) -> Option<&String>| {
            view.value(field)
                .and_then(pick)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| SlackError::InvalidPayload(format!("missing field {}", field.0)))
        };

        let title = required(fields::TITLE, |s| s.value.as_ref())?;
        let description = required(fields::DESCRIPTION, |s| s.value.as_ref())?;
        let assignee_user_id = required(fields::ASSIGNEE, |s| s.selected_user.as_ref())?;
        let priority = required(fields::PRIORITY, |s| {
            s.selected_option.as_ref().map(|o| &o.value)
        })?;

        let due_date = view
            .value(fields::DUE)
            .and_then(|s| s.selected_date.as_deref())
            .map(parse_due_date)
            .transpose()?;

        let tags = view
            .value(fields::TAGS)
            .and_then(|s| s.value.clone())
            .unwrap_or_default();

        Ok(Self {
            title,
            description,
            assignee_user_id,
            priority,
            due_date,
            tags,
        })
    }
}

/// Parses a datepicker value (`YYYY-MM-DD`) as midnight UTC
fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, SlackError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| SlackError::InvalidPayload(format!("invalid due date {}", raw)))
}
