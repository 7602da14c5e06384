/// Block Kit builders for the task modal and task notifications
///
/// Only the subset of Block Kit that Tako Tasks renders is modelled.
/// See: <https://api.slack.com/block-kit>

use serde::{Deserialize, Serialize};

use crate::models::task::Task;

/// Callback id of the task creation modal
pub const TASK_CREATE_CALLBACK_ID: &str = "task_create";

/// Block and action ids of the task creation modal, as `(block_id, action_id)`
pub mod fields {
    pub const TITLE: (&str, &str) = ("title_block", "title_input");
    pub const DESCRIPTION: (&str, &str) = ("description_block", "description_input");
    pub const ASSIGNEE: (&str, &str) = ("assignee_block", "assignee_input");
    pub const DUE: (&str, &str) = ("due_block", "due_input");
    pub const PRIORITY: (&str, &str) = ("priority_block", "priority_input");
    pub const TAGS: (&str, &str) = ("tags_block", "tags_input");
}

/// Priority choices offered by the modal; values are the lowercased labels
pub const PRIORITY_LABELS: [&str; 4] = ["Low", "Normal", "High", "Urgent"];

/// A modal view.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    #[serde(rename = "type")]
    pub view_type: &'static str,
    pub callback_id: String,
    pub title: Text,
    pub submit: Text,
    pub close: Text,
    pub blocks: Vec<Block>,
}

/// Block Kit block types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        text: Text,
    },
    Context {
        elements: Vec<Text>,
    },
    Actions {
        elements: Vec<ActionElement>,
    },
    Input {
        block_id: String,
        label: Text,
        element: InputElement,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        optional: bool,
    },
}

/// Text object types.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    PlainText { text: String },
    Mrkdwn { text: String },
}

impl Text {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

/// Input block elements.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput {
        action_id: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        multiline: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<Text>,
    },
    UsersSelect {
        action_id: String,
    },
    Datepicker {
        action_id: String,
    },
    StaticSelect {
        action_id: String,
        options: Vec<SelectOption>,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_option: Option<SelectOption>,
    },
}

/// Option of a static select.
#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub text: Text,
    pub value: String,
}

impl SelectOption {
    fn labelled(label: &str) -> Self {
        Self {
            text: Text::plain(label),
            value: label.to_lowercase(),
        }
    }
}

/// Action block elements.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionElement {
    Button {
        text: Text,
        action_id: String,
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<ButtonStyle>,
    },
}

/// Button style (affects color).
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// Value carried by task message buttons, JSON encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionValue {
    pub action: String,
    pub task_id: i64,
}

fn input(
    (block_id, action_id): (&str, &str),
    label: &str,
    optional: bool,
    element: impl FnOnce(String) -> InputElement,
) -> Block {
    Block::Input {
        block_id: block_id.to_string(),
        label: Text::plain(label),
        element: element(action_id.to_string()),
        optional,
    }
}

/// Builds the "Create Task" modal.
pub fn task_modal() -> View {
    let blocks = vec![
        input(fields::TITLE, "Title", false, |action_id| {
            InputElement::PlainTextInput {
                action_id,
                multiline: false,
                placeholder: Some(Text::plain("Add summary")),
            }
        }),
        input(fields::DESCRIPTION, "Description", false, |action_id| {
            InputElement::PlainTextInput {
                action_id,
                multiline: true,
                placeholder: None,
            }
        }),
        input(fields::ASSIGNEE, "Assignee", false, |action_id| {
            InputElement::UsersSelect { action_id }
        }),
        input(fields::DUE, "Due date", true, |action_id| {
            InputElement::Datepicker { action_id }
        }),
        input(fields::PRIORITY, "Priority", false, |action_id| {
            InputElement::StaticSelect {
                action_id,
                options: PRIORITY_LABELS.iter().map(|l| SelectOption::labelled(l)).collect(),
                initial_option: Some(SelectOption::labelled("Normal")),
            }
        }),
        input(fields::TAGS, "Tags", true, |action_id| {
            InputElement::PlainTextInput {
                action_id,
                multiline: false,
                placeholder: Some(Text::plain("comma,separated")),
            }
        }),
    ];

    View {
        view_type: "modal",
        callback_id: TASK_CREATE_CALLBACK_ID.to_string(),
        title: Text::plain("Create Task"),
        submit: Text::plain("Save"),
        close: Text::plain("Cancel"),
        blocks,
    }
}

fn button(label: &str, action: &str, task_id: i64, style: Option<ButtonStyle>) -> ActionElement {
    let value = ActionValue {
        action: action.to_string(),
        task_id,
    };

    ActionElement::Button {
        text: Text::plain(label),
        action_id: format!("task_{}", action),
        value: serde_json::to_string(&value).unwrap_or_default(),
        style,
    }
}

/// Builds the notification blocks for a task: summary, metadata and buttons.
pub fn task_message_blocks(task: &Task) -> Vec<Block> {
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "n/a".to_string());

    vec![
        Block::Section {
            text: Text::mrkdwn(format!(
                "*{}*\n{}\n*Assignee:* <@{}>",
                task.title, task.description, task.assignee_user_id
            )),
        },
        Block::Context {
            elements: vec![
                Text::mrkdwn(format!("Priority: {}", task.priority)),
                Text::mrkdwn(format!("Status: {}", task.status.as_str())),
                Text::mrkdwn(format!("Due: {}", due)),
            ],
        },
        Block::Actions {
            elements: vec![
                button("✔ Mark Complete", "complete", task.id, Some(ButtonStyle::Primary)),
                button("🔄 Update Status", "status", task.id, None),
                button("🗂 Reassign", "reassign", task.id, None),
                button("📝 Edit", "edit", task.id, None),
            ],
        },
    ]
}
