//! Plan document model and codec.
//!
//! A plan is a single root [`Task`] with ordered, role-tagged [`Subtask`]s. The
//! on-disk form is XML:
//!
//! ```xml
//! <project_plan>
//!   <name>calculator</name>
//!   <description>Build a CLI calculator</description>
//!   <delegatedTo><agent>coder</agent></delegatedTo>
//!   <tasks>
//!     <task><name>implement</name><delegatedTo>coder</delegatedTo></task>
//!   </tasks>
//! </project_plan>
//! ```
//!
//! Parsing is strict: one malformed task rejects the whole document, because
//! scheduling assumes every subtask carries a role.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::core::role::RoleId;
use crate::core::xml::{Element, parse_document};

/// Root element name of a plan document.
pub const PLAN_ROOT: &str = "project_plan";

const NAME: &str = "name";
const DESCRIPTION: &str = "description";
const DELEGATED_TO: &str = "delegatedTo";
const AGENT: &str = "agent";
const TASKS: &str = "tasks";
const TASK: &str = "task";

/// Reasons a plan document is rejected. No partial [`Task`] is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("malformed plan document: {reason}")]
    MalformedDocument { reason: String },
    #[error("missing or empty required field '{field}'")]
    MissingRequiredField { field: String },
}

impl PlanError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }
}

/// One unit of work assigned to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    description: String,
    role: RoleId,
}

impl Subtask {
    pub fn new(description: &str, role: &str) -> Result<Self, PlanError> {
        let description = non_empty(description).ok_or_else(|| PlanError::missing(NAME))?;
        let role = RoleId::new(role).map_err(|_| PlanError::missing(DELEGATED_TO))?;
        Ok(Self { description, role })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn role(&self) -> &RoleId {
        &self.role
    }
}

/// Root of a parsed plan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: String,
    description: String,
    delegated_roles: Vec<RoleId>,
    subtasks: Vec<Subtask>,
}

impl Task {
    pub fn new(
        name: &str,
        description: &str,
        delegated_roles: Vec<RoleId>,
        subtasks: Vec<Subtask>,
    ) -> Result<Self, PlanError> {
        let name = non_empty(name).ok_or_else(|| PlanError::missing(NAME))?;
        let description = non_empty(description).ok_or_else(|| PlanError::missing(DESCRIPTION))?;
        Ok(Self {
            name,
            description,
            delegated_roles,
            subtasks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn delegated_roles(&self) -> &[RoleId] {
        &self.delegated_roles
    }

    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a plan document into its root [`Task`].
pub fn parse_plan(document: &str) -> Result<Task, PlanError> {
    let root = parse_document(document).map_err(PlanError::malformed)?;
    if root.name != PLAN_ROOT {
        return Err(PlanError::malformed(format!(
            "root element must be '{PLAN_ROOT}', found '{}'",
            root.name
        )));
    }
    parse_root(&root)
}

fn parse_root(root: &Element) -> Result<Task, PlanError> {
    let name = root.child_text(NAME).ok_or_else(|| PlanError::missing(NAME))?;
    let description = root
        .child_text(DESCRIPTION)
        .ok_or_else(|| PlanError::missing(DESCRIPTION))?;

    // Blank agent entries are skipped rather than rejected.
    let delegated_roles = root
        .child(DELEGATED_TO)
        .map(|delegated| {
            delegated
                .children_named(AGENT)
                .filter_map(|agent| RoleId::new(&agent.text).ok())
                .collect()
        })
        .unwrap_or_default();

    let subtasks = match root.child(TASKS) {
        Some(tasks) => tasks
            .children_named(TASK)
            .enumerate()
            .map(|(idx, task)| parse_subtask(task, idx + 1))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Task::new(name, description, delegated_roles, subtasks)
}

fn parse_subtask(task: &Element, position: usize) -> Result<Subtask, PlanError> {
    let field = |name: &str| format!("{TASKS}/{TASK}[{position}]/{name}");
    let description = task
        .child_text(NAME)
        .ok_or_else(|| PlanError::missing(field(NAME)))?;
    let role = task
        .child_text(DELEGATED_TO)
        .ok_or_else(|| PlanError::missing(field(DELEGATED_TO)))?;
    Subtask::new(description, role)
}

/// Locate a plan document embedded in free text (prose, code fences).
///
/// Returns the slice from the `<project_plan>` start tag through the last
/// matching end tag, or `None` when the text carries no complete document.
pub fn find_plan_document(text: &str) -> Option<&str> {
    let open = format!("<{PLAN_ROOT}");
    let close = format!("</{PLAN_ROOT}>");

    let mut from = 0;
    let start = loop {
        let idx = from + text[from..].find(&open)?;
        let next = text[idx + open.len()..].chars().next();
        if matches!(next, Some(c) if c == '>' || c == '/' || c.is_whitespace()) {
            break idx;
        }
        from = idx + open.len();
    };
    let end = start + text[start..].rfind(&close)? + close.len();
    Some(&text[start..end])
}

/// Failure while writing a plan document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render plan: {0}")]
pub struct RenderError(String);

/// Render a [`Task`] as a plan document accepted by [`parse_plan`].
pub fn render_plan(task: &Task) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new(PLAN_ROOT)))?;
    write_text_element(&mut writer, NAME, task.name())?;
    write_text_element(&mut writer, DESCRIPTION, task.description())?;

    if !task.delegated_roles().is_empty() {
        emit(&mut writer, Event::Start(BytesStart::new(DELEGATED_TO)))?;
        for role in task.delegated_roles() {
            write_text_element(&mut writer, AGENT, role.as_str())?;
        }
        emit(&mut writer, Event::End(BytesEnd::new(DELEGATED_TO)))?;
    }

    emit(&mut writer, Event::Start(BytesStart::new(TASKS)))?;
    for subtask in task.subtasks() {
        emit(&mut writer, Event::Start(BytesStart::new(TASK)))?;
        write_text_element(&mut writer, NAME, subtask.description())?;
        write_text_element(&mut writer, DELEGATED_TO, subtask.role().as_str())?;
        emit(&mut writer, Event::End(BytesEnd::new(TASK)))?;
    }
    emit(&mut writer, Event::End(BytesEnd::new(TASKS)))?;
    emit(&mut writer, Event::End(BytesEnd::new(PLAN_ROOT)))?;

    let mut out = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    out.push('\n');
    Ok(out)
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), RenderError> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), RenderError> {
    writer
        .write_event(event)
        .map_err(|err| RenderError(err.to_string()))
}
