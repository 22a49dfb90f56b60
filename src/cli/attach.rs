//! tally attach command implementations.

use std::path::Path;

use serde::Serialize;

use super::context::{load_context, now};
use super::Globals;
use crate::attachment::Attachment;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct AttachmentListOutput {
    task_id: String,
    total: usize,
    attachments: Vec<Attachment>,
}

pub fn run_add(task_id: &str, path: &Path, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let task = ctx.tasks().get(task_id)?;
    let store = ctx.attachments();
    let attachment = store.add(&task, &ctx.user, path, now())?;

    let mut human = HumanOutput::new("Attachment added");
    human.field("Task", task.id.clone());
    human.field("File", attachment.file_name.clone());
    human.field("Size", attachment.display_size());
    human.field("Stored", store.path_of(&attachment).display().to_string());

    emit_success(ctx.output, "attach add", &attachment, Some(&human))
}

pub fn run_list(task_id: &str, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let task = ctx.tasks().get(task_id)?;
    let attachments = ctx.attachments().list(&task.id)?;

    let mut human = HumanOutput::new(format!("Attachments on task {}", task.id));
    human.field("Total", attachments.len().to_string());
    for attachment in &attachments {
        human.line(format_attachment(attachment));
    }

    let output = AttachmentListOutput {
        task_id: task.id,
        total: attachments.len(),
        attachments,
    };
    emit_success(ctx.output, "attach list", &output, Some(&human))
}

pub(crate) fn format_attachment(attachment: &Attachment) -> String {
    format!(
        "{} {} ({}) by {}",
        attachment.created_at.to_rfc3339(),
        attachment.file_name,
        attachment.display_size(),
        attachment.user
    )
}
