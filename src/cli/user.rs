//! tally user command implementations.

use serde::Serialize;

use super::context::load_context;
use super::Globals;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::user;

#[derive(Serialize)]
struct UserOutput {
    user_id: String,
}

pub fn run_set(name: &str, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let user_id = user::persist_user(&ctx.storage, name)?;

    let mut human = HumanOutput::new("User set");
    human.field("User", user_id.clone());

    emit_success(ctx.output, "user set", &UserOutput { user_id }, Some(&human))
}

pub fn run_show(globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;

    let mut human = HumanOutput::new("Current user");
    human.field("User", ctx.user.clone());

    let output = UserOutput {
        user_id: ctx.user.clone(),
    };
    emit_success(ctx.output, "user show", &output, Some(&human))
}
