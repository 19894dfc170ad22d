//! Pod commands

use anyhow::Result;

use super::execute;
use crate::api::SERVERS;
use crate::cli::{PodAction, PodCommand};
use crate::options::Options;
use crate::output::Output;

pub async fn run(cmd: PodCommand, dry_run: bool, out: &Output) -> Result<()> {
    match cmd.action {
        PodAction::Create(opts) => {
            let req = SERVERS.create(opts.params()?);
            execute("pod.create", vec![req], dry_run, out).await
        }
    }
}
