//! Host commands

use anyhow::Result;

use super::execute;
use crate::api::HOSTS;
use crate::cli::{HostAction, HostCommand};
use crate::options::{Options, Params};
use crate::output::Output;

pub async fn run(cmd: HostCommand, dry_run: bool, out: &Output) -> Result<()> {
    match cmd.action {
        HostAction::List(opts) => {
            let req = HOSTS.list(&opts.params()?);
            execute("host.list", vec![req], dry_run, out).await
        }
        HostAction::Show(opts) => {
            out.debug(&format!("showing host {}", opts.id));
            let req = HOSTS.get(&opts.id, &Params::new());
            execute("host.show", vec![req], dry_run, out).await
        }
    }
}
