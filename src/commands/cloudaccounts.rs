//! Cloud account commands

use anyhow::Result;

use super::execute;
use crate::api::CLOUDACCOUNTS;
use crate::cli::{CloudAccountAction, CloudAccountCommand};
use crate::options::Options;
use crate::output::Output;

pub async fn run(cmd: CloudAccountCommand, dry_run: bool, out: &Output) -> Result<()> {
    let (op, req) = match cmd.action {
        CloudAccountAction::List(opts) => ("cloud-account.list", CLOUDACCOUNTS.list(&opts.params()?)),
        CloudAccountAction::CreateJdcloud(opts) => {
            out.log("info", &format!("Registering JD Cloud account {}", opts.base.name));
            ("cloud-account.create-jdcloud", CLOUDACCOUNTS.create(opts.params()?))
        }
        CloudAccountAction::CreateAliyun(opts) => {
            out.log("info", &format!("Registering Aliyun account {}", opts.base.name));
            ("cloud-account.create-aliyun", CLOUDACCOUNTS.create(opts.params()?))
        }
    };
    execute(op, vec![req], dry_run, out).await
}
