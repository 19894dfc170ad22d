//! Virtual server commands

use anyhow::Result;

use super::execute;
use crate::api::{Request, SERVERS};
use crate::cli::{ServerAction, ServerCommand};
use crate::options::Options;
use crate::output::Output;

pub async fn run(cmd: ServerCommand, dry_run: bool, out: &Output) -> Result<()> {
    let (op, requests) = requests(cmd.action)?;
    if !dry_run {
        out.log("info", &format!("{}: {} request(s)", op, requests.len()));
    }
    execute(op, requests, dry_run, out).await
}

/// Map a server action onto region service requests, one per target server
fn requests(action: ServerAction) -> Result<(&'static str, Vec<Request>)> {
    let built = match action {
        ServerAction::List(opts) => ("server.list", vec![SERVERS.list(&opts.params()?)]),
        ServerAction::Show(opts) => {
            let params = opts.params()?;
            ("server.show", vec![SERVERS.get(&opts.server.id, &params)])
        }
        ServerAction::Create(opts) => ("server.create", vec![SERVERS.create(opts.params()?)]),
        ServerAction::Update(opts) => {
            let params = opts.params()?;
            let reqs = opts
                .servers
                .ids
                .iter()
                .map(|id| SERVERS.update(id, params.clone()))
                .collect();
            ("server.update", reqs)
        }
        ServerAction::Start(opts) => {
            let params = opts.params()?;
            let reqs = opts
                .servers
                .ids
                .iter()
                .map(|id| SERVERS.perform_action(id, "start", params.clone()))
                .collect();
            ("server.start", reqs)
        }
        ServerAction::Stop(opts) => {
            let params = opts.params()?;
            let reqs = opts
                .servers
                .ids
                .iter()
                .map(|id| SERVERS.perform_action(id, "stop", params.clone()))
                .collect();
            ("server.stop", reqs)
        }
        ServerAction::Delete(opts) => {
            let params = opts.params()?;
            let reqs = opts
                .servers
                .ids
                .iter()
                .map(|id| SERVERS.delete(id, &params))
                .collect();
            ("server.delete", reqs)
        }
        ServerAction::Deploy(opts) => {
            let params = opts.params()?;
            (
                "server.deploy",
                vec![SERVERS.perform_action(&opts.server.id, "deploy", params)],
            )
        }
        ServerAction::Metadata(opts) => {
            let params = opts.params()?;
            (
                "server.metadata",
                vec![SERVERS.perform_action(&opts.server.id, "user-metadata", params)],
            )
        }
        ServerAction::BatchMetadata(opts) => (
            "server.batch-metadata",
            vec![SERVERS.perform_class_action("batch-user-metadata", opts.params()?)],
        ),
    };
    Ok(built)
}
