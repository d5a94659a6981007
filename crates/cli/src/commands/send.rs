// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use common::env_const::{get_api_base_url, get_max_payload_mb, get_request_timeout_ms};
use form_engine::form::{FormController, FormError, ResponseStatus};
use rpc_client::HttpTransport;
use swag_env::Environment;

use crate::config::Config;

use super::command::{
    CommandDefinition, base_url_arg, flag, get, input_arg, load_api, manifest_arg,
    max_payload_arg, method_arg, open_history, read_input, timeout_arg,
};

/// Submit a request through the form: the payload is validated and recorded in the history
/// before it is sent, and the response is printed the way the response pane shows it.
pub struct SendCommandDefinition {}

#[async_trait]
impl CommandDefinition for SendCommandDefinition {
    fn command(&self) -> Command {
        Command::new("send")
            .about("Call a method with a JSON payload")
            .long_about(
                "Call a method with a JSON payload. Without a method, the method of the latest \
                 history entry is called. Without --input, the method's latest submission is sent \
                 again, or its sample payload if it has no history; with --history, an earlier \
                 submission is sent again.",
            )
            .arg(
                method_arg()
                    .help("The method path; defaults to the method of the latest submission")
                    .required(false),
            )
            .arg(input_arg())
            .arg(
                Arg::new("query")
                    .help("URL query arguments as a JSON object, such as '{\"dry\": \"1\"}'")
                    .short('q')
                    .long("query")
                    .required(false)
                    .num_args(1),
            )
            .arg(
                Arg::new("history")
                    .help("Resend the nth most recent submission of the method (0 is the latest)")
                    .long("history")
                    .required(false)
                    .value_parser(clap::value_parser!(usize))
                    .conflicts_with("input")
                    .num_args(1),
            )
            .arg(
                Arg::new("force")
                    .help("Send the payload even if it does not validate")
                    .long("force")
                    .action(ArgAction::SetTrue),
            )
            .arg(manifest_arg())
            .arg(base_url_arg())
            .arg(timeout_arg())
            .arg(max_payload_arg())
    }

    async fn execute(
        &self,
        matches: &ArgMatches,
        _config: &Config,
        env: Arc<dyn Environment>,
    ) -> Result<()> {
        let force = flag(matches, "force");

        let api = load_api(env.as_ref())?;
        let transport = HttpTransport::new(
            &get_api_base_url(env.as_ref()),
            get_request_timeout_ms(env.as_ref())?,
            get_max_payload_mb(env.as_ref())?,
        )?;
        let store = open_history(env.as_ref())?;

        let mut form = FormController::new(api, transport, store);
        if let Some(method_path) = get::<String>(matches, "method") {
            form.select_method(&method_path)?;
        }
        let method_path = form
            .selected_method()
            .map(|method| method.path.clone())
            .ok_or_else(|| anyhow!("No method given and no history to take one from"))?;

        if let Some(index) = get::<usize>(matches, "history") {
            form.select_history(index)?;
        }

        if let Some(input) = get::<PathBuf>(matches, "input") {
            match form.set_payload_text(&read_input(&input)?) {
                Err(FormError::InvalidPayload(error)) if force => {
                    eprintln!("{} {error}", "Sending anyway:".yellow());
                }
                other => other?,
            }
        }

        if let Some(query) = get::<String>(matches, "query") {
            form.set_query_args(&query);
        }

        let status = form.submit(force).await?;

        if let Some(response) = form.response_pane() {
            println!("{}", response.text());
        }

        let elapsed = form
            .last_duration()
            .map(|duration| format!(" in {} ms", duration.as_millis()))
            .unwrap_or_default();
        eprintln!(
            "{}{elapsed} (user: {})",
            format!("{status:?}").bold(),
            form.current_user()
        );

        match status {
            ResponseStatus::Failed => Err(anyhow!("Request to {method_path} failed")),
            _ => Ok(()),
        }
    }
}
