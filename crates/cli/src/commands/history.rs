// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use form_engine::history::HistoryStore;
use swag_env::Environment;

use crate::config::Config;

use super::command::{
    CommandDefinition, find_method, flag, get, load_api, manifest_arg, open_history,
};

const DEFAULT_SUMMARY_LEN: usize = 120;

pub struct HistoryCommandDefinition {}

#[async_trait]
impl CommandDefinition for HistoryCommandDefinition {
    fn command(&self) -> Command {
        Command::new("history")
            .about("Show earlier submissions and remembered field values")
            .arg(
                Arg::new("method")
                    .help("Only show submissions of this method")
                    .required(false)
                    .index(1),
            )
            .arg(
                Arg::new("entry")
                    .help("Print the payload and query arguments of the nth most recent submission")
                    .long("entry")
                    .required(false)
                    .value_parser(clap::value_parser!(usize))
                    .requires("method")
                    .num_args(1),
            )
            .arg(
                Arg::new("latest")
                    .help("Show the most recent submission of any method")
                    .long("latest")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("autocomplete")
                    .help("List the strings remembered for fields with this name")
                    .long("autocomplete")
                    .required(false)
                    .num_args(1),
            )
            .arg(
                Arg::new("width")
                    .help("Cut summaries after this many characters (0 for no limit)")
                    .long("width")
                    .required(false)
                    .value_parser(clap::value_parser!(usize))
                    .default_value("120")
                    .num_args(1),
            )
            .arg(manifest_arg())
    }

    async fn execute(
        &self,
        matches: &ArgMatches,
        _config: &Config,
        env: Arc<dyn Environment>,
    ) -> Result<()> {
        let api = load_api(env.as_ref())?;
        let mut history = HistoryStore::new(open_history(env.as_ref())?);
        history.cleanup(&api)?;

        let width: usize = get(matches, "width").unwrap_or(DEFAULT_SUMMARY_LEN);

        if let Some(field_name) = get::<String>(matches, "autocomplete") {
            for value in history.autocomplete(&field_name)? {
                println!("{value}");
            }
            return Ok(());
        }

        if flag(matches, "latest") {
            if let Some(latest) = history.history_latest()? {
                println!(
                    "{} {}",
                    latest.method_path.bold(),
                    latest.entry.summary(width)
                );
            }
            return Ok(());
        }

        match get::<String>(matches, "method") {
            Some(method_path) => {
                find_method(&api, &method_path)?;
                let entries = history.history_of(&method_path)?;

                if let Some(index) = get::<usize>(matches, "entry") {
                    let entry = entries
                        .get(index)
                        .ok_or_else(|| anyhow!("No history entry #{index} for {method_path}"))?;
                    println!("{}", serde_json::to_string_pretty(&entry.payload)?);
                    if let Some(query_string) = &entry.query_string {
                        println!("?{query_string}");
                    }
                    return Ok(());
                }

                for (index, entry) in entries.iter().enumerate() {
                    println!("{index:>3} {}", entry.summary(width));
                }
            }
            None => {
                for method in &api.manifest().methods {
                    let entries = history.history_of(&method.path)?;
                    if entries.is_empty() {
                        continue;
                    }
                    println!("{} ({})", method.path.bold(), entries.len());
                    for (index, entry) in entries.iter().enumerate() {
                        println!("{index:>3} {}", entry.summary(width));
                    }
                }
            }
        }

        Ok(())
    }
}
