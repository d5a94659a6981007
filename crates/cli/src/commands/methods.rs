// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use colored::Colorize;
use swag_env::Environment;

use crate::config::Config;

use super::command::{CommandDefinition, load_api, manifest_arg};

pub struct MethodsCommandDefinition {}

#[async_trait]
impl CommandDefinition for MethodsCommandDefinition {
    fn command(&self) -> Command {
        Command::new("methods")
            .about("List the methods of the API with their payload and response types")
            .arg(manifest_arg())
    }

    async fn execute(
        &self,
        _matches: &ArgMatches,
        _config: &Config,
        env: Arc<dyn Environment>,
    ) -> Result<()> {
        let api = load_api(env.as_ref())?;

        for method in &api.manifest().methods {
            println!(
                "{} {} -> {}",
                method.path.bold(),
                method.in_type.cyan(),
                method.out_type.cyan()
            );
        }

        Ok(())
    }
}
