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
use clap::{ArgMatches, Command};
use form_engine::{StructuralValidator, validation::outcome_message};
use swag_env::Environment;

use crate::config::Config;

use super::command::{
    CommandDefinition, find_method, flag, get, get_required, input_arg, load_api, manifest_arg,
    method_arg, read_input, response_arg,
};

pub struct ValidateCommandDefinition {}

#[async_trait]
impl CommandDefinition for ValidateCommandDefinition {
    fn command(&self) -> Command {
        Command::new("validate")
            .about("Check JSON text against the payload (or response) type of a method")
            .arg(method_arg())
            .arg(input_arg())
            .arg(response_arg())
            .arg(manifest_arg())
    }

    async fn execute(
        &self,
        matches: &ArgMatches,
        _config: &Config,
        env: Arc<dyn Environment>,
    ) -> Result<()> {
        let method_path: String = get_required(matches, "method")?;
        let input: PathBuf = get(matches, "input").unwrap_or_else(|| PathBuf::from("-"));

        let api = load_api(env.as_ref())?;
        let method = find_method(&api, &method_path)?;
        let type_name = if flag(matches, "response") {
            &method.out_type
        } else {
            &method.in_type
        };

        let text = read_input(&input)?;
        let outcome = StructuralValidator::new(&api).validate_text(type_name, &text);
        let message = outcome_message(&outcome);

        if outcome.is_err() {
            return Err(anyhow!("{message}"));
        }
        println!("{message}");
        Ok(())
    }
}
