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
use form_engine::SampleSynthesizer;
use swag_env::Environment;

use crate::config::Config;

use super::command::{
    CommandDefinition, find_method, flag, get_required, load_api, manifest_arg, method_arg,
    response_arg,
};

/// Print a sample value for a method: the starting payload of its request form, or with
/// `--response` an illustrative response.
pub struct SampleCommandDefinition {}

#[async_trait]
impl CommandDefinition for SampleCommandDefinition {
    fn command(&self) -> Command {
        Command::new("sample")
            .about("Print a sample payload (or response) of a method")
            .arg(method_arg())
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
        let api = load_api(env.as_ref())?;
        let method = find_method(&api, &method_path)?;

        let sample = if flag(matches, "response") {
            SampleSynthesizer::illustrative(&api).synthesize(&method.out_type)
        } else {
            SampleSynthesizer::for_payload(&api, &method.path).synthesize(&method.in_type)
        };

        println!("{}", serde_json::to_string_pretty(&sample)?);
        Ok(())
    }
}
