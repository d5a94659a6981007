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
use common::logging_tracing;
use swag_env::{CompositeEnvironment, Environment, SystemEnvironment};

use commands::{
    command::{CommandDefinition, SubcommandDefinition},
    history::HistoryCommandDefinition,
    methods::MethodsCommandDefinition,
    sample::SampleCommandDefinition,
    send::SendCommandDefinition,
    tree::TreeCommandDefinition,
    validate::ValidateCommandDefinition,
};

mod commands;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    logging_tracing::init()?;

    let subcommand_definition = SubcommandDefinition::new(
        "swag",
        "Type-driven request forms for a reflected RPC API",
        vec![
            Box::new(MethodsCommandDefinition {}),
            Box::new(SampleCommandDefinition {}),
            Box::new(ValidateCommandDefinition {}),
            Box::new(TreeCommandDefinition {}),
            Box::new(SendCommandDefinition {}),
            Box::new(HistoryCommandDefinition {}),
        ],
    );

    let command = subcommand_definition
        .command()
        .version(env!("CARGO_PKG_VERSION"));

    let matches = command.get_matches();

    let config = config::load_config()?;

    // Command-line flags are layered on top of this by each subcommand.
    let env: Arc<dyn Environment> = Arc::new(CompositeEnvironment::new(vec![
        Arc::new(SystemEnvironment),
        Arc::new(config.environment()),
    ]));

    subcommand_definition.execute(&matches, &config, env).await
}
