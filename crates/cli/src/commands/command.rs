// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow};
use api_reflection::{ApiReflection, ReflMethod, ReflectionManifest};
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use common::env_const::{
    SWAG_API_BASE_URL, SWAG_MANIFEST, SWAG_MAX_PAYLOAD_MB, SWAG_REQUEST_TIMEOUT_MS,
    get_history_capacity, get_history_file, get_manifest_path,
};
use form_engine::history::FileStore;
use swag_env::{CompositeEnvironment, Environment, MapEnvironment};

use crate::config::Config;

#[async_trait]
pub trait CommandDefinition: Send + Sync {
    fn command(&self) -> Command;

    async fn execute(
        &self,
        matches: &ArgMatches,
        config: &Config,
        env: Arc<dyn Environment>,
    ) -> Result<()>;
}

pub struct SubcommandDefinition {
    pub name: &'static str,
    pub about: &'static str,
    pub command_definitions: Vec<Box<dyn CommandDefinition>>,
}

impl SubcommandDefinition {
    pub fn new(
        name: &'static str,
        about: &'static str,
        command_definitions: Vec<Box<dyn CommandDefinition>>,
    ) -> Self {
        Self {
            name,
            about,
            command_definitions,
        }
    }
}

#[async_trait]
impl CommandDefinition for SubcommandDefinition {
    fn command(&self) -> Command {
        Command::new(self.name)
            .about(self.about)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .disable_help_subcommand(true)
            .subcommands(
                self.command_definitions
                    .iter()
                    .map(|command_definition| command_definition.command()),
            )
    }

    async fn execute(
        &self,
        matches: &ArgMatches,
        config: &Config,
        env: Arc<dyn Environment>,
    ) -> Result<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| anyhow!("No subcommand given"))?;

        for command_definition in &self.command_definitions {
            if command_definition.command().get_name() == name {
                return command_definition
                    .execute(sub_matches, config, flag_environment(sub_matches, env))
                    .await;
            }
        }

        Err(anyhow!("Unknown subcommand: {name}"))
    }
}

pub fn get_required<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    arg_id: &str,
) -> Result<T> {
    get(matches, arg_id).ok_or_else(|| anyhow!("Required argument `{arg_id}` is not present"))
}

pub fn get<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, arg_id: &str) -> Option<T> {
    matches.try_get_one::<T>(arg_id).ok().flatten().cloned()
}

pub fn flag(matches: &ArgMatches, arg_id: &str) -> bool {
    matches.try_get_one::<bool>(arg_id).ok().flatten() == Some(&true)
}

/// Put the configuration flags given on the command line in front of `env`.
fn flag_environment(matches: &ArgMatches, env: Arc<dyn Environment>) -> Arc<dyn Environment> {
    let mut flags = MapEnvironment::new();
    flags.set_opt(
        SWAG_MANIFEST,
        get::<PathBuf>(matches, "manifest").map(|path| path.display().to_string()),
    );
    flags.set_opt(SWAG_API_BASE_URL, get::<String>(matches, "base-url"));
    flags.set_opt(SWAG_REQUEST_TIMEOUT_MS, get::<u64>(matches, "timeout"));
    flags.set_opt(SWAG_MAX_PAYLOAD_MB, get::<u64>(matches, "max-payload-mb"));

    if flags.is_empty() {
        env
    } else {
        Arc::new(CompositeEnvironment::new(vec![Arc::new(flags), env]))
    }
}

pub fn manifest_arg() -> Arg {
    Arg::new("manifest")
        .help("The reflection manifest to read")
        .long_help(
            "The reflection manifest to read. If not specified, the program reads it from the \
             environment (`SWAG_MANIFEST`), then `swag.toml`, then `yo-refl.json`.",
        )
        .short('m')
        .long("manifest")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .num_args(1)
}

pub fn method_arg() -> Arg {
    Arg::new("method")
        .help("The method path, such as `users/create`")
        .required(true)
        .index(1)
}

pub fn input_arg() -> Arg {
    Arg::new("input")
        .help("File holding the JSON text (`-` for stdin)")
        .short('i')
        .long("input")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .num_args(1)
}

pub fn response_arg() -> Arg {
    Arg::new("response")
        .help("Use the method's response type instead of its payload type")
        .long("response")
        .action(ArgAction::SetTrue)
}

pub fn base_url_arg() -> Arg {
    Arg::new("base-url")
        .help("API base URL")
        .long_help("The URL method paths are appended to (`SWAG_API_BASE_URL`).")
        .long("base-url")
        .required(false)
        .num_args(1)
}

pub fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .help("Request timeout in milliseconds")
        .long("timeout")
        .required(false)
        .value_parser(clap::value_parser!(u64))
        .num_args(1)
}

pub fn max_payload_arg() -> Arg {
    Arg::new("max-payload-mb")
        .help("Largest JSON payload to send, in MiB (0 for no limit)")
        .long("max-payload-mb")
        .required(false)
        .value_parser(clap::value_parser!(u64))
        .num_args(1)
}

pub fn load_api(env: &dyn Environment) -> Result<Arc<ApiReflection>> {
    let manifest_path = get_manifest_path(env);
    let manifest = ReflectionManifest::load(&manifest_path)
        .with_context(|| format!("Failed to load manifest '{}'", manifest_path.display()))?;

    tracing::debug!(
        manifest = %manifest_path.display(),
        methods = manifest.methods.len(),
        "Loaded manifest"
    );

    Ok(Arc::new(ApiReflection::new(manifest)))
}

pub fn find_method<'a>(api: &'a ApiReflection, method_path: &str) -> Result<&'a ReflMethod> {
    api.manifest()
        .method(method_path)
        .ok_or_else(|| anyhow!("No method '{method_path}' in the manifest"))
}

pub fn open_history(env: &dyn Environment) -> Result<FileStore> {
    let history_file = get_history_file(env);
    let capacity = get_history_capacity(env)?;

    FileStore::open(&history_file, capacity)
        .with_context(|| format!("Failed to open history '{}'", history_file.display()))
}

/// Read the text named by `input`: a file, or stdin for `-`.
pub fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read file '{}'", input.display()))
    }
}
