// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt::Write, path::PathBuf, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use form_engine::tree::{JsonTreeSync, PaneKind, Tree, TreeNode, Widget};
use swag_env::Environment;

use crate::config::Config;

use super::command::{
    CommandDefinition, find_method, flag, get, get_required, input_arg, load_api, manifest_arg,
    method_arg, read_input, response_arg,
};

/// Print the tree of controls the request form shows for a payload (or response), starting
/// from the sample unless JSON text is given.
pub struct TreeCommandDefinition {}

#[async_trait]
impl CommandDefinition for TreeCommandDefinition {
    fn command(&self) -> Command {
        Command::new("tree")
            .about("Show the form tree of a method's payload (or response)")
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
        let api = load_api(env.as_ref())?;
        let method = find_method(&api, &method_path)?.clone();

        let (type_name, pane) = if flag(matches, "response") {
            (&method.out_type, PaneKind::Response)
        } else {
            (&method.in_type, PaneKind::Payload)
        };
        let mut sync = JsonTreeSync::with_sample(api, &method.path, type_name, pane);

        if let Some(input) = get::<PathBuf>(matches, "input") {
            sync.set_text(&read_input(&input)?)
                .map_err(|error| anyhow!("{error}"))?;
        }

        print!("{}", render(sync.tree()));
        Ok(())
    }
}

/// One line per node: presence mark, label, declared type and the control's value.
fn render(tree: &Tree) -> String {
    let mut out = String::new();
    if let Some(badge) = &tree.badge {
        let _ = writeln!(out, "{badge}");
    }
    render_nodes(&tree.nodes, 0, &mut out);
    out
}

fn render_nodes(nodes: &[TreeNode], depth: usize, out: &mut String) {
    for node in nodes {
        let mark = if node.present { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{}{mark} {} {}{}",
            "  ".repeat(depth),
            node.label,
            node.type_name,
            widget_detail(&node.widget)
        );

        if let Widget::Container { children, .. } = &node.widget {
            render_nodes(children, depth + 1, out);
        }
    }
}

fn widget_detail(widget: &Widget) -> String {
    match widget {
        Widget::DateTime { value } => format!(" = {value}"),
        Widget::Integer { value, .. } => format!(" = {value}"),
        Widget::Float { value, .. } => format!(" = {value}"),
        Widget::Text { value, .. } => format!(" = {value:?}"),
        Widget::Checkbox { checked } => format!(" = {checked}"),
        Widget::Select { selected, options } => {
            let members: Vec<&str> = options
                .iter()
                .filter(|option| !option.is_empty())
                .map(String::as_str)
                .collect();
            format!(" = {selected:?} of {}", members.join("|"))
        }
        Widget::Container { badge, .. } => badge
            .as_ref()
            .map(|badge| format!(" {badge}"))
            .unwrap_or_default(),
        Widget::Raw(text) => format!(" = {text}"),
        Widget::Absent => String::new(),
    }
}
