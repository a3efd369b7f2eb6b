use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use serde_json::Value;

use super::{Command, CommandResult, Context};
use crate::gateway::{Gateway, Method, Payload, RequestDescriptor};
use crate::screens::format_value;

pub struct CallCommand;

#[async_trait]
impl Command for CallCommand {
    fn name(&self) -> &str {
        "/call"
    }

    fn usage(&self) -> &str {
        "<METHOD> <path> [json]"
    }

    fn description(&self) -> &str {
        "send a raw request through the gateway"
    }

    async fn execute(&self, ctx: &Context<'_>, args: &str) -> CommandResult {
        let request = match parse_args(args) {
            Ok(request) => request,
            Err(e) => {
                eprintln!("  ✗ {e:#}");
                eprintln!("  usage: /call {}", self.usage());
                return CommandResult::Handled;
            }
        };
        match call(ctx.gateway, request).await {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("  ✗ {e:#}"),
        }
        CommandResult::Handled
    }
}

/// Parse `METHOD path [json]`. The body is everything after the path.
fn parse_args(args: &str) -> Result<RequestDescriptor> {
    let mut parts = args.splitn(3, char::is_whitespace);
    let (Some(method), Some(path)) = (parts.next().filter(|m| !m.is_empty()), parts.next()) else {
        bail!("method and path are required");
    };
    let body = match parts.next().map(str::trim).filter(|b| !b.is_empty()) {
        Some(raw) => Some(serde_json::from_str(raw).context("body is not valid JSON")?),
        None => None,
    };
    describe(method, path, &[], body)
}

/// Build a descriptor from loose parts; shared with `flowdesk call`.
pub fn describe(
    method: &str,
    path: &str,
    query: &[(String, String)],
    body: Option<Value>,
) -> Result<RequestDescriptor> {
    let method: Method = method.parse()?;
    let mut request = RequestDescriptor::new(method, path);
    for (key, value) in query {
        request = request.query(key, value);
    }
    if let Some(body) = body {
        request = request.json(body);
    }
    Ok(request)
}

/// Split a `key=value` query argument.
pub fn parse_query_pair(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("query must look like key=value: {raw}"),
    }
}

/// Send and format the unwrapped payload for printing.
pub async fn call(gateway: &Gateway, request: RequestDescriptor) -> Result<String> {
    let payload = gateway.send(request).await?;
    Ok(match payload {
        Payload::Json(value) => format_value(&value),
        Payload::Blob(bytes) => format!("  ({} bytes)", bytes.len()),
    })
}
