//! Request command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use reauth_core::{Method, Request};

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS)
    pub method: Method,

    /// Path relative to the API URL
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Extra header as NAME:VALUE (repeatable)
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,
}

pub async fn run(args: RequestArgs, global: &GlobalArgs) -> Result<()> {
    let api_url = session::api_url(global)?;
    let url = api_url.endpoint(&args.path).context("Invalid request path")?;

    let mut request = Request::new(args.method, url);
    for header in &args.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("Invalid header '{}', expected NAME:VALUE", header);
        };
        request = request.with_header(name.trim(), value.trim());
    }
    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_json(&body)?;
    }

    let store = session::open_store(global)?;
    let client = session::auth_client(global, store)?;

    let response = client.send(request).await.context("Request failed")?;

    eprintln!("{}", format!("HTTP {}", response.status()).dimmed());
    match response.json::<serde_json::Value>() {
        Ok(value) => output::json_pretty(&value)?,
        Err(_) => print!("{}", response.text()),
    }

    Ok(())
}
