use std::{env, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use piper::{PageType, PipeItem, Piper};
use reqwest::Url;
use tracing_subscriber::EnvFilter;

/// Extract structured data from a document with a JSON schema.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the JSON schema.
    schema: PathBuf,
    /// An `http(s)://` or `file://` URL, or a path, to read the document from.
    source: String,
    /// How to read the document: html, json, text, xml or js.
    #[arg(long, default_value = "html")]
    page_type: PageType,
    /// Print the result on one line.
    #[arg(long)]
    compact: bool,
}

async fn fetch(client: &reqwest::Client, source: &str) -> anyhow::Result<Vec<u8>> {
    let path = match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let response = client
                .get(url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .with_context(|| format!("error fetching `{source}`"))?;

            let body = response
                .bytes()
                .await
                .with_context(|| format!("error reading body of `{source}`"))?;

            return Ok(body.to_vec());
        }
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|()| anyhow::anyhow!("`{source}` is not a valid file URL"))?,
        Ok(url) => anyhow::bail!("unsupported URL scheme `{}`", url.scheme()),
        Err(url::ParseError::RelativeUrlWithoutBase) => PathBuf::from(source),
        Err(e) => return Err(e).with_context(|| format!("invalid source `{source}`")),
    };

    tokio::fs::read(&path)
        .await
        .with_context(|| format!("error reading {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = reqwest::Client::builder()
        .user_agent(env::var("USER_AGENT").unwrap_or_else(|_| {
            format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        }))
        .build()
        .context("error building HTTP client")?;

    let schema_fut = async {
        let text = tokio::fs::read_to_string(&args.schema)
            .await
            .with_context(|| format!("error reading schema {}", args.schema.display()))?;
        PipeItem::from_json(&text).context("error loading schema")
    };

    let (schema, body) = tokio::try_join!(schema_fut, fetch(&client, &args.source))?;
    tracing::debug!(bytes = body.len(), page_type = %args.page_type, "fetched document");

    let value = Piper::new()
        .pipe_bytes(&body, args.page_type, &schema)
        .context("error evaluating schema")?;

    println!("{}", value.to_json_string(!args.compact)?);

    Ok(())
}
