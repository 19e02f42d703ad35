use anyhow::{Context, Result};
use clap::Args;
use unifetch::{DecodedBody, HttpClient, Method, RequestBody, RequestConfig};

/// Request without a payload
#[derive(Args, Debug)]
pub struct RequestSubCommand {
    /// Path joined to the base url, or an absolute url
    path: String,
}

/// Request with an optional payload
#[derive(Args, Debug)]
pub struct BodyRequestSubCommand {
    /// Path joined to the base url, or an absolute url
    path: String,
    /// Raw text body
    #[arg(short, long, conflicts_with = "json")]
    data: Option<String>,
    /// JSON body
    #[arg(short, long)]
    json: Option<String>,
}

impl BodyRequestSubCommand {
    fn body(&self) -> Result<Option<RequestBody>> {
        if let Some(json) = &self.json {
            let value: serde_json::Value =
                serde_json::from_str(json).context("Invalid JSON body")?;
            return Ok(Some(RequestBody::Json(value)));
        }

        Ok(self.data.clone().map(RequestBody::Text))
    }
}

pub async fn get(client: &HttpClient, sub_command_args: &RequestSubCommand) -> Result<DecodedBody> {
    Ok(client
        .get(&sub_command_args.path, RequestConfig::new())
        .await?)
}

pub async fn delete(
    client: &HttpClient,
    sub_command_args: &RequestSubCommand,
) -> Result<DecodedBody> {
    Ok(client
        .delete(&sub_command_args.path, RequestConfig::new())
        .await?)
}

pub async fn post(
    client: &HttpClient,
    sub_command_args: &BodyRequestSubCommand,
) -> Result<DecodedBody> {
    let body = match sub_command_args.body()? {
        Some(body) => {
            client
                .post(&sub_command_args.path, body, RequestConfig::new())
                .await?
        }
        None => {
            client
                .request(
                    &sub_command_args.path,
                    RequestConfig::new().method(Method::Post),
                )
                .await?
        }
    };

    Ok(body)
}

pub async fn put(
    client: &HttpClient,
    sub_command_args: &BodyRequestSubCommand,
) -> Result<DecodedBody> {
    let body = match sub_command_args.body()? {
        Some(body) => {
            client
                .put(&sub_command_args.path, body, RequestConfig::new())
                .await?
        }
        None => {
            client
                .request(
                    &sub_command_args.path,
                    RequestConfig::new().method(Method::Put),
                )
                .await?
        }
    };

    Ok(body)
}
