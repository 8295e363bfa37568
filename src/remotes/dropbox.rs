// Copyright 2022 Paolo Galeone <nessuno@nerdz.eu>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::DropboxConfig;
use crate::remotes::remote::{self, Backend, Remote};

use async_trait::async_trait;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use serde_json::json;
use url::Url;

use log::debug;

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// The Dropbox content API. Connecting does not hit the network: the token is
/// validated by the first request that uses it.
#[derive(Clone)]
pub struct Dropbox {
    endpoint: Url,
}

impl Dropbox {
    pub fn new(config: &DropboxConfig) -> Dropbox {
        let mut endpoint = config.endpoint.clone();
        // Url::join replaces the last segment unless the base ends with '/'
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Dropbox { endpoint }
    }

    fn upload_url(&self) -> Result<Url, remote::Error> {
        self.endpoint
            .join("files/upload")
            .map_err(|error| remote::Error::InvalidPath(format!("{}: {}", self.endpoint, error)))
    }
}

#[async_trait]
impl Backend for Dropbox {
    async fn connect(&self, token: &str) -> Result<Box<dyn Remote>, remote::Error> {
        let client = Client::builder().build()?;
        Ok(Box::new(Session {
            client: Some(client),
            upload_url: self.upload_url()?,
            token: token.to_owned(),
        }))
    }

    fn name(&self) -> String {
        String::from("dropbox")
    }
}

pub struct Session {
    client: Option<Client>,
    upload_url: Url,
    token: String,
}

/// Dropbox paths are absolute from the root of the app folder.
fn dropbox_path(remote_path: &str) -> String {
    if remote_path.starts_with('/') {
        remote_path.to_owned()
    } else {
        format!("/{}", remote_path)
    }
}

/// HTTP headers must be ASCII: escape everything else as JSON \u sequences.
fn header_safe_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

fn upload_arg(remote_path: &str) -> String {
    let arg = json!({
        "path": dropbox_path(remote_path),
        "mode": "overwrite",
        "autorename": false,
        "mute": true,
    });
    header_safe_json(&arg.to_string())
}

#[async_trait]
impl Remote for Session {
    async fn put_object(&self, remote_path: &str, content: Vec<u8>) -> Result<(), remote::Error> {
        let client = match &self.client {
            Some(client) => client,
            None => {
                return Err(remote::Error::LocalError(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "session already closed",
                )))
            }
        };

        debug!("POST {} ({} bytes)", self.upload_url, content.len());
        let response = client
            .post(self.upload_url.clone())
            .bearer_auth(&self.token)
            .header(API_ARG_HEADER, upload_arg(remote_path))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(remote::Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), remote::Error> {
        // Dropping the client tears down its connection pool
        self.client.take();
        Ok(())
    }

    fn name(&self) -> String {
        String::from("dropbox")
    }
}
