//! HTTP transport
//!
//! The runner only sees the [`Transport`] trait. [`ReqwestTransport`] is the
//! real implementation; one instance is one session, sharing a cookie jar
//! across the steps of a scenario.

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, ClientBuilder, Identity, Method, Proxy};
use std::path::Path;
use std::sync::Arc;

use super::{HttpRequest, HttpResponse};
use crate::common::{Error, Result};
use crate::scenario::{CertSpec, TlsVerify};

/// Sends one request and returns the response
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// reqwest-backed session
pub struct ReqwestTransport {
    client: Client,
    cookies: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let cookies = Arc::new(Jar::default());
        let client = base_builder(&cookies).build()?;
        Ok(Self { client, cookies })
    }

    /// The session client, or a one-off client for TLS/proxy/redirect overrides
    fn client_for(&self, request: &HttpRequest) -> Result<Client> {
        if !request.needs_dedicated_client() {
            return Ok(self.client.clone());
        }

        let mut builder = base_builder(&self.cookies);

        if !request.allow_redirects {
            builder = builder.redirect(Policy::none());
        }

        match &request.verify {
            Some(TlsVerify::Enabled(false)) => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            Some(TlsVerify::CaBundle(path)) => {
                let pem = read_pem(Path::new(path))?;
                builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
            }
            _ => {}
        }

        if let Some(cert) = &request.cert {
            let pem = match cert {
                CertSpec::Combined(path) => read_pem(Path::new(path))?,
                CertSpec::Pair(cert, key) => {
                    let mut pem = read_pem(Path::new(cert))?;
                    pem.push(b'\n');
                    pem.extend(read_pem(Path::new(key))?);
                    pem
                }
            };
            builder = builder.use_rustls_tls().identity(Identity::from_pem(&pem)?);
        }

        for (scheme, url) in &request.proxies {
            let proxy = match scheme.to_ascii_lowercase().as_str() {
                "http" => Proxy::http(url)?,
                "https" => Proxy::https(url)?,
                _ => Proxy::all(url)?,
            };
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }
}

fn base_builder(cookies: &Arc<Jar>) -> ClientBuilder {
    Client::builder().cookie_provider(Arc::clone(cookies))
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::file_read(path, e))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse> {
        let client = self.client_for(request)?;
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            Error::Config(format!("Invalid HTTP method '{}'", request.method))
        })?;

        let mut builder = client
            .request(method, &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(auth) = &request.auth {
            builder = builder.basic_auth(&auth.user, Some(&auth.password));
        }

        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let timeout_secs = request.timeout.as_secs().max(1);
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Timeout(timeout_secs)
            } else {
                Error::from(e)
            }
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = response.text().await.map_err(map_err)?;

        tracing::debug!(status, bytes = text.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            text,
        })
    }
}
