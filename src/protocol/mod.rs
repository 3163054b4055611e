//! Authenticated XML exchange with the Spreedly API.
//!
//! `Protocol` owns the credentials and the per-site base URL. It sends
//! requests through a `Transport`, turns error statuses into `Error::Api` and
//! decodes successful bodies into `Value`s.

pub mod encoding;
pub mod transport;
pub mod value;

use rustc_serialize::base64::{ToBase64, STANDARD};
use time::UtcOffset;

use crate::config::Config;
use crate::error::{Error, Result};
use self::encoding::{decode, Document, Element};
use self::transport::{HttpsTransport, Method, Request, Transport};
use self::value::Value;

pub const API_VERSION: &'static str = "v4";

pub struct Protocol<T = HttpsTransport> {
    auth: String,
    base_path: String,
    base_url: String,
    utc_offset: UtcOffset,
    transport: T,
}

impl Protocol<HttpsTransport> {
    pub fn new(config: &Config) -> Protocol<HttpsTransport> {
        Protocol::with_transport(config, HttpsTransport::new())
    }
}

impl<T: Transport> Protocol<T> {
    pub fn with_transport(config: &Config, transport: T) -> Protocol<T> {
        let auth = format!("{}:x", config.token).as_bytes().to_base64(STANDARD);
        let base_path = format!("/api/{}/{}", API_VERSION, config.site_name);
        let base_url = format!("https://{}{}", config.host, base_path);

        Protocol {
            auth: auth,
            base_path: base_path,
            base_url: base_url,
            utc_offset: config.utc_offset,
            transport: transport,
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends one request relative to the site's base URL and returns the raw
    /// body. Any status above 299 fails with `Error::Api`.
    pub fn query(&self, url: &str, body: Option<&[u8]>, method: Method) -> Result<Vec<u8>> {
        let mut headers = vec![("Authorization".to_string(), format!("Basic {}", self.auth))];
        if method.has_body() {
            headers.push(("Content-Type".to_string(), "application/xml".to_string()));
        }

        let request = Request {
            method: method,
            url: format!("{}/{}", self.base_url, url),
            headers: headers,
            body: body.map(|b| b.to_vec()).unwrap_or_default(),
        };

        debug!("{} {}", request.method, request.url);
        trace!("Request body: {}", String::from_utf8_lossy(&request.body));

        let response = self.transport.send(&request)?;

        trace!("Response {} body: {}", response.status, String::from_utf8_lossy(&response.body));

        if response.status > 299 {
            return Err(Error::Api {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        Ok(response.body)
    }

    pub fn get(&self, url: &str) -> Result<Value> {
        let body = self.query(url, None, Method::Get)?;
        self.parse(&body)
    }

    pub fn post(&self, url: &str, data: &[u8]) -> Result<Value> {
        let body = self.query(url, Some(data), Method::Post)?;
        self.parse(&body)
    }

    pub fn put(&self, url: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.query(url, Some(data), Method::Put)
    }

    pub fn delete(&self, url: &str) -> Result<Vec<u8>> {
        self.query(url, None, Method::Delete)
    }

    /// Decodes a response body, shifting datetimes to the configured offset.
    pub fn parse(&self, body: &[u8]) -> Result<Value> {
        let root = Element::parse(body)?;
        decode(&root, self.utc_offset)
    }

    pub fn create_document(&self, document: &Document) -> Result<Vec<u8>> {
        document.to_xml()
    }
}
