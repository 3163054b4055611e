use std::fmt;
use std::io::Read;

use crate::error::Result;

const USER_AGENT: &'static str = concat!("spreedly-rust/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry an XML body.
    pub fn has_body(&self) -> bool {
        match *self {
            Method::Post | Method::Put => true,
            Method::Get | Method::Delete => false,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.0.eq_ignore_ascii_case(name))
            .map(|header| header.1.as_str())
    }
}

/// Status and body of an HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends one request and waits for the whole response.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response>;
}

impl<'a, T: Transport + ?Sized> Transport for &'a T {
    fn send(&self, request: &Request) -> Result<Response> {
        (**self).send(request)
    }
}

/// Blocking HTTPS transport. Every call opens its own connection and
/// redirects are returned as-is rather than followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpsTransport;

impl HttpsTransport {
    pub fn new() -> HttpsTransport {
        HttpsTransport
    }
}

impl Transport for HttpsTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .user_agent(USER_AGENT)
            .build();

        let mut http_request = agent.request(request.method.as_str(), &request.url);
        for &(ref name, ref value) in request.headers.iter() {
            http_request = http_request.set(name, value);
        }

        let result = if request.method.has_body() {
            http_request.send_bytes(&request.body)
        } else {
            http_request.call()
        };

        // Error statuses still carry a body the caller wants to see
        let http_response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => return Err(err.into()),
        };

        let status = http_response.status();
        let mut body = Vec::new();
        http_response.into_reader().read_to_end(&mut body)?;

        Ok(Response {
            status: status,
            body: body,
        })
    }
}
