use http::{HeaderMap, HeaderName, HeaderValue, Method};
use micro_record::ValueMap;
use mime::Mime;
use std::net::SocketAddr;

/// An inbound request as the dispatch layer consumes it: method, URI path,
/// headers, and each parameter source (URL query, form body, cookies)
/// wrapped in a [`ValueMap`].
///
/// The host web-serving framework performs URI decoding and body parsing;
/// this type only carries the already-parsed collections for the lifetime of
/// one dispatch.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    raw_uri: String,
    protocol_name: String,
    protocol_version: String,
    secure: bool,
    remote_addr: Option<SocketAddr>,
    headers: HeaderMap,
    query: ValueMap,
    form: ValueMap,
    cookies: ValueMap,
    body: Option<Vec<u8>>,
    content_type: Option<Mime>,
}

impl Request {
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        let path = path.into();

        RequestBuilder {
            request: Request {
                method,
                raw_uri: path.clone(),
                path,
                protocol_name: "HTTP".to_owned(),
                protocol_version: "1.1".to_owned(),
                secure: false,
                remote_addr: None,
                headers: HeaderMap::new(),
                query: ValueMap::empty(),
                form: ValueMap::empty(),
                cookies: ValueMap::empty(),
                body: None,
                content_type: None,
            },
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_uri(&self) -> &str {
        &self.raw_uri
    }

    pub fn protocol_name(&self) -> &str {
        &self.protocol_name
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn query(&self) -> &ValueMap {
        &self.query
    }

    pub fn form(&self) -> &ValueMap {
        &self.form
    }

    pub fn cookies(&self) -> &ValueMap {
        &self.cookies
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }
}

/// Assembles a [`Request`] from already-parsed inputs.
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn raw_uri(mut self, raw_uri: impl Into<String>) -> Self {
        self.request.raw_uri = raw_uri.into();
        self
    }

    pub fn protocol(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.request.protocol_name = name.into();
        self.request.protocol_version = version.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.request.secure = secure;
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.request.remote_addr = Some(addr);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.request.headers = headers;
        self
    }

    pub fn query(mut self, query: ValueMap) -> Self {
        self.request.query = query;
        self
    }

    pub fn form(mut self, form: ValueMap) -> Self {
        self.request.form = form;
        self
    }

    pub fn cookies(mut self, cookies: ValueMap) -> Self {
        self.request.cookies = cookies;
        self
    }

    pub fn body(mut self, content_type: Mime, body: Vec<u8>) -> Self {
        self.request.content_type = Some(content_type);
        self.request.body = Some(body);
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}
