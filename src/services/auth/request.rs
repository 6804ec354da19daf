//! Transport-side view of an inbound request, as seen by the auth pipeline.
//!
//! The pipeline only needs three things from the transport:
//! - header access
//! - pause/resume of the request body stream
//! - a request-scoped attribute bag
//!
//! `HttpExchange` is the axum adapter; tests use their own in-memory fakes.

use std::collections::HashMap;

use axum::{body::Body, http::Request};

pub const REMOTE_USER: &str = "remote_user";
pub const AUTHORIZATION_TYPE: &str = "authorization_type";
pub const CLIENT_ID: &str = "client_id";

pub trait AuthRequest: Send {
    fn header(&self, name: &str) -> Option<&str>;

    /// Stop delivering body data downstream until `resume` is called.
    fn pause(&mut self);

    fn resume(&mut self);

    fn attribute(&self, key: &str) -> Option<&str>;

    fn set_attribute(&mut self, key: &str, value: String);
}

/// Request-scoped key/value bag.
///
/// Lives in request extensions so that handlers downstream of the auth
/// middleware can read what the pipeline (and the Basic stage) wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestAttributes {
    values: HashMap<String, String>,
}

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// axum adapter implementing `AuthRequest` over an owned `Request<Body>`.
///
/// Pausing parks the body outside the request, so nothing can poll it while
/// verification is in flight. `into_request` always hands back the body.
pub struct HttpExchange {
    req: Request<Body>,
    parked: Option<Body>,
}

impl HttpExchange {
    pub fn new(mut req: Request<Body>) -> Self {
        if req.extensions().get::<RequestAttributes>().is_none() {
            req.extensions_mut().insert(RequestAttributes::new());
        }
        Self { req, parked: None }
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.parked.is_some()
    }

    pub fn attributes(&self) -> Option<&RequestAttributes> {
        self.req.extensions().get::<RequestAttributes>()
    }

    pub fn into_request(mut self) -> Request<Body> {
        if let Some(body) = self.parked.take() {
            tracing::warn!("request released while paused; restoring body");
            *self.req.body_mut() = body;
        }
        self.req
    }
}

impl AuthRequest for HttpExchange {
    fn header(&self, name: &str) -> Option<&str> {
        self.req.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn pause(&mut self) {
        if self.parked.is_none() {
            self.parked = Some(std::mem::take(self.req.body_mut()));
        }
    }

    fn resume(&mut self) {
        if let Some(body) = self.parked.take() {
            *self.req.body_mut() = body;
        }
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes().and_then(|attrs| attrs.get(key))
    }

    fn set_attribute(&mut self, key: &str, value: String) {
        let extensions = self.req.extensions_mut();
        match extensions.get_mut::<RequestAttributes>() {
            Some(attrs) => attrs.set(key, value),
            None => {
                let mut attrs = RequestAttributes::new();
                attrs.set(key, value);
                extensions.insert(attrs);
            }
        }
    }
}

/// Keeps a request paused for as long as it lives.
///
/// `resume` consumes the guard; dropping it (e.g. when the validating future
/// is cancelled) resumes as well, so resume runs exactly once per pause.
pub struct PausedRequest<'a> {
    request: Option<&'a mut dyn AuthRequest>,
}

impl<'a> PausedRequest<'a> {
    pub fn pause(request: &'a mut dyn AuthRequest) -> Self {
        request.pause();
        Self {
            request: Some(request),
        }
    }

    pub fn resume(mut self) -> &'a mut dyn AuthRequest {
        let request = self
            .request
            .take()
            .unwrap_or_else(|| unreachable!("guard resumed twice"));
        request.resume();
        request
    }
}

impl Drop for PausedRequest<'_> {
    fn drop(&mut self) {
        if let Some(request) = self.request.take() {
            request.resume();
        }
    }
}
