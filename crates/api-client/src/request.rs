use faststr::FastStr;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::Result;

const MERGE_PATCH: &str = "application/merge-patch+json";

/// One call against the API, relative to the client's root.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method:  Method,
    pub path:    FastStr,
    pub query:   Vec<(FastStr, FastStr)>,
    pub headers: HashMap<FastStr, FastStr>,
    pub body:    Option<Value>,
}

impl ApiRequest {
    pub fn new<T>(method: Method, path: T) -> Self
    where
        T: Into<FastStr>,
    {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Default::default(),
            body: None,
        }
    }

    pub fn get<T: Into<FastStr>>(path: T) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete<T: Into<FastStr>>(path: T) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post<T: Into<FastStr>, B: Serialize>(path: T, body: &B) -> Result<Self> {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put<T: Into<FastStr>, B: Serialize>(path: T, body: &B) -> Result<Self> {
        Self::new(Method::PUT, path).json(body)
    }

    /// A JSON merge patch.
    pub fn patch<T: Into<FastStr>, B: Serialize>(path: T, body: &B) -> Result<Self> {
        Ok(Self::new(Method::PATCH, path)
            .json(body)?
            .header("content-type", MERGE_PATCH))
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<FastStr>,
        V: Into<FastStr>,
    {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<FastStr>,
        V: Into<FastStr>,
    {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_auth<T>(&mut self, auth: T)
    where
        T: Into<FastStr>,
    {
        self.headers.insert(
            "authorization".into(),
            format!("Bearer {}", auth.into()).into(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_is_merge_patch() {
        let req = ApiRequest::patch("projects/p/clusters/c", &json!({"spec": {"version": "1.30"}}))
            .unwrap();
        assert_eq!(req.method, Method::PATCH);
        assert_eq!(req.headers.get("content-type").map(|v| v.as_str()), Some(MERGE_PATCH));
        assert_eq!(req.body, Some(json!({"spec": {"version": "1.30"}})));
    }

    #[test]
    fn test_bearer_auth() {
        let mut req = ApiRequest::get("projects").query("displayAll", "true");
        req.bearer_auth("token");
        assert_eq!(
            req.headers.get("authorization").map(|v| v.as_str()),
            Some("Bearer token")
        );
        assert_eq!(req.query.len(), 1);
        assert!(req.body.is_none());
    }
}
