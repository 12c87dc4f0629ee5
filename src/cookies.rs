//! Request cookie parsing and `Set-Cookie` rendering.
//!
//! A [`CookieStore`] is created per request. Session providers read the
//! incoming cookies through it and record the cookies they want set on the
//! response; the caller later drains those mutations onto whichever response
//! it decides to send.

use axum::http::{header, HeaderMap, HeaderValue};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCookie {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A single cookie mutation destined for a `Set-Cookie` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl SetCookie {
    /// Session cookie defaults: `Path=/`, HttpOnly, `SameSite=Lax`
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
        }
    }

    /// A mutation that deletes the cookie on the client
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(0)
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn is_removal(&self) -> bool {
        self.max_age == Some(0)
    }

    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out.push_str("; SameSite=");
        out.push_str(self.same_site.as_str());
        out
    }
}

/// Parse every `Cookie` header into name/value pairs, in order of appearance
pub fn parse_cookie_headers(headers: &HeaderMap) -> Vec<RequestCookie> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(RequestCookie {
                name: name.to_string(),
                value: value.trim().trim_matches('"').to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct CookieState {
    request: Vec<RequestCookie>,
    pending: Vec<SetCookie>,
}

/// Per-request cookie jar shared between the caller and a session client
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    inner: Arc<Mutex<CookieState>>,
}

impl CookieStore {
    pub fn new(request: Vec<RequestCookie>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CookieState {
                request,
                pending: Vec::new(),
            })),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(parse_cookie_headers(headers))
    }

    fn lock(&self) -> MutexGuard<'_, CookieState> {
        // Neither field can be left half-written, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// "Read all cookies": the request cookies as seen by the provider,
    /// with pending mutations applied
    pub fn get_all(&self) -> Vec<RequestCookie> {
        let state = self.lock();
        let mut cookies: Vec<RequestCookie> = state
            .request
            .iter()
            .filter(|c| !state.pending.iter().any(|p| p.name == c.name))
            .cloned()
            .collect();
        cookies.extend(state.pending.iter().filter(|p| !p.is_removal()).map(|p| RequestCookie {
            name: p.name.clone(),
            value: p.value.clone(),
        }));
        cookies
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.get_all()
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    /// "Write cookie set": record mutations; a later write to the same name
    /// replaces the earlier one
    pub fn set_all(&self, cookies: impl IntoIterator<Item = SetCookie>) {
        let mut state = self.lock();
        for cookie in cookies {
            state.pending.retain(|p| p.name != cookie.name);
            state.pending.push(cookie);
        }
    }

    /// Fold mutations made elsewhere into the request view, without
    /// recording them as pending
    pub fn absorb(&self, cookies: &[SetCookie]) {
        let mut state = self.lock();
        for cookie in cookies {
            state.request.retain(|c| c.name != cookie.name);
            if !cookie.is_removal() {
                state.request.push(RequestCookie {
                    name: cookie.name.clone(),
                    value: cookie.value.clone(),
                });
            }
        }
    }

    pub fn pending(&self) -> Vec<SetCookie> {
        self.lock().pending.clone()
    }

    /// Take the recorded mutations, leaving none behind
    pub fn drain(&self) -> Vec<SetCookie> {
        std::mem::take(&mut self.lock().pending)
    }
}

/// Append mutations to a response's headers as `Set-Cookie` lines
pub fn apply_set_cookies(headers: &mut HeaderMap, cookies: &[SetCookie]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!("Dropping cookie '{}' with invalid header value: {}", cookie.name, e);
            }
        }
    }
}
