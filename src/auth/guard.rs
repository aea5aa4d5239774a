use crate::models::session::{ PersistedBlob, Session };
use axum::{
    extract::{ Request, State },
    http::header::COOKIE,
    middleware::Next,
    response::{ IntoResponse, Redirect, Response },
};
use log::debug;
use serde_json::Value as JsonValue;
use url::form_urlencoded;

pub const PUBLIC_ROUTES: [&str; 3] = ["/", "/login", "/signup"];
pub const PROTECTED_PREFIX: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(&'static str),
}

pub fn decide(path: &str, logged_in: bool) -> GuardDecision {
    let is_public = PUBLIC_ROUTES.contains(&path);
    let is_protected = path.starts_with(PROTECTED_PREFIX);

    if !logged_in && is_protected {
        return GuardDecision::Redirect(LOGIN_PATH);
    }
    if logged_in && is_public {
        return GuardDecision::Redirect(DASHBOARD_PATH);
    }
    GuardDecision::Pass
}

/// Reads `state.isLoggedIn` out of the session cookie. Anything unreadable counts as logged out.
pub fn session_from_cookie(raw: &str) -> bool {
    let decoded = if raw.trim_start().starts_with('{') {
        raw.to_string()
    } else {
        match form_urlencoded::parse(raw.as_bytes()).next() {
            Some((json, _)) => json.into_owned(),
            None => return false,
        }
    };

    serde_json::from_str::<JsonValue>(&decoded)
        .ok()
        .and_then(|v| v.get("state")?.get("isLoggedIn")?.as_bool())
        .unwrap_or(false)
}

/// Finds `name` in a `Cookie` request header.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

pub fn is_logged_in(req: &Request, cookie_name: &str) -> bool {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|h| find_cookie(h, cookie_name))
        .map(session_from_cookie)
        .unwrap_or(false)
}

/// `Set-Cookie` value mirroring the session's login flag for the guard.
pub fn session_cookie(cookie_name: &str, session: &Session, max_age_days: i64) -> String {
    let blob = PersistedBlob { state: session, version: 0 };
    let json = serde_json::to_string(&blob).unwrap_or_else(|_| "{}".to_string());
    let encoded: String = form_urlencoded::byte_serialize(json.as_bytes()).collect();
    format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        cookie_name,
        encoded,
        max_age_days * 24 * 60 * 60
    )
}

pub fn clear_session_cookie(cookie_name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; SameSite=Lax", cookie_name)
}

pub async fn route_guard(State(cookie_name): State<String>, req: Request, next: Next) -> Response {
    let logged_in = is_logged_in(&req, &cookie_name);
    let path = req.uri().path().to_string();

    match decide(&path, logged_in) {
        GuardDecision::Pass => next.run(req).await,
        GuardDecision::Redirect(to) => {
            debug!("Guard redirecting {} (logged_in={}) to {}", path, logged_in, to);
            Redirect::to(to).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_dashboard_goes_to_login() {
        assert_eq!(decide("/dashboard", false), GuardDecision::Redirect("/login"));
        assert_eq!(decide("/dashboard/room_1_abc", false), GuardDecision::Redirect("/login"));
        assert_eq!(decide("/login", false), GuardDecision::Pass);
        assert_eq!(decide("/", false), GuardDecision::Pass);
    }

    #[test]
    fn authenticated_public_pages_go_to_dashboard() {
        for path in PUBLIC_ROUTES {
            assert_eq!(decide(path, true), GuardDecision::Redirect("/dashboard"));
        }
        assert_eq!(decide("/dashboard", true), GuardDecision::Pass);
        assert_eq!(decide("/about", true), GuardDecision::Pass);
    }

    #[test]
    fn cookie_parsing_defaults_to_logged_out() {
        assert!(session_from_cookie(r#"{"state":{"isLoggedIn":true}}"#));
        assert!(!session_from_cookie(r#"{"state":{"isLoggedIn":"true"}}"#));
        assert!(!session_from_cookie(r#"{"isLoggedIn":true}"#));
        assert!(!session_from_cookie("not-json"));
        assert!(!session_from_cookie(""));
    }

    #[test]
    fn issued_cookie_is_read_back() {
        let session = Session {
            is_logged_in: true,
            phone: Some("+911234567890".into()),
            name: Some("Ada Lovelace".into()),
        };
        let header = session_cookie("easy-chat-store", &session, 7);
        assert!(header.contains("Max-Age=604800"));

        let pair = header.split(';').next().unwrap();
        let value = find_cookie(pair, "easy-chat-store").unwrap();
        assert!(!value.contains('"'));
        assert!(session_from_cookie(value));
    }

    #[test]
    fn finds_cookie_among_others() {
        let header = "theme=dark; easy-chat-store=%7B%7D; other=1";
        assert_eq!(find_cookie(header, "easy-chat-store"), Some("%7B%7D"));
        assert_eq!(find_cookie(header, "missing"), None);
    }
}
