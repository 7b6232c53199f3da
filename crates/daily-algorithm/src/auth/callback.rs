//! Receiving the authorization code, either through a one-shot local HTTP
//! listener or from a redirect URL pasted by the user.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tiny_http::{Header, Response, Server};
use url::Url;

use super::error::AuthError;
use super::oauth::CALLBACK_PATH;

pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "<html><body><h1>Authentication successful</h1>\
<p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h1>Authentication failed</h1>\
<p>Check the terminal for details.</p></body></html>";

/// What the authorization server sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code { code: String, state: Option<String> },
    Error(String),
}

/// Parses the query of a redirect target such as `/auth/callback?code=..&state=..`.
/// Returns `None` when neither a code nor an error is present.
pub fn parse_callback(target: &str) -> Option<CallbackOutcome> {
    let url = if target.starts_with("http://") || target.starts_with("https://") {
        Url::parse(target).ok()?
    } else {
        Url::parse(&format!("http://localhost{}", target)).ok()?
    };

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(CallbackOutcome::Error(error));
    }
    code.map(|code| CallbackOutcome::Code { code, state })
}

/// Checks an outcome against the state sent with the request.
///
/// A missing state is accepted only when `require_state` is false, which is
/// the case for a bare code pasted in manual mode.
pub fn verify_outcome(
    outcome: CallbackOutcome,
    expected_state: &str,
    require_state: bool,
) -> Result<String, AuthError> {
    match outcome {
        CallbackOutcome::Error(error) => Err(AuthError::Denied(error)),
        CallbackOutcome::Code { code, state } => match state {
            Some(state) if state == expected_state => Ok(code),
            Some(_) => Err(AuthError::StateMismatch),
            None if require_state => Err(AuthError::StateMismatch),
            None => Ok(code),
        },
    }
}

/// Interprets text pasted in manual mode: a full redirect URL or a bare code.
pub fn parse_pasted(input: &str, expected_state: &str) -> Result<String, AuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::Callback("No authorization code entered".to_string()));
    }

    if input.contains("code=") || input.contains("error=") {
        let outcome = parse_callback(input).ok_or_else(|| {
            AuthError::Callback("Pasted URL contains no authorization code".to_string())
        })?;
        return verify_outcome(outcome, expected_state, false);
    }

    Ok(input.to_string())
}

fn html_header() -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]).ok()
}

fn respond(request: tiny_http::Request, status: u16, body: &str) {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Some(header) = html_header() {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        debug!("Failed to answer callback request: {}", e);
    }
}

/// Blocks until the consent redirect arrives on `127.0.0.1:<port>` or the
/// timeout passes. Requests for other paths get a 404 and are ignored.
pub fn wait_for_code(
    port: u16,
    expected_state: &str,
    timeout: Duration,
) -> Result<String, AuthError> {
    let server = Server::http(("127.0.0.1", port)).map_err(|e| {
        AuthError::Callback(format!("Failed to listen on port {}: {}", port, e))
    })?;
    info!("Waiting for authorization callback on port {}", port);

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AuthError::Timeout(timeout.as_secs()));
        }

        let request = match server.recv_timeout(remaining) {
            Ok(Some(request)) => request,
            Ok(None) => return Err(AuthError::Timeout(timeout.as_secs())),
            Err(e) => return Err(AuthError::Callback(format!("Callback listener failed: {}", e))),
        };

        let target = request.url().to_string();
        if !target.starts_with(CALLBACK_PATH) {
            respond(request, 404, "Not found");
            continue;
        }

        match parse_callback(&target) {
            Some(outcome) => {
                let result = verify_outcome(outcome, expected_state, true);
                match &result {
                    Ok(_) => respond(request, 200, SUCCESS_PAGE),
                    Err(e) => {
                        warn!("Authorization callback rejected: {}", e);
                        respond(request, 400, FAILURE_PAGE);
                    }
                }
                return result;
            }
            None => respond(request, 400, FAILURE_PAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_code_and_state() {
        let outcome = parse_callback("/auth/callback?code=4%2Fabc&state=xyz&scope=s").unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Code {
                code: "4/abc".to_string(),
                state: Some("xyz".to_string())
            }
        );
    }

    #[test]
    fn test_parse_callback_error() {
        let outcome = parse_callback("/auth/callback?error=access_denied").unwrap();
        assert_eq!(outcome, CallbackOutcome::Error("access_denied".to_string()));
    }

    #[test]
    fn test_parse_callback_without_code() {
        assert!(parse_callback("/favicon.ico").is_none());
    }

    #[test]
    fn test_verify_outcome_state_checks() {
        let code = |state: Option<&str>| CallbackOutcome::Code {
            code: "c".to_string(),
            state: state.map(str::to_string),
        };
        assert_eq!(verify_outcome(code(Some("s")), "s", true).unwrap(), "c");
        assert!(matches!(
            verify_outcome(code(Some("other")), "s", true),
            Err(AuthError::StateMismatch)
        ));
        assert!(matches!(
            verify_outcome(code(None), "s", true),
            Err(AuthError::StateMismatch)
        ));
        assert_eq!(verify_outcome(code(None), "s", false).unwrap(), "c");
        assert!(matches!(
            verify_outcome(CallbackOutcome::Error("denied".into()), "s", true),
            Err(AuthError::Denied(_))
        ));
    }

    #[test]
    fn test_parse_pasted_full_url() {
        let code = parse_pasted(
            "http://localhost:4160/auth/callback?code=abc&state=s1\n",
            "s1",
        )
        .unwrap();
        assert_eq!(code, "abc");
        assert!(parse_pasted("http://localhost:4160/auth/callback?code=abc&state=bad", "s1").is_err());
    }

    #[test]
    fn test_parse_pasted_bare_code() {
        assert_eq!(parse_pasted("  4/0Abc  ", "s1").unwrap(), "4/0Abc");
        assert!(parse_pasted("   ", "s1").is_err());
    }

    #[test]
    fn test_wait_for_code_receives_redirect() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let handle = std::thread::spawn(move || wait_for_code(port, "st", Duration::from_secs(10)));

        let mut attempts = 0;
        let response = loop {
            attempts += 1;
            match std::net::TcpStream::connect(("127.0.0.1", port)) {
                Ok(mut stream) => {
                    use std::io::{Read, Write};
                    write!(
                        stream,
                        "GET /auth/callback?code=the-code&state=st HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"
                    )
                    .unwrap();
                    let mut body = String::new();
                    stream.read_to_string(&mut body).unwrap();
                    break body;
                }
                Err(_) if attempts < 50 => std::thread::sleep(Duration::from_millis(20)),
                Err(e) => panic!("listener never came up: {}", e),
            }
        };

        assert!(response.starts_with("HTTP/1.1 200"));
        assert_eq!(handle.join().unwrap().unwrap(), "the-code");
    }

    #[test]
    fn test_wait_for_code_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = wait_for_code(port, "st", Duration::from_millis(50));
        assert!(matches!(result, Err(AuthError::Timeout(_))));
    }
}
