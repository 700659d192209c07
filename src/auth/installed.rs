// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Installed-application authorization via a loopback redirect.
//!
//! Binds an ephemeral port on 127.0.0.1, prints the consent URL, and waits
//! for Google to redirect the browser back with `code` and `state`.

use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use super::error::AuthError;
use super::oauth::{generate_random_string, GoogleOAuthClient, PkcePair};
use super::secrets::ClientSecrets;
use super::token::AuthorizedUser;

/// How long to wait for the operator to finish the browser consent.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3><p>You may close this window.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Authorization failed.</h3><p>Return to the terminal for details.</p></body></html>";

/// Run the one-time interactive authorization and return fresh credentials.
pub async fn authorize_interactive(
    oauth: &GoogleOAuthClient,
    secrets: &ClientSecrets,
    scopes: &[String],
) -> Result<AuthorizedUser, AuthError> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{}/", port);

    let state = generate_random_string(32);
    let pkce = PkcePair::generate();
    let auth_url = GoogleOAuthClient::authorization_url(secrets, scopes, &redirect_uri, &state, &pkce);

    println!("Please visit this URL to authorize this application:\n{}", auth_url);
    info!("Waiting for authorization callback on {}", redirect_uri);

    let code = tokio::time::timeout(CALLBACK_TIMEOUT, wait_for_callback(&listener, &state))
        .await
        .map_err(|_| AuthError::InvalidCallback("timed out waiting for authorization".to_string()))??;

    let response = oauth
        .exchange_code(secrets, &code, &pkce.verifier, &redirect_uri)
        .await?;
    Ok(AuthorizedUser::from_exchange(secrets, response, scopes))
}

/// Accept connections until the redirect arrives; returns the authorization code.
pub async fn wait_for_callback(listener: &TcpListener, expected_state: &str) -> Result<String, AuthError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("Authorization callback connection from {}", peer);

        let (target, mut stream) = read_request_target(stream).await?;
        let Some(target) = target else {
            write_response(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
            continue;
        };

        // Browsers also ask for /favicon.ico and the like.
        if !target.starts_with("/?") && target != "/" {
            write_response(&mut stream, "404 Not Found", "").await;
            continue;
        }

        let outcome = parse_callback(&target, expected_state);
        match &outcome {
            Ok(_) => write_response(&mut stream, "200 OK", SUCCESS_PAGE).await,
            Err(e) => {
                warn!("Authorization callback rejected: {}", e);
                write_response(&mut stream, "400 Bad Request", FAILURE_PAGE).await
            }
        }
        return outcome;
    }
}

async fn read_request_target(stream: TcpStream) -> Result<(Option<String>, TcpStream), AuthError> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain headers so the browser sees a clean response.
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).await?;
        if read == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    let mut parts = request_line.split_whitespace();
    let target = match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target.to_string()),
        _ => None,
    };
    Ok((target, reader.into_inner()))
}

async fn write_response(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!("Failed to write callback response: {}", e);
    }
    let _ = stream.shutdown().await;
}

/// Extract the authorization code from a redirect target such as `/?state=..&code=..`.
pub fn parse_callback(target: &str, expected_state: &str) -> Result<String, AuthError> {
    let url = Url::parse(&format!("http://127.0.0.1{}", target))
        .map_err(|e| AuthError::InvalidCallback(e.to_string()))?;

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
        return Err(AuthError::AuthorizationDenied(error));
    }
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::InvalidState);
    }
    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::InvalidCallback("missing code parameter".to_string()))
}
