//! The browser side of signing in: an OAuth 2.0 authorization-code flow with PKCE against Google,
//! using a short-lived HTTP server on localhost to receive the redirect.
//!
//! The result is a Google ID token (plus the nonce we asked Google to embed in it). Verifying the
//! token is the job of the `Authenticator`.

use crate::auth::ClientSecretFile;
use crate::error::Res;
use anyhow::{anyhow, bail, Context};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    ExtraTokenFields, PkceCodeChallenge, RedirectUrl, Scope, StandardRevocableToken,
    StandardTokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const SCOPES: &[&str] = &["openid", "email", "profile"];
const LOGIN_TIMEOUT: Duration = Duration::from_secs(300);
const SUCCESS_PAGE: &str = "Signed in to fintrack. You can close this window.";

/// Google returns the ID token alongside the access token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IdTokenFields {
    id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type GoogleTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type GoogleClient = oauth2::Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// What a successful browser sign-in hands back.
#[derive(Debug, Clone)]
pub(crate) struct LoginTokens {
    pub(crate) id_token: String,
    pub(crate) nonce: String,
}

/// Sends the user to Google's consent page and waits, up to five minutes, for the redirect to
/// `http://localhost:<port>`. Then exchanges the authorization code for tokens.
pub(crate) async fn login_flow(secret: &ClientSecretFile, port: u16) -> Res<LoginTokens> {
    let credentials = secret.credentials();
    let redirect = format!("http://localhost:{port}");
    let client: GoogleClient = oauth2::Client::new(ClientId::new(credentials.client_id.clone()))
        .set_client_secret(ClientSecret::new(credentials.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(credentials.auth_uri.clone()).context("Invalid auth_uri")?)
        .set_token_uri(TokenUrl::new(credentials.token_uri.clone()).context("Invalid token_uri")?)
        .set_redirect_uri(RedirectUrl::new(redirect.clone()).context("Invalid redirect URI")?);

    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let nonce = CsrfToken::new_random().secret().clone();
    let mut request = client
        .authorize_url(CsrfToken::new_random)
        .add_extra_param("nonce", nonce.clone())
        .add_extra_param("prompt", "select_account")
        .set_pkce_challenge(challenge);
    for scope in SCOPES {
        request = request.add_scope(Scope::new(scope.to_string()));
    }
    let (auth_url, state) = request.url();

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("Unable to listen for the OAuth redirect on port {port}"))?;
    info!("Waiting for the Google sign-in to redirect to {redirect}");
    info!("Open this URL in your browser to sign in:\n\n{auth_url}\n");

    let code = tokio::time::timeout(LOGIN_TIMEOUT, wait_for_code(listener, state.secret()))
        .await
        .map_err(|_| anyhow!("Timed out waiting for the Google sign-in to complete"))??;
    debug!("Received authorization code, exchanging it for tokens");

    let http = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to create HTTP client")?;
    let token = client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(verifier)
        .request_async(&http)
        .await
        .map_err(|e| anyhow!("Failed to exchange the authorization code: {e}"))?;

    let id_token = token
        .extra_fields()
        .id_token
        .clone()
        .context("Google did not return an ID token, was the 'openid' scope granted?")?;
    Ok(LoginTokens { id_token, nonce })
}

/// Serves the redirect until one request carries an authorization code (or an error). Requests
/// without either, such as `/favicon.ico`, get a 404 and are ignored.
async fn wait_for_code(listener: TcpListener, state: &str) -> Res<String> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Res<String>>();
    loop {
        tokio::select! {
            outcome = rx.recv() => {
                return outcome.context("The OAuth redirect server stopped unexpectedly")?;
            }
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("Failed to accept OAuth redirect connection")?;
                let tx = tx.clone();
                let state = state.to_string();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let outcome = parse_callback(req.uri().query().unwrap_or_default(), &state);
                        let response = match outcome {
                            Ok(None) => respond(StatusCode::NOT_FOUND, "Not found"),
                            Ok(Some(code)) => {
                                let _ = tx.send(Ok(code));
                                respond(StatusCode::OK, SUCCESS_PAGE)
                            }
                            Err(e) => {
                                let page = format!("Sign-in failed: {e}");
                                let _ = tx.send(Err(e));
                                respond(StatusCode::BAD_REQUEST, page)
                            }
                        };
                        async move { Ok::<_, Infallible>(response) }
                    });
                    if let Err(e) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        warn!("Error serving OAuth redirect: {e}");
                    }
                });
            }
        }
    }
}

fn respond(status: StatusCode, body: impl Into<String>) -> Response<String> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}

/// Reads the query string of the redirect. Returns the authorization code, `None` if the request
/// is not an OAuth redirect at all, or an error if Google reported one or the state is wrong.
fn parse_callback(query: &str, expected_state: &str) -> Res<Option<String>> {
    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        bail!("Google returned an error: {error}");
    }
    let Some(code) = code else {
        return Ok(None);
    };
    if state.as_deref() != Some(expected_state) {
        bail!("The OAuth state does not match, refusing the redirect");
    }
    Ok(Some(code))
}
