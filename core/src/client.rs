//! Request building, response parsing, and the CRUD client.
//!
//! # Design
//! `RequestBuilder` holds only the immutable [`ClientConfig`] and carries no
//! state between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. [`AccessClient`] runs the pair through a [`Transport`];
//! hosts that do their own I/O can use the builder alone.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use urlencoding::encode;

use crate::config::{ClientConfig, StatusPolicy};
use crate::envelope::decode_envelope;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{CreateUser, UpdateUser, User};

const USERS_PATH: &str = "/api/v1/developer/users";

/// Builds requests against a configured console and parses its responses.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    config: ClientConfig,
}

impl RequestBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve `path` against the base endpoint and attach the bearer token.
    ///
    /// `path` is appended to whatever path the base endpoint already carries.
    pub fn build(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        let mut url = self.config.base_url().clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);

        let mut headers = vec![(
            "authorization".to_string(),
            format!("Bearer {}", self.config.token()),
        )];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        }
    }

    fn build_json<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        input: &B,
    ) -> Result<HttpRequest> {
        let body = serde_json::to_string(input).map_err(ApiError::Serialization)?;
        Ok(self.build(method, path, Some(body)))
    }

    pub fn build_create_user(&self, input: &CreateUser) -> Result<HttpRequest> {
        self.build_json(HttpMethod::Post, USERS_PATH, input)
    }

    pub fn build_get_user(&self, id: &str) -> HttpRequest {
        self.build(HttpMethod::Get, &user_path(id), None)
    }

    pub fn build_update_user(&self, id: &str, input: &UpdateUser) -> Result<HttpRequest> {
        self.build_json(HttpMethod::Put, &user_path(id), input)
    }

    pub fn build_list_users(&self) -> HttpRequest {
        self.build(HttpMethod::Get, USERS_PATH, None)
    }

    /// Apply the status policy, then decode the envelope into `T`.
    pub fn parse<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        tracing::debug!(
            status = response.status,
            bytes = response.body.len(),
            "response received"
        );
        check_status(&response, self.config.status_policy())?;
        let result = decode_envelope(&response.body);
        if let Err(ApiError::Application { code, msg }) = &result {
            tracing::warn!(%code, %msg, "request rejected by console");
        }
        result
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User> {
        self.parse(response)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User> {
        self.parse(response)
    }

    /// The payload of an update is not used; only the outcome matters.
    pub fn parse_update_user(&self, response: HttpResponse) -> Result<()> {
        self.parse::<IgnoredAny>(response).map(|_| ())
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<User>> {
        self.parse(response)
    }
}

/// `/api/v1/developer/users/{id}` with `id` percent-encoded as one segment.
fn user_path(id: &str) -> String {
    format!("{USERS_PATH}/{}", encode(id))
}

fn check_status(response: &HttpResponse, policy: StatusPolicy) -> Result<()> {
    match policy {
        StatusPolicy::EnvelopeOnly => Ok(()),
        StatusPolicy::RequireOk if response.status == 200 => Ok(()),
        StatusPolicy::RequireOk => Err(ApiError::UnexpectedStatus {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }),
    }
}

/// Typed client for the developer user endpoints.
///
/// Holds no mutable state, so one instance can serve concurrent callers as
/// long as the transport can.
#[derive(Debug, Clone)]
pub struct AccessClient<T> {
    builder: RequestBuilder,
    transport: T,
}

impl<T: Transport> AccessClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            builder: RequestBuilder::new(config),
            transport,
        }
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");
        self.transport.execute(request).map_err(ApiError::Transport)
    }

    pub fn create_user(&self, input: &CreateUser) -> Result<User> {
        let request = self.builder.build_create_user(input)?;
        self.builder.parse_create_user(self.send(request)?)
    }

    pub fn get_user(&self, id: &str) -> Result<User> {
        let request = self.builder.build_get_user(id);
        self.builder.parse_get_user(self.send(request)?)
    }

    pub fn update_user(&self, id: &str, input: &UpdateUser) -> Result<()> {
        let request = self.builder.build_update_user(id, input)?;
        self.builder.parse_update_user(self.send(request)?)
    }

    // Pagination is not supported; the console returns its default first page.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let request = self.builder.build_list_users();
        self.builder.parse_list_users(self.send(request)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::BoxError;
    use crate::types::UserStatus;

    const BASE: &str = "https://192.168.1.1:12445";

    fn builder() -> RequestBuilder {
        RequestBuilder::new(ClientConfig::new(BASE, "tok").unwrap())
    }

    /// Replies with a canned response and records every request it sees.
    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(self.status, self.body))
        }
    }

    struct Refused;

    impl Transport for Refused {
        fn execute(&self, _: HttpRequest) -> std::result::Result<HttpResponse, BoxError> {
            Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    fn client<T: Transport>(transport: T) -> AccessClient<T> {
        AccessClient::new(ClientConfig::new(BASE, "tok").unwrap(), transport)
    }

    #[test]
    fn build_list_users_produces_correct_request() {
        let req = builder().build_list_users();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://192.168.1.1:12445/api/v1/developer/users");
        assert_eq!(
            req.headers,
            vec![("authorization".to_string(), "Bearer tok".to_string())]
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_get_user_produces_correct_request() {
        let req = builder().build_get_user("63f654b9-9d11-4a92-9d18-cc536b74d9e8");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://192.168.1.1:12445/api/v1/developer/users/63f654b9-9d11-4a92-9d18-cc536b74d9e8"
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_get_user_encodes_id_as_one_segment() {
        let req = builder().build_get_user("a/b c?");
        assert_eq!(
            req.url,
            "https://192.168.1.1:12445/api/v1/developer/users/a%2Fb%20c%3F"
        );
    }

    #[test]
    fn build_create_user_produces_correct_request() {
        let req = builder()
            .build_create_user(&CreateUser::new("Perico", "Palotes"))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://192.168.1.1:12445/api/v1/developer/users");
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: serde_json::Value =
            serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["first_name"], "Perico");
        assert_eq!(body["last_name"], "Palotes");
        assert!(body.get("user_email").is_none());
    }

    #[test]
    fn build_update_user_produces_correct_request() {
        let input = UpdateUser {
            status: Some(UserStatus::Deactivated),
            ..UpdateUser::default()
        };
        let req = builder().build_update_user("9258da27", &input).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(
            req.url,
            "https://192.168.1.1:12445/api/v1/developer/users/9258da27"
        );
        assert_eq!(req.body.as_deref(), Some(r#"{"status":"DEACTIVATED"}"#));
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let config =
            ClientConfig::new("https://console.example.com/proxy/access/?x=1", "t").unwrap();
        let req = RequestBuilder::new(config).build_list_users();
        assert_eq!(
            req.url,
            "https://console.example.com/proxy/access/api/v1/developer/users"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let builder =
            RequestBuilder::new(ClientConfig::new("http://localhost:3000/", "t").unwrap());
        assert_eq!(
            builder.build_list_users().url,
            "http://localhost:3000/api/v1/developer/users"
        );
    }

    #[test]
    fn parse_list_users_success() {
        let response =
            HttpResponse::new(200, r#"{"code":"SUCCESS","msg":"success","data":[{}]}"#);
        let users = builder().parse_list_users(response).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0], User::default());
    }

    #[test]
    fn parse_get_user_success() {
        let response = HttpResponse::new(
            200,
            r#"{"code":"SUCCESS","msg":"success",
                "data":{"id":"u1","first_name":"Ana","status":"ACTIVE"}}"#,
        );
        let user = builder().parse_get_user(response).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.status, Some(UserStatus::Active));
    }

    #[test]
    fn parse_update_user_discards_payload() {
        let response = HttpResponse::new(
            200,
            r#"{"code":"SUCCESS","msg":"success","data":{"anything":[1,2]}}"#,
        );
        builder().parse_update_user(response).unwrap();
        let response = HttpResponse::new(200, r#"{"code":"SUCCESS","msg":"success"}"#);
        builder().parse_update_user(response).unwrap();
    }

    #[test]
    fn application_error_under_http_200() {
        let response = HttpResponse::new(
            200,
            r#"{"code":"CODE_SYSTEM_ERROR","msg":"An error occurred on the server's end."}"#,
        );
        let err = builder().parse_list_users(response).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CODE_SYSTEM_ERROR: An error occurred on the server's end."
        );
    }

    #[test]
    fn envelope_only_ignores_status() {
        let response =
            HttpResponse::new(500, r#"{"code":"SUCCESS","msg":"success","data":[]}"#);
        assert!(builder().parse_list_users(response).unwrap().is_empty());

        let response = HttpResponse::new(401, r#"{"code":"CODE_UNAUTHORIZED","msg":"no"}"#);
        let err = builder().parse_get_user(response).unwrap_err();
        assert!(err.is_application_code("CODE_UNAUTHORIZED"));
    }

    #[test]
    fn require_ok_rejects_before_decoding() {
        let config = ClientConfig::new(BASE, "tok")
            .unwrap()
            .with_status_policy(StatusPolicy::RequireOk);
        let builder = RequestBuilder::new(config);
        let response = HttpResponse::new(502, "<html>bad gateway</html>");
        let err = builder.parse_list_users(response).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status: 502, .. }));

        let response =
            HttpResponse::new(200, r#"{"code":"SUCCESS","msg":"success","data":[]}"#);
        assert!(builder.parse_list_users(response).is_ok());
    }

    #[test]
    fn non_json_is_malformed_regardless_of_status() {
        for status in [200, 404, 500] {
            let err = builder()
                .parse_get_user(HttpResponse::new(status, "not json"))
                .unwrap_err();
            assert!(matches!(err, ApiError::MalformedResponse(_)), "{status}");
        }
    }

    #[test]
    fn client_composes_build_send_parse() {
        let transport =
            Canned::new(200, r#"{"code":"SUCCESS","msg":"success","data":{"id":"new"}}"#);
        let client = client(&transport);
        let created = client.create_user(&CreateUser::new("A", "B")).unwrap();
        assert_eq!(created.id, "new");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].header("Authorization"), Some("Bearer tok"));
    }

    #[test]
    fn client_update_and_get_hit_user_path() {
        let transport = Canned::new(200, r#"{"code":"SUCCESS","msg":"success","data":{}}"#);
        let client = client(&transport);
        client.update_user("u1", &UpdateUser::default()).unwrap();
        client.get_user("u1").unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, HttpMethod::Put);
        assert_eq!(seen[0].body.as_deref(), Some("{}"));
        assert_eq!(seen[1].method, HttpMethod::Get);
        assert!(seen.iter().all(|r| r.url.ends_with("/api/v1/developer/users/u1")));
    }

    #[test]
    fn client_surfaces_application_error() {
        let client = client(Canned::new(
            200,
            r#"{"code":"CODE_SYSTEM_ERROR","msg":"An error occurred on the server's end."}"#,
        ));
        let err = client.list_users().unwrap_err();
        assert_eq!(
            err.to_string(),
            "CODE_SYSTEM_ERROR: An error occurred on the server's end."
        );
    }

    #[test]
    fn client_surfaces_transport_error_unchanged() {
        let client = client(Refused);
        match client.list_users().unwrap_err() {
            ApiError::Transport(source) => {
                assert_eq!(source.to_string(), "connection refused")
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn host_can_drive_io_through_exposed_parts() {
        let transport = Canned::new(200, r#"{"code":"SUCCESS","msg":"success","data":[{},{}]}"#);
        let client = client(transport);

        let builder = client.request_builder();
        assert_eq!(builder.config().token(), "tok");
        let request = builder.build_list_users();
        let response = client.transport().execute(request).unwrap();
        let users = builder.parse_list_users(response).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(client.transport().seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<AccessClient<Canned>>();
    }
}
