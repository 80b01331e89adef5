//! `reqwest`-backed [`HttpTransport`].

use composable_fetch_core::transport::{
    HttpMethod, HttpRequest, HttpTransport, TransportFuture, TransportResponse,
};
use reqwest::Client;

/// HTTP transport over a shared [`reqwest::Client`].
///
/// Always resolves with a response when the server answered; non-2xx
/// statuses are left to the caller. Malformed URLs and connection
/// failures surface as the client's own [`reqwest::Error`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Transport with a default client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over an existing client (timeouts, proxies, TLS, ...)
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

impl HttpTransport for ReqwestTransport {
    type Response = ReqwestResponse;
    type Error = reqwest::Error;

    fn send(&self, request: HttpRequest) -> TransportFuture<'_, Option<Self::Response>, Self::Error> {
        Box::pin(async move {
            let mut builder = self.client.request(to_reqwest(request.method), &request.url);
            for (name, value) in request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            tracing::trace!(status = response.status().as_u16(), "Response received");
            Ok(Some(ReqwestResponse(response)))
        })
    }
}

/// Response produced by [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestResponse(reqwest::Response);

impl TransportResponse for ReqwestResponse {
    type Error = reqwest::Error;

    fn status(&self) -> u16 {
        self.0.status().as_u16()
    }

    fn body(self) -> TransportFuture<'static, Vec<u8>, Self::Error> {
        Box::pin(async move { Ok(self.0.bytes().await?.to_vec()) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use composable_fetch_core::transport::RequestOptions;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sends_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/items/1"))
            .and(header("x-api-key", "secret"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let options = RequestOptions::new()
            .with_header("x-api-key", "secret")
            .with_body("payload");
        let request = HttpRequest::new(
            format!("{}/items/1", server.uri()),
            HttpMethod::Put,
            Some(&options),
        );

        let response = ReqwestTransport::new().send(request).await.unwrap().unwrap();

        assert_eq!(response.status(), 204);
        assert!(response.ok());
    }

    #[tokio::test]
    async fn test_non_success_status_is_still_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let request = HttpRequest::new(server.uri(), HttpMethod::Get, None);
        let response = ReqwestTransport::new().send(request).await.unwrap().unwrap();

        assert!(!response.ok());
        assert_eq!(response.body().await.unwrap(), b"missing".to_vec());
    }

    #[tokio::test]
    async fn test_malformed_url_is_a_transport_error() {
        let request = HttpRequest::new("not a url", HttpMethod::Get, None);
        let result = ReqwestTransport::new().send(request).await;

        assert!(result.is_err());
    }
}
