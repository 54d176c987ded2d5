//! Integration tests for the script HTTP client.

use std::io::Read;
use std::time::Duration;

use script_http::{
    ClientConfig, ErrorKind, HeaderSet, ProxySettings, ResponseBody, ScriptHttpClient,
    ScriptResponse,
};

#[test]
fn test_client_creation() {
    let client = ScriptHttpClient::default();
    assert!(!client.config().ignore_hostname_verification);
    assert!(client.config().default_headers.is_empty());
    assert!(client.config().timeout.is_none());
}

#[test]
fn test_client_from_options() {
    let options = serde_json::json!({
        "IgnoreHostnameVerification": true,
        "DefaultHeaders": "{\"Accept\":\"application/json\"}",
    });
    let client = ScriptHttpClient::from_options(options.as_object().unwrap())
        .expect("Failed to build client");

    assert!(client.config().ignore_hostname_verification);
    assert_eq!(
        client.config().default_headers.get("Accept"),
        Some("application/json")
    );
}

#[test]
fn test_invalid_arguments_fail_before_network() {
    // Nothing listens here; reaching the network would yield a NetworkError.
    let client = ScriptHttpClient::default();

    let err = client.get("", None, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = client
        .put("http://127.0.0.1:1/", None, "", "body")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("contentType"));

    let err = client
        .post_param("http://127.0.0.1:1/", None, "text/plain", "")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("body"));
}

#[test]
fn test_connection_refused_is_network_error() {
    let client = ScriptHttpClient::new(ClientConfig::new().connect_timeout(Duration::from_secs(5)));

    let err = client.get("http://127.0.0.1:1/", None, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.to_string().starts_with("An error occurred. Cause: [NetworkError: "));
    assert!(
        err.message().to_lowercase().contains("connection refused"),
        "cause missing from: {}",
        err.message()
    );
}

#[test]
fn test_unresolvable_host_differs_from_refused() {
    let client = ScriptHttpClient::new(ClientConfig::new().connect_timeout(Duration::from_secs(5)));

    let refused = client.get("http://127.0.0.1:1/", None, false).unwrap_err();
    let unresolved = client
        .get("http://no-such-host.invalid/", None, false)
        .unwrap_err();

    assert_eq!(unresolved.kind(), ErrorKind::Network);
    assert_ne!(refused.message(), unresolved.message());
}

mod stub_server {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Run a blocking client call off the async test runtime.
    fn blocking<T, F>(f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        std::thread::spawn(f).join().expect("client thread panicked")
    }

    fn stream_of(response: ScriptResponse) -> script_http::BodyStream {
        response
            .body
            .and_then(ResponseBody::into_stream)
            .expect("expected a streamed body")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_text_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/text"))
            .and(header("accept", "text/plain"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/plain")
                    .set_body_string("body content"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/text", mock_server.uri());
        let response = blocking(move || {
            let headers = HeaderSet::from([("Accept", "text/plain")]);
            ScriptHttpClient::default().get(&url, Some(&headers), false)
        })
        .expect("Request failed");

        assert_eq!(response.status, "200");
        assert_eq!(response.header_map()["Content-Type"], "text/plain");
        assert_eq!(response.text(), Some("body content"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_stream_round_trip() {
        let mock_server = MockServer::start().await;
        let payload = vec![0x00, 0xff, 0x10, 0x7f];

        Mock::given(method("GET"))
            .and(path("/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&mock_server)
            .await;

        let url = format!("{}/raw", mock_server.uri());
        let (status, bytes, closed) = blocking(move || {
            let response = ScriptHttpClient::default()
                .get(&url, None, true)
                .expect("Request failed");
            let status = response.status.clone();
            let mut stream = stream_of(response);
            assert!(!stream.is_closed());

            let mut bytes = Vec::new();
            stream.read_to_end(&mut bytes).expect("Failed to read stream");
            (status, bytes, stream.is_closed())
        });

        assert_eq!(status, "200");
        assert_eq!(bytes, payload);
        assert!(closed, "stream must release the connection at end of body");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stream_close_releases_connection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/items/7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("deleted item 7"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/items/7", mock_server.uri());
        let (first, after_close, closed) = blocking(move || {
            let response = ScriptHttpClient::default()
                .delete(&url, None, true)
                .expect("Request failed");
            let mut stream = stream_of(response);

            let mut first = [0u8; 7];
            stream.read_exact(&mut first).expect("Failed to read prefix");
            stream.close();

            let mut rest = Vec::new();
            let after_close = stream.read_to_end(&mut rest).expect("Read after close failed");
            (first, after_close, stream.is_closed())
        });

        assert_eq!(&first, b"deleted");
        assert_eq!(after_close, 0);
        assert!(closed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_call_header_overrides_default() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/precedence"))
            .and(header("x", "2"))
            .and(header("x-tenant", "acme"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/precedence", mock_server.uri());
        let response = blocking(move || {
            let config = ClientConfig::new()
                .default_headers(HeaderSet::from([("X", "1"), ("X-Tenant", "acme")]));
            let headers = HeaderSet::from([("X", "2")]);
            ScriptHttpClient::new(config).get(&url, Some(&headers), false)
        })
        .expect("Request failed");

        assert_eq!(response.status, "200");

        let requests = mock_server.received_requests().await.unwrap();
        let values: Vec<_> = requests[0].headers.get_all("x").iter().collect();
        assert_eq!(values, vec!["2"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_explicit_content_type_wins_over_default() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("content-type", "text/plain"))
            .and(body_string("key1=value1&key2=value2"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/submit", mock_server.uri());
        let response = blocking(move || {
            let options = serde_json::json!({
                "DefaultHeaders": "{\"Content-Type\":\"application/json\"}",
            });
            ScriptHttpClient::from_options(options.as_object().unwrap())
                .expect("Failed to build client")
                .post(&url, None, "text/plain", "key1=value1&key2=value2")
        })
        .expect("Request failed");

        assert_eq!(response.status, "201");
        assert_eq!(response.text(), Some("created"));

        let requests = mock_server.received_requests().await.unwrap();
        let values: Vec<_> = requests[0].headers.get_all("content-type").iter().collect();
        assert_eq!(values, vec!["text/plain"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_patch_and_legacy_aliases() {
        let mock_server = MockServer::start().await;

        for verb in ["PUT", "PATCH", "POST"] {
            Mock::given(method(verb))
                .and(path("/resource"))
                .and(header("content-type", "application/json"))
                .and(body_string(r#"{"done":true}"#))
                .respond_with(ResponseTemplate::new(200).set_body_string(verb))
                .mount(&mock_server)
                .await;
        }

        let url = format!("{}/resource", mock_server.uri());
        let bodies = blocking(move || {
            let client = ScriptHttpClient::default();
            let json = "application/json";
            let body = r#"{"done":true}"#;
            [
                client.put(&url, None, json, body),
                client.put_param(&url, None, json, body),
                client.patch(&url, None, json, body),
                client.post_param(&url, None, json, body),
            ]
            .map(|result| {
                result
                    .expect("Request failed")
                    .text()
                    .map(str::to_string)
                    .unwrap_or_default()
            })
        });

        assert_eq!(bodies, ["PUT", "PUT", "PATCH", "POST"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_identical_gets_are_idempotent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stable"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Version", "3")
                    .set_body_string("same every time"),
            )
            .expect(2)
            .mount(&mock_server)
            .await;

        let url = format!("{}/stable", mock_server.uri());
        let (first, second) = blocking(move || {
            let client = ScriptHttpClient::default();
            let first = client.get(&url, None, false).expect("Request failed");
            let second = client.get(&url, None, false).expect("Request failed");
            (first, second)
        });

        let comparable = |response: &ScriptResponse| {
            let mut headers = response.header_map();
            headers.remove("Date");
            (response.status.clone(), headers, response.text().map(str::to_string))
        };
        assert_eq!(comparable(&first), comparable(&second));
        assert_eq!(first.header_map()["X-Version"], "3");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_error_status_passes_through() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/not-found"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/not-found", mock_server.uri());
        let response = blocking(move || ScriptHttpClient::default().get(&url, None, false))
            .expect("404 must not be an error");

        assert_eq!(response.status, "404");
        assert_eq!(response.text(), Some("Not Found"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_content_has_no_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/items/1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let url = format!("{}/items/1", mock_server.uri());
        let (text_mode, stream_mode) = blocking(move || {
            let client = ScriptHttpClient::default();
            (
                client.delete(&url, None, false).expect("Request failed"),
                client.delete(&url, None, true).expect("Request failed"),
            )
        });

        assert_eq!(text_mode.status, "204");
        assert!(text_mode.body.is_none());
        assert!(stream_mode.body.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_utf8_body_is_body_read_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/binary"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0xfd]))
            .mount(&mock_server)
            .await;

        let url = format!("{}/binary", mock_server.uri());
        let err = blocking(move || ScriptHttpClient::default().get(&url, None, false))
            .expect_err("invalid UTF-8 must fail in text mode");

        assert_eq!(err.kind(), ErrorKind::BodyRead);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let url = format!("{}/slow", mock_server.uri());
        let err = blocking(move || {
            ScriptHttpClient::new(ClientConfig::new().timeout(Duration::from_millis(100)))
                .get(&url, None, false)
        })
        .expect_err("request should time out");

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.message().starts_with("Request timed out: "));
        assert!(err.message().contains("/slow"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_requests_route_through_proxy_with_credentials() {
        let proxy = MockServer::start().await;

        // "alice:secret" in base64
        Mock::given(method("GET"))
            .and(path("/via-proxy"))
            .and(header("proxy-authorization", "Basic YWxpY2U6c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("proxied"))
            .expect(1)
            .mount(&proxy)
            .await;

        let port = proxy.address().port();
        let response = blocking(move || {
            ScriptHttpClient::default()
                .with_proxy(ProxySettings::new("127.0.0.1", port).with_credentials("alice", "secret"))
                .get("http://origin.invalid/via-proxy", None, false)
        })
        .expect("Request failed");

        assert_eq!(response.status, "200");
        assert_eq!(response.text(), Some("proxied"));
    }
}

mod self_signed {
    use super::*;
    use std::sync::Arc;

    use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_rustls::TlsAcceptor;

    /// Serve a fixed response over TLS with a certificate for another host.
    async fn start_https_server() -> u16 {
        let key_pair = rcgen::KeyPair::generate().expect("Failed to generate key");
        let cert = rcgen::CertificateParams::new(vec!["example.invalid".to_string()])
            .expect("Failed to build certificate params")
            .self_signed(&key_pair)
            .expect("Failed to self-sign certificate");
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

        let config = rustls::ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .expect("Failed to select protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .expect("Failed to build server config");
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let port = listener.local_addr().expect("No local address").port();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    let Ok(mut tls) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match tls.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }
                    let response = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\
                                    Content-Length: 6\r\nConnection: close\r\n\r\nsecure";
                    let _ = tls.write_all(response.as_bytes()).await;
                    let _ = tls.shutdown().await;
                });
            }
        });

        port
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_untrusted_certificate_refused_by_default() {
        let port = start_https_server().await;

        let err = std::thread::spawn(move || {
            ScriptHttpClient::default().get(&format!("https://127.0.0.1:{port}/"), None, false)
        })
        .join()
        .expect("client thread panicked")
        .expect_err("self-signed certificate must be rejected");

        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ignore_hostname_verification_accepts_self_signed() {
        let port = start_https_server().await;

        let response = std::thread::spawn(move || {
            let options = serde_json::json!({"IgnoreHostnameVerification": true});
            ScriptHttpClient::from_options(options.as_object().unwrap())
                .expect("Failed to build client")
                .get(&format!("https://127.0.0.1:{port}/"), None, false)
        })
        .join()
        .expect("client thread panicked")
        .expect("Request failed");

        assert_eq!(response.status, "200");
        assert_eq!(response.text(), Some("secure"));
    }
}
