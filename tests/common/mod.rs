#![allow(dead_code)]

use std::{
    convert::Infallible,
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use axum::{body::Body, http::Request as ApiRequest, Router};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
    Request, Response, StatusCode,
};
use hyper_util::rt::TokioIo;
use proxy_probe::server::{self, Config};
use serde_json::Value;
use tokio::{
    io::{copy_bidirectional, AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tower::ServiceExt;

/// A local HTTP proxy that answers every absolute-form request itself.
///
/// The requested URI, method and user agent are echoed back in
/// `x-proxied-uri`, `x-proxied-method` and `x-proxied-user-agent`.
pub struct TestProxy {
    pub status: StatusCode,
    pub body: Bytes,
    pub delay: Duration,
}

impl Default for TestProxy {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: Bytes::from_static(b"hello through the proxy"),
            delay: Duration::ZERO,
        }
    }
}

impl TestProxy {
    pub async fn spawn(self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (status, body, delay) = (self.status, self.body.clone(), self.delay);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let body = body.clone();
                        async move {
                            tokio::time::sleep(delay).await;
                            let user_agent = req
                                .headers()
                                .get("user-agent")
                                .and_then(|ua| ua.to_str().ok())
                                .unwrap_or_default()
                                .to_owned();
                            let response = Response::builder()
                                .status(status)
                                .header("x-proxied-user-agent", user_agent)
                                .header("x-proxied-uri", req.uri().to_string())
                                .header("x-proxied-method", req.method().as_str())
                                .body(Full::new(body))
                                .unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        addr
    }
}

/// A local SOCKS relay speaking a single protocol version (4 or 5).
///
/// Only `CONNECT` without authentication is supported; anything else closes
/// the connection.
pub struct SocksRelay {
    pub version: u8,
}

impl SocksRelay {
    pub async fn spawn(self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let version = self.version;

        tokio::spawn(async move {
            while let Ok((mut inbound, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let outbound = match version {
                        4 => socks4_connect(&mut inbound).await,
                        _ => socks5_connect(&mut inbound).await,
                    };
                    if let Ok(mut outbound) = outbound {
                        let _ = copy_bidirectional(&mut inbound, &mut outbound).await;
                    }
                });
            }
        });

        addr
    }
}

async fn socks4_connect(inbound: &mut TcpStream) -> io::Result<TcpStream> {
    if inbound.read_u8().await? != 4 || inbound.read_u8().await? != 1 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "not a SOCKS4 CONNECT"));
    }
    let port = inbound.read_u16().await?;
    let ip = Ipv4Addr::from(inbound.read_u32().await?);
    // user id, NUL terminated
    while inbound.read_u8().await? != 0 {}

    match TcpStream::connect((ip, port)).await {
        Ok(outbound) => {
            inbound.write_all(&[0, 90, 0, 0, 0, 0, 0, 0]).await?;
            Ok(outbound)
        }
        Err(e) => {
            inbound.write_all(&[0, 91, 0, 0, 0, 0, 0, 0]).await?;
            Err(e)
        }
    }
}

async fn socks5_connect(inbound: &mut TcpStream) -> io::Result<TcpStream> {
    if inbound.read_u8().await? != 5 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "not SOCKS5"));
    }
    let mut methods = vec![0u8; inbound.read_u8().await? as usize];
    inbound.read_exact(&mut methods).await?;
    if !methods.contains(&0) {
        inbound.write_all(&[5, 0xff]).await?;
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "no usable method"));
    }
    inbound.write_all(&[5, 0]).await?;

    let mut head = [0u8; 4];
    inbound.read_exact(&mut head).await?;
    if head[1] != 1 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "not a CONNECT"));
    }
    let outbound = match head[3] {
        1 => {
            let ip = Ipv4Addr::from(inbound.read_u32().await?);
            let port = inbound.read_u16().await?;
            TcpStream::connect((ip, port)).await
        }
        3 => {
            let mut name = vec![0u8; inbound.read_u8().await? as usize];
            inbound.read_exact(&mut name).await?;
            let port = inbound.read_u16().await?;
            let name = String::from_utf8_lossy(&name).into_owned();
            TcpStream::connect((name.as_str(), port)).await
        }
        4 => {
            let ip = Ipv6Addr::from(inbound.read_u128().await?);
            let port = inbound.read_u16().await?;
            TcpStream::connect((ip, port)).await
        }
        _ => Err(io::Error::new(io::ErrorKind::InvalidData, "bad address type")),
    };

    let reply = if outbound.is_ok() { 0 } else { 5 };
    inbound
        .write_all(&[5, reply, 0, 1, 0, 0, 0, 0, 0, 0])
        .await?;
    outbound
}

/// Returns an address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn app(config: Config) -> Router {
    server::router(&config)
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.client.request_timeout = 5_000;
    config.client.connect_timeout = 2_000;
    config
}

pub async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = ApiRequest::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn post_raw(
    app: &Router,
    path: &str,
    content_type: Option<&str>,
    body: &str,
) -> (StatusCode, Value) {
    let mut request = ApiRequest::builder().method("POST").uri(path);
    if let Some(content_type) = content_type {
        request = request.header("content-type", content_type);
    }
    let request = request.body(Body::from(body.to_owned())).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

pub async fn get_text(app: &Router, path: &str) -> (StatusCode, String) {
    let request = ApiRequest::builder().uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
