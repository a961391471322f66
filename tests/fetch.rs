//! Fetcher integration tests.
//!
//! Each test serves its own body from a local listener on an ephemeral port.

use std::{fs, net::SocketAddr, path::Path};

use axum::{Router, http::StatusCode, routing::get};
use clipsight::{ClipsightError, FetchOptions, Fetcher};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    address
}

/// Serve one response with a chunked body and no `Content-Length`.
async fn spawn_chunked(chunks: Vec<Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;

        let mut response =
            b"HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
                .to_vec();
        for chunk in chunks {
            response.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
            response.extend_from_slice(&chunk);
            response.extend_from_slice(b"\r\n");
        }
        response.extend_from_slice(b"0\r\n\r\n");
        let _ = socket.write_all(&response).await;
        let _ = socket.shutdown().await;
    });
    address
}

fn entries(directory: &Path) -> usize {
    fs::read_dir(directory)
        .expect("Failed to read directory")
        .count()
}

#[tokio::test]
async fn downloads_body_within_limit() {
    let body = vec![7u8; 20_000];
    let expected = body.clone();
    let router = Router::new().route(
        "/clip.mp4",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let address = spawn_router(router).await;
    let directory = tempfile::tempdir().expect("Failed to create temp dir");

    let fetcher = Fetcher::new(FetchOptions::new().with_max_bytes(1024 * 1024));
    let handle = fetcher
        .download(&format!("http://{address}/clip.mp4"), directory.path())
        .await
        .expect("Download should succeed");

    assert_eq!(handle.byte_size, expected.len() as u64);
    assert!(handle.path.starts_with(directory.path()));
    assert_eq!(
        handle.path.extension().and_then(|extension| extension.to_str()),
        Some("mp4")
    );
    assert_eq!(fs::read(&handle.path).expect("Failed to read download"), expected);
}

#[tokio::test]
async fn declared_length_over_limit_is_rejected_before_writing() {
    let address = spawn_router(
        Router::new().route("/big.mp4", get(|| async { vec![0u8; 4096] })),
    )
    .await;
    let directory = tempfile::tempdir().expect("Failed to create temp dir");

    let fetcher = Fetcher::new(FetchOptions::new().with_max_bytes(1024));
    let error = fetcher
        .download(&format!("http://{address}/big.mp4"), directory.path())
        .await
        .unwrap_err();

    assert!(
        matches!(
            error,
            ClipsightError::SizeLimitExceeded {
                limit: 1024,
                observed: 4096
            }
        ),
        "unexpected error: {error}"
    );
    assert_eq!(entries(directory.path()), 0, "No file should be created");
}

#[tokio::test]
async fn undeclared_length_is_cut_off_at_limit() {
    let address = spawn_chunked(vec![vec![1u8; 600], vec![2u8; 600], vec![3u8; 600]]).await;
    let directory = tempfile::tempdir().expect("Failed to create temp dir");

    let fetcher = Fetcher::new(FetchOptions::new().with_max_bytes(1000));
    let error = fetcher
        .download(&format!("http://{address}/stream.mp4"), directory.path())
        .await
        .unwrap_err();

    match error {
        ClipsightError::SizeLimitExceeded { limit, observed } => {
            assert_eq!(limit, 1000);
            assert!(observed > limit);
        }
        other => panic!("Expected SizeLimitExceeded, got {other}"),
    }
}

#[tokio::test]
async fn undeclared_length_within_limit_succeeds() {
    let address = spawn_chunked(vec![vec![1u8; 300], vec![2u8; 300]]).await;
    let directory = tempfile::tempdir().expect("Failed to create temp dir");

    let fetcher = Fetcher::new(FetchOptions::new().with_max_bytes(1000).with_chunk_size(64));
    let handle = fetcher
        .download(&format!("http://{address}/stream.mp4"), directory.path())
        .await
        .expect("Download should succeed");

    assert_eq!(handle.byte_size, 600);
    let written = fs::read(&handle.path).expect("Failed to read download");
    assert_eq!(&written[..300], &[1u8; 300][..]);
    assert_eq!(&written[300..], &[2u8; 300][..]);
}

#[tokio::test]
async fn write_buffer_size_does_not_change_content() {
    let chunks = vec![vec![4u8; 700], vec![5u8; 13], vec![6u8; 2048]];
    let expected: Vec<u8> = chunks.concat();

    for chunk_size in [1, 100, 8192] {
        let address = spawn_chunked(chunks.clone()).await;
        let directory = tempfile::tempdir().expect("Failed to create temp dir");

        let fetcher = Fetcher::new(FetchOptions::new().with_chunk_size(chunk_size));
        assert_eq!(fetcher.options().chunk_size, chunk_size);
        let handle = fetcher
            .download(&format!("http://{address}/stream.mp4"), directory.path())
            .await
            .expect("Download should succeed");

        assert_eq!(handle.byte_size, expected.len() as u64);
        assert_eq!(fs::read(&handle.path).expect("Failed to read download"), expected);
    }
}

#[tokio::test]
async fn error_status_is_a_transport_error() {
    let address = spawn_router(
        Router::new().route("/missing.mp4", get(|| async { StatusCode::NOT_FOUND })),
    )
    .await;
    let directory = tempfile::tempdir().expect("Failed to create temp dir");

    let error = Fetcher::default()
        .download(&format!("http://{address}/missing.mp4"), directory.path())
        .await
        .unwrap_err();

    assert!(matches!(error, ClipsightError::Transport(_)), "unexpected error: {error}");
    assert!(error.to_string().starts_with("Failed to download video"));
    assert!(!error.is_client_error());
    assert_eq!(entries(directory.path()), 0);
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    // Bind and drop to get a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let address = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    let directory = tempfile::tempdir().expect("Failed to create temp dir");

    let error = Fetcher::default()
        .download(&format!("http://{address}/clip.mp4"), directory.path())
        .await
        .unwrap_err();

    assert!(matches!(error, ClipsightError::Transport(_)), "unexpected error: {error}");
}
