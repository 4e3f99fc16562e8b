//! Order submission against a canned HTTP server.

use desk_core::Symbol;
use desk_portfolio::{OrderGateway, OrderOutcome, OrderSide, PortfolioClient, PortfolioError};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response on a fresh port, then stop.
async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            // Drain the request head; order commands carry no body.
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
    format!("http://{addr}")
}

fn gateway(base_url: String) -> OrderGateway {
    OrderGateway::new(Arc::new(PortfolioClient::new(base_url).unwrap()))
}

#[tokio::test]
async fn test_rejected_sell_surfaces_reason_and_keeps_no_local_mutation() {
    let base_url = one_shot_server(
        "HTTP/1.1 400 Bad Request",
        r#"{"error": "insufficient shares"}"#,
    )
    .await;
    let gateway = gateway(base_url);
    let symbol = Symbol::new("TSLA").unwrap();

    let err = gateway.sell(&symbol).await.unwrap_err();
    match err {
        PortfolioError::OrderRejected(reason) => assert_eq!(reason, "insufficient shares"),
        other => panic!("expected OrderRejected, got {other:?}"),
    }

    let record = gateway.last_result().unwrap();
    assert_eq!(record.side, OrderSide::Sell);
    assert_eq!(record.symbol, symbol);
    assert!(matches!(
        &record.outcome,
        OrderOutcome::Rejected { reason } if reason == "insufficient shares"
    ));
}

#[tokio::test]
async fn test_accepted_buy_is_recorded() {
    let base_url = one_shot_server("HTTP/1.1 200 OK", "{}").await;
    let gateway = gateway(base_url);
    let symbol = Symbol::new("AAPL").unwrap();

    gateway.buy(&symbol).await.unwrap();

    let record = gateway.last_result().unwrap();
    assert_eq!(record.side, OrderSide::Buy);
    assert_eq!(record.outcome, OrderOutcome::Accepted);
}
