//! Connects to a TCP peer, prints what it sends, and writes a keep-alive
//! marker every few seconds until the peer goes away.
//!
//! ```text
//! nc -lk 7000 &
//! RUST_LOG=mill_stream=debug cargo run --example keepalive_client -- 127.0.0.1:7000
//! ```

use mill_stream::{ClientState, EventLoop, StreamClient};
use mio::Token;
use std::{
    env,
    net::SocketAddr,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

const CLIENT: Token = Token(1);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mill_stream=info")),
        )
        .init();

    let addr: SocketAddr = env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7000".to_string())
        .parse()?;

    let mut event_loop = EventLoop::default();
    let mut client = StreamClient::new(CLIENT);

    client.on_connect(|client, _| {
        if let Ok(peer) = client.peer_addr() {
            println!("connected to {peer}");
        }
    });
    client.on_read(|_, _, data| {
        println!("received: {}", String::from_utf8_lossy(data));
    });
    client.on_eof(|_, _, _| println!("peer closed the connection"));
    client.on_error(|_, _, err| eprintln!("error {}: {}", err.code(), err));

    if let Err(e) = client.connect(&mut event_loop, addr) {
        eprintln!("could not start connecting: {e}");
        return Ok(());
    }

    let mut last_keepalive = Instant::now();
    while client.state() != ClientState::Init {
        event_loop.run_once(Some(Duration::from_millis(250)), &mut client)?;

        if client.is_connected() && last_keepalive.elapsed() >= KEEPALIVE_INTERVAL {
            if let Err(e) = client.keepalive() {
                eprintln!("keep-alive failed: {e}");
                client.disconnect(&mut event_loop);
            }
            last_keepalive = Instant::now();
        }
    }

    client.close(&mut event_loop);
    Ok(())
}
