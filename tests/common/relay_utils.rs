use chess3d::messages::{FramedMessage, WireConfig};
use chess3d::network::RelayServer;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// A relay running on an ephemeral port
pub struct TestRelay {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestRelay {
    pub async fn start() -> Self {
        let server = RelayServer::bind("127.0.0.1:0", WireConfig::default())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async move {
            let _ = rx.await;
        }));
        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let result = timeout(IO_TIMEOUT, &mut self.handle).await;
        assert!(result.is_ok(), "relay did not shut down");
    }
}

/// Read one frame's raw bytes (prefix included) from a plain socket
pub async fn read_raw_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut prefix = [0u8; 4];
    timeout(IO_TIMEOUT, stream.read_exact(&mut prefix))
        .await
        .expect("timed out reading prefix")
        .unwrap();
    let len = u32::from_be_bytes(prefix) as usize;
    let mut payload = vec![0u8; len];
    timeout(IO_TIMEOUT, stream.read_exact(&mut payload))
        .await
        .expect("timed out reading payload")
        .unwrap();

    let mut frame = prefix.to_vec();
    frame.extend_from_slice(&payload);
    frame
}

pub async fn read_text(stream: &mut TcpStream) -> String {
    let framed = FramedMessage::default();
    timeout(IO_TIMEOUT, framed.read_text(stream))
        .await
        .expect("timed out reading frame")
        .unwrap()
}

pub async fn write_text(stream: &mut TcpStream, text: &str) {
    FramedMessage::default()
        .write_frame(stream, text.as_bytes())
        .await
        .unwrap();
}

/// Connect two raw peers and return them as (white, black)
pub async fn paired_peers(addr: SocketAddr) -> (TcpStream, TcpStream) {
    let mut first = TcpStream::connect(addr).await.unwrap();
    let mut second = TcpStream::connect(addr).await.unwrap();

    let first_color = read_text(&mut first).await;
    let second_color = read_text(&mut second).await;
    assert_ne!(first_color, second_color);

    match first_color.as_str() {
        "white" => (first, second),
        "black" => (second, first),
        other => panic!("unexpected color assignment {:?}", other),
    }
}
