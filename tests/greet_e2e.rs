use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use greet_stream::duplex::{DuplexCoordinator, ExchangeConfig, ExchangeError, ResponseObserver};
use greet_stream::greet_proto::HelloResponse;
use greet_stream::grpc::{ClientConfig, GreetClient, ServerConfig, serve};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::transport::Channel;
use url::Url;

const NAMES: [&str; 3] = ["Yatharth", "Alice", "Bob"];

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl ResponseObserver<HelloResponse> for Recorder {
    fn on_response(&mut self, _index: u64, response: &HelloResponse) {
        self.0.lock().unwrap().push(response.message.clone());
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown, stopped) = oneshot::channel::<()>();

        let config = ServerConfig::builder()
            .addr(addr)
            .stream_delay(Duration::ZERO)
            .build();
        tokio::spawn(async move {
            serve(listener, config, async move {
                let _ = stopped.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            shutdown: Some(shutdown),
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::builder()
            .endpoint(Url::parse(&format!("http://{}", self.addr)).unwrap())
            .names(names())
            .exchange(
                ExchangeConfig::builder()
                    .inter_message_delay(Duration::ZERO)
                    .timeout(Duration::from_secs(10))
                    .build(),
            )
            .build()
    }

    async fn client(&self) -> GreetClient {
        GreetClient::connect(self.client_config()).await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn names() -> Vec<String> {
    NAMES.iter().map(|name| name.to_string()).collect()
}

fn greetings() -> Vec<String> {
    NAMES.iter().map(|name| format!("Hello {name}")).collect()
}

#[tokio::test]
async fn unary_call_says_hello() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    assert_eq!(client.say_hello().await.unwrap(), "Hello");
}

#[tokio::test]
async fn server_streaming_greets_each_name() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let recorder = Recorder::default();

    let received = client
        .say_hello_server_streaming(names(), recorder.clone())
        .await
        .unwrap();

    assert_eq!(received, 3);
    assert_eq!(recorder.messages(), greetings());
}

#[tokio::test]
async fn client_streaming_collects_greetings() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let messages = client
        .say_hello_client_streaming(names(), Duration::from_millis(5))
        .await
        .unwrap();

    assert_eq!(messages, greetings());
}

#[tokio::test]
async fn bidirectional_exchange_echoes_in_order() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let recorder = Recorder::default();
    let coordinator = DuplexCoordinator::new(client.config().exchange.clone());

    let summary = client
        .say_hello_bidirectional_streaming(names(), &coordinator, recorder.clone())
        .await
        .unwrap();

    assert_eq!(summary.sent, 3);
    assert_eq!(summary.received, 3);
    assert_eq!(recorder.messages(), greetings());
}

#[tokio::test]
async fn bidirectional_exchange_with_no_names_completes() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let recorder = Recorder::default();
    let coordinator = DuplexCoordinator::new(client.config().exchange.clone());

    let summary = client
        .say_hello_bidirectional_streaming(Vec::new(), &coordinator, recorder.clone())
        .await
        .unwrap();

    assert_eq!(summary.sent, 0);
    assert_eq!(summary.received, 0);
    assert!(recorder.messages().is_empty());
}

#[tokio::test]
async fn bidirectional_exchange_reports_open_failure() {
    // Reserve a port, then release it so nothing is listening there.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let config = ClientConfig::builder()
        .endpoint(Url::parse(&format!("http://{addr}")).unwrap())
        .build();
    let channel = Channel::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect_lazy();
    let mut client = GreetClient::with_channel(channel, config);
    let coordinator = DuplexCoordinator::new(ExchangeConfig::default());

    let result = client
        .say_hello_bidirectional_streaming(names(), &coordinator, Recorder::default())
        .await;

    assert!(matches!(result, Err(ExchangeError::StreamOpen(_))));
}
