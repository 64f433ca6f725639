//! Minimal end-to-end demo: one routed RPC over the in-process bus.
//!
//! A "room" server is subscribed on the bus, the client resolves the route
//! through discovery and sends one request, then the client shuts down. Run
//! with `--fail` to see the application error channel instead of a payload,
//! or `--linger` to keep the client alive until ctrl-c.
//!
//! ```bash
//! cargo run -p subrpc-client --example basic
//! cargo run -p subrpc-client --example basic -- --fail
//! RUST_LOG=debug cargo run -p subrpc-client --example basic
//! ```

use std::sync::Arc;

use argh::FromArgs;
use subrpc_client::protocol::{EnvelopeCodec, ErrorPayload, Message, Request, Response};
use subrpc_client::{
    ClientConfig, Discovery, MemoryBus, MemoryTransport, RpcClient, ServerIdentity,
    StaticDiscovery,
};

#[derive(FromArgs)]
/// Send one routed RPC over an in-process bus and print the reply.
struct Args {
    /// route to call
    #[argh(option, default = "String::from(\"room.room.join\")")]
    route: String,

    /// payload to send
    #[argh(option, default = "String::from(\"Some data to be sent\")")]
    data: String,

    /// make the server answer with an application error
    #[argh(switch)]
    fail: bool,

    /// stay registered until ctrl-c instead of shutting down immediately
    #[argh(switch)]
    linger: bool,
}

fn serve_room(bus: &MemoryBus, discovery: &StaticDiscovery, room: &ServerIdentity, fail: bool) {
    let codec = EnvelopeCodec::new();
    bus.subscribe(discovery.subject_for(room), move |bytes| async move {
        let request = codec.decode_request(&bytes).expect("malformed request envelope");
        let route = request.message.as_ref().map(|m| m.route.clone()).unwrap_or_default();
        println!("server: handling {route}");

        let response = if fail {
            Response::err(
                ErrorPayload::new("PIT-404", "handler refused the call")
                    .with_metadata(serde_json::json!({ "route": route }).to_string()),
            )
        } else {
            Response::ok(b"HEY, THIS IS THE SERVER".to_vec())
        };
        codec.response_to_vec(&response).expect("encode response envelope")
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    let config = ClientConfig::default();

    // Default log level comes from the config; RUST_LOG overrides it.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let bus = MemoryBus::new();
    let discovery = Arc::new(StaticDiscovery::new(&config.discovery));

    // The serving side: a room server registered with discovery and
    // listening on its bus subject.
    let room = ServerIdentity::new("room-1", "room");
    discovery.register(&room).await?;
    serve_room(&bus, &discovery, &room, args.fail);

    let transport = Arc::new(MemoryTransport::new(bus.clone(), &config.transport));
    let identity = ServerIdentity::new("demo-client", "demo").with_metadata("random-metadata");
    let client =
        RpcClient::initialize(transport, discovery.clone(), config.clone(), identity).await?;

    let request = Request::user(Message::request(&args.route, args.data.into_bytes()))
        .with_metadata(b"{}".to_vec());

    let codec = EnvelopeCodec::new();
    let mut wire = [0u8; 256];
    let len = codec.encode_request(&request, &mut wire)?;
    println!("encoded request: {len} bytes");

    match client.send_rpc(&args.route, request).await {
        Ok(response) => match response.into_result() {
            Ok(payload) => println!("response: {}", String::from_utf8_lossy(&payload)),
            Err(error) => println!("application error: {error}"),
        },
        Err(e) => eprintln!("rpc failed: {e}"),
    }

    if args.linger {
        println!("press ctrl-c to shut down");
    } else {
        client.request_shutdown();
    }
    client.wait_for_shutdown_signal().await;
    client.shutdown(config.transport.shutdown_deadline()).await?;
    Ok(())
}
