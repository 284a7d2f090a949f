//! # Loopback Demo
//!
//! Drives a client against the in-memory server for one short session:
//! connect, exchange a few packets, get kicked, reconnect, stop.

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use netcode_client::{
    Client, ClientConfig, ClientEvent, Connector, DecodeResult, DeliveryMode, MemoryServer,
    Packet, PacketKind, PacketReader, PacketWriter, RegistryBuilder,
};

#[derive(Debug, Default)]
struct Lobby {
    pongs: u32,
    chat: Vec<String>,
}

#[derive(Debug, Default)]
struct Ping;

impl Packet<Lobby> for Ping {}

#[derive(Debug, Default)]
struct Pong;

impl Packet<Lobby> for Pong {
    fn handle(&self, ctx: &mut Lobby) {
        ctx.pongs += 1;
    }
}

#[derive(Debug, Default)]
struct ChatMessage {
    from: String,
    text: String,
}

impl Packet<Lobby> for ChatMessage {
    fn write(&self, writer: &mut PacketWriter) {
        writer.write_str(&self.from);
        writer.write_str(&self.text);
    }

    fn read(&mut self, reader: &mut PacketReader) -> DecodeResult<()> {
        self.from = reader.read_string()?;
        self.text = reader.read_string()?;
        Ok(())
    }

    fn handle(&self, ctx: &mut Lobby) {
        ctx.chat.push(format!("<{}> {}", self.from, self.text));
    }
}

/// Drains until `done` holds or the deadline passes.
fn pump<K: Connector>(
    client: &mut Client<Lobby, K>,
    lobby: &mut Lobby,
    done: impl Fn(&Client<Lobby, K>, &[ClientEvent]) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        let drain = client.drain_and_handle(lobby);
        for event in &drain.events {
            println!("  event: {event:?}");
        }
        events.extend(drain.events);
        if done(client, &events) {
            return true;
        }
        // One application tick
        thread::sleep(Duration::from_millis(16));
    }
    false
}

fn run() -> Result<(), Box<dyn Error>> {
    let registry = Arc::new(
        RegistryBuilder::<Lobby>::new()
            .register::<Ping>(0x01)?
            .register::<Pong>(0x02)?
            .register::<ChatMessage>(0x03)?
            .build(),
    );
    println!("Registry: {registry:?}");

    let server = MemoryServer::new();
    let config = ClientConfig {
        service_timeout_ms: 5,
        ..ClientConfig::default()
    };
    let mut client = Client::new(Arc::clone(&registry), config, server.connector());
    let mut lobby = Lobby::default();

    println!("\n[1] Connect and queue pings before the server answers");
    client.connect("127.0.0.1", 7777, &[PacketKind::of::<Ping>()])?;
    for _ in 0..3 {
        client.send(&Ping, DeliveryMode::Reliable)?;
    }
    println!("  state: {}", client.state());
    server.accept();
    if !pump(&mut client, &mut lobby, |c, _| c.is_connected()) {
        return Err("client never connected".into());
    }

    let mut pings = 0;
    while let Some(sent) = server.recv_sent(Duration::from_millis(200)) {
        println!(
            "  server got opcode 0x{:02X} ({} bytes)",
            sent.opcode().unwrap_or(0),
            sent.data.len()
        );
        pings += 1;
        if pings == 3 {
            break;
        }
    }

    println!("\n[2] Server replies");
    let chat = registry.encode(&ChatMessage {
        from: "server".to_string(),
        text: "welcome".to_string(),
    })?;
    server.deliver(registry.encode(&Pong)?.bytes);
    server.deliver(chat.bytes);
    server.deliver(vec![0xFF, 0x00]);
    // The unknown opcode is counted after both valid packets are queued
    pump(&mut client, &mut lobby, |c, _| c.stats().decode_errors >= 1);
    let drain = client.drain_and_handle(&mut lobby);
    println!("  late drain: {} handled", drain.handled);
    println!("  pongs: {}, chat: {:?}", lobby.pongs, lobby.chat);

    println!("\n[3] Server kicks the client");
    server.kick(1);
    pump(&mut client, &mut lobby, |c, events| {
        !c.state().is_active() && !events.is_empty()
    });
    println!("  state: {}", client.state());

    println!("\n[4] Reconnect, then stop twice");
    client.connect("127.0.0.1", 7777, &[])?;
    server.accept();
    pump(&mut client, &mut lobby, |c, _| c.is_connected());
    client.stop();
    client.stop();
    pump(&mut client, &mut lobby, |c, _| !c.state().is_active());
    println!("  graceful disconnects sent: {}", server.disconnect_calls());

    println!("\n{:?}", client.stats());
    Ok(())
}

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║              NETCODE CLIENT - LOOPBACK DEMO                      ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");

    if let Err(err) = run() {
        eprintln!("Demo failed: {err}");
        std::process::exit(1);
    }
}
