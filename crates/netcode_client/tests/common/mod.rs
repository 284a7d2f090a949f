//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use netcode_client::{
    Client, ClientConfig, Connector, DecodeResult, Drain, MemoryServer, MemoryTransport,
    OpcodeRegistry, Packet, PacketReader, PacketWriter, RegistryBuilder,
};

pub const PING: u8 = 0x01;
pub const MOVE: u8 = 0x02;
pub const BLOB: u8 = 0x03;

/// Application context the handlers mutate.
#[derive(Debug, Default)]
pub struct Game {
    pub pings: u32,
    pub moves: Vec<(i32, i32)>,
    pub blobs: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct Ping;

impl Packet<Game> for Ping {
    fn handle(&self, ctx: &mut Game) {
        ctx.pings += 1;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub x: i32,
    pub y: i32,
}

impl Packet<Game> for Move {
    fn write(&self, writer: &mut PacketWriter) {
        writer.write_i32(self.x);
        writer.write_i32(self.y);
    }

    fn read(&mut self, reader: &mut PacketReader) -> DecodeResult<()> {
        self.x = reader.read_i32()?;
        self.y = reader.read_i32()?;
        Ok(())
    }

    fn handle(&self, ctx: &mut Game) {
        ctx.moves.push((self.x, self.y));
    }
}

/// Opaque payload filling the rest of the packet.
#[derive(Debug, Default)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Packet<Game> for Blob {
    fn write(&self, writer: &mut PacketWriter) {
        writer.write_raw(&self.data);
    }

    fn read(&mut self, reader: &mut PacketReader) -> DecodeResult<()> {
        self.data = reader.read_remaining();
        Ok(())
    }

    fn handle(&self, ctx: &mut Game) {
        ctx.blobs.push(self.data.len());
    }
}

/// Never registered.
#[derive(Debug, Default)]
pub struct Unregistered;

impl Packet<Game> for Unregistered {}

pub fn registry() -> Arc<OpcodeRegistry<Game>> {
    Arc::new(
        RegistryBuilder::new()
            .register::<Ping>(PING)
            .unwrap()
            .register::<Move>(MOVE)
            .unwrap()
            .register::<Blob>(BLOB)
            .unwrap()
            .build(),
    )
}

/// Short service wait so tests are not paced by the worker.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        service_timeout_ms: 2,
        ..ClientConfig::default()
    }
}

pub fn client_with(
    server: &MemoryServer,
    config: ClientConfig,
) -> Client<Game, impl Connector<Transport = MemoryTransport>> {
    Client::new(registry(), config, server.connector())
}

pub fn client(server: &MemoryServer) -> Client<Game, impl Connector<Transport = MemoryTransport>> {
    client_with(server, fast_config())
}

/// Polls `condition` until it holds or two seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Drains repeatedly, accumulating, until `done` holds for the total.
pub fn drain_until<K: Connector>(
    client: &mut Client<Game, K>,
    game: &mut Game,
    done: impl Fn(&Drain) -> bool,
) -> Drain {
    let mut total = Drain::default();
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let drain = client.drain_and_handle(game);
        total.handled += drain.handled;
        total.failed += drain.failed;
        total.events.extend(drain.events);
        if done(&total) || Instant::now() >= deadline {
            return total;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

/// Connects and waits for the server to accept.
pub fn connect_and_accept<K: Connector>(
    client: &mut Client<Game, K>,
    server: &MemoryServer,
    game: &mut Game,
) {
    client.connect("localhost", 7777, &[]).unwrap();
    server.accept();
    assert!(wait_until(|| client.is_connected()));
    let drain = drain_until(client, game, |d| !d.events.is_empty());
    assert_eq!(drain.events, vec![netcode_client::ClientEvent::Connected]);
}
