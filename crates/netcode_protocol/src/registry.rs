//! # Opcode Registry
//!
//! Static mapping packet type ↔ single-byte opcode, plus the codec built on it.
//!
//! ## Design
//!
//! - Built once with [`RegistryBuilder`], immutable afterwards
//! - Opcode lookup is a direct index into a 256-slot table
//! - Every decoded packet gets a fresh handler instance from the type's
//!   factory, so no handler state is shared between packets or threads

use std::collections::HashMap;
use std::fmt;

use crate::error::{DecodeError, DecodeResult, EncodeError, RegistryError};
use crate::packet::{Packet, PacketKind};
use crate::reader::PacketReader;
use crate::writer::PacketWriter;
use crate::MAX_PACKET_SIZE;

type Factory<C> = fn() -> Box<dyn Packet<C>>;

fn make<C, P>() -> Box<dyn Packet<C>>
where
    P: Packet<C> + Default,
{
    Box::<P>::default()
}

struct Entry<C> {
    kind: PacketKind,
    factory: Factory<C>,
}

/// Builder for an [`OpcodeRegistry`].
pub struct RegistryBuilder<C> {
    slots: Vec<Option<Entry<C>>>,
    opcodes: HashMap<PacketKind, u8>,
    max_packet_size: usize,
}

impl<C: 'static> RegistryBuilder<C> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(256);
        slots.resize_with(256, || None);
        Self {
            slots,
            opcodes: HashMap::new(),
            max_packet_size: MAX_PACKET_SIZE,
        }
    }

    /// Maps packet type `P` to `opcode`.
    pub fn register<P>(mut self, opcode: u8) -> Result<Self, RegistryError>
    where
        P: Packet<C> + Default,
    {
        let kind = PacketKind::of::<P>();

        if self.opcodes.contains_key(&kind) {
            return Err(RegistryError::DuplicateType(kind.name()));
        }
        if let Some(existing) = &self.slots[usize::from(opcode)] {
            return Err(RegistryError::DuplicateOpcode {
                opcode,
                existing: existing.kind.name(),
                rejected: kind.name(),
            });
        }

        self.slots[usize::from(opcode)] = Some(Entry {
            kind,
            factory: make::<C, P>,
        });
        self.opcodes.insert(kind, opcode);
        Ok(self)
    }

    /// Overrides the maximum packet size (opcode included).
    #[must_use]
    pub fn max_packet_size(mut self, max: usize) -> Self {
        self.max_packet_size = max;
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> OpcodeRegistry<C> {
        OpcodeRegistry {
            slots: self.slots,
            opcodes: self.opcodes,
            max_packet_size: self.max_packet_size,
        }
    }
}

impl<C: 'static> Default for RegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable opcode table.
///
/// Shared between the application thread and the connection worker.
pub struct OpcodeRegistry<C> {
    slots: Vec<Option<Entry<C>>>,
    opcodes: HashMap<PacketKind, u8>,
    max_packet_size: usize,
}

impl<C: 'static> OpcodeRegistry<C> {
    /// Returns the number of registered packet types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    /// Returns true if nothing was registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    /// Maximum packet size accepted on encode and on receive.
    #[inline]
    #[must_use]
    pub const fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Looks up the opcode of a packet type.
    #[must_use]
    pub fn opcode_of(&self, kind: PacketKind) -> Option<u8> {
        self.opcodes.get(&kind).copied()
    }

    /// Looks up the packet type of an opcode.
    #[must_use]
    pub fn kind_of(&self, opcode: u8) -> Option<PacketKind> {
        self.slots[usize::from(opcode)].as_ref().map(|e| e.kind)
    }

    /// Encodes `packet` as opcode + payload.
    pub fn encode<P: Packet<C>>(&self, packet: &P) -> Result<EncodedPacket, EncodeError> {
        let kind = PacketKind::of::<P>();
        let opcode = self
            .opcode_of(kind)
            .ok_or(EncodeError::Unregistered(kind.name()))?;

        let mut writer = PacketWriter::with_opcode(opcode);
        packet.write(&mut writer);

        if writer.len() > self.max_packet_size {
            return Err(EncodeError::TooLarge {
                kind: kind.name(),
                size: writer.len(),
                max: self.max_packet_size,
            });
        }

        Ok(EncodedPacket {
            opcode,
            bytes: writer.into_bytes(),
        })
    }

    /// Reads the opcode of a raw packet and pairs it with a fresh handler.
    ///
    /// The payload itself is not read here; see [`DecodedPacket::read`].
    pub fn decode(&self, raw: Vec<u8>) -> DecodeResult<DecodedPacket<C>> {
        let mut reader = PacketReader::new(raw);
        let opcode = reader.read_u8().map_err(|_| DecodeError::Empty)?;
        let entry = self.slots[usize::from(opcode)]
            .as_ref()
            .ok_or(DecodeError::UnknownOpcode(opcode))?;

        Ok(DecodedPacket {
            kind: entry.kind,
            opcode,
            reader,
            handler: (entry.factory)(),
        })
    }
}

impl<C> fmt::Debug for OpcodeRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (opcode, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot {
                map.entry(&opcode, &entry.kind.name());
            }
        }
        map.finish()
    }
}

/// Bytes of an outbound packet, opcode first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPacket {
    /// Opcode of the packet type.
    pub opcode: u8,
    /// Opcode followed by the payload.
    pub bytes: Vec<u8>,
}

/// An inbound packet whose opcode has been resolved.
///
/// Holds the type identifier, a reader positioned just past the opcode and
/// a fresh handler instance. Consumed exactly once.
pub struct DecodedPacket<C> {
    kind: PacketKind,
    opcode: u8,
    reader: PacketReader,
    handler: Box<dyn Packet<C>>,
}

impl<C: 'static> DecodedPacket<C> {
    /// Packet type.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> PacketKind {
        self.kind
    }

    /// Opcode the packet arrived with.
    #[inline]
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Reader positioned after the opcode.
    #[inline]
    #[must_use]
    pub const fn reader(&self) -> &PacketReader {
        &self.reader
    }

    /// Reads the payload into the handler and returns the populated handler.
    ///
    /// The reader is dropped afterwards.
    pub fn read(self) -> DecodeResult<Box<dyn Packet<C>>> {
        let Self {
            mut reader,
            mut handler,
            ..
        } = self;
        handler.read(&mut reader)?;
        Ok(handler)
    }
}

impl<C> fmt::Debug for DecodedPacket<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedPacket")
            .field("kind", &self.kind.name())
            .field("opcode", &self.opcode)
            .field("len", &self.reader.packet_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeResult;

    #[derive(Default)]
    struct Game {
        pings: u32,
        moves: Vec<(i32, i32)>,
    }

    #[derive(Debug, Default)]
    struct Ping;

    impl Packet<Game> for Ping {
        fn handle(&self, ctx: &mut Game) {
            ctx.pings += 1;
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Move {
        x: i32,
        y: i32,
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

    #[derive(Debug, Default)]
    struct Chat {
        text: String,
    }

    impl Packet<Game> for Chat {
        fn write(&self, writer: &mut PacketWriter) {
            writer.write_str(&self.text);
        }

        fn read(&mut self, reader: &mut PacketReader) -> DecodeResult<()> {
            self.text = reader.read_string()?;
            Ok(())
        }
    }

    fn registry() -> OpcodeRegistry<Game> {
        RegistryBuilder::new()
            .register::<Ping>(0x01)
            .unwrap()
            .register::<Move>(0x02)
            .unwrap()
            .register::<Chat>(0x03)
            .unwrap()
            .build()
    }

    #[test]
    fn test_lookup_both_ways() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.opcode_of(PacketKind::of::<Move>()), Some(0x02));
        assert_eq!(registry.kind_of(0x01), Some(PacketKind::of::<Ping>()));
        assert_eq!(registry.kind_of(0x04), None);
    }

    #[test]
    fn test_round_trip_applies_handler() {
        let registry = registry();
        let mut game = Game::default();

        let ping = registry.encode(&Ping).unwrap();
        assert_eq!(ping.bytes, vec![0x01]);
        let decoded = registry.decode(ping.bytes).unwrap();
        assert_eq!(decoded.kind(), PacketKind::of::<Ping>());
        decoded.read().unwrap().handle(&mut game);

        let moved = registry.encode(&Move { x: -3, y: 9 }).unwrap();
        assert_eq!(moved.opcode, 0x02);
        let decoded = registry.decode(moved.bytes).unwrap();
        assert_eq!(decoded.kind(), PacketKind::of::<Move>());
        decoded.read().unwrap().handle(&mut game);

        assert_eq!(game.pings, 1);
        assert_eq!(game.moves, vec![(-3, 9)]);
    }

    #[test]
    fn test_round_trip_reproduces_payload() {
        let registry = registry();
        let chat = Chat {
            text: "the dragon wakes".to_string(),
        };

        let encoded = registry.encode(&chat).unwrap();
        let decoded = registry.decode(encoded.bytes.clone()).unwrap();
        assert_eq!(decoded.reader().as_slice(), &encoded.bytes[1..]);

        let handler = decoded.read().unwrap();
        assert!(format!("{handler:?}").contains("the dragon wakes"));
    }

    #[test]
    fn test_each_decode_gets_fresh_handler() {
        let registry = registry();
        let first = registry.encode(&Move { x: 1, y: 1 }).unwrap();
        let second = registry.encode(&Move { x: 2, y: 2 }).unwrap();

        let a = registry.decode(first.bytes).unwrap();
        let b = registry.decode(second.bytes).unwrap();

        let mut game = Game::default();
        b.read().unwrap().handle(&mut game);
        a.read().unwrap().handle(&mut game);
        assert_eq!(game.moves, vec![(2, 2), (1, 1)]);
    }

    #[test]
    fn test_unknown_opcode() {
        let registry = registry();
        let err = registry.decode(vec![0xFF, 1, 2]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOpcode(0xFF));
    }

    #[test]
    fn test_empty_packet() {
        let registry = registry();
        assert_eq!(registry.decode(Vec::new()).unwrap_err(), DecodeError::Empty);
    }

    #[test]
    fn test_truncated_payload_fails_on_read() {
        let registry = registry();
        let decoded = registry.decode(vec![0x02, 1, 0]).unwrap();
        assert!(matches!(
            decoded.read(),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_unregistered_type_fails_encode() {
        let registry = RegistryBuilder::<Game>::new()
            .register::<Ping>(0x01)
            .unwrap()
            .build();
        let err = registry.encode(&Move { x: 0, y: 0 }).unwrap_err();
        assert_eq!(err, EncodeError::Unregistered("Move"));
    }

    #[test]
    fn test_oversized_encode_rejected() {
        let registry = RegistryBuilder::<Game>::new()
            .register::<Chat>(0x03)
            .unwrap()
            .max_packet_size(16)
            .build();

        // 1 opcode + 4 length + 11 text = 16 bytes: exactly at the limit
        let fits = Chat {
            text: "x".repeat(11),
        };
        assert_eq!(registry.encode(&fits).unwrap().bytes.len(), 16);

        let over = Chat {
            text: "x".repeat(12),
        };
        assert_eq!(
            registry.encode(&over).unwrap_err(),
            EncodeError::TooLarge {
                kind: "Chat",
                size: 17,
                max: 16
            }
        );
    }

    #[test]
    fn test_duplicate_opcode_rejected() {
        let result = RegistryBuilder::<Game>::new()
            .register::<Ping>(0x01)
            .unwrap()
            .register::<Move>(0x01);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateOpcode {
                opcode: 0x01,
                existing: "Ping",
                rejected: "Move"
            })
        ));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let result = RegistryBuilder::<Game>::new()
            .register::<Ping>(0x01)
            .unwrap()
            .register::<Ping>(0x02);
        assert!(matches!(result, Err(RegistryError::DuplicateType("Ping"))));
    }
}
