//! # Packet Definitions
//!
//! The [`Packet`] trait, packet type identifiers and delivery modes.
//!
//! A packet type is a plain struct. It writes itself when sent, reads itself
//! when received, and applies itself to the application context `C` when the
//! application drains the client. All three methods default to "no payload,
//! no effect", so a marker packet such as a ping needs no code at all.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::DecodeResult;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

/// A typed game packet.
///
/// `C` is the application context handed to [`Packet::handle`]. Handlers only
/// ever run on the application thread, inside the client's drain call.
pub trait Packet<C>: Send + fmt::Debug + 'static {
    /// Writes the payload (everything after the opcode).
    fn write(&self, _writer: &mut PacketWriter) {}

    /// Reads the payload (everything after the opcode) into `self`.
    fn read(&mut self, _reader: &mut PacketReader) -> DecodeResult<()> {
        Ok(())
    }

    /// Applies the packet to the application.
    fn handle(&self, _ctx: &mut C) {}
}

/// Identifier of a packet type.
///
/// Equality and hashing use the [`TypeId`] only; the name is for logs.
#[derive(Clone, Copy, Debug)]
pub struct PacketKind {
    type_id: TypeId,
    name: &'static str,
}

impl PacketKind {
    /// Returns the identifier of packet type `P`.
    #[must_use]
    pub fn of<P: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            name: short_name(type_name::<P>()),
        }
    }

    /// Short type name, without the module path.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Underlying type identifier.
    #[inline]
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for PacketKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for PacketKind {}

impl Hash for PacketKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn short_name(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

/// Reliability requested for an outbound packet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeliveryMode {
    /// Delivered in order, retransmitted until acknowledged.
    #[default]
    Reliable = 0,
    /// Fire and forget.
    Unreliable = 1,
}

impl DeliveryMode {
    /// Returns true for [`DeliveryMode::Reliable`].
    #[inline]
    #[must_use]
    pub const fn is_reliable(self) -> bool {
        matches!(self, Self::Reliable)
    }
}
