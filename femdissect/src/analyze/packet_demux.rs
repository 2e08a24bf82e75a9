//! Groups finalized [FemRecord]s into [PacketRecord]s at the packet sentinels.

use crate::records::{FemRecord, PacketRecord};

/// Collects FEM records into packets.
///
/// A packet is implicitly open from the start of the stream, it is only emitted if it holds records.
#[derive(Debug, Default)]
pub struct PacketDemux {
    open: PacketRecord,
    next_index: u64,
    completed: Vec<PacketRecord>,
}

impl PacketDemux {
    /// Create a demultiplexer with the implicit packet open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized record to the open packet.
    pub fn push_fem(&mut self, fem: Option<FemRecord>) {
        if let Some(fem) = fem {
            self.open.fems.push(fem);
        }
    }

    /// A packet header at `mem_pos`: emit the open packet and open a new one.
    pub fn open_packet(&mut self, mem_pos: u64) {
        self.flush();
        self.open.mem_pos = Some(mem_pos);
    }

    /// A packet trailer was seen.
    pub fn mark_trailer(&mut self) {
        self.open.trailer_seen = true;
    }

    /// Emit the open packet if it holds records, and leave an empty packet open.
    ///
    /// An empty packet is replaced without consuming an index.
    pub fn flush(&mut self) {
        let packet = std::mem::take(&mut self.open);
        if packet.is_empty() {
            return;
        }
        self.completed.push(PacketRecord {
            index: self.next_index,
            ..packet
        });
        self.next_index += 1;
    }

    /// Take the packets completed since the last call.
    pub fn take_completed(&mut self) -> Vec<PacketRecord> {
        std::mem::take(&mut self.completed)
    }

    /// Number of packets emitted so far.
    pub fn packets_emitted(&self) -> u64 {
        self.next_index
    }
}
