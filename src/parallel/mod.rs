//! # Distributed evaluation
//!
//! A run is a group of ranks. Rank 0 owns the populations and makes every GA decision;
//! the other ranks only evaluate individuals sent to them. Ranks talk through a
//! [`Communicator`]: tagged byte messages plus a one-flag broadcast from rank 0.
//!
//! Two transports ship with the crate:
//!
//! - [`SingleProcess`]: a group of one, no messages at all
//! - [`LocalCluster`]: one thread per rank, connected by channels
//!
//! The scheduling policy is chosen by group size alone, see [`scheduler`].
pub mod codec;
pub mod local;
pub mod scheduler;

use crate::error::{GeneticError, Result};

pub use local::{LocalCluster, LocalCommunicator};

/// Message tags of the evaluation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Rank 0 to worker: an encoded individual to evaluate.
    StringToEval = 1,
    /// Worker to rank 0: the evaluation of the last individual received.
    EvalResult = 2,
    /// Rank 0 to worker: the current evaluation pass is over.
    Done = 3,
    /// Rank 0 to everyone: a broadcast control flag.
    Control = 4,
}

impl TryFrom<u8> for Tag {
    type Error = GeneticError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Tag::StringToEval),
            2 => Ok(Tag::EvalResult),
            3 => Ok(Tag::Done),
            4 => Ok(Tag::Control),
            other => Err(GeneticError::Transport(format!("Unknown message tag {}", other))),
        }
    }
}

/// A message as delivered to its receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub source: usize,
    pub tag: Tag,
    pub payload: Vec<u8>,
}

/// The transport between the ranks of one run.
///
/// Delivery between any two ranks is in order. No order is guaranteed across senders.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Sends a message. Does not wait for the receiver.
    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()>;

    /// Blocks until a message from any rank arrives.
    fn recv(&self) -> Result<Message>;

    /// Rank 0 sends `flag` to every other rank; every rank returns rank 0's value.
    fn broadcast_flag(&self, flag: bool) -> Result<bool> {
        if self.rank() == 0 {
            for dest in 1..self.size() {
                self.send(dest, Tag::Control, vec![flag as u8])?;
            }
            return Ok(flag);
        }
        let message = self.recv()?;
        match (message.source, message.tag, message.payload.as_slice()) {
            (0, Tag::Control, [value]) => Ok(*value != 0),
            (source, tag, payload) => Err(GeneticError::Transport(format!(
                "Expected a control flag from rank 0, got {:?} with {} bytes from rank {}",
                tag,
                payload.len(),
                source
            ))),
        }
    }
}

/// The communicator of a run without peers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, dest: usize, _tag: Tag, _payload: Vec<u8>) -> Result<()> {
        Err(GeneticError::Transport(format!(
            "Rank {} does not exist in a single process run",
            dest
        )))
    }

    fn recv(&self) -> Result<Message> {
        Err(GeneticError::Transport(
            "Nothing to receive in a single process run".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_conversion() {
        for tag in [Tag::StringToEval, Tag::EvalResult, Tag::Done, Tag::Control] {
            assert_eq!(Tag::try_from(tag as u8).unwrap(), tag);
        }
        assert!(matches!(Tag::try_from(9), Err(GeneticError::Transport(_))));
    }

    #[test]
    fn test_single_process() {
        let comm = SingleProcess;
        assert_eq!((comm.rank(), comm.size()), (0, 1));
        assert!(comm.broadcast_flag(true).unwrap());
        assert!(comm.send(1, Tag::Done, Vec::new()).is_err());
        assert!(comm.recv().is_err());
    }
}
