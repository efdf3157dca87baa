//! An in-process cluster: every rank is a thread of a dedicated rayon pool and
//! every rank owns the receiving end of one channel.
//!
//! The group is wired as a star. Rank 0 can reach every other rank, the other
//! ranks can reach rank 0 only. When rank 0 returns, every worker's inbox
//! loses its last sender and a blocked `recv` fails instead of hanging.

use std::sync::mpsc::{channel, Receiver, Sender};

use rayon::ThreadPoolBuilder;
use tracing::debug;

use super::{Communicator, Message, Tag};
use crate::error::{GeneticError, OptionExt, Result, ResultExt};

/// The communicator handed to one rank of a [`LocalCluster`].
#[derive(Debug)]
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    peers: Vec<Option<Sender<Message>>>,
    inbox: Receiver<Message>,
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()> {
        let peer = self.peers.get(dest).and_then(Option::as_ref).ok_or_else_genetic(|| {
            GeneticError::Transport(format!(
                "Rank {} has no route to rank {} in a group of {}",
                self.rank, dest, self.size
            ))
        })?;
        peer.send(Message {
            source: self.rank,
            tag,
            payload,
        })
        .map_err(|_| GeneticError::Transport(format!("Rank {} has hung up", dest)))
    }

    fn recv(&self) -> Result<Message> {
        self.inbox.recv().map_err(|_| {
            GeneticError::Transport(format!("Every peer of rank {} has hung up", self.rank))
        })
    }
}

/// A group of `size` ranks hosted in one process.
///
/// # Examples
///
/// ```
/// use pgalib::parallel::{Communicator, LocalCluster};
///
/// let cluster = LocalCluster::new(3).unwrap();
/// let ranks = cluster
///     .run(|comm| {
///         let flag = comm.broadcast_flag(comm.rank() == 0)?;
///         Ok((comm.rank(), flag))
///     })
///     .unwrap();
/// assert_eq!(ranks, vec![(0, true), (1, true), (2, true)]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LocalCluster {
    size: usize,
}

impl LocalCluster {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(GeneticError::Configuration(
                "A cluster needs at least one rank".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `f` once per rank, each on its own thread, and returns the results
    /// in rank order. The first failing rank's error is returned.
    pub fn run<T, F>(&self, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(LocalCommunicator) -> Result<T> + Sync,
    {
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..self.size).map(|_| channel::<Message>()).unzip();
        let communicators: Vec<LocalCommunicator> = receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalCommunicator {
                rank,
                size: self.size,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(dest, tx)| ((rank == 0) != (dest == 0)).then(|| tx.clone()))
                    .collect(),
                inbox,
            })
            .collect();
        drop(senders);

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.size)
            .thread_name(|i| format!("pga-rank-{}", i))
            .build()
            .context("Failed to build the rank thread pool")?;

        debug!(size = self.size, "Starting local cluster");
        let (results_tx, results_rx) = channel();
        pool.scope(|scope| {
            for comm in communicators {
                let results_tx = results_tx.clone();
                let f = &f;
                scope.spawn(move |_| {
                    let rank = comm.rank;
                    // The receiver outlives the scope, so this cannot fail.
                    let _ = results_tx.send((rank, f(comm)));
                });
            }
        });
        drop(results_tx);

        let mut results: Vec<Option<Result<T>>> = (0..self.size).map(|_| None).collect();
        for (rank, result) in results_rx {
            results[rank] = Some(result);
        }
        results
            .into_iter()
            .enumerate()
            .map(|(rank, r)| {
                r.ok_or_else_genetic(|| {
                    GeneticError::Transport(format!("Rank {} produced no result", rank))
                })?
            })
            .collect()
    }
}
