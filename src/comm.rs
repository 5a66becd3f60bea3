//! In-process rank ring: neighbor messaging and collective reductions.
//!
//! Ranks form a 1-D periodic ring along x. Each rank owns two outgoing
//! channels (to its left and right neighbors) and two incoming ones; sends
//! never block, receives block until the matching message arrives, which
//! mirrors the post-nonblocking-then-wait exchange protocol of
//! distributed-memory halo updates. A message is a raw `Vec<f64>` in
//! (variable, z, halo-column) layout; sender and receiver agree on the
//! length `NUM_VARS * nz * HS` by construction.
//!
//! The SUM all-reduce deposits each rank's contribution into a per-rank
//! slot and folds the slots in rank order after a barrier, so the reduced
//! values are deterministic for a fixed rank count.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Barrier, Mutex};

use crate::error::ModelError;

/// Shared state for barriers and all-reduce across every rank in the ring.
struct Collective {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// One rank's endpoint in the ring.
pub struct RingComm {
    rank: usize,
    nranks: usize,
    left_rank: usize,
    right_rank: usize,
    to_left: Sender<Vec<f64>>,
    to_right: Sender<Vec<f64>>,
    from_left: Receiver<Vec<f64>>,
    from_right: Receiver<Vec<f64>>,
    shared: Arc<Collective>,
}

impl RingComm {
    /// Build a full ring of `nranks` connected endpoints.
    ///
    /// Endpoint r's `to_right` channel feeds endpoint (r+1) % n's
    /// `from_left`, and symmetrically for the other direction; with a
    /// single rank both loop back to itself.
    pub fn ring(nranks: usize) -> Vec<RingComm> {
        assert!(nranks > 0, "a ring needs at least one rank");
        let shared = Arc::new(Collective {
            barrier: Barrier::new(nranks),
            slots: Mutex::new(vec![Vec::new(); nranks]),
        });

        // rightward[r]: r sends right, (r+1) % n receives from its left.
        // leftward[r]: r sends left, (r+n-1) % n receives from its right.
        type Endpoints = (Option<Sender<Vec<f64>>>, Option<Receiver<Vec<f64>>>);
        let new_edges = |n: usize| -> Vec<Endpoints> {
            (0..n)
                .map(|_| {
                    let (tx, rx) = channel();
                    (Some(tx), Some(rx))
                })
                .collect()
        };
        let mut rightward = new_edges(nranks);
        let mut leftward = new_edges(nranks);

        let mut comms = Vec::with_capacity(nranks);
        for rank in 0..nranks {
            let left_rank = (rank + nranks - 1) % nranks;
            let right_rank = (rank + 1) % nranks;
            let to_right = rightward[rank].0.take().unwrap();
            let from_left = rightward[left_rank].1.take().unwrap();
            let to_left = leftward[rank].0.take().unwrap();
            let from_right = leftward[right_rank].1.take().unwrap();
            comms.push(RingComm {
                rank,
                nranks,
                left_rank,
                right_rank,
                to_left,
                to_right,
                from_left,
                from_right,
                shared: Arc::clone(&shared),
            });
        }
        comms
    }

    /// A one-rank ring whose neighbors are itself.
    pub fn single() -> RingComm {
        RingComm::ring(1).remove(0)
    }

    /// This rank's id.
    #[inline(always)]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks in the ring.
    #[inline(always)]
    pub fn nranks(&self) -> usize {
        self.nranks
    }

    /// Left neighbor id under periodic wrap.
    #[inline(always)]
    pub fn left_rank(&self) -> usize {
        self.left_rank
    }

    /// Right neighbor id under periodic wrap.
    #[inline(always)]
    pub fn right_rank(&self) -> usize {
        self.right_rank
    }

    /// Whether this is the main (reporting) rank.
    #[inline(always)]
    pub fn is_main(&self) -> bool {
        self.rank == 0
    }

    /// Post a message to the left neighbor without blocking.
    pub fn send_left(&self, buf: Vec<f64>) -> Result<(), ModelError> {
        self.to_left
            .send(buf)
            .map_err(|_| ModelError::Exchange(format!("left neighbor {} is gone", self.left_rank)))
    }

    /// Post a message to the right neighbor without blocking.
    pub fn send_right(&self, buf: Vec<f64>) -> Result<(), ModelError> {
        self.to_right.send(buf).map_err(|_| {
            ModelError::Exchange(format!("right neighbor {} is gone", self.right_rank))
        })
    }

    /// Wait for the message posted by the left neighbor.
    pub fn recv_from_left(&self) -> Result<Vec<f64>, ModelError> {
        self.from_left.recv().map_err(|_| {
            ModelError::Exchange(format!("left neighbor {} is gone", self.left_rank))
        })
    }

    /// Wait for the message posted by the right neighbor.
    pub fn recv_from_right(&self) -> Result<Vec<f64>, ModelError> {
        self.from_right.recv().map_err(|_| {
            ModelError::Exchange(format!("right neighbor {} is gone", self.right_rank))
        })
    }

    /// Block until every rank has reached the same point.
    pub fn barrier(&self) {
        self.shared.barrier.wait();
    }

    /// Element-wise SUM across all ranks; every rank gets the result.
    ///
    /// Contributions are folded in rank order, so the result does not
    /// depend on thread scheduling.
    pub fn allreduce_sum(&self, local: &[f64]) -> Vec<f64> {
        {
            let mut slots = self.shared.slots.lock().unwrap();
            slots[self.rank] = local.to_vec();
        }
        // All contributions are deposited...
        self.shared.barrier.wait();
        let result = {
            let slots = self.shared.slots.lock().unwrap();
            let mut acc = vec![0.0; local.len()];
            for slot in slots.iter() {
                for (a, v) in acc.iter_mut().zip(slot.iter()) {
                    *a += v;
                }
            }
            acc
        };
        // ...and all ranks have read them before anyone starts the next round.
        self.shared.barrier.wait();
        result
    }

    /// Scalar convenience wrapper around [`Self::allreduce_sum`].
    pub fn allreduce_sum_scalar(&self, value: f64) -> f64 {
        self.allreduce_sum(&[value])[0]
    }
}
