//! # Evaluation scheduler
//!
//! One evaluation pass computes every out-of-date member of a population
//! exactly once. The policy depends only on the group size:
//!
//! - 1 rank: rank 0 evaluates every pending member in place.
//! - 2 ranks: cooperative pipelining. Rank 0 sends one pending member to
//!   rank 1, evaluates the next pending member itself, then waits for rank 1's
//!   result, until nothing is pending.
//! - 3 or more ranks: master/worker. Rank 0 hands one member to every worker,
//!   then answers each incoming result by sending that worker the next pending
//!   member. Once nothing is left to send it drains the results still in
//!   flight.
//!
//! Every pass on 2 or more ranks ends with a `Done` message to each worker,
//! which is what returns [`run_worker`] on the other side.

use tracing::{debug, trace};

use super::{codec, Communicator, Tag};
use crate::{
    error::{GeneticError, Result},
    evolution::Challenge,
    genome::Representation,
    population::Population,
};

/// Evaluates every stale member of `pop`. Returns how many were evaluated.
///
/// Must be called on rank 0; the other ranks run [`run_worker`] meanwhile.
pub fn evaluate<R, C, M>(
    representation: &R,
    pop: &mut Population<R::Genome>,
    challenge: &C,
    comm: &M,
) -> Result<usize>
where
    R: Representation,
    C: Challenge<R::Genome> + ?Sized,
    M: Communicator + ?Sized,
{
    if comm.rank() != 0 {
        return Err(GeneticError::Configuration(format!(
            "Rank {} cannot schedule evaluations, only rank 0 can",
            comm.rank()
        )));
    }
    let pending = pop.pending();
    let count = pending.len();
    match comm.size() {
        1 => evaluate_sequential(pop, &pending, challenge)?,
        2 => evaluate_cooperative(representation, pop, &pending, challenge, comm)?,
        _ => evaluate_master_worker(representation, pop, &pending, comm)?,
    }
    debug!(evaluated = count, ranks = comm.size(), "Evaluation pass complete");
    Ok(count)
}

fn evaluate_local<G, C>(pop: &mut Population<G>, index: usize, challenge: &C) -> Result<()>
where
    C: Challenge<G> + ?Sized,
{
    let member = pop.get_mut(index)?;
    let value = challenge.score(member.genome());
    member.set_evaluation(value);
    trace!(index, value, "Evaluated locally");
    Ok(())
}

fn evaluate_sequential<G, C>(pop: &mut Population<G>, pending: &[usize], challenge: &C) -> Result<()>
where
    C: Challenge<G> + ?Sized,
{
    for &index in pending {
        evaluate_local(pop, index, challenge)?;
    }
    Ok(())
}

fn send_individual<R, M>(
    representation: &R,
    pop: &Population<R::Genome>,
    index: usize,
    worker: usize,
    comm: &M,
) -> Result<()>
where
    R: Representation,
    M: Communicator + ?Sized,
{
    let payload = codec::encode_individual(representation, pop.get(index)?);
    comm.send(worker, Tag::StringToEval, payload)?;
    trace!(index, worker, "Dispatched");
    Ok(())
}

/// Receives one result and returns the sending rank with its value.
fn receive_result<M: Communicator + ?Sized>(comm: &M) -> Result<(usize, f64)> {
    let message = comm.recv()?;
    if message.tag != Tag::EvalResult {
        return Err(GeneticError::Transport(format!(
            "Expected an evaluation result, got {:?} from rank {}",
            message.tag, message.source
        )));
    }
    Ok((message.source, codec::decode_evaluation(&message.payload)?))
}

fn release_workers<M: Communicator + ?Sized>(comm: &M) -> Result<()> {
    for worker in 1..comm.size() {
        comm.send(worker, Tag::Done, Vec::new())?;
    }
    Ok(())
}

fn evaluate_cooperative<R, C, M>(
    representation: &R,
    pop: &mut Population<R::Genome>,
    pending: &[usize],
    challenge: &C,
    comm: &M,
) -> Result<()>
where
    R: Representation,
    C: Challenge<R::Genome> + ?Sized,
    M: Communicator + ?Sized,
{
    for pair in pending.chunks(2) {
        let remote = pair[0];
        send_individual(representation, pop, remote, 1, comm)?;
        if let Some(&local) = pair.get(1) {
            evaluate_local(pop, local, challenge)?;
        }
        let (source, value) = receive_result(comm)?;
        if source != 1 {
            return Err(GeneticError::Transport(format!(
                "Unexpected result from rank {} in a group of two",
                source
            )));
        }
        pop.get_mut(remote)?.set_evaluation(value);
    }
    release_workers(comm)
}

fn evaluate_master_worker<R, M>(
    representation: &R,
    pop: &mut Population<R::Genome>,
    pending: &[usize],
    comm: &M,
) -> Result<()>
where
    R: Representation,
    M: Communicator + ?Sized,
{
    let mut work: Vec<Option<usize>> = vec![None; comm.size()];
    let mut queue = pending.iter().copied();
    let mut in_flight = 0;

    for (worker, slot) in work.iter_mut().enumerate().skip(1) {
        match queue.next() {
            Some(index) => {
                send_individual(representation, pop, index, worker, comm)?;
                *slot = Some(index);
                in_flight += 1;
            }
            None => break,
        }
    }

    while in_flight > 0 {
        let (worker, value) = receive_result(comm)?;
        let index = work
            .get_mut(worker)
            .and_then(Option::take)
            .ok_or_else(|| {
                GeneticError::Transport(format!(
                    "Result from rank {} which has no outstanding work",
                    worker
                ))
            })?;
        pop.get_mut(index)?.set_evaluation(value);
        in_flight -= 1;

        if let Some(next) = queue.next() {
            send_individual(representation, pop, next, worker, comm)?;
            work[worker] = Some(next);
            in_flight += 1;
        }
    }
    release_workers(comm)
}

/// The evaluation loop of a worker rank for one pass.
///
/// Evaluates every individual received until rank 0 sends `Done`. Returns how
/// many individuals were evaluated.
pub fn run_worker<R, C, M>(representation: &R, challenge: &C, comm: &M) -> Result<usize>
where
    R: Representation,
    C: Challenge<R::Genome> + ?Sized,
    M: Communicator + ?Sized,
{
    let mut count = 0;
    loop {
        let message = comm.recv()?;
        match message.tag {
            Tag::StringToEval => {
                let individual = codec::decode_individual(representation, &message.payload)?;
                let value = challenge.score(individual.genome());
                comm.send(message.source, Tag::EvalResult, codec::encode_evaluation(value))?;
                count += 1;
            }
            Tag::Done => return Ok(count),
            other => {
                return Err(GeneticError::Transport(format!(
                    "Worker {} received unexpected {:?} from rank {}",
                    comm.rank(),
                    other,
                    message.source
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{BinaryRepresentation, BinaryString};
    use crate::parallel::{LocalCluster, SingleProcess};
    use crate::rng::RandomNumberGenerator;

    fn ones(g: &BinaryString) -> f64 {
        g.count_ones() as f64
    }

    fn population(rep: &BinaryRepresentation, seed: u64) -> Population<BinaryString> {
        let mut rng = RandomNumberGenerator::from_seed(seed);
        Population::new(9, |_| rep.create(true, &mut rng))
    }

    fn expected(pop: &Population<BinaryString>) -> Vec<f64> {
        pop.members().iter().map(|m| ones(m.genome())).collect()
    }

    #[test]
    fn test_sequential_skips_current_members() {
        let rep = BinaryRepresentation::new(20);
        let mut pop = population(&rep, 1);
        pop.get_mut(3).unwrap().set_evaluation(-1.0);

        let n = evaluate(&rep, &mut pop, &ones, &SingleProcess).unwrap();

        assert_eq!(n, 8);
        assert_eq!(pop.get(3).unwrap().evaluation(), -1.0);
        assert!(pop.pending().is_empty());
    }

    /// Runs one pass on `size` ranks and returns how many members the workers evaluated.
    fn distributed(size: usize) -> usize {
        let rep = BinaryRepresentation::new(20);
        let results = LocalCluster::new(size)
            .unwrap()
            .run(|comm| {
                if comm.rank() == 0 {
                    let mut pop = population(&rep, 2);
                    let want = expected(&pop);
                    let n = evaluate(&rep, &mut pop, &ones, &comm)?;
                    assert_eq!(n, 9);
                    assert_eq!(pop.evaluations(), want);
                    assert!(pop.pending().is_empty());
                    Ok(n)
                } else {
                    run_worker(&rep, &ones, &comm)
                }
            })
            .unwrap();
        assert_eq!(results[0], 9);
        results.iter().skip(1).sum()
    }

    #[test]
    fn test_cooperative_pass() {
        // Rank 0 keeps every second pending member for itself.
        assert_eq!(distributed(2), 5);
    }

    #[test]
    fn test_master_worker_pass() {
        assert_eq!(distributed(4), 9);
    }

    #[test]
    fn test_more_workers_than_pending() {
        let rep = BinaryRepresentation::new(20);
        LocalCluster::new(5)
            .unwrap()
            .run(|comm| {
                if comm.rank() == 0 {
                    let mut pop = population(&rep, 3);
                    for i in 0..8 {
                        pop.get_mut(i)?.set_evaluation(0.0);
                    }
                    evaluate(&rep, &mut pop, &ones, &comm)
                } else {
                    run_worker(&rep, &ones, &comm)
                }
            })
            .unwrap();
    }

    #[test]
    fn test_worker_rejects_unexpected_tag() {
        let rep = BinaryRepresentation::new(20);
        let results = LocalCluster::new(2).unwrap().run(|comm| {
            if comm.rank() == 0 {
                comm.send(1, Tag::EvalResult, Vec::new())?;
                Ok(0)
            } else {
                run_worker(&rep, &ones, &comm)
            }
        });
        assert!(matches!(results, Err(GeneticError::Transport(_))));
    }

    #[test]
    fn test_only_rank_zero_schedules() {
        let rep = BinaryRepresentation::new(20);
        let result = LocalCluster::new(2).unwrap().run(|comm| {
            let mut pop = population(&rep, 4);
            match comm.rank() {
                1 => evaluate(&rep, &mut pop, &ones, &comm),
                _ => Ok(0),
            }
        });
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }
}
