/// The evaluation function of a run.
///
/// `score` is called once per out-of-date individual per pass. It must be a pure function
/// of the genome: the scheduler may call it on any rank, in any order.
///
/// Closures implement the trait directly:
///
/// ```
/// use pgalib::evolution::Challenge;
/// use pgalib::genome::BinaryString;
///
/// let ones = |g: &BinaryString| g.count_ones() as f64;
/// assert_eq!(ones.score(&BinaryString::from_bits(&[true, false, true])), 2.0);
/// ```
pub trait Challenge<G>: Send + Sync {
    fn score(&self, genome: &G) -> f64;
}

impl<G, F> Challenge<G> for F
where
    F: Fn(&G) -> f64 + Send + Sync,
{
    fn score(&self, genome: &G) -> f64 {
        self(genome)
    }
}
