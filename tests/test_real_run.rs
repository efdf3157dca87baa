use pgalib::{
    evolution::{Challenge, EvolutionOptions, GeneticAlgorithm},
    fitness::{Direction, FitnessMinType, FitnessType},
    genome::{IntegerRepresentation, RealMutation, RealRepresentation},
    strategy::ReproductionPolicy,
};

struct SumOfSquares;

impl Challenge<Vec<f64>> for SumOfSquares {
    fn score(&self, genome: &Vec<f64>) -> f64 {
        genome.iter().map(|x| x * x).sum()
    }
}

fn sphere_options(seed: u64) -> EvolutionOptions {
    EvolutionOptions::builder()
        .direction(Direction::Minimize)
        .population_size(40)
        .num_replace(30)
        .max_iterations(500)
        .reproduction(ReproductionPolicy::MutationAndCrossover)
        .seed(seed)
        .build()
        .unwrap()
}

fn unit_cube() -> RealRepresentation {
    RealRepresentation::new(5)
        .with_range(0.0, 1.0)
        .with_mutation(RealMutation::Gaussian)
        .with_bounded_mutation(true)
}

#[test]
fn test_sphere_minimised() {
    for seed in [1, 2, 3] {
        let mut ga = GeneticAlgorithm::builder(unit_cube(), sphere_options(seed))
            .build()
            .unwrap();
        let summary = ga.run(&SumOfSquares).unwrap();
        assert!(
            summary.best_evaluation.abs() < 1e-3,
            "Seed {} ended at {}",
            seed,
            summary.best_evaluation
        );
        assert!(summary.best.iter().all(|x| (0.0..=1.0).contains(x)));
    }
}

#[test]
fn test_sphere_with_ranking_and_reciprocal() {
    let options = EvolutionOptions::builder()
        .direction(Direction::Minimize)
        .population_size(40)
        .num_replace(30)
        .max_iterations(300)
        .fitness_type(FitnessType::Ranking)
        .fitness_min_type(FitnessMinType::Reciprocal)
        .seed(12)
        .build()
        .unwrap();
    let mut ga = GeneticAlgorithm::builder(unit_cube(), options).build().unwrap();
    let summary = ga.run(&SumOfSquares).unwrap();
    assert!(summary.trajectory[0] >= *summary.trajectory.last().unwrap());
    assert!(summary.best_evaluation < 0.05);
}

#[test]
fn test_integer_target_found() {
    let target = [3i64, -2, 7, 0, 5, -9];
    let challenge = move |genome: &Vec<i64>| -> f64 {
        genome
            .iter()
            .zip(target.iter())
            .map(|(a, b)| (a - b).abs() as f64)
            .sum()
    };
    let options = EvolutionOptions::builder()
        .direction(Direction::Minimize)
        .population_size(60)
        .num_replace(40)
        .max_iterations(400)
        .seed(21)
        .build()
        .unwrap();
    let rep = IntegerRepresentation::new(6).with_range(-10, 10);
    let mut ga = GeneticAlgorithm::builder(rep, options).build().unwrap();
    let summary = ga.run(&challenge).unwrap();
    assert!(summary.best_evaluation <= 2.0);
}
