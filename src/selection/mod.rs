pub mod roulette;
pub mod selection_strategy;
pub mod tournament;
pub mod universal;

pub use roulette::RouletteWheelSelection;
pub use selection_strategy::{MatingPool, SelectionStrategy, SelectionType};
pub use tournament::{ProbabilisticTournamentSelection, TournamentSelection};
pub use universal::StochasticUniversalSelection;
