pub mod local;
pub mod seaorm;

pub use local::LocalProfileRepository;
pub use seaorm::SeaOrmProfileRepository;
