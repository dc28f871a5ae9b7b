pub mod local;
pub mod seaorm;

pub use local::LocalAuthRepository;
pub use seaorm::SeaOrmAuthRepository;
