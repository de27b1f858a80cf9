pub mod enrich;
pub mod replay_eval;
pub mod serve;
pub mod session;
pub mod worker;
