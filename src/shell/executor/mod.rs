mod executor;
mod pipeline;
mod stage;

pub use executor::Executor;
