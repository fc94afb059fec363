pub mod migrator;
pub mod state;

pub use migrator::Migrator;
pub use state::PipelineState;
