pub mod pool;
pub mod db;
pub mod sql;
pub mod ident;
pub mod probes;
pub mod hosts;

pub use pool::{
    DatabasePool,
    initialize_dbpool,
};

pub use db::{
    initialize_db,
    cleanup_db,
};

pub use probes::{
    ProbeCache,
    ProbeSchema,
    ProbeStore,
};

pub use hosts::{
    HostCache,
    HostStore,
};
