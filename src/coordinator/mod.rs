pub mod rendezvous;
pub mod collective;
