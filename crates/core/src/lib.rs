//! # multinet-core
//!
//! Community detection over multilayer networks: a data model of actors,
//! layers, nodes and typed-attribute edges (§3–§4.1), sparse matrix
//! construction from that model (§4.2), and four community-detection
//! engines — GLouvain, LART, PMM, ACL — plus the ABACUS ensemble and the
//! modularity evaluator they share (§4.3–§4.8).
//!
//! See the project README for the full specification this crate
//! implements.

pub mod algo;
pub mod error;
pub mod matrix;
pub mod model;
pub mod rng;
pub mod worker;

// Re-export commonly used types at crate root.
pub use algo::{
    Abacus, AbacusParams, AbacusResult, Acl, AclParams, AclResult, BelongingCombinator, GLouvain,
    GlouvainParams, GlouvainResult, Lart, LartParams, LartResult, LinkageMethod, Modularity, MoveStrategy,
    Pmm, PmmParams, PmmResult,
};
pub use error::{Error, Result};
pub use matrix::MatrixBuilder;
pub use model::{
    Actor, ActorId, AttributeStore, AttributeType, Community, CommunityStructure, Edge, EdgeId, Layer,
    LayerId, NeighborMode, Network, Node, NodeId,
};
pub use worker::{CancelledError, NoopMonitor, ProgressMonitor};
