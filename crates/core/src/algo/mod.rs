//! Community detection engines (§4.3–§4.7) and the evaluator they share
//! (§4.8).

mod abacus;
mod acl;
mod glouvain;
mod group_index;
mod lart;
mod modularity;
mod pmm;

pub use abacus::{Abacus, AbacusParams, AbacusResult};
pub use acl::{Acl, AclParams, AclResult};
pub use glouvain::{GLouvain, GlouvainParams, GlouvainResult, MoveStrategy};
pub use lart::{Lart, LartParams, LartResult, LinkageMethod};
pub use modularity::{BelongingCombinator, Modularity};
pub use pmm::{Pmm, PmmParams, PmmResult};
