//! The multilayer network data model (spec §3, §4.1).
//!
//! `Network` is the sole owner of every actor, layer, node, edge and
//! attribute store; everything else in this module is a value type it
//! hands out by reference or by id.

mod actor;
mod attributes;
mod community;
mod edge;
mod ids;
mod layer;
mod network;
mod node;

pub use actor::Actor;
pub use attributes::{AttributeStore, AttributeType};
pub use community::{Community, CommunityStructure};
pub use edge::Edge;
pub use ids::{ActorId, EdgeId, LayerId, NodeId};
pub use layer::Layer;
pub use network::{NeighborMode, Network};
pub use node::Node;
