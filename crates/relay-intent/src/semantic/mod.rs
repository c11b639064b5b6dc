//! Semantic routes built from SEMANTIC_EXAMPLE rules.

pub mod routes;

pub use routes::{RouteMatch, SemanticRoute, SemanticRouteTable};
