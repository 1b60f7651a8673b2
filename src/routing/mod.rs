// Request routing
//
// - args: splits argv into an explicit-module, auto-route or top-level invocation
// - extensions: static extension table and compatibility matrix
// - resolver: picks the module for one invocation

pub mod args;
pub mod extensions;
pub mod resolver;

pub use args::Invocation;
pub use resolver::{Resolver, RouteRequest, RouteTarget, RoutingDecision};
