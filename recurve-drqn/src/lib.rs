#![warn(missing_docs)]
//! DRQN agent for the `recurve` library.
//!
//! The agent learns from pixel frames with a recurrent Q-network: traces of
//! transitions are sampled from an episode replay buffer, bootstrapped
//! targets are computed with the double-Q rule, and the first half of every
//! trace is excluded from the loss while the recurrent state warms up.
//!
//! The network itself stays behind the [`RecurrentQFunction`] contract; a
//! backend crate provides the convolutional/recurrent/dueling graph with
//! whatever tensor library it prefers.
//!
//! [`RecurrentQFunction`]: crate::model::RecurrentQFunction
pub mod drqn;
pub mod frame;
pub mod model;
