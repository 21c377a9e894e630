//! Plugin backend processes
//!
//! A plugin may ship a backend binary that speaks HTTP on a unix socket.
//! [`BackendSupervisor`] starts every configured binary with the socket path
//! as its argument, reads `GET /manifest` once it answers, and restarts the
//! process whenever the binary changes on disk. Requests under
//! `/api/plugin/{id}/` are forwarded to the socket by [`ipc::send`].

mod error;
pub mod ipc;
mod manifest;
mod supervisor;

pub use error::BackendError;
pub use manifest::{Datasource, LoadedPlugins, Manifest};
pub use supervisor::{Backend, BackendSupervisor, SupervisorSettings};
