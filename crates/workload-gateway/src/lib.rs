//! Workload gateway: an HTTP facade over a Kubernetes cluster.
//!
//! Callers list pods and create, update or delete Deployments by sending
//! manifest YAML. Every mutation is one bounded call to the control plane.

pub mod api;
pub mod app;
pub mod auth;
pub mod cluster;
pub mod config;
pub mod controller;
pub mod logging;
pub mod manifest;
pub mod status;
pub mod users;
