//! Pipeworks Core -- item-transport networks in a voxel world.
//!
//! A network ("pipe") is a connected structure of same-color connector cells
//! that links input cells to output cells. Items placed in an input are
//! routed into the storage targets of the outputs, honoring sorter filters
//! and smelter slot rules.
//!
//! # Cycle Pipeline
//!
//! The host drives everything through a [`service::PipeService`]:
//!
//! 1. **Activation** -- An input fires; its network is found through the
//!    cache (flood-fill discovery on a miss) and a transfer is queued.
//! 2. **Tick** -- Once per host cycle, loop detections past their TTL
//!    expire and the scheduler counts down.
//! 3. **Firing** -- Every `cycle_interval` cycles, all queued transfers run
//!    in one batch. Each successful run is sampled by the loop detector.
//! 4. **Invalidation** -- Block changes reported by the host drop cached
//!    networks touching the changed cell.
//!
//! # Key Types
//!
//! - [`discovery::Discovery`] -- Breadth-first flood that builds a
//!   [`pipe::Pipe`] from any member cell.
//! - [`cache::PipeCache`] -- Location-keyed memo of discovered pipes, with
//!   generation tickets for off-cycle discovery.
//! - [`transfer::TransferEngine`] -- Four-tier output ranking and placement.
//! - [`scheduler::TransferScheduler`] -- Deduplicated, periodic batches with
//!   idle auto-stop.
//! - [`detector::LoopDetector`] -- Per-requester execution counters.
//! - [`world::World`] / [`item::Inventory`] -- Traits the host implements;
//!   [`grid::GridWorld`] is an in-memory reference implementation.
//! - [`event::PipeEvent`] -- Notifications delivered to a
//!   [`event::NotificationSink`].

pub mod cache;
pub mod classify;
pub mod config;
pub mod detector;
pub mod discovery;
pub mod event;
pub mod grid;
pub mod id;
pub mod item;
pub mod location;
pub mod pipe;
pub mod scheduler;
pub mod service;
pub mod transfer;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
