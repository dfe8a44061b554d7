//! # probex-core
//!
//! Core library for the probex media-probe service: the job store,
//! the orchestration service, and the single analysis worker that
//! drives jobs through the external probe tool.
//!
//! ## Architecture
//!
//! - [`job`]: the job entity, its identifier, and the status state
//!   machine.
//! - [`store`]: the concurrency-safe job container (`in-memory` and
//!   Postgres backends behind one trait).
//! - [`service`]: request validation and store-error translation.
//! - [`worker`]: the claim/execute/finalize polling loop.
//! - [`fetch`] / [`probe`]: the collaborator contracts for source
//!   byte retrieval and external inspection, with default
//!   implementations.

pub mod api_types;
pub mod error;
pub mod fetch;
pub mod job;
pub mod probe;
pub mod service;
pub mod store;
pub mod worker;

pub use api_types::{JobResponse, JobResultRequest, JobStatusUpdateRequest, NewJobRequest};
pub use error::{ProbeError, Result};
pub use fetch::{FetchError, FileSourceFetcher, HttpSourceFetcher, SourceFetcher};
pub use job::{Job, JobId, JobStatus, StatusUpdate};
pub use probe::{FfprobeRunner, ProbeRunError, ProbeRunner};
pub use service::JobService;
pub use store::{JobStore, MemoryJobStore, PgJobStore};
pub use worker::{AnalysisWorker, WorkerConfig};
