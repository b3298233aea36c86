//! Visage Core - the authentication decision pipeline.
//!
//! Everything between an incoming payload and an accept/reject decision:
//!
//! - **Image codec** - base64/data-URI transport decode, fail-closed
//! - **Transient artifacts** - request-scoped probe files with guaranteed release
//! - **Credential store** - SQLite accounts + face credentials (atomic pairs)
//! - **Verification engine** - pluggable face comparison behind [`FaceVerifier`]
//! - **Session store** - tokens issued only on a positive verification
//!
//! # Usage
//!
//! ```rust,ignore
//! use visage_core::GatewayDb;
//!
//! let db = GatewayDb::open("path/to/gateway.db").await?;
//! ```

pub mod artifact;
pub mod codec;
pub mod credentials;
pub mod db;
pub mod error;
pub mod session;
pub mod verify;

pub use artifact::{ArtifactStore, StagedArtifact};
pub use codec::{decode_face_image, encode_face_image, ensure_decodable_image};
pub use credentials::{Account, Enrollment, FaceCredential};
pub use db::GatewayDb;
pub use error::{CodecError, CoreError, CoreResult};
pub use session::Session;
pub use verify::{CommandVerifier, FaceVerifier, VerificationResult};
