mod backend;
mod backends;
mod registry;
mod result;

pub use backend::{DetectionCapability, DetectorBackend};
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::{TractBackend, TractConfig};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, MalformedDetection};
