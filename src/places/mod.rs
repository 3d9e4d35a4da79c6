mod registry;

pub use registry::{PointOfInterest, Registry, RegistryError};
