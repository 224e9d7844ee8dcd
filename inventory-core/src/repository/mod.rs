pub mod application;
pub mod cluster;
pub mod instance;
pub mod namespace;

pub use application::ApplicationRepository;
pub use cluster::ClusterRepository;
pub use instance::InstanceRepository;
pub use namespace::NamespaceRepository;
