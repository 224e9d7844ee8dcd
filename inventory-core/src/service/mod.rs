pub mod application;
pub mod cluster;
pub mod facade;
pub mod instance;
pub mod namespace;

pub use application::ApplicationService;
pub use cluster::ClusterService;
pub use facade::InventoryFacade;
pub use instance::ApplicationInstanceService;
pub use namespace::NamespaceService;
