pub mod application;
pub mod cluster;
pub mod instance;
pub mod namespace;
pub mod pagination;

pub use application::{
    Application, CreateApplicationRequest, NewApplication, UpdateApplicationRequest,
};
pub use cluster::{
    Cluster, ClusterType, CreateClusterRequest, NewCluster, UpdateClusterRequest,
};
pub use instance::{
    ApplicationInstance, CreateInstanceRequest, InstanceRegistration, InstanceStatus,
    NewInstance, UpdateInstanceRequest,
};
pub use namespace::{
    CreateNamespaceRequest, Namespace, NamespaceStatus, NewNamespace, UpdateNamespaceRequest,
};
pub use pagination::{Page, PageParams, PageQuery};
