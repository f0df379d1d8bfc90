/// Re-export the Kubernetes resource types the adapters and mappers work with
pub use k8s_openapi::api::core::v1::{
    Container as K8sContainer,
    Node,
    NodeCondition,
    Pod,
    PodCondition,
    Service,
    ServicePort,
    ServiceSpec,
};

pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
