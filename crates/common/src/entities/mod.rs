//! Payloads returned by the console API. The refresh layer treats them as
//! opaque values, so every type here has an empty `Default` that stands in for
//! a failed fetch.

mod clusters;
mod external;
mod metering;
mod presets;

pub use clusters::{Cluster, ClusterHealth, ClusterSpec, ClusterStatus, Event, HealthStatus, MachineDeployment};
pub use external::{ExternalCluster, ExternalClusterProvider, ProviderCluster};
pub use metering::{MeteringSchedule, Report};
pub use presets::{Preset, PresetList};
