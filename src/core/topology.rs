use serde::{Deserialize, Serialize};

/// Naming scheme of the simulated village: one tank feeding `num_clusters`
/// clusters over trunk pipes, each cluster feeding `houses_per_cluster` houses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageTopology {
    pub num_clusters: u32,
    pub houses_per_cluster: u32,
}

impl Default for VillageTopology {
    fn default() -> Self {
        Self {
            num_clusters: 10,
            houses_per_cluster: 5,
        }
    }
}

impl VillageTopology {
    pub fn new(num_clusters: u32, houses_per_cluster: u32) -> Self {
        Self {
            num_clusters,
            houses_per_cluster,
        }
    }

    /// Trunk-flow column ids (`Cluster1`, `Cluster2`, ...).
    pub fn cluster_ids(&self) -> Vec<String> {
        (1..=self.num_clusters).map(|c| format!("Cluster{}", c)).collect()
    }

    /// House junction ids, cluster-major (`C1H1`, `C1H2`, ..., `C2H1`, ...).
    pub fn house_ids(&self) -> Vec<String> {
        (1..=self.num_clusters)
            .flat_map(|c| (1..=self.houses_per_cluster).map(move |h| format!("C{}H{}", c, h)))
            .collect()
    }

    pub fn total_houses(&self) -> u32 {
        self.num_clusters * self.houses_per_cluster
    }
}
