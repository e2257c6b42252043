//! K-Means clustering model implementation

use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Centroid movement below which the fit counts as converged
const TOLERANCE: f64 = 1e-4;

/// K-Means model wrapper with fitted parameters
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Fitted K-Means model from linfa; `None` for the single-cluster fallback
    pub fitted: Option<KMeans<f64, L2Dist>>,
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignments for training data
    pub labels: Array1<usize>,
    /// Cluster centroids in normalized space (n_clusters, n_features)
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
}

impl KMeansModel {
    /// Single-cluster model used when there is nothing to cluster
    fn trivial(features: ArrayView2<f64>) -> Self {
        let centroids = Array2::zeros((1, features.ncols()));
        let labels = Array1::zeros(features.nrows());
        let inertia = compute_inertia(features, &labels, &centroids);
        KMeansModel {
            fitted: None,
            n_clusters: 1,
            labels,
            centroids,
            inertia,
        }
    }

    /// Nearest-centroid cluster of every row of a normalized matrix
    ///
    /// Distance ties go to the lowest cluster id.
    pub fn predict(&self, features: ArrayView2<f64>) -> Array1<usize> {
        match &self.fitted {
            Some(fitted) => fitted.predict(&features),
            None => Array1::zeros(features.nrows()),
        }
    }

    /// Records per cluster id
    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.labels.iter().fold(vec![0; self.n_clusters], |mut sizes, &label| {
            if let Some(size) = sizes.get_mut(label) {
                *size += 1;
            }
            sizes
        })
    }

    /// Compute basic silhouette coefficient for a subset of points (for efficiency)
    pub fn compute_silhouette_sample(&self, features: ArrayView2<f64>, sample_size: usize) -> f64 {
        let n_samples = features.nrows().min(sample_size).min(self.labels.len());
        if n_samples < 2 || self.n_clusters < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let point = features.row(i);
            let cluster_label = self.labels[i];

            let mut same_cluster_distances = Vec::new();
            let mut other_cluster_distances: Vec<Vec<f64>> = vec![Vec::new(); self.n_clusters];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }

                let distance = euclidean_distance(point, features.row(j));
                let other_label = self.labels[j];

                if other_label == cluster_label {
                    same_cluster_distances.push(distance);
                } else if other_label < self.n_clusters {
                    other_cluster_distances[other_label].push(distance);
                }
            }

            // a(i): mean distance within the own cluster
            let a_i = if same_cluster_distances.is_empty() {
                0.0
            } else {
                same_cluster_distances.iter().sum::<f64>() / same_cluster_distances.len() as f64
            };

            // b(i): smallest mean distance to another cluster
            let b_i = other_cluster_distances
                .iter()
                .filter(|distances| !distances.is_empty())
                .map(|distances| distances.iter().sum::<f64>() / distances.len() as f64)
                .fold(f64::INFINITY, f64::min);

            let silhouette_i = if b_i.is_infinite() || a_i.max(b_i) == 0.0 {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };

            silhouette_sum += silhouette_i;
        }

        silhouette_sum / n_samples as f64
    }
}

/// Fit K-Means on a normalized feature matrix
///
/// # Arguments
/// * `features` - Normalized features (n_samples, n_features)
/// * `n_clusters` - Requested number of clusters, capped at the number of samples
/// * `max_iters` - Maximum iterations for convergence
/// * `rng` - Random source; one seed is drawn from it for k-means++ init
///
/// # Returns
/// * Fitted `KMeansModel`; a single cluster 0 when the matrix has no rows or no columns
pub fn fit_kmeans<R: Rng + ?Sized>(
    features: &Array2<f64>,
    n_clusters: usize,
    max_iters: usize,
    rng: &mut R,
) -> KMeansModel {
    let k = n_clusters.min(features.nrows());
    if k == 0 || features.ncols() == 0 {
        log::debug!(
            "Degenerate clustering input {:?}, using a single cluster",
            features.shape()
        );
        return KMeansModel::trivial(features.view());
    }

    // Create dataset for linfa
    let targets: Array1<usize> = Array1::zeros(features.nrows());
    let dataset = Dataset::new(features.clone(), targets);

    let fitted = KMeans::params_with(k, StdRng::seed_from_u64(rng.gen()), L2Dist)
        .n_runs(1)
        .max_n_iterations(max_iters.max(1) as u64)
        .tolerance(TOLERANCE)
        .fit(&dataset);

    let fitted = match fitted {
        Ok(fitted) => fitted,
        Err(err) => {
            log::warn!("K-Means fit failed ({}), using a single cluster", err);
            return KMeansModel::trivial(features.view());
        }
    };

    let centroids = fitted.centroids().clone();
    let mut model = KMeansModel {
        fitted: Some(fitted),
        n_clusters: k,
        labels: Array1::zeros(0),
        centroids,
        inertia: 0.0,
    };
    model.labels = model.predict(features.view());
    model.inertia = compute_inertia(features.view(), &model.labels, &model.centroids);

    log::debug!("K-Means k={} finished (inertia: {:.4})", k, model.inertia);
    model
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: ArrayView2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    features
        .outer_iter()
        .zip(labels.iter())
        .filter(|(_, cluster)| **cluster < centroids.nrows())
        .map(|(point, &cluster)| squared_distance(point, centroids.row(cluster)))
        .sum()
}

fn squared_distance(point1: ArrayView1<f64>, point2: ArrayView1<f64>) -> f64 {
    point1
        .iter()
        .zip(point2.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
}

/// Calculate Euclidean distance between two points
fn euclidean_distance(point1: ArrayView1<f64>, point2: ArrayView1<f64>) -> f64 {
    squared_distance(point1, point2).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_features() -> Array2<f64> {
        // Three well separated groups of two points each
        array![
            [-5.0, -5.0],
            [-5.2, -4.8],
            [0.0, 0.1],
            [0.1, 0.0],
            [5.0, 5.0],
            [5.1, 4.9],
        ]
    }

    #[test]
    fn test_fit_kmeans() {
        let features = create_test_features();
        let mut rng = StdRng::seed_from_u64(7);
        let model = fit_kmeans(&features, 3, 100, &mut rng);

        assert_eq!(model.n_clusters, 3);
        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.centroids.shape(), &[3, 2]);
        assert!(model.fitted.is_some());
        assert!(model.labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_separated_groups_share_labels() {
        let features = create_test_features();
        let model = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(11));

        assert_eq!(model.labels[0], model.labels[1]);
        assert_eq!(model.labels[2], model.labels[3]);
        assert_eq!(model.labels[4], model.labels[5]);
        assert_eq!(model.cluster_sizes(), vec![2, 2, 2]);
    }

    #[test]
    fn test_predict_new_points() {
        let features = create_test_features();
        let model = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(11));

        let new_points = array![[-4.9, -5.1], [4.8, 5.2]];
        let predicted = model.predict(new_points.view());
        assert_eq!(predicted[0], model.labels[0]);
        assert_eq!(predicted[1], model.labels[4]);
        assert_eq!(model.predict(features.view()), model.labels);
    }

    #[test]
    fn test_same_seed_same_result() {
        let features = create_test_features();
        let a = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(3));
        let b = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(3));

        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
    }

    #[test]
    fn test_cluster_sizes() {
        let features = create_test_features();
        let model = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(5));

        let sizes = model.cluster_sizes();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_k_capped_by_samples() {
        let features = array![[1.0], [2.0]];
        let model = fit_kmeans(&features, 5, 100, &mut StdRng::seed_from_u64(1));

        assert_eq!(model.n_clusters, 2);
        assert_eq!(model.centroids.nrows(), 2);
    }

    #[test]
    fn test_degenerate_inputs_give_single_cluster() {
        let mut rng = StdRng::seed_from_u64(1);

        let no_columns = Array2::<f64>::zeros((4, 0));
        let model = fit_kmeans(&no_columns, 5, 100, &mut rng);
        assert_eq!(model.n_clusters, 1);
        assert_eq!(model.labels.to_vec(), vec![0, 0, 0, 0]);

        let no_rows = Array2::<f64>::zeros((0, 3));
        let model = fit_kmeans(&no_rows, 5, 100, &mut rng);
        assert_eq!(model.n_clusters, 1);
        assert!(model.labels.is_empty());
    }

    #[test]
    fn test_identical_points_do_not_fail_seeding() {
        let features = Array2::<f64>::zeros((10, 2));
        let model = fit_kmeans(&features, 5, 100, &mut StdRng::seed_from_u64(9));

        assert_eq!(model.n_clusters, 5);
        assert_eq!(model.inertia, 0.0);
        assert!(model.labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_iteration_cap_still_returns_model() {
        let features = create_test_features();
        let model = fit_kmeans(&features, 3, 1, &mut StdRng::seed_from_u64(2));

        assert_eq!(model.n_clusters, 3);
        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.predict(features.view()), model.labels);
    }

    #[test]
    fn test_single_point() {
        let features = array![[0.5, -0.5]];
        let model = fit_kmeans(&features, 5, 100, &mut StdRng::seed_from_u64(42));

        assert_eq!(model.n_clusters, 1);
        assert_eq!(model.labels.to_vec(), vec![0]);
    }

    #[test]
    fn test_model_inertia() {
        let features = create_test_features();
        let model = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(4));

        assert!(model.inertia >= 0.0);
        assert!(model.inertia.is_finite());
    }

    #[test]
    fn test_silhouette_range() {
        let features = create_test_features();
        let model = fit_kmeans(&features, 3, 100, &mut StdRng::seed_from_u64(8));
        let score = model.compute_silhouette_sample(features.view(), 100);

        assert!((-1.0..=1.0).contains(&score));
    }
}
