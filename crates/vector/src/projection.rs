//! Principal component projection to two dimensions
//!
//! Fitted fresh on every batch. The eigenproblem is solved on whichever of
//! the (rows x rows) Gram matrix or the (dims x dims) covariance matrix of
//! the centred data is smaller, with cyclic Jacobi rotations, and the
//! components are taken in order of decreasing variance.

use embedwrangler_common::{Result, WranglerError};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Output dimensionality
pub const PROJECTION_COMPONENTS: usize = 2;

const MAX_SWEEPS: usize = 100;
/// Off-diagonal mass, relative to the whole matrix, at which Jacobi stops
const JACOBI_TOLERANCE: f64 = 1e-24;
/// Components whose variance is below this fraction of the total are zero
const RELATIVE_VARIANCE_FLOOR: f64 = 1e-10;

/// Project the rows of `data` onto their first two principal components
///
/// Column 0 carries the largest variance. Each column's sign is fixed so
/// its largest-magnitude coordinate is positive, making the output
/// deterministic for a given input.
pub fn project_2d(data: ArrayView2<f32>) -> Result<Vec<[f32; 2]>> {
    let (rows, dims) = data.dim();
    if rows < PROJECTION_COMPONENTS {
        return Err(WranglerError::invalid_input(format!(
            "Projection needs at least {} vectors, got {}",
            PROJECTION_COMPONENTS, rows
        )));
    }

    let x = data.mapv(f64::from);
    let mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| WranglerError::internal("Cannot centre an empty batch"))?;
    let centered = &x - &mean;

    // Both matrices share the nonzero eigenvalues; their traces are the
    // total variance.
    let use_gram = rows <= dims;
    let scatter = if use_gram {
        centered.dot(&centered.t())
    } else {
        centered.t().dot(&centered)
    };
    let total_variance = scatter.diag().sum();

    let (eigenvalues, eigenvectors) = symmetric_eigen(scatter);
    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]).then(a.cmp(&b)));

    let mut coords = Array2::<f64>::zeros((rows, PROJECTION_COMPONENTS));
    for (component, &k) in order.iter().take(PROJECTION_COMPONENTS).enumerate() {
        let eigenvalue = eigenvalues[k];
        if eigenvalue <= 0.0 || eigenvalue <= total_variance * RELATIVE_VARIANCE_FLOOR {
            break;
        }

        let scores = if use_gram {
            eigenvectors.column(k).mapv(|u| u * eigenvalue.sqrt())
        } else {
            centered.dot(&eigenvectors.column(k))
        };
        coords.column_mut(component).assign(&canonical_sign(scores));
    }

    coords
        .outer_iter()
        .map(|row| {
            let point = [row[0] as f32, row[1] as f32];
            if point.iter().all(|v| v.is_finite()) {
                Ok(point)
            } else {
                Err(WranglerError::internal("Projection produced non-finite coordinates"))
            }
        })
        .collect()
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix
fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.mapv(|x| x * x).sum();

    for _ in 0..MAX_SWEEPS {
        let off_diagonal: f64 = a
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, x)| x * x)
            .sum();
        if off_diagonal <= scale * JACOBI_TOLERANCE {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                // Rotation angle that zeroes a[p][q]
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

fn canonical_sign(v: Array1<f64>) -> Array1<f64> {
    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        -v
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const EPSILON: f32 = 1e-4;

    fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    }

    #[test]
    fn test_rejects_single_row() {
        let data = array![[1.0f32, 2.0, 3.0]];
        let err = project_2d(data.view()).unwrap_err();
        assert!(matches!(err, WranglerError::InvalidInput(_)));
    }

    #[test]
    fn test_two_rows_lie_on_first_axis() {
        let data = array![[0.0f32, 0.0, 0.0], [3.0, 4.0, 0.0]];
        let coords = project_2d(data.view()).unwrap();

        assert_eq!(coords.len(), 2);
        assert!((coords[0][0] + coords[1][0]).abs() < EPSILON);
        assert!((distance(coords[0], coords[1]) - 5.0).abs() < EPSILON);
        assert!(coords.iter().all(|c| c[1] == 0.0));
    }

    #[test]
    fn test_planar_data_preserves_distances() {
        // Rectangle 4 x 2 embedded in 4 dimensions with an offset
        let data = array![
            [2.0f32, 1.0, 7.0, 7.0],
            [-2.0, 1.0, 7.0, 7.0],
            [-2.0, -1.0, 7.0, 7.0],
            [2.0, -1.0, 7.0, 7.0],
        ];
        let coords = project_2d(data.view()).unwrap();

        for i in 0..4 {
            for j in 0..4 {
                let expected = {
                    let a = data.row(i);
                    let b = data.row(j);
                    (&a - &b).mapv(|d| d * d).sum().sqrt()
                };
                assert!((distance(coords[i], coords[j]) - expected).abs() < EPSILON);
            }
        }

        // Longest side on the first component
        for c in &coords {
            assert!((c[0].abs() - 2.0).abs() < EPSILON);
            assert!((c[1].abs() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_centred_output() {
        let data = array![
            [0.1f32, 0.9, -0.3],
            [0.4, -0.2, 0.8],
            [-0.7, 0.5, 0.2],
            [0.3, 0.3, 0.3],
            [1.2, -0.4, 0.0],
        ];
        let coords = project_2d(data.view()).unwrap();
        let sum_x: f32 = coords.iter().map(|c| c[0]).sum();
        let sum_y: f32 = coords.iter().map(|c| c[1]).sum();
        assert!(sum_x.abs() < EPSILON);
        assert!(sum_y.abs() < EPSILON);
    }

    #[test]
    fn test_repeatable() {
        let data = array![
            [0.5f32, -1.0, 2.0, 0.0],
            [1.5, 0.0, -2.0, 1.0],
            [-0.5, 2.0, 0.5, -1.0],
        ];
        let first = project_2d(data.view()).unwrap();
        let second = project_2d(data.view()).unwrap();
        assert_eq!(first, second);
    }

    fn variances(coords: &[[f32; 2]]) -> (f32, f32) {
        coords
            .iter()
            .fold((0.0, 0.0), |(a, b), c| (a + c[0] * c[0], b + c[1] * c[1]))
    }

    /// Eight points on a long axis and two far out on a short one
    fn cross(dims: usize) -> Array2<f32> {
        let mut data = Array2::<f32>::zeros((10, dims));
        for i in 0..8 {
            data[[i, 0]] = if i % 2 == 0 { 5.0 } else { -5.0 };
        }
        data[[8, 1]] = 9.0;
        data[[9, 1]] = -9.0;
        data
    }

    #[test]
    fn test_components_ordered_by_variance() {
        // 10 x 2 goes through the covariance matrix, 10 x 12 through the Gram matrix
        for dims in [2, 12] {
            let coords = project_2d(cross(dims).view()).unwrap();
            let (first, second) = variances(&coords);

            assert!(first >= second, "dims={}: {} < {}", dims, first, second);
            assert!((first - 200.0).abs() < 1e-2, "dims={}", dims);
            assert!((second - 162.0).abs() < 1e-2, "dims={}", dims);
            for c in &coords[..8] {
                assert!((c[0].abs() - 5.0).abs() < EPSILON);
                assert!(c[1].abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_tall_and_wide_batches_agree() {
        let tall = array![
            [0.1f32, 0.9, -0.3],
            [0.4, -0.2, 0.8],
            [-0.7, 0.5, 0.2],
            [0.3, 0.3, 0.3],
            [1.2, -0.4, 0.0],
        ];
        // Same points padded with zero dimensions
        let mut wide = Array2::<f32>::zeros((5, 8));
        wide.slice_mut(ndarray::s![.., ..3]).assign(&tall);

        let a = project_2d(tall.view()).unwrap();
        let b = project_2d(wide.view()).unwrap();
        for (p, q) in a.iter().zip(&b) {
            assert!((p[0] - q[0]).abs() < EPSILON);
            assert!((p[1] - q[1]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_identical_rows_project_to_origin() {
        let data = array![[1.0f32, 2.0], [1.0, 2.0], [1.0, 2.0]];
        let coords = project_2d(data.view()).unwrap();
        assert!(coords.iter().all(|c| c == &[0.0, 0.0]));
    }
}
