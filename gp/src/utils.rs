use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix2};

/// Computes differences between each element of x and each element of y
/// resulting in a 2d array of shape (nrows(x) * nrows(y), ncols(x));
/// *Panics* if x and y have not the same column numbers
pub fn pairwise_differences<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    assert!(x.ncols() == y.ncols());

    let nx = x.nrows();
    let ny = y.nrows();
    let ncols = x.ncols();
    let mut result = Array2::zeros((nx * ny, ncols));

    for (i, x_row) in x.rows().into_iter().enumerate() {
        for (j, y_row) in y.rows().into_iter().enumerate() {
            let idx = i * ny + j;
            for k in 0..ncols {
                result[[idx, k]] = x_row[k] - y_row[k];
            }
        }
    }

    result
}

/// Number of elements described by the given batch shape (1 for the empty shape)
pub fn batch_len(batch_shape: &[usize]) -> usize {
    batch_shape.iter().product()
}

/// Shape made of `batch_shape` followed by `tail` dimensions
pub fn with_tail(batch_shape: &[usize], tail: &[usize]) -> Vec<usize> {
    let mut shape = batch_shape.to_vec();
    shape.extend_from_slice(tail);
    shape
}
