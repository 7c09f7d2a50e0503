//! Round-robin split of a trace across clients

/// Split `items` into `parts` lists; list `i` gets `items[i]`, `items[i + parts]`, ...
///
/// Order within each list follows the input. Lists may differ in length by
/// at most one; trailing lists are empty when there are fewer items than
/// parts. `parts == 0` yields no lists.
pub fn partition_round_robin<T: Clone>(items: &[T], parts: usize) -> Vec<Vec<T>> {
    let mut out: Vec<Vec<T>> = (0..parts)
        .map(|i| Vec::with_capacity(items.len().saturating_sub(i).div_ceil(parts)))
        .collect();

    if parts == 0 {
        return out;
    }

    for (idx, item) in items.iter().enumerate() {
        out[idx % parts].push(item.clone());
    }
    out
}
