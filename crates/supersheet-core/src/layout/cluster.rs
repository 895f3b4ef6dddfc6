/// A group of nearby positions on one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Indices into the input slice, in ascending position order.
    pub members: Vec<usize>,
    pub min: f32,
    pub max: f32,
    sum: f32,
}

impl Cluster {
    fn start(index: usize, position: f32) -> Self {
        Cluster {
            members: vec![index],
            min: position,
            max: position,
            sum: position,
        }
    }

    fn push(&mut self, index: usize, position: f32) {
        self.members.push(index);
        self.min = self.min.min(position);
        self.max = self.max.max(position);
        self.sum += position;
    }

    pub fn center(&self) -> f32 {
        self.sum / self.members.len() as f32
    }
}

/// Single-pass 1-D clustering used for both line (y) and column (x) inference.
///
/// Positions are visited in ascending order; a position joins the current
/// cluster when it lies within `tolerance` of that cluster's running center,
/// otherwise it opens a new cluster. Clusters come back in ascending order and
/// every input index appears in exactly one of them.
pub fn cluster_1d(positions: &[f32], tolerance: f32) -> Vec<Cluster> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| positions[a].total_cmp(&positions[b]));

    let mut clusters: Vec<Cluster> = Vec::new();
    for i in order {
        let p = positions[i];
        match clusters.last_mut() {
            Some(c) if (p - c.center()).abs() <= tolerance => c.push(i, p),
            _ => clusters.push(Cluster::start(i, p)),
        }
    }
    clusters
}

/// Median of the finite values, or `None` when there are none.
pub fn median(values: impl IntoIterator<Item = f32>) -> Option<f32> {
    let mut v: Vec<f32> = values.into_iter().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f32::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}
